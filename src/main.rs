//! termshell demo CLI
//!
//! Exercises the menu, form and table primitives on a real terminal.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::info;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

use termshell::config::{config_path, load_config, resolve, CliOverrides};
use termshell::console::{Console, Terminal};
use termshell::error::{ShellError, ShellResult};
use termshell::form::{Form, FormItem};
use termshell::menu::{Menu, MenuItem};
use termshell::table::Table;
use termshell::types::{ColumnSpec, SelectionMode, ShellConfig};

#[derive(Parser)]
#[command(name = "termshell")]
#[command(about = "Menus, forms and tables for plain text consoles")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: <config dir>/termshell/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write debug logs to this file
    #[arg(long, global = true)]
    log: Option<PathBuf>,

    /// Key that leaves the current menu (also cancels form corrections)
    #[arg(long, global = true)]
    go_up: Option<char>,

    /// Key that runs the debug hook
    #[arg(long, global = true)]
    debug_switch: Option<char>,

    /// Don't clear the screen between redraws
    #[arg(long, global = true)]
    no_clear: bool,

    /// Select menu items by typing a number and Enter
    #[arg(long, global = true)]
    line_select: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Navigate a nested demo menu
    Menu,

    /// Fill in a demo form
    Form {
        /// Print collected values as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a demo table
    Table,

    /// Show the resolved configuration
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(path) = &cli.log {
        init_logging(path);
    }

    let result = resolve_config(&cli).and_then(|config| match cli.command {
        Commands::Menu => cmd_menu(config),
        Commands::Form { json } => cmd_form(config, json),
        Commands::Table => cmd_table(&config),
        Commands::Config => cmd_config(&config),
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

// ============================================================================
// SETUP
// ============================================================================

/// Log to a file; stdout belongs to the UI.
fn init_logging(path: &Path) {
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();

    match File::create(path) {
        Ok(file) => {
            let _ = WriteLogger::init(LevelFilter::Debug, log_config, file);
        }
        Err(e) => eprintln!("Note: cannot open log file {}: {}", path.display(), e),
    }
}

fn resolve_config(cli: &Cli) -> Result<ShellConfig, String> {
    let file_config = load_config(cli.config.as_deref()).map_err(|e| e.to_string())?;

    let overrides = CliOverrides {
        go_up: cli.go_up,
        debug: cli.debug_switch,
        selection: cli.line_select.then_some(SelectionMode::Line),
        new_screen: cli.no_clear.then_some(false),
    };

    let config =
        resolve(&file_config, &overrides, |key| std::env::var(key).ok()).map_err(|e| e.to_string())?;
    info!("termshell starting with {:?}", config);
    Ok(config)
}

/// Running out of input or pressing Ctrl+C is a normal way to leave.
fn finish<T>(result: ShellResult<T>) -> Result<Option<T>, String> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(ShellError::Io(e))
            if matches!(e.kind(), io::ErrorKind::UnexpectedEof | io::ErrorKind::Interrupted) =>
        {
            info!("input ended: {}", e);
            Ok(None)
        }
        Err(e) => Err(e.to_string()),
    }
}

// ============================================================================
// COMMAND HANDLERS
// ============================================================================

fn cmd_menu(config: ShellConfig) -> Result<(), String> {
    let summary = format!("{:?}", config);
    let config = config.with_debug_hook(move |console| {
        console.write_line(&summary)?;
        console.write("Press any key... ")?;
        console.read_key()?;
        Ok(())
    });

    let deep_config = config.clone();
    let divider = config.divider;

    let mut start = Menu::new("Start", config.clone())
        .item(MenuItem::new("First Item", |console| {
            console.write_line("First Item Choose!")?;
            Ok(())
        }))
        .item(MenuItem::new("Second Item", |console| {
            console.write_line("Second Item Choose!")?;
            Ok(())
        }))
        .item(
            MenuItem::new("Go deeper", move |console| {
                let mut deep = Menu::new("Deeper", deep_config.clone())
                    .item(MenuItem::new("Go deeper.First Item", |console| {
                        console.write_line("Go deeper.First Item Choose!")?;
                        Ok(())
                    }))
                    .item(MenuItem::new("Go deeper.Second Item", |console| {
                        console.write_line("Go deeper.Second Item Choose!")?;
                        Ok(())
                    }));
                deep.run(console)
            })
            .refresh(true),
        )
        .item(MenuItem::new("Show table", move |console| {
            console.write(&demo_table(divider).to_string())?;
            Ok(())
        }));

    finish(start.run(&mut Terminal::new())).map(|_| ())
}

fn cmd_form(config: ShellConfig, json: bool) -> Result<(), String> {
    let divider = config.divider;
    let mut form = Form::new("New contact", config)
        .item(FormItem::new("Name", |s| !s.trim().is_empty()))
        .item(FormItem::new("Age", |s| s.trim().parse::<u8>().is_ok()))
        .item(FormItem::new("Email", |s| {
            s.split_once('@')
                .is_some_and(|(user, host)| !user.is_empty() && host.contains('.'))
        }));

    let mut console = Terminal::new();
    if finish(form.run(&mut console))?.is_none() {
        return Ok(());
    }

    let output = if json {
        serde_json::to_string_pretty(&form.field_values()).map_err(|e| e.to_string())? + "\n"
    } else {
        let mut table = Table::with_divider(
            [ColumnSpec::left("Field", 8), ColumnSpec::left("Value", 24)],
            divider,
        );
        for field in form.field_values() {
            table.append_row([field.label, field.value]);
        }
        format!("\n{}", table)
    };

    console.write(&output).map_err(|e| e.to_string())
}

fn cmd_table(config: &ShellConfig) -> Result<(), String> {
    Terminal::new()
        .write(&demo_table(config.divider).to_string())
        .map_err(|e| e.to_string())
}

fn cmd_config(config: &ShellConfig) -> Result<(), String> {
    let location = config_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(no config directory)".to_string());

    let mut table = Table::with_divider(
        [ColumnSpec::left("Setting", 12), ColumnSpec::left("Value", 10)],
        config.divider,
    );
    let settings = [
        ("go_up", config.switches.go_up().to_string()),
        ("debug", config.switches.debug().to_string()),
        ("selection", format!("{:?}", config.selection).to_lowercase()),
        ("new_screen", config.new_screen.to_string()),
        ("on_cancel", format!("{:?}", config.on_cancel).to_lowercase()),
        ("divider", config.divider.to_string()),
    ];
    for (setting, value) in &settings {
        table.append_row([*setting, value.as_str()]);
    }

    Terminal::new()
        .write(&format!("Config file: {}\n\n{}", location, table))
        .map_err(|e| e.to_string())
}

// ============================================================================
// DEMO DATA
// ============================================================================

/// Mixed alignments, a short row, explicit cells and an overflowing row.
fn demo_table(divider: char) -> Table {
    let mut table = Table::with_divider(
        [
            ("Col1", 10, true),
            ("Col2", -10, true),
            ("Col3", 10, false),
            ("Col4", -10, false),
        ],
        divider,
    );

    table
        .append_row(["1,1", "1,2"])
        .append_columns([
            ("1,1", 10, true),
            ("1,2", -10, true),
            ("1,3", -10, false),
            ("1.4", 10, false),
        ])
        .append_columns([
            ("1,1", 10, true),
            ("1,2", -10, true),
            ("1,3", -10, true),
            ("1.4", 10, false),
            ("1.5", 0, true),
        ])
        .append_row(["1,1", "1,2", "1,3", "1.4", "1.5"]);

    table
}
