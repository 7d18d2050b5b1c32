//! Configuration loading and resolution.
//!
//! Override hierarchy: defaults → config file → env vars → CLI flags.
//!
//! The file lives at `<config_dir>/termshell/config.toml` unless a path is
//! given explicitly. Every field is optional; anything missing falls back
//! to the defaults in [`crate::types`].

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::types::{CancelBehavior, SelectionMode, ShellConfig, Switches};

/// Environment variable overriding the go-up switch.
pub const ENV_GO_UP: &str = "TERMSHELL_GO_UP";

/// Environment variable overriding the debug switch.
pub const ENV_DEBUG: &str = "TERMSHELL_DEBUG";

// ============================================================================
// FILE MODEL (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct FileConfig {
    #[serde(default)]
    pub switches: SwitchesConfig,
    #[serde(default)]
    pub menu: MenuConfig,
    #[serde(default)]
    pub form: FormConfig,
    #[serde(default)]
    pub table: TableConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SwitchesConfig {
    pub go_up: Option<char>,
    pub debug: Option<char>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct MenuConfig {
    pub selection: Option<SelectionMode>,
    pub new_screen: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct FormConfig {
    pub on_cancel: Option<CancelBehavior>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct TableConfig {
    pub divider: Option<char>,
}

/// Values given on the command line. None = not specified.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub go_up: Option<char>,
    pub debug: Option<char>,
    pub selection: Option<SelectionMode>,
    pub new_screen: Option<bool>,
}

// ============================================================================
// ERROR TYPE
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: io::Error },
    Parse(toml::de::Error),
    /// A switch or divider character that cannot be used.
    InvalidChar {
        name: &'static str,
        value: char,
        reason: &'static str,
    },
    /// Go-up and debug switches are the same key.
    SwitchCollision(char),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "cannot read config {}: {source}", path.display())
            }
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
            ConfigError::InvalidChar { name, value, reason } => {
                write!(f, "invalid {name} {value:?}: {reason}")
            }
            ConfigError::SwitchCollision(c) => {
                write!(f, "go-up and debug switches are both {c:?}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// LOADING
// ============================================================================

/// Returns the default config location, `<config_dir>/termshell/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("termshell").join("config.toml"))
}

/// Load configuration.
///
/// An explicit path must exist. The default location is optional: if it
/// is missing (or no config directory exists) defaults are returned.
pub fn load_config(explicit: Option<&Path>) -> Result<FileConfig, ConfigError> {
    if let Some(path) = explicit {
        return load_from_path(path);
    }

    match config_path() {
        Some(path) if path.exists() => load_from_path(&path),
        Some(path) => {
            debug!("No config file at {}, using defaults", path.display());
            Ok(FileConfig::default())
        }
        None => {
            warn!("Could not determine config directory, using defaults");
            Ok(FileConfig::default())
        }
    }
}

/// Parse the config file at `path`.
pub fn load_from_path(path: &Path) -> Result<FileConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: FileConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

// ============================================================================
// RESOLUTION
// ============================================================================

/// Collapse file, environment and CLI values into a validated [`ShellConfig`].
///
/// `env` looks up environment variables; pass `|k| std::env::var(k).ok()`
/// for the real environment.
pub fn resolve<E>(config: &FileConfig, cli: &CliOverrides, env: E) -> Result<ShellConfig, ConfigError>
where
    E: Fn(&str) -> Option<String>,
{
    let defaults = ShellConfig::default();
    let env_char = |key: &str| {
        let value = env(key)?;
        let first = value.chars().next();
        if first.is_none() {
            warn!("{} is set but empty, ignoring it", key);
        }
        first
    };

    // Switches: CLI → env → config → default
    let go_up = cli
        .go_up
        .or_else(|| env_char(ENV_GO_UP))
        .or(config.switches.go_up)
        .unwrap_or(defaults.switches.go_up());
    let debug_switch = cli
        .debug
        .or_else(|| env_char(ENV_DEBUG))
        .or(config.switches.debug)
        .unwrap_or(defaults.switches.debug());

    let switches = Switches::new(go_up, debug_switch)?;
    let divider = validate_divider(config.table.divider.unwrap_or(defaults.divider))?;

    let resolved = ShellConfig {
        switches,
        selection: cli
            .selection
            .or(config.menu.selection)
            .unwrap_or(defaults.selection),
        new_screen: cli
            .new_screen
            .or(config.menu.new_screen)
            .unwrap_or(defaults.new_screen),
        on_cancel: config.form.on_cancel.unwrap_or(defaults.on_cancel),
        divider,
        debug_hook: None,
    };
    debug!("Resolved config: {:?}", resolved);
    Ok(resolved)
}

fn validate_divider(value: char) -> Result<char, ConfigError> {
    if value.is_control() {
        return Err(ConfigError::InvalidChar {
            name: "table divider",
            value,
            reason: "not a printable character",
        });
    }
    Ok(value)
}
