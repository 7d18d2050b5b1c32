//! Console port: the only place menus and forms touch the terminal.
//!
//! Structure:
//! - `Console`: the blocking read/write/clear capability the loops need
//! - `Terminal`: crossterm-backed implementation for real use
//! - `ScriptedConsole`: queued input and captured output for tests and demos
//! - `print_title`: the title banner shared by menus and forms

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use crossterm::cursor::MoveTo;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, Clear, ClearType};
use crossterm::ExecutableCommand;
use log::trace;

// ============================================================================
// PORT
// ============================================================================

/// Blocking console operations.
///
/// Every read blocks until input arrives. End of input is reported as
/// `io::ErrorKind::UnexpectedEof` so loops terminate instead of spinning.
pub trait Console {
    /// Read a single keypress. Enter is returned as `'\n'`.
    fn read_key(&mut self) -> io::Result<char>;

    /// Read one line, without its line terminator.
    fn read_line(&mut self) -> io::Result<String>;

    /// Write text without a newline.
    fn write(&mut self, text: &str) -> io::Result<()>;

    /// Write text followed by a newline.
    fn write_line(&mut self, text: &str) -> io::Result<()> {
        self.write(text)?;
        self.write("\n")
    }

    /// Clear the screen.
    fn clear(&mut self) -> io::Result<()>;
}

/// Print the title banner: the title, an `=` underline of the same
/// character count, then a blank line.
pub fn print_title(console: &mut dyn Console, title: &str, new_screen: bool) -> io::Result<()> {
    if new_screen {
        console.clear()?;
    }

    console.write_line(title)?;
    console.write_line(&"=".repeat(title.chars().count()))?;
    console.write_line("")
}

// ============================================================================
// KEY MAPPING
// ============================================================================

/// What a raw terminal key event means to the port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// A character the loops can interpret.
    Char(char),
    /// Ctrl+C: abandon the read.
    Interrupt,
}

/// Map a crossterm key event to console input.
///
/// Returns None for keys with no character meaning (arrows, function keys).
pub fn map_key(key: KeyEvent) -> Option<KeyInput> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    // Ctrl+C always interrupts; raw mode swallows SIGINT
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(KeyInput::Interrupt);
    }

    match key.code {
        KeyCode::Char(c) => Some(KeyInput::Char(c)),
        KeyCode::Enter => Some(KeyInput::Char('\n')),
        KeyCode::Tab => Some(KeyInput::Char('\t')),
        KeyCode::Esc => Some(KeyInput::Char('\u{1b}')),
        _ => None,
    }
}

// ============================================================================
// TERMINAL
// ============================================================================

/// Real terminal: crossterm for keys and clearing, stdin/stdout for lines.
#[derive(Debug, Default)]
pub struct Terminal;

impl Terminal {
    pub fn new() -> Self {
        Terminal
    }
}

/// Keeps raw mode on for the lifetime of a single key read.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(RawModeGuard)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        // Best-effort restoration, nothing to report to
        let _ = disable_raw_mode();
    }
}

impl Console for Terminal {
    fn read_key(&mut self) -> io::Result<char> {
        io::stdout().flush()?;

        let input = {
            let _raw = RawModeGuard::enable()?;
            loop {
                if let Event::Key(key) = event::read()? {
                    if let Some(input) = map_key(key) {
                        break input;
                    }
                }
            }
        };

        match input {
            KeyInput::Interrupt => Err(io::Error::new(io::ErrorKind::Interrupted, "interrupted")),
            KeyInput::Char(c) => {
                trace!("key: {:?}", c);
                if !c.is_control() {
                    self.write(&c.to_string())?;
                }
                Ok(c)
            }
        }
    }

    fn read_line(&mut self) -> io::Result<String> {
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"));
        }

        let trimmed = line.trim_end_matches(['\r', '\n']).to_string();
        trace!("line: {:?}", trimmed);
        Ok(trimmed)
    }

    fn write(&mut self, text: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(text.as_bytes())?;
        out.flush()
    }

    fn clear(&mut self) -> io::Result<()> {
        let mut out = io::stdout();
        out.execute(Clear(ClearType::All))?;
        out.execute(MoveTo(0, 0))?;
        Ok(())
    }
}

// ============================================================================
// SCRIPTED CONSOLE
// ============================================================================

/// One queued input for a [`ScriptedConsole`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    Key(char),
    Line(String),
}

/// Console driven by a fixed script, capturing everything written.
///
/// Reads consume the script in order. Asking for a key when the next
/// step is a line (or the reverse) fails with `InvalidInput`, and an
/// exhausted script fails with `UnexpectedEof`. Echo mirrors a terminal:
/// printable keys and whole lines appear in the transcript.
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    script: VecDeque<ScriptStep>,
    output: String,
    clears: usize,
}

impl ScriptedConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a single keypress.
    pub fn key(mut self, c: char) -> Self {
        self.script.push_back(ScriptStep::Key(c));
        self
    }

    /// Queue one keypress per character of `keys`.
    pub fn keys(mut self, keys: &str) -> Self {
        self.script.extend(keys.chars().map(ScriptStep::Key));
        self
    }

    /// Queue a line of input.
    pub fn line(mut self, line: &str) -> Self {
        self.script.push_back(ScriptStep::Line(line.to_string()));
        self
    }

    /// Everything written so far, including echoed input.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Number of times the screen was cleared.
    pub fn clears(&self) -> usize {
        self.clears
    }

    /// Inputs not consumed yet.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    fn next_step(&mut self) -> io::Result<ScriptStep> {
        self.script
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted"))
    }
}

impl Console for ScriptedConsole {
    fn read_key(&mut self) -> io::Result<char> {
        match self.next_step()? {
            ScriptStep::Key(c) => {
                if !c.is_control() {
                    self.output.push(c);
                }
                Ok(c)
            }
            ScriptStep::Line(line) => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("expected a key, script has line {:?}", line),
            )),
        }
    }

    fn read_line(&mut self) -> io::Result<String> {
        match self.next_step()? {
            ScriptStep::Line(line) => {
                self.output.push_str(&line);
                self.output.push('\n');
                Ok(line)
            }
            ScriptStep::Key(c) => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("expected a line, script has key {:?}", c),
            )),
        }
    }

    fn write(&mut self, text: &str) -> io::Result<()> {
        self.output.push_str(text);
        Ok(())
    }

    fn clear(&mut self) -> io::Result<()> {
        self.clears += 1;
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
