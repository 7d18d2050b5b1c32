//! Shared types for termshell.
//!
//! Configuration values carried by every menu and form, plus the
//! column description used by the table renderer.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::console::Console;
use crate::error::ShellResult;

// ============================================================================
// SWITCHES
// ============================================================================

/// Default key that leaves the current menu level.
pub const DEFAULT_GO_UP_SWITCH: char = 'C';

/// Default key that runs the debug hook.
pub const DEFAULT_DEBUG_SWITCH: char = 'D';

/// Default row divider character for tables.
pub const DEFAULT_DIVIDER: char = '-';

/// The two reserved menu keys.
///
/// Only built through [`Switches::new`], so both keys are always
/// uppercase, printable, not whitespace, not a digit or sign, and
/// distinct from each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Switches {
    go_up: char,
    debug: char,
}

impl Switches {
    /// Validate both keys and normalize them to uppercase.
    pub fn new(go_up: char, debug: char) -> Result<Self, ConfigError> {
        let go_up = validate_switch("go-up switch", go_up)?;
        let debug = validate_switch("debug switch", debug)?;

        if go_up == debug {
            return Err(ConfigError::SwitchCollision(go_up));
        }

        Ok(Self { go_up, debug })
    }

    /// Leaves the current menu; also the form's cancel token.
    pub fn go_up(&self) -> char {
        self.go_up
    }

    /// Runs the debug hook.
    pub fn debug(&self) -> char {
        self.debug
    }
}

impl Default for Switches {
    fn default() -> Self {
        Self {
            go_up: DEFAULT_GO_UP_SWITCH,
            debug: DEFAULT_DEBUG_SWITCH,
        }
    }
}

fn validate_switch(name: &'static str, value: char) -> Result<char, ConfigError> {
    let reason = if value.is_control() {
        Some("not a printable character")
    } else if value.is_whitespace() {
        Some("whitespace cannot be a switch")
    } else if value.is_ascii_digit() {
        Some("digits are reserved for item selection")
    } else if value == '+' || value == '-' {
        Some("signs are read as part of a field number")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(ConfigError::InvalidChar { name, value, reason }),
        None => Ok(to_upper(value)),
    }
}

/// Uppercase a single character, keeping it unchanged when its uppercase
/// form is more than one character.
pub(crate) fn to_upper(c: char) -> char {
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None) => u,
        _ => c,
    }
}

// ============================================================================
// MODES
// ============================================================================

/// How menus turn raw input into a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// One keypress per selection; items 1–9 reachable.
    #[default]
    Key,
    /// A full line per selection; any item index reachable.
    Line,
}

/// What the form does when the user cancels the correction prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CancelBehavior {
    /// Return immediately with the current values.
    #[default]
    Finish,
    /// Start collecting every field again from the first one.
    Restart,
}

// ============================================================================
// SHELL CONFIGURATION
// ============================================================================

/// Diagnostic hook reachable from any menu through the debug switch.
pub type DebugHook = Rc<dyn Fn(&mut dyn Console) -> ShellResult<()>>;

/// Resolved configuration handed to every menu and form.
///
/// Cheap to clone; nested menus take a clone of their parent's config.
#[derive(Clone)]
pub struct ShellConfig {
    pub switches: Switches,
    pub selection: SelectionMode,
    /// Clear the screen before each full redraw.
    pub new_screen: bool,
    pub on_cancel: CancelBehavior,
    pub divider: char,
    pub debug_hook: Option<DebugHook>,
}

impl ShellConfig {
    /// Install the debug hook.
    pub fn with_debug_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut dyn Console) -> ShellResult<()> + 'static,
    {
        self.debug_hook = Some(Rc::new(hook));
        self
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            switches: Switches::default(),
            selection: SelectionMode::default(),
            new_screen: true,
            on_cancel: CancelBehavior::default(),
            divider: DEFAULT_DIVIDER,
            debug_hook: None,
        }
    }
}

impl fmt::Debug for ShellConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShellConfig")
            .field("switches", &self.switches)
            .field("selection", &self.selection)
            .field("new_screen", &self.new_screen)
            .field("on_cancel", &self.on_cancel)
            .field("divider", &self.divider)
            .field("debug_hook", &self.debug_hook.as_ref().map(|_| "<hook>"))
            .finish()
    }
}

// ============================================================================
// TABLE COLUMNS
// ============================================================================

/// How a cell's text sits inside its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Right,
    Center,
}

/// One cell of a table row: text plus width and alignment.
///
/// Sign convention: `width >= 0` left-aligns, `width < 0` right-aligns,
/// the field is `|width|` characters wide. `center_pad` overrides the sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub text: String,
    pub width: i32,
    pub center_pad: bool,
}

impl ColumnSpec {
    pub fn new(text: impl Into<String>, width: i32, center_pad: bool) -> Self {
        Self {
            text: text.into(),
            width,
            center_pad,
        }
    }

    /// Left-aligned column of the given width.
    pub fn left(text: impl Into<String>, width: u16) -> Self {
        Self::new(text, i32::from(width), false)
    }

    /// Right-aligned column of the given width.
    pub fn right(text: impl Into<String>, width: u16) -> Self {
        Self::new(text, -i32::from(width), false)
    }

    /// Centered column of the given width.
    pub fn centered(text: impl Into<String>, width: u16) -> Self {
        Self::new(text, i32::from(width), true)
    }

    pub fn alignment(&self) -> Alignment {
        if self.center_pad {
            Alignment::Center
        } else if self.width >= 0 {
            Alignment::Left
        } else {
            Alignment::Right
        }
    }

    /// Nominal field width in characters.
    pub fn field_width(&self) -> usize {
        self.width.unsigned_abs() as usize
    }
}

impl<S: Into<String>> From<(S, i32, bool)> for ColumnSpec {
    fn from((text, width, center_pad): (S, i32, bool)) -> Self {
        Self::new(text, width, center_pad)
    }
}
