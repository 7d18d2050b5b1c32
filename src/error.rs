//! Error type for the interaction loops.
//!
//! User-input mistakes never show up here: they are recovered by
//! reprompting inside the loops. What remains is console failure and
//! errors raised by caller-supplied code.

use std::fmt;
use std::io;

/// Boxed error returned by actions and debug hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result alias used across menus, forms and hooks.
pub type ShellResult<T> = Result<T, ShellError>;

/// Failure that ends a menu or form loop.
#[derive(Debug)]
pub enum ShellError {
    /// The console could not be read or written.
    ///
    /// End of input is reported as `io::ErrorKind::UnexpectedEof`.
    Io(io::Error),

    /// An action or debug hook returned an error.
    Action(BoxError),
}

impl ShellError {
    /// Wrap an error raised by caller-supplied code.
    pub fn action(err: impl Into<BoxError>) -> Self {
        ShellError::Action(err.into())
    }

    /// True when the console ran out of input.
    pub fn is_end_of_input(&self) -> bool {
        matches!(self, ShellError::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof)
    }
}

impl fmt::Display for ShellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShellError::Io(e) => write!(f, "console error: {e}"),
            ShellError::Action(e) => write!(f, "action failed: {e}"),
        }
    }
}

impl std::error::Error for ShellError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ShellError::Io(e) => Some(e),
            ShellError::Action(e) => Some(e.as_ref()),
        }
    }
}

impl From<io::Error> for ShellError {
    fn from(err: io::Error) -> Self {
        ShellError::Io(err)
    }
}
