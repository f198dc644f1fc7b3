//! Typed error enum for the strand runtime
//!
//! Replaces generic `Result<T, String>` with specific error types so
//! callers (the REPL, watch windows) can decide per-variant whether a
//! failure is fatal, recoverable, or merely "value unavailable".

use std::error::Error as StdError;
use std::fmt;

/// Typed errors surfaced by the reader, the executive, and the mirror.
///
/// Resolution and unpack errors propagate to the immediate caller; the
/// interactive surface decides how to present them. Rendering truncation
/// (`"..."`, mid-array elision) is bounded-output behavior, not an error,
/// and never appears here.
#[derive(Debug, Clone, PartialEq)]
pub enum StrandError {
    // Name resolution
    NameNotFound {
        name: String,
    },
    UninitializedVariable {
        name: String,
    },

    // Deliberate gaps the mirror never works around silently
    Unsupported {
        what: String,
    },

    // Reader errors
    SyntaxError {
        message: String,
        line: Option<usize>,
    },

    // Evaluation errors
    TypeMismatch {
        expected: String,
        got: String,
    },
    DivisionByZero,

    // Heap integrity: a handle that does not address what it claims to
    InvalidHandle {
        handle: u32,
    },

    // Generic fallback
    Generic {
        message: String,
    },
}

impl StrandError {
    /// Create a name-not-found error
    pub fn name_not_found(name: impl Into<String>) -> Self {
        StrandError::NameNotFound { name: name.into() }
    }

    /// Create an uninitialized-variable error
    pub fn uninitialized(name: impl Into<String>) -> Self {
        StrandError::UninitializedVariable { name: name.into() }
    }

    /// Create an unsupported-feature error
    pub fn unsupported(what: impl Into<String>) -> Self {
        StrandError::Unsupported { what: what.into() }
    }

    /// Create a syntax error
    pub fn syntax_error(message: impl Into<String>, line: Option<usize>) -> Self {
        StrandError::SyntaxError {
            message: message.into(),
            line,
        }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(expected: impl Into<String>, got: impl Into<String>) -> Self {
        StrandError::TypeMismatch {
            expected: expected.into(),
            got: got.into(),
        }
    }

    /// Create an invalid-handle error
    pub fn invalid_handle(handle: u32) -> Self {
        StrandError::InvalidHandle { handle }
    }

    /// Get a human-readable description of the error
    pub fn description(&self) -> String {
        match self {
            StrandError::NameNotFound { name } => {
                format!("Name error: '{}' is not defined in any reachable scope", name)
            }
            StrandError::UninitializedVariable { name } => {
                format!("Value error: variable '{}' is declared but never assigned", name)
            }
            StrandError::Unsupported { what } => {
                format!("Unsupported: {}", what)
            }
            StrandError::SyntaxError { message, line } => match line {
                Some(l) => format!("Syntax error at line {}: {}", l, message),
                None => format!("Syntax error: {}", message),
            },
            StrandError::TypeMismatch { expected, got } => {
                format!("Type error: expected {}, got {}", expected, got)
            }
            StrandError::DivisionByZero => "Arithmetic error: division by zero".to_string(),
            StrandError::InvalidHandle { handle } => {
                format!("Heap error: invalid handle {}", handle)
            }
            StrandError::Generic { message } => format!("Error: {}", message),
        }
    }

    /// The offending symbol name, for name-carrying variants.
    pub fn symbol_name(&self) -> Option<&str> {
        match self {
            StrandError::NameNotFound { name } => Some(name),
            StrandError::UninitializedVariable { name } => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for StrandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl StdError for StrandError {}

/// Conversion from StrandError to String for compatibility
impl From<StrandError> for String {
    fn from(err: StrandError) -> String {
        err.description()
    }
}

/// Conversion from String to StrandError for fallback
impl From<String> for StrandError {
    fn from(msg: String) -> Self {
        StrandError::Generic { message: msg }
    }
}

impl From<&str> for StrandError {
    fn from(msg: &str) -> Self {
        StrandError::Generic {
            message: msg.to_string(),
        }
    }
}
