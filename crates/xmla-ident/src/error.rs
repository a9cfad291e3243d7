//! Error types for identifier parsing.

use thiserror::Error;

/// Errors that can occur while parsing identifier, tuple or list text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentError {
    /// Malformed input at a specific character position.
    #[error("parse error at position {position} in \"{input}\": {message}")]
    ParseError {
        /// Character offset in the input where the error was detected.
        position: usize,
        /// Description of the error.
        message: String,
        /// The complete original input.
        input: String,
    },

    /// Empty input where an identifier was required.
    #[error("empty identifier")]
    EmptyIdentifier,
}

impl IdentError {
    /// Returns the offending character position, if the error has one.
    pub fn position(&self) -> Option<usize> {
        match self {
            IdentError::ParseError { position, .. } => Some(*position),
            IdentError::EmptyIdentifier => None,
        }
    }
}

/// Result type for identifier parsing.
pub type IdentResult<T> = std::result::Result<T, IdentError>;
