//! Error types for the response cache crate.

use std::path::PathBuf;

use xmla_executor::XmlaError;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors that can occur while configuring or using a cache backend.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// A cache property was missing or malformed.
    #[error("invalid cache configuration: {0}")]
    InvalidConfig(String),

    /// The backend cannot do what was asked (e.g. record without an output file).
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// `get`/`put` with a session id this cache never issued.
    #[error("unknown cache session '{0}'")]
    UnknownSession(String),

    /// I/O error against a file backend.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// File being read or written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A record in a cache file could not be decoded.
    #[error("malformed record at {path}:{line}: {message}")]
    Format {
        /// File holding the record.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// What was wrong with it.
        message: String,
    },

    /// SQLite error from the table backend.
    #[cfg(feature = "table")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl CacheError {
    /// Creates an I/O error with path context.
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a format error for one line of a cache file.
    pub fn format_error(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::Format {
            path: path.into(),
            line,
            message: message.into(),
        }
    }
}

impl From<CacheError> for XmlaError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Unsupported(message) => XmlaError::UnsupportedOperation(message),
            other => XmlaError::Cache(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_unsupported_maps_to_unsupported_operation() {
        let err: XmlaError = CacheError::Unsupported("read-only".into()).into();
        assert!(matches!(err, XmlaError::UnsupportedOperation(m) if m == "read-only"));
    }

    #[test]
    fn test_other_errors_keep_their_source() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: XmlaError = CacheError::io_error("/tmp/cache.txt", io).into();
        assert!(matches!(err, XmlaError::Cache(_)));

        let cache_err = err.source().expect("cache error source");
        assert!(cache_err.to_string().contains("/tmp/cache.txt"));
        assert!(cache_err.source().is_some());
    }

    #[test]
    fn test_format_error_display() {
        let err = CacheError::format_error("replay.txt", 3, "bad base64");
        assert_eq!(err.to_string(), "malformed record at replay.txt:3: bad base64");
    }
}
