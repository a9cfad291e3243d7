//! Error types for statement execution.

use std::time::Duration;

use thiserror::Error;

/// Boxed lower-level cause carried by transport and cache errors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while executing a statement or reading its result.
#[derive(Error, Debug)]
pub enum XmlaError {
    /// Malformed identifier, tuple or list text.
    #[error("identifier parse error: {0}")]
    Parse(#[from] xmla_ident::IdentError),

    /// The server answered with a SOAP or XMLA fault.
    #[error("server fault{}: {message}", code.as_deref().map(|c| format!(" [{}]", c)).unwrap_or_default())]
    ProtocolFault {
        /// Fault code, when the server supplied one.
        code: Option<String>,
        /// Fault text supplied by the server.
        message: String,
        /// Additional detail text, when present.
        detail: Option<String>,
    },

    /// No response within the configured bound.
    #[error("query timeout after {0:?}")]
    Timeout(Duration),

    /// Execution was cancelled, before or during submission.
    #[error("statement cancelled")]
    Cancelled,

    /// The transport failed for a reason other than timeout or cancellation.
    #[error("transport failure: {message}")]
    Transport {
        /// What the transport was doing.
        message: String,
        /// Underlying cause, when available.
        #[source]
        source: Option<BoxError>,
    },

    /// Ordinal or coordinate vector outside the cell set bounds.
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),

    /// A capability this driver intentionally does not implement.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// The response could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The request could not be encoded.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// An argument was out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The statement or cell set was already closed.
    #[error("{0} is closed")]
    Closed(&'static str),

    /// The response cache backend failed while record or play was enabled.
    #[error("response cache failure: {0}")]
    Cache(#[source] BoxError),
}

impl XmlaError {
    /// Creates a transport error without an underlying cause.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a transport error wrapping an underlying cause.
    pub fn transport_with(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Transport {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates a protocol fault.
    pub fn fault(code: Option<String>, message: impl Into<String>) -> Self {
        Self::ProtocolFault {
            code,
            message: message.into(),
            detail: None,
        }
    }

    /// Returns true for [`XmlaError::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns true for [`XmlaError::Timeout`].
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// Result type for executor operations.
pub type XmlaResult<T> = std::result::Result<T, XmlaError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display_fault_with_code() {
        let err = XmlaError::fault(Some("SOAP-ENV:Server".to_string()), "MDX object not found");
        assert_eq!(
            err.to_string(),
            "server fault [SOAP-ENV:Server]: MDX object not found"
        );
    }

    #[test]
    fn test_error_display_fault_without_code() {
        let err = XmlaError::fault(None, "boom");
        assert_eq!(err.to_string(), "server fault: boom");
    }

    #[test]
    fn test_error_display_timeout() {
        let err = XmlaError::Timeout(Duration::from_secs(30));
        assert_eq!(err.to_string(), "query timeout after 30s");
        assert!(err.is_timeout());
    }

    #[test]
    fn test_error_display_cancelled() {
        assert_eq!(XmlaError::Cancelled.to_string(), "statement cancelled");
        assert!(XmlaError::Cancelled.is_cancelled());
    }

    #[test]
    fn test_transport_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        let err = XmlaError::transport_with("exchange failed", io);
        assert_eq!(err.to_string(), "transport failure: exchange failed");
        let source = err.source().expect("source should be kept");
        assert_eq!(source.to_string(), "reset by peer");
    }

    #[test]
    fn test_error_display_closed() {
        assert_eq!(XmlaError::Closed("statement").to_string(), "statement is closed");
    }

    #[test]
    fn test_error_from_ident_error() {
        let err: XmlaError = xmla_ident::IdentError::EmptyIdentifier.into();
        assert!(matches!(err, XmlaError::Parse(_)));
    }
}
