//! Error types for the transport layer.

use thiserror::Error;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors reading or writing a request or response.
///
/// Any of these ends the connection it happened on.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed request line '{line}'")]
    MalformedRequestLine { line: String },

    #[error("line exceeds {limit} bytes")]
    LineTooLong { limit: usize },

    #[error("more than {limit} header lines")]
    TooManyHeaders { limit: usize },

    #[error("message is not valid UTF-8")]
    InvalidUtf8,

    #[error("invalid Authorization header")]
    InvalidAuthorization,

    #[error("malformed response: {reason}")]
    MalformedResponse { reason: &'static str },

    #[error("response body of {length} bytes exceeds limit {limit}")]
    BodyTooLarge { length: u64, limit: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_line_too_long() {
        let err = TransportError::LineTooLong { limit: 8192 };
        assert_eq!(err.to_string(), "line exceeds 8192 bytes");
    }

    #[test]
    fn error_display_body_too_large() {
        let err = TransportError::BodyTooLarge {
            length: 10,
            limit: 4,
        };
        assert!(err.to_string().contains("10 bytes"));
    }

    #[test]
    fn io_error_converts() {
        let err: TransportError = std::io::Error::from(std::io::ErrorKind::BrokenPipe).into();
        assert!(matches!(err, TransportError::Io(_)));
    }
}
