//! Protocol error types.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while moving frames over a stream.
///
/// Decoding itself never fails; these cover the transport only.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// IO error during read/write.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the stream before a complete frame arrived.
    #[error("connection closed with {buffered} unterminated bytes buffered")]
    ConnectionClosed { buffered: usize },

    /// Bytes accumulated without a terminator beyond the allowed size.
    #[error("frame too large: {size} bytes without terminator (max: {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// Operation timed out.
    #[error("timeout during {operation}")]
    Timeout { operation: String },
}

impl ProtocolError {
    /// Creates a timeout error for the named operation.
    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    /// Returns true for timeouts.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
