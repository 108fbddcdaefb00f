//! Client error types.

use std::fmt;
use std::time::Duration;

use ts3query_protocol::{ProtocolError, Response};

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug)]
pub enum ClientError {
    /// No stream is attached.
    NotConnected,
    /// `connect` was called on a live connection.
    AlreadyConnected,
    /// Resolving, connecting or reading the greeting failed.
    Connection(String),
    /// Transport or framing error.
    Protocol(ProtocolError),
    /// Operation timed out.
    Timeout(String),
    /// The server rejected a command.
    Server {
        id: u32,
        message: String,
        extra: Option<String>,
    },
    /// The background poller did not stop within the join timeout.
    PollerStalled(Duration),
    /// Configuration error.
    Config(String),
    /// IO error.
    Io(std::io::Error),
}

impl ClientError {
    /// Converts a rejected response into [`ClientError::Server`].
    pub fn from_response(response: &Response) -> Self {
        Self::Server {
            id: response.error_id,
            message: response.error_message.clone(),
            extra: response.extra_message.clone(),
        }
    }

    /// Returns true when the stream itself is gone.
    pub fn is_stream_failure(&self) -> bool {
        matches!(
            self,
            Self::Protocol(ProtocolError::ConnectionClosed { .. } | ProtocolError::Io(_))
        )
    }

    /// Server error id, if this is a server rejection.
    pub fn server_error_id(&self) -> Option<u32> {
        match self {
            Self::Server { id, .. } => Some(*id),
            _ => None,
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "not connected"),
            Self::AlreadyConnected => write!(f, "already connected"),
            Self::Connection(msg) => write!(f, "connection error: {}", msg),
            Self::Protocol(err) => write!(f, "protocol error: {}", err),
            Self::Timeout(msg) => write!(f, "timeout: {}", msg),
            Self::Server {
                id,
                message,
                extra: Some(extra),
            } => write!(f, "server error {}: {} ({})", id, message, extra),
            Self::Server { id, message, .. } => write!(f, "server error {}: {}", id, message),
            Self::PollerStalled(timeout) => {
                write!(f, "poller did not stop within {}ms", timeout.as_millis())
            }
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Protocol(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ProtocolError> for ClientError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::Timeout { operation } => Self::Timeout(operation),
            other => Self::Protocol(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_timeout_becomes_client_timeout() {
        let err = ClientError::from(ProtocolError::timeout("read response"));
        assert!(matches!(err, ClientError::Timeout(ref op) if op == "read response"));
    }

    #[test]
    fn server_error_display() {
        let response = Response::parse("error id=520 msg=invalid\\sloginname\\sor\\spassword\n\r").unwrap();
        let err = ClientError::from_response(&response);
        assert_eq!(err.server_error_id(), Some(520));
        assert_eq!(err.to_string(), "server error 520: invalid loginname or password");
    }
}
