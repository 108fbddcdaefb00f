//! Bot error types.

use std::io;
use thiserror::Error;

use ts3query_client::ClientError;

/// Result type for bot operations.
pub type BotResult<T> = Result<T, BotError>;

/// Errors that can occur in the bot.
#[derive(Debug, Error)]
pub enum BotError {
    /// IO error (config file, etc.).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// ServerQuery client error.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A plugin gave up.
    #[error("Plugin '{plugin}': {message}")]
    Plugin { plugin: String, message: String },

    /// Malformed command line for `ts3bot query`.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl BotError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a plugin error.
    pub fn plugin(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Plugin {
            plugin: plugin.into(),
            message: message.into(),
        }
    }

    /// Returns true when the ServerQuery session itself is gone.
    pub fn is_connection_lost(&self) -> bool {
        match self {
            Self::Client(err) => err.is_stream_failure() || matches!(err, ClientError::NotConnected),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(
            BotError::plugin("afk_mover", "no channel").to_string(),
            "Plugin 'afk_mover': no channel"
        );
        assert_eq!(
            BotError::config("bad").to_string(),
            "Configuration error: bad"
        );
    }

    #[test]
    fn client_errors_pass_through() {
        let err = BotError::from(ClientError::NotConnected);
        assert_eq!(err.to_string(), ClientError::NotConnected.to_string());
        assert!(err.is_connection_lost());

        let server = BotError::from(ClientError::Server {
            id: 512,
            message: "invalid clientID".into(),
            extra: None,
        });
        assert!(!server.is_connection_lost());
    }
}
