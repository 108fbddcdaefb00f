//! Connection configuration.
//!
//! Lives in a `[connection]` table:
//!
//! ```toml
//! [connection]
//! host = "ts.example.org"
//! port = 10011
//! login = "serveradmin"
//! password = "env::TS3_QUERY_PASSWORD"
//! server_port = 9987
//! nickname = "Bot"
//! ```
//!
//! `password` supports secret references, see [`crate::secret`].

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use ts3query_protocol::DEFAULT_QUERY_PORT;

use crate::connection::Credentials;
use crate::error::{ClientError, ClientResult};
use crate::options::{ConnectionOptions, DEFAULT_BUFFER_LIMIT};
use crate::secret;

/// Default voice port used to pick a virtual server.
pub const DEFAULT_SERVER_PORT: u16 = 9987;

/// How to reach and set up a ServerQuery session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub host: String,

    /// ServerQuery TCP port.
    pub port: u16,

    /// Query account name. No login happens without it.
    pub login: Option<String>,

    /// Query account password or secret reference.
    pub password: Option<String>,

    /// Response timeout in seconds.
    pub timeout: u64,

    pub flood_protection: bool,

    /// Flood protection pause in milliseconds.
    pub flood_interval_ms: u64,

    pub events_limit: usize,
    pub messages_limit: usize,

    /// Virtual server id. Takes precedence over `server_port`.
    pub server_id: Option<i64>,

    /// Voice port of the virtual server to select.
    pub server_port: u16,

    /// Nickname to set after selecting the server.
    pub nickname: Option<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_QUERY_PORT,
            login: None,
            password: None,
            timeout: 10,
            flood_protection: true,
            flood_interval_ms: 500,
            events_limit: DEFAULT_BUFFER_LIMIT,
            messages_limit: DEFAULT_BUFFER_LIMIT,
            server_id: None,
            server_port: DEFAULT_SERVER_PORT,
            nickname: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    connection: ConnectionConfig,
}

impl ConnectionConfig {
    /// Creates a configuration for the given host with defaults elsewhere.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Default::default()
        }
    }

    /// Builder: set credentials.
    pub fn with_credentials(mut self, login: impl Into<String>, password: impl Into<String>) -> Self {
        self.login = Some(login.into());
        self.password = Some(password.into());
        self
    }

    /// Builder: set the query port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Builder: set the nickname.
    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    /// Reads the `[connection]` table of a TOML file.
    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ClientError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    /// Parses the `[connection]` table out of TOML text.
    pub fn from_toml(content: &str) -> ClientResult<Self> {
        let file: ConfigFile = toml::from_str(content)
            .map_err(|e| ClientError::Config(format!("failed to parse config: {}", e)))?;
        Ok(file.connection)
    }

    /// Checks values that would only fail later at connect time.
    pub fn validate(&self) -> ClientResult<()> {
        if self.host.trim().is_empty() {
            return Err(ClientError::Config("connection.host is empty".into()));
        }
        if self.port == 0 {
            return Err(ClientError::Config("connection.port must not be 0".into()));
        }
        if self.timeout == 0 {
            return Err(ClientError::Config("connection.timeout must be at least 1s".into()));
        }
        if self.login.is_some() != self.password.is_some() {
            return Err(ClientError::Config(
                "connection.login and connection.password must be set together".into(),
            ));
        }
        Ok(())
    }

    /// Runtime options derived from this configuration.
    pub fn options(&self) -> ConnectionOptions {
        ConnectionOptions::default()
            .with_timeout(Duration::from_secs(self.timeout))
            .with_flood_protection(self.flood_protection)
            .with_flood_interval(Duration::from_millis(self.flood_interval_ms))
            .with_events_limit(self.events_limit)
            .with_messages_limit(self.messages_limit)
    }

    /// Credentials with the password reference resolved.
    pub fn credentials(&self) -> ClientResult<Option<Credentials>> {
        match (&self.login, &self.password) {
            (Some(login), Some(password)) => {
                Ok(Some(Credentials::new(login.clone(), secret::resolve(password)?)))
            }
            _ => Ok(None),
        }
    }
}
