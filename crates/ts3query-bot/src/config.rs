//! Bot configuration.
//!
//! Everything lives in one `config.toml`, by default at
//! `~/.config/ts3bot/config.toml`:
//!
//! ```toml
//! [connection]
//! host = "ts.example.org"
//! login = "serveradmin"
//! password = "pass::ts3/serveradmin"
//!
//! [bot]
//! name = "TS3Bot"
//! polling_rate_ms = 1000
//!
//! [plugins.afk_mover]
//! afk_channel_id = 12
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use ts3query_client::ConnectionConfig;
use ts3query_client::secret;

use crate::error::{BotError, BotResult};
use crate::plugins::PluginsConfig;

/// `[bot]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotSettings {
    /// Nickname, unless `connection.nickname` is set.
    pub name: String,

    /// Milliseconds between keep-alive polls.
    pub polling_rate_ms: u64,

    /// Seconds each plugin gets to finish after shutdown.
    pub plugin_join_timeout: u64,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            name: "TS3Bot".to_string(),
            polling_rate_ms: 1000,
            plugin_join_timeout: 10,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub connection: ConnectionConfig,
    pub bot: BotSettings,
    pub plugins: PluginsConfig,
}

impl BotConfig {
    /// Loads configuration from the default path, or defaults if it does
    /// not exist.
    pub fn load() -> BotResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> BotResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BotError::config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> BotResult<Self> {
        toml::from_str(content).map_err(|e| BotError::config(format!("failed to parse config: {}", e)))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ts3bot")
    }

    pub fn validate(&self) -> BotResult<()> {
        self.connection.validate()?;
        if self.bot.polling_rate_ms == 0 {
            return Err(BotError::config("bot.polling_rate_ms must be at least 1"));
        }
        if self.bot.name.trim().is_empty() && self.connection.nickname.is_none() {
            return Err(BotError::config("bot.name is empty"));
        }
        self.plugins.validate()
    }

    /// The connection settings with the bot name as fallback nickname.
    pub fn connection(&self) -> ConnectionConfig {
        let mut connection = self.connection.clone();
        if connection.nickname.is_none() {
            connection.nickname = Some(self.bot.name.clone());
        }
        connection
    }

    pub fn polling_rate(&self) -> Duration {
        Duration::from_millis(self.bot.polling_rate_ms)
    }

    pub fn plugin_join_timeout(&self) -> Duration {
        Duration::from_secs(self.bot.plugin_join_timeout)
    }

    /// Copy safe to print: plain-text passwords are masked, secret
    /// references are kept.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if let Some(password) = &config.connection.password {
            if !secret::is_reference(password) {
                config.connection.password = Some("********".to_string());
            }
        }
        config
    }
}
