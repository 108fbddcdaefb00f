//! Plugin-driven ServerQuery bot.
//!
//! The bot connects with a [`ts3query_client::Ts3Client`], registers for
//! every notification group, keeps the session alive with the client's
//! poller and runs each configured [`Plugin`] as its own task until a
//! shutdown signal arrives.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod manager;
pub mod plugin;
pub mod plugins;
pub mod signals;

#[cfg(test)]
mod testing;

pub use cli::Cli;
pub use config::{BotConfig, BotSettings};
pub use error::{BotError, BotResult};
pub use manager::{PluginExit, PluginManager};
pub use plugin::{Plugin, PluginContext, PluginResult, QueryStream};
pub use signals::{ShutdownHandle, SignalHandler};
