//! Bundled plugins and the `[plugins.*]` configuration tables.
//!
//! A plugin runs when its table is present:
//!
//! ```toml
//! [plugins.afk_mover]
//! afk_channel_id = 12
//!
//! [plugins.welcomer]
//! messages = ["Hi!", "Welcome back!"]
//! ```

pub mod afk_mover;
pub mod command_handler;
pub mod doodler;
pub mod welcomer;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::plugin::{Plugin, PluginResult, QueryStream};

pub use afk_mover::{AfkMover, AfkMoverConfig};
pub use command_handler::{ChatCommand, CommandHandler, CommandHandlerConfig, Help};
pub use doodler::{Doodler, DoodlerConfig};
pub use welcomer::{Welcomer, WelcomerConfig};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub afk_mover: Option<AfkMoverConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub welcomer: Option<WelcomerConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_handler: Option<CommandHandlerConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub doodler: Option<DoodlerConfig>,

    /// Tables for plugins this build does not ship. Kept so dumps
    /// round-trip.
    #[serde(flatten)]
    pub unknown: BTreeMap<String, toml::Value>,
}

impl PluginsConfig {
    /// Names of the configured plugins this build can run.
    pub fn enabled(&self) -> Vec<&'static str> {
        [
            self.afk_mover.as_ref().map(|_| afk_mover::NAME),
            self.welcomer.as_ref().map(|_| welcomer::NAME),
            self.command_handler.as_ref().map(|_| command_handler::NAME),
            self.doodler.as_ref().map(|_| doodler::NAME),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    pub fn validate(&self) -> PluginResult<()> {
        if let Some(config) = &self.afk_mover {
            config.validate()?;
        }
        if let Some(config) = &self.welcomer {
            config.validate()?;
        }
        if let Some(config) = &self.command_handler {
            config.validate()?;
        }
        if let Some(config) = &self.doodler {
            config.validate()?;
        }
        Ok(())
    }

    /// Instantiates every configured plugin.
    pub fn build<S: QueryStream>(&self) -> PluginResult<Vec<Box<dyn Plugin<S>>>> {
        for name in self.unknown.keys() {
            warn!(plugin = %name, "plugin not found, skipping");
        }
        self.validate()?;

        let mut plugins: Vec<Box<dyn Plugin<S>>> = Vec::new();
        if let Some(config) = &self.afk_mover {
            plugins.push(Box::new(AfkMover::new(config.clone())));
        }
        if let Some(config) = &self.welcomer {
            plugins.push(Box::new(Welcomer::new(config.clone())));
        }
        if let Some(config) = &self.command_handler {
            plugins.push(Box::new(CommandHandler::<S>::from_config(config)));
        }
        if let Some(config) = &self.doodler {
            plugins.push(Box::new(Doodler::new(config)?));
        }
        Ok(plugins)
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::DuplexStream;

    use super::*;

    #[test]
    fn tables_enable_plugins() {
        let config: PluginsConfig = toml::from_str(
            r#"
            [welcomer]
            [afk_mover]
            afk_channel_id = 4
            [casino]
            start_balance = 100
            "#,
        )
        .unwrap();

        assert_eq!(config.enabled(), ["afk_mover", "welcomer"]);
        assert!(config.unknown.contains_key("casino"));

        let plugins = config.build::<DuplexStream>().unwrap();
        let names: Vec<_> = plugins.iter().map(|p| p.name()).collect();
        assert_eq!(names, ["afk_mover", "welcomer"]);
    }

    #[test]
    fn invalid_plugin_config_fails_build() {
        let config: PluginsConfig = toml::from_str(
            r#"
            [welcomer]
            messages = []
            "#,
        )
        .unwrap();
        assert!(config.build::<DuplexStream>().is_err());
    }
}
