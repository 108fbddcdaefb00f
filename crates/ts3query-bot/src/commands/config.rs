//! Configuration commands.

use std::path::Path;

use crate::config::BotConfig;
use crate::error::{BotError, BotResult};

/// Dump the effective configuration to stdout, passwords masked.
pub fn dump(config: &BotConfig, path: &Path) -> BotResult<()> {
    let toml_str = toml::to_string_pretty(&config.redacted())
        .map_err(|e| BotError::config(format!("failed to serialize config: {}", e)))?;
    println!("# config.toml ({})", path.display());
    println!("{}", toml_str);
    Ok(())
}

/// Validate the configuration, including plugin tables and secrets.
pub fn validate(config: &BotConfig) -> BotResult<()> {
    config.validate()?;
    if config.connection.credentials()?.is_some() {
        println!("Credentials resolve.");
    }

    let enabled = config.plugins.enabled();
    if enabled.is_empty() {
        println!("No plugins enabled.");
    } else {
        println!("Plugins: {}", enabled.join(", "));
    }
    for name in config.plugins.unknown.keys() {
        println!("Unknown plugin table ignored: {}", name);
    }

    println!("Configuration is valid.");
    Ok(())
}

/// Show the configuration file path.
pub fn path(path: &Path) -> BotResult<()> {
    println!("config: {}", path.display());
    Ok(())
}
