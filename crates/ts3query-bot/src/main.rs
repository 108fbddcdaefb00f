//! ts3bot CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing::Level;

use ts3query_bot::cli::{Cli, Command, ConfigAction};
use ts3query_bot::commands;
use ts3query_bot::config::BotConfig;
use ts3query_bot::error::BotResult;
use ts3query_core::{TracingConfig, TracingOutputFormat, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut tracing_config = if cli.debug {
        TracingConfig::cli_debug()
    } else if matches!(cli.command, None | Some(Command::Run)) {
        TracingConfig::bot().with_format(TracingOutputFormat::Compact)
    } else {
        TracingConfig::default()
            .with_level(Level::WARN)
            .with_format(TracingOutputFormat::Compact)
    };
    if let Some(format) = cli.log_format {
        tracing_config = tracing_config.with_format(format);
    }
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> BotResult<()> {
    let path = cli.config.clone().unwrap_or_else(BotConfig::default_path);
    let config = if cli.config.is_some() {
        BotConfig::load_from(&path)?
    } else {
        BotConfig::load()?
    };

    match cli.command {
        None | Some(Command::Run) => commands::run::run(&config).await,
        Some(Command::Query { verb, args }) => commands::query::query(&config, &verb, &args).await,
        Some(Command::Config { action }) => match action {
            ConfigAction::Dump => commands::config::dump(&config, &path),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(&path),
        },
    }
}
