//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use ts3query_core::TracingOutputFormat;

/// ts3bot - a plugin-driven TeamSpeak 3 ServerQuery bot
#[derive(Debug, Parser)]
#[command(name = "ts3bot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "TS3BOT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Log output format (pretty, compact, json)
    #[arg(long, env = "TS3BOT_LOG_FORMAT")]
    pub log_format: Option<TracingOutputFormat>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Connect and run the configured plugins (default)
    Run,

    /// Send one raw command and print the response as JSON
    ///
    /// Example: ts3bot query clientlist -uid -away
    Query {
        /// Command verb, e.g. clientlist
        verb: String,

        /// Flags (-uid) and arguments (key=value)
        #[arg(allow_hyphen_values = true, trailing_var_arg = true)]
        args: Vec<String>,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn query_keeps_flags_as_args() {
        let cli = Cli::try_parse_from(["ts3bot", "query", "clientlist", "-uid", "-away"]).unwrap();
        match cli.command {
            Some(Command::Query { verb, args }) => {
                assert_eq!(verb, "clientlist");
                assert_eq!(args, ["-uid", "-away"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn run_is_optional() {
        let cli = Cli::try_parse_from(["ts3bot", "--log-format", "json"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log_format, Some(TracingOutputFormat::Json));
    }
}
