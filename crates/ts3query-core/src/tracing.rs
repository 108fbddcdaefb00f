//! Tracing setup for the ts3query crates and the bot binary.
//!
//! ```ignore
//! use ts3query_core::tracing::{init_tracing, TracingConfig};
//!
//! init_tracing(TracingConfig::bot()).expect("failed to initialize tracing");
//! ```

use thiserror::Error;
use tracing::{Level, Subscriber};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    prelude::*,
    registry::LookupSpan,
};

/// Target prefixes covered by the default filter directive.
const LOG_TARGETS: [&str; 2] = ["ts3query", "ts3bot"];

#[derive(Debug, Error)]
pub enum TracingError {
    #[error("failed to set global tracing subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingOutputFormat {
    #[default]
    Pretty,
    Compact,
    /// JSON lines
    Json,
}

impl std::str::FromStr for TracingOutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Level for the ts3query targets when `RUST_LOG` is not set.
    pub default_level: Level,
    pub output_format: TracingOutputFormat,
    /// File and line of each event.
    pub include_location: bool,
    pub include_timestamp: bool,
    /// Logs span creation and close, which shows plugin task lifetimes.
    pub include_span_events: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_level: Level::INFO,
            output_format: TracingOutputFormat::Pretty,
            include_location: false,
            include_timestamp: true,
            include_span_events: false,
        }
    }
}

impl TracingConfig {
    /// `ts3bot -v`: debug level, no timestamps.
    #[must_use]
    pub fn cli_debug() -> Self {
        Self {
            default_level: Level::DEBUG,
            output_format: TracingOutputFormat::Compact,
            include_location: true,
            include_timestamp: false,
            ..Self::default()
        }
    }

    /// Config for an unattended bot process.
    #[must_use]
    pub fn bot() -> Self {
        Self {
            output_format: TracingOutputFormat::Json,
            include_location: true,
            include_span_events: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: TracingOutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// The directive used when `RUST_LOG` is not set.
    pub fn default_directive(&self) -> String {
        LOG_TARGETS
            .iter()
            .map(|target| format!("{target}={}", self.default_level))
            .collect::<Vec<_>>()
            .join(",")
    }

    fn fmt_layer<S>(&self) -> Box<dyn Layer<S> + Send + Sync>
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        let span_events = if self.include_span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };
        let layer = fmt::layer::<S>()
            .with_file(self.include_location)
            .with_line_number(self.include_location)
            .with_span_events(span_events);

        match (self.output_format, self.include_timestamp) {
            (TracingOutputFormat::Pretty, _) => layer.pretty().boxed(),
            (TracingOutputFormat::Compact, true) => layer.compact().boxed(),
            (TracingOutputFormat::Compact, false) => layer.compact().without_time().boxed(),
            (TracingOutputFormat::Json, _) => layer.json().boxed(),
        }
    }
}

/// Installs the global subscriber. `RUST_LOG` overrides the default level.
///
/// # Errors
///
/// Returns an error if a global subscriber is already set.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_directive()));

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(config.fmt_layer());
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
