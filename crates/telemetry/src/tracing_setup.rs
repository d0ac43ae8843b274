//! Tracing setup for structured logging.
//!
//! Every run logs to stderr so stdout stays free for `generate-schema`.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Directives appended to every filter. The MySQL driver is chatty at info.
const QUIET_DEPENDENCIES: &str = "mysql_async=warn";

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Tracing configuration.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Level or filter directives, e.g. "info" or "worker=debug".
    pub filter: String,
    pub format: LogFormat,
    /// Emit span close events, which carry step durations.
    pub span_events: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::Pretty,
            span_events: false,
        }
    }
}

impl TracingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_span_events(mut self, span_events: bool) -> Self {
        self.span_events = span_events;
        self
    }

    /// The filter string handed to `EnvFilter`.
    pub fn directives(&self) -> String {
        let filter = self.filter.trim();
        if filter.is_empty() {
            format!("info,{}", QUIET_DEPENDENCIES)
        } else if filter.contains("mysql_async") {
            filter.to_string()
        } else {
            format!("{},{}", filter, QUIET_DEPENDENCIES)
        }
    }
}

/// Installs the global subscriber.
///
/// Returns `false` when a subscriber was already installed, which happens
/// when tests initialize logging more than once.
pub fn init_tracing(config: &TracingConfig) -> bool {
    let env_filter =
        EnvFilter::try_new(config.directives()).unwrap_or_else(|_| EnvFilter::new("info"));

    let span_events = if config.span_events {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let installed = match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_span_events(span_events)
                    .with_current_span(true)
                    .with_target(true),
            )
            .try_init()
            .is_ok(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_span_events(span_events)
                    .with_target(false),
            )
            .try_init()
            .is_ok(),
    };

    if installed {
        tracing::debug!(filter = %config.directives(), format = ?config.format, "Logging initialized");
    }
    installed
}

/// Initialize tracing from environment variables.
///
/// `RUST_LOG` wins over `default_filter`. `LOG_JSON=1` switches to JSON
/// lines and `LOG_SPANS=1` adds step timing events.
pub fn init_tracing_from_env(default_filter: &str) -> bool {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.to_string());

    let format = if env_flag("LOG_JSON") {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };

    init_tracing(
        &TracingConfig::new()
            .with_filter(filter)
            .with_format(format)
            .with_span_events(env_flag("LOG_SPANS")),
    )
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
