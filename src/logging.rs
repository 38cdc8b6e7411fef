//! Logging setup on top of `tracing`.

use crate::config::{LogFormat, LogLevel, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the configured level.
pub const LOG_LEVEL_ENV: &str = "ENVGENE_LOG_LEVEL";

impl LogLevel {
    /// Map a level label to a level.
    ///
    /// Accepts the labels used across the generator's tooling: `CRITICAL`
    /// collapses to [`LogLevel::Error`], `WARNING` to [`LogLevel::Warn`], and
    /// anything unrecognized falls back to [`LogLevel::Info`].
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "CRITICAL" | "FATAL" | "ERROR" => Self::Error,
            "WARNING" | "WARN" => Self::Warn,
            "DEBUG" => Self::Debug,
            "TRACE" => Self::Trace,
            _ => Self::Info,
        }
    }

    /// Directive understood by `EnvFilter`.
    #[must_use]
    pub const fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Level to run with: `ENVGENE_LOG_LEVEL` if set, else the configured one.
#[must_use]
pub fn effective_level(config: &LoggingConfig) -> LogLevel {
    resolve_level(config, std::env::var(LOG_LEVEL_ENV).ok().as_deref())
}

fn resolve_level(config: &LoggingConfig, env_value: Option<&str>) -> LogLevel {
    env_value
        .filter(|v| !v.trim().is_empty())
        .map_or(config.level, LogLevel::from_label)
}

/// Install the global subscriber.
///
/// Returns `false` when a subscriber was already installed; the existing one is
/// left in place.
pub fn init(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::new(effective_level(config).as_directive());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
    installed.is_ok()
}
