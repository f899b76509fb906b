//! Logging initialisation.
//!
//! Installs a `tracing-subscriber` formatter with an [`EnvFilter`]. JSON
//! output suits production; the pretty formatter suits local development.
//!
//! ```rust,no_run
//! use restbind_server::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development()).unwrap();
//! tracing::info!(http.path = "/users/7", "ready");
//! ```

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::error::ServerError;

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Whether to install a subscriber at all.
    pub enabled: bool,
    /// Filter directives, e.g. `"info"` or `"restbind_core=debug,info"`.
    pub level: String,
    /// JSON lines instead of the pretty formatter.
    pub json_format: bool,
    /// Emit span open/close events.
    pub span_events: bool,
    /// Include source file and line.
    pub file_line_info: bool,
    /// Include the event target.
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl LogConfig {
    /// Human readable, debug level.
    #[must_use]
    pub fn development() -> Self {
        Self {
            enabled: true,
            level: "debug".to_string(),
            json_format: false,
            span_events: true,
            file_line_info: true,
            include_target: true,
        }
    }

    /// JSON, info level.
    #[must_use]
    pub fn production() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            json_format: true,
            span_events: false,
            file_line_info: false,
            include_target: true,
        }
    }

    /// Uses `RUST_LOG` as the filter when it is set.
    #[must_use]
    pub fn with_env_filter(mut self) -> Self {
        if let Ok(level) = std::env::var(EnvFilter::DEFAULT_ENV) {
            self.level = level;
        }
        self
    }
}

/// Installs the global subscriber.
///
/// Fails if the filter does not parse or a subscriber is already set.
pub fn init_logging(config: &LogConfig) -> Result<(), ServerError> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.level)?;
    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let layer = if config.json_format {
        tracing_subscriber::fmt::layer()
            .json()
            .with_span_events(span_events)
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_target(config.include_target)
            .with_filter(filter)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .pretty()
            .with_span_events(span_events)
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_target(config.include_target)
            .with_filter(filter)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| ServerError::Logging(e.to_string()))
}

/// Parses filter directives.
pub fn create_env_filter(directives: &str) -> Result<EnvFilter, ServerError> {
    EnvFilter::try_new(directives)
        .map_err(|e| ServerError::Logging(format!("invalid log filter {directives:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let dev = LogConfig::development();
        assert!(!dev.json_format);
        assert_eq!(dev.level, "debug");

        let prod = LogConfig::production();
        assert!(prod.json_format);
        assert!(!prod.span_events);
        assert_eq!(prod.level, "info");
        assert_eq!(LogConfig::default(), prod);
    }

    #[test]
    fn test_env_filter() {
        assert!(create_env_filter("restbind_server=debug,info").is_ok());
        assert!(create_env_filter("restbind=loudest").is_err());
    }

    #[test]
    fn test_disabled_logging_is_a_no_op() {
        let config = LogConfig {
            enabled: false,
            ..LogConfig::default()
        };
        assert!(init_logging(&config).is_ok());
    }
}
