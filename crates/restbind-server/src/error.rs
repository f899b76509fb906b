//! Server and configuration errors.

use std::net::AddrParseError;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured address is not a socket address.
    #[error("invalid listen address {addr:?}: {source}")]
    InvalidAddress {
        /// Configured address.
        addr: String,
        /// Parser error.
        #[source]
        source: AddrParseError,
    },

    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that was tried.
        addr: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The tracing subscriber could not be installed.
    #[error("failed to initialize logging: {0}")]
    Logging(String),

    /// Other I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while loading [`ServerConfig`](crate::ServerConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("configuration file not found: {}", path.display())]
    FileNotFound {
        /// Path that was tried.
        path: PathBuf,
    },

    /// The configuration file could not be read.
    #[error("failed to read configuration file {}: {source}", path.display())]
    Read {
        /// Path of the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file extension is neither `toml` nor `json`.
    #[error("unsupported configuration format: {}", path.display())]
    UnsupportedFormat {
        /// Path of the file.
        path: PathBuf,
    },

    /// TOML parsing failed.
    #[error("failed to parse TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON parsing failed.
    #[error("failed to parse JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// An environment override could not be parsed.
    #[error("failed to parse environment variable {var}: {reason}")]
    EnvParse {
        /// Variable name.
        var: String,
        /// What was expected.
        reason: String,
    },

    /// A value is out of range.
    #[error("invalid configuration value for {field}: {reason}")]
    InvalidValue {
        /// Field name.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn env_parse(var: &str, reason: &str) -> Self {
        Self::EnvParse {
            var: var.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn invalid_value(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}
