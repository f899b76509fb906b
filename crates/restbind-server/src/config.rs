//! Server configuration.
//!
//! Settings are layered: built-in defaults, then an optional TOML or JSON
//! file, then `RESTBIND_*` environment variables. [`ServerConfig::validate`]
//! runs last.
//!
//! # Example
//!
//! ```rust
//! use restbind_server::ServerConfig;
//! use std::time::Duration;
//!
//! let config = ServerConfig::builder()
//!     .http_addr("127.0.0.1:3000")
//!     .request_timeout(Some(Duration::from_secs(5)))
//!     .build();
//!
//! assert_eq!(config.http_addr(), "127.0.0.1:3000");
//! assert!(config.validate().is_ok());
//! ```

use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default HTTP bind address.
pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:8080";

/// Default shutdown drain timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default keep-alive timeout in seconds.
pub const DEFAULT_KEEP_ALIVE_SECS: u64 = 75;

/// Default request body limit (2 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Default per-request deadline in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Environment variable overriding [`ServerConfig::http_addr`].
pub const ENV_HTTP_ADDR: &str = "RESTBIND_HTTP_ADDR";
/// Environment variable overriding [`ServerConfig::max_connections`].
pub const ENV_MAX_CONNECTIONS: &str = "RESTBIND_MAX_CONNECTIONS";
/// Environment variable overriding [`ServerConfig::max_body_bytes`].
pub const ENV_MAX_BODY_BYTES: &str = "RESTBIND_MAX_BODY_BYTES";
/// Environment variable overriding [`ServerConfig::shutdown_timeout`].
pub const ENV_SHUTDOWN_TIMEOUT_SECS: &str = "RESTBIND_SHUTDOWN_TIMEOUT_SECS";
/// Environment variable overriding [`ServerConfig::request_timeout`].
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "RESTBIND_REQUEST_TIMEOUT_SECS";

/// HTTP server settings.
///
/// Durations are stored in whole seconds so the file format stays flat:
///
/// ```toml
/// http_addr = "127.0.0.1:8080"
/// shutdown_timeout_secs = 10
/// keep_alive_timeout_secs = 75
/// max_connections = 1024
/// max_body_bytes = 1048576
/// request_timeout_secs = 30
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    http_addr: String,
    shutdown_timeout_secs: u64,
    keep_alive_timeout_secs: Option<u64>,
    max_connections: Option<usize>,
    max_body_bytes: usize,
    request_timeout_secs: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
            shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            keep_alive_timeout_secs: Some(DEFAULT_KEEP_ALIVE_SECS),
            max_connections: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            request_timeout_secs: Some(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl ServerConfig {
    /// Starts a builder seeded with the defaults.
    #[must_use]
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Loads a file, choosing the format from its extension.
    ///
    /// Missing fields keep their defaults; unknown fields are rejected.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Applies `RESTBIND_*` environment variables.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|var| std::env::var(var).ok())
    }

    /// Applies overrides from an arbitrary variable lookup.
    ///
    /// `RESTBIND_MAX_CONNECTIONS` and `RESTBIND_REQUEST_TIMEOUT_SECS` accept
    /// `none` to clear the setting.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup(ENV_HTTP_ADDR) {
            self.http_addr = addr;
        }
        if let Some(value) = lookup(ENV_MAX_CONNECTIONS) {
            self.max_connections = parse_optional(ENV_MAX_CONNECTIONS, &value)?;
        }
        if let Some(value) = lookup(ENV_MAX_BODY_BYTES) {
            self.max_body_bytes = parse_number(ENV_MAX_BODY_BYTES, &value)?;
        }
        if let Some(value) = lookup(ENV_SHUTDOWN_TIMEOUT_SECS) {
            self.shutdown_timeout_secs = parse_number(ENV_SHUTDOWN_TIMEOUT_SECS, &value)?;
        }
        if let Some(value) = lookup(ENV_REQUEST_TIMEOUT_SECS) {
            self.request_timeout_secs = parse_optional(ENV_REQUEST_TIMEOUT_SECS, &value)?;
        }
        Ok(self)
    }

    /// Checks that every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()
            .map_err(|e| ConfigError::invalid_value("http_addr", e.to_string()))?;

        if self.max_body_bytes == 0 {
            return Err(ConfigError::invalid_value(
                "max_body_bytes",
                "must be greater than zero",
            ));
        }
        if self.max_connections == Some(0) {
            return Err(ConfigError::invalid_value(
                "max_connections",
                "must be greater than zero when set",
            ));
        }
        if self.request_timeout_secs == Some(0) {
            return Err(ConfigError::invalid_value(
                "request_timeout_secs",
                "must be greater than zero when set",
            ));
        }
        Ok(())
    }

    /// The HTTP bind address.
    #[must_use]
    pub fn http_addr(&self) -> &str {
        &self.http_addr
    }

    /// Parses [`Self::http_addr`].
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.http_addr.parse()
    }

    /// How long shutdown waits for open connections.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Keep-alive timeout; `None` disables keep-alive.
    #[must_use]
    pub fn keep_alive_timeout(&self) -> Option<Duration> {
        self.keep_alive_timeout_secs.map(Duration::from_secs)
    }

    /// Connection cap; `None` is unlimited.
    #[must_use]
    pub fn max_connections(&self) -> Option<usize> {
        self.max_connections
    }

    /// Largest accepted request body.
    #[must_use]
    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    /// Deadline placed on every request's context.
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

fn parse_number<T: std::str::FromStr>(var: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env_parse(var, "expected a non-negative integer"))
}

fn parse_optional<T: std::str::FromStr>(var: &str, value: &str) -> Result<Option<T>, ConfigError> {
    if value.trim().eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    parse_number(var, value).map(Some)
}

/// Builder for [`ServerConfig`].
#[derive(Debug, Clone, Default)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    /// Creates a builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the bind address.
    #[must_use]
    pub fn http_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.http_addr = addr.into();
        self
    }

    /// Sets the shutdown drain timeout (whole seconds).
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config.shutdown_timeout_secs = timeout.as_secs();
        self
    }

    /// Sets the keep-alive timeout; `None` disables keep-alive.
    #[must_use]
    pub fn keep_alive_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.keep_alive_timeout_secs = timeout.map(|t| t.as_secs());
        self
    }

    /// Caps concurrent connections.
    #[must_use]
    pub fn max_connections(mut self, max: Option<usize>) -> Self {
        self.config.max_connections = max;
        self
    }

    /// Sets the request body limit.
    #[must_use]
    pub fn max_body_bytes(mut self, max: usize) -> Self {
        self.config.max_body_bytes = max;
        self
    }

    /// Sets the per-request deadline (whole seconds).
    #[must_use]
    pub fn request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.request_timeout_secs = timeout.map(|t| t.as_secs());
        self
    }

    /// Finishes the configuration.
    #[must_use]
    pub fn build(self) -> ServerConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    fn write_file(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr(), DEFAULT_HTTP_ADDR);
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(30));
        assert_eq!(config.keep_alive_timeout(), Some(Duration::from_secs(75)));
        assert_eq!(config.max_connections(), None);
        assert_eq!(config.max_body_bytes(), DEFAULT_MAX_BODY_BYTES);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = ServerConfig::builder()
            .http_addr("127.0.0.1:0")
            .shutdown_timeout(Duration::from_secs(5))
            .keep_alive_timeout(None)
            .max_connections(Some(10))
            .max_body_bytes(64)
            .request_timeout(None)
            .build();

        assert_eq!(config.http_addr(), "127.0.0.1:0");
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(5));
        assert!(config.keep_alive_timeout().is_none());
        assert_eq!(config.max_connections(), Some(10));
        assert_eq!(config.max_body_bytes(), 64);
        assert!(config.request_timeout().is_none());
    }

    #[test]
    fn test_from_toml_file() {
        let file = write_file(
            ".toml",
            "http_addr = \"127.0.0.1:9000\"\nmax_body_bytes = 1024\n",
        );
        let config = ServerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.http_addr(), "127.0.0.1:9000");
        assert_eq!(config.max_body_bytes(), 1024);
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_from_json_file() {
        let file = write_file(".json", r#"{"max_connections": 4, "request_timeout_secs": 2}"#);
        let config = ServerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.max_connections(), Some(4));
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_from_file_errors() {
        assert!(matches!(
            ServerConfig::from_file("/definitely/not/here.toml"),
            Err(ConfigError::FileNotFound { .. })
        ));

        let file = write_file(".yaml", "http_addr: x");
        assert!(matches!(
            ServerConfig::from_file(file.path()),
            Err(ConfigError::UnsupportedFormat { .. })
        ));

        let file = write_file(".toml", "unknown_field = 1\n");
        assert!(matches!(
            ServerConfig::from_file(file.path()),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::default()
            .with_overrides(lookup(&[
                (ENV_HTTP_ADDR, "127.0.0.1:7000"),
                (ENV_MAX_CONNECTIONS, "16"),
                (ENV_MAX_BODY_BYTES, "4096"),
                (ENV_SHUTDOWN_TIMEOUT_SECS, "3"),
                (ENV_REQUEST_TIMEOUT_SECS, "none"),
            ]))
            .unwrap();

        assert_eq!(config.http_addr(), "127.0.0.1:7000");
        assert_eq!(config.max_connections(), Some(16));
        assert_eq!(config.max_body_bytes(), 4096);
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(3));
        assert!(config.request_timeout().is_none());
    }

    #[test]
    fn test_override_parse_error() {
        let err = ServerConfig::default()
            .with_overrides(lookup(&[(ENV_MAX_BODY_BYTES, "lots")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::EnvParse { ref var, .. } if var == ENV_MAX_BODY_BYTES));
    }

    #[test]
    fn test_validate() {
        let bad_addr = ServerConfig::builder().http_addr("localhost").build();
        assert!(bad_addr.validate().is_err());

        let zero_body = ServerConfig::builder().max_body_bytes(0).build();
        assert!(zero_body.validate().is_err());

        let zero_conns = ServerConfig::builder().max_connections(Some(0)).build();
        assert!(zero_conns.validate().is_err());

        let zero_timeout = ServerConfig::builder()
            .request_timeout(Some(Duration::ZERO))
            .build();
        assert!(zero_timeout.validate().is_err());
    }
}
