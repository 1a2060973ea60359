//! Configuration for extension policy resolution
//!
//! Defaults describe the production endpoint: `https://{pbx}:8443/getConnectParams`
//! with a 30 second request timeout, a 60 second resource timeout and a
//! 60 second cache window. Durations are kept at millisecond resolution.
//!
//! ```rust
//! use extension_policy_core::config::PolicyConfig;
//! use std::time::Duration;
//!
//! let config = PolicyConfig::new()
//!     .with_port(9443)
//!     .with_cache_ttl(Duration::from_secs(30));
//!
//! assert_eq!(config.port, 9443);
//! assert_eq!(config.cache_ttl(), Duration::from_secs(30));
//! assert!(config.validate().is_ok());
//! ```

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::{PolicyError, PolicyResult};

/// Environment variable prefix recognised by [`PolicyConfig::load`]
pub const ENV_PREFIX: &str = "EXTENSION_POLICY";

/// Settings for the connect-params client, cache and resolver
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// URL scheme of the connect-params endpoint
    pub scheme: String,
    /// Port of the connect-params endpoint on the PBX
    pub port: u16,
    /// Path of the connect-params endpoint
    pub endpoint_path: String,
    /// Per-request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Per-resource (whole exchange) timeout in milliseconds
    pub resource_timeout_ms: u64,
    /// Validity window of a cached entry in milliseconds
    pub cache_ttl_ms: u64,
    /// Trust every server certificate.
    ///
    /// UNSAFE. Only honoured when built with the `insecure-tls` feature.
    pub accept_invalid_certs: bool,
    /// Share one in-flight fetch between concurrent lookups of the same extension
    pub coalesce_in_flight: bool,
    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            scheme: "https".to_string(),
            port: 8443,
            endpoint_path: "/getConnectParams".to_string(),
            request_timeout_ms: 30_000,
            resource_timeout_ms: 60_000,
            cache_ttl_ms: 60_000,
            accept_invalid_certs: false,
            coalesce_in_flight: true,
            user_agent: format!("extension-policy/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl PolicyConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from an optional file and the environment
    ///
    /// Sources are layered: built-in defaults, then the file (format chosen
    /// by extension), then `EXTENSION_POLICY_*` environment variables.
    pub fn load(path: Option<&Path>) -> PolicyResult<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        let settings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Set the endpoint scheme
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// Set the endpoint port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the per-request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = millis(timeout);
        self
    }

    /// Set the per-resource timeout
    pub fn with_resource_timeout(mut self, timeout: Duration) -> Self {
        self.resource_timeout_ms = millis(timeout);
        self
    }

    /// Set the cache validity window
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl_ms = millis(ttl);
        self
    }

    /// Enable or disable in-flight fetch coalescing
    pub fn with_coalescing(mut self, enabled: bool) -> Self {
        self.coalesce_in_flight = enabled;
        self
    }

    /// Trust every server certificate (requires the `insecure-tls` feature)
    pub fn with_insecure_tls(mut self, enabled: bool) -> Self {
        self.accept_invalid_certs = enabled;
        self
    }

    /// Per-request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Per-resource timeout
    pub fn resource_timeout(&self) -> Duration {
        Duration::from_millis(self.resource_timeout_ms)
    }

    /// Cache validity window
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    /// Check the settings for consistency
    pub fn validate(&self) -> PolicyResult<()> {
        if self.scheme != "https" && self.scheme != "http" {
            return Err(PolicyError::config(format!(
                "unsupported scheme: {}",
                self.scheme
            )));
        }
        if self.port == 0 {
            return Err(PolicyError::config("port must be non-zero"));
        }
        if !self.endpoint_path.starts_with('/') {
            return Err(PolicyError::config("endpoint_path must start with '/'"));
        }
        if self.request_timeout_ms == 0 || self.resource_timeout_ms == 0 {
            return Err(PolicyError::config("timeouts must be at least 1ms"));
        }
        if self.cache_ttl_ms == 0 {
            return Err(PolicyError::config("cache_ttl_ms must be at least 1ms"));
        }
        if self.accept_invalid_certs && !cfg!(feature = "insecure-tls") {
            return Err(PolicyError::config(
                "accept_invalid_certs requires a build with the `insecure-tls` feature",
            ));
        }
        Ok(())
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = PolicyConfig::default();
        assert_eq!(config.scheme, "https");
        assert_eq!(config.port, 8443);
        assert_eq!(config.endpoint_path, "/getConnectParams");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.resource_timeout(), Duration::from_secs(60));
        assert_eq!(config.cache_ttl(), Duration::from_secs(60));
        assert!(!config.accept_invalid_certs);
        assert!(config.coalesce_in_flight);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(PolicyConfig::new().with_port(0).validate().is_err());
        assert!(PolicyConfig::new().with_scheme("ftp").validate().is_err());
        assert!(PolicyConfig::new()
            .with_cache_ttl(Duration::ZERO)
            .validate()
            .is_err());
        assert!(PolicyConfig::new()
            .with_request_timeout(Duration::ZERO)
            .validate()
            .is_err());
    }

    #[cfg(not(feature = "insecure-tls"))]
    #[test]
    fn test_insecure_tls_rejected_without_feature() {
        let err = PolicyConfig::new().with_insecure_tls(true).validate().unwrap_err();
        assert!(matches!(err, PolicyError::Configuration { .. }));
    }

    #[test]
    #[serial]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(file, "port = 9443").unwrap();
        writeln!(file, "cache_ttl_ms = 15000").unwrap();

        let config = PolicyConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.port, 9443);
        assert_eq!(config.cache_ttl(), Duration::from_secs(15));
        // Untouched keys keep their defaults
        assert_eq!(config.endpoint_path, "/getConnectParams");
    }

    #[test]
    #[serial]
    fn test_load_rejects_invalid_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(file, "port = 0").unwrap();

        assert!(PolicyConfig::load(Some(file.path())).is_err());
    }

    #[test]
    fn test_sub_second_durations_are_kept() {
        let config = PolicyConfig::new()
            .with_cache_ttl(Duration::from_millis(1500))
            .with_request_timeout(Duration::from_millis(500))
            .with_resource_timeout(Duration::from_millis(2500));

        assert_eq!(config.cache_ttl(), Duration::from_millis(1500));
        assert_eq!(config.request_timeout(), Duration::from_millis(500));
        assert_eq!(config.resource_timeout(), Duration::from_millis(2500));
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_environment_overrides_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(file, "port = 9443").unwrap();
        writeln!(file, "request_timeout_ms = 5000").unwrap();

        // SAFETY: tests touching EXTENSION_POLICY_* run serially
        unsafe {
            std::env::set_var("EXTENSION_POLICY_PORT", "9000");
            std::env::set_var("EXTENSION_POLICY_CACHE_TTL_MS", "7000");
        }
        let result = PolicyConfig::load(Some(file.path()));
        unsafe {
            std::env::remove_var("EXTENSION_POLICY_PORT");
            std::env::remove_var("EXTENSION_POLICY_CACHE_TTL_MS");
        }

        let config = result.unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.cache_ttl(), Duration::from_secs(7));
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
    }
}
