//! Logging setup for binaries embedding the policy service

use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{PolicyError, PolicyResult};

/// Configuration for the logging subscriber
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Maximum level logged when `RUST_LOG` is unset or invalid
    pub level: Level,
    /// Emit JSON lines instead of human readable output
    pub json: bool,
    /// Include file and line information
    pub file_info: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: Level::INFO,
            json: false,
            file_info: false,
        }
    }
}

impl LoggingConfig {
    pub fn new(level: Level) -> Self {
        LoggingConfig {
            level,
            ..Default::default()
        }
    }

    /// Enable JSON formatting
    pub fn with_json(mut self) -> Self {
        self.json = true;
        self
    }

    /// Enable file and line information in logs
    pub fn with_file_info(mut self) -> Self {
        self.file_info = true;
        self
    }
}

/// Install the global tracing subscriber
///
/// A valid `RUST_LOG` replaces the configured level entirely. Fails if a
/// subscriber is already installed.
pub fn setup_logging(config: LoggingConfig) -> PolicyResult<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(config.level, rust_log.as_deref());

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_file(config.file_info)
        .with_line_number(config.file_info);

    let result = if config.json {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    };

    result.map_err(|e| PolicyError::Logging {
        message: e.to_string(),
    })
}

fn build_filter(level: Level, rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(level.to_string()))
}

/// Parse a log level from a string
pub fn parse_log_level(level: &str) -> PolicyResult<Level> {
    Level::from_str(level).map_err(|_| PolicyError::config(format!("Invalid log level: {}", level)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("debug").unwrap(), Level::DEBUG);
        assert_eq!(parse_log_level("WARN").unwrap(), Level::WARN);
        assert!(parse_log_level("loud").is_err());
    }

    #[test]
    fn test_config_builders() {
        let config = LoggingConfig::new(Level::DEBUG).with_json().with_file_info();
        assert_eq!(config.level, Level::DEBUG);
        assert!(config.json);
        assert!(config.file_info);
    }

    #[test]
    fn test_filter_uses_configured_level_without_rust_log() {
        let filter = build_filter(Level::DEBUG, None);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));

        let filter = build_filter(Level::WARN, Some("  "));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn test_rust_log_replaces_configured_level() {
        // A quieter RUST_LOG must not be widened by the configured level
        let filter = build_filter(Level::DEBUG, Some("warn"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));

        let filter = build_filter(Level::INFO, Some("trace"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));
    }

    #[test]
    fn test_invalid_rust_log_falls_back_to_level() {
        let filter = build_filter(Level::ERROR, Some("=not a directive="));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::ERROR));
    }
}
