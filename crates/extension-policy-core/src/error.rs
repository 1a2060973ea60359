//! Error types for extension policy resolution
//!
//! None of these errors reach the public policy API. They are produced by the
//! address resolver, the connect-params client and the account lookups, then
//! logged and collapsed into "parameters unknown" at the resolver boundary.

use thiserror::Error;

/// Result type for extension policy operations
pub type PolicyResult<T> = Result<T, PolicyError>;

/// Errors that can occur while resolving extension parameters
#[derive(Debug, Error)]
pub enum PolicyError {
    /// No address could be derived for the PBX
    #[error("Address resolution failed for {host}: {message}")]
    Resolution { host: String, message: String },

    /// Connect, timeout or TLS failure talking to the PBX
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// The endpoint answered with something other than 200
    #[error("Unexpected HTTP status {status} from {url}")]
    Protocol { status: u16, url: String },

    /// The response body was not a JSON object
    #[error("Malformed connect params response: {message}")]
    Parse { message: String },

    /// No account matched and no default account is available
    #[error("No account available for extension {extension}")]
    DirectoryMiss { extension: String },

    /// Invalid configuration
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Logging subscriber could not be installed
    #[error("Logging setup failed: {message}")]
    Logging { message: String },
}

impl PolicyError {
    /// Create a resolution error
    pub fn resolution(host: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Resolution {
            host: host.into(),
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a protocol error
    pub fn protocol(status: u16, url: impl Into<String>) -> Self {
        Self::Protocol {
            status,
            url: url.into(),
        }
    }

    /// Create a parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a directory miss error
    pub fn directory_miss(extension: impl Into<String>) -> Self {
        Self::DirectoryMiss {
            extension: extension.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for PolicyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::parse(err.to_string())
        } else {
            Self::transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for PolicyError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse(err.to_string())
    }
}

impl From<config::ConfigError> for PolicyError {
    fn from(err: config::ConfigError) -> Self {
        Self::config(err.to_string())
    }
}
