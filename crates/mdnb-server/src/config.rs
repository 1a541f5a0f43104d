//! Server configuration
//!
//! Read from an optional TOML file; command-line flags override file
//! values through the `with_*` builders.
//!
//! ```toml
//! address = "127.0.0.1:7863"
//! protocol = "stream"
//!
//! [layer]
//! identity = "all"
//! machine_id = "build-host-1"
//! ```

use mdnb_serializer::LayerConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default listen address
pub const DEFAULT_ADDRESS: &str = "127.0.0.1:7863";

/// Default request body limit (32 MiB, room for a base64 encoded 10 MiB source)
pub const DEFAULT_BODY_LIMIT: u64 = 32 * 1024 * 1024;

/// Transport serving the parser service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Unary HTTP/JSON calls
    #[default]
    Http,
    /// Newline-delimited JSON envelopes over TCP
    Stream,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Http => "http",
            Self::Stream => "stream",
        })
    }
}

impl FromStr for Protocol {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "stream" | "tcp" => Ok(Self::Stream),
            _ => Err(ConfigError::Invalid(format!("unknown protocol '{s}'"))),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read {path}: {source}")]
    Read {
        /// File path
        path: PathBuf,
        /// IO error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`ServerConfig`]
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub address: SocketAddr,
    /// Transport
    pub protocol: Protocol,
    /// Maximum request body in bytes (HTTP only)
    pub body_limit: u64,
    /// Serialization layer settings
    pub layer: LayerConfig,
}

impl ServerConfig {
    /// Load configuration, falling back to defaults when `path` is `None`
    ///
    /// # Errors
    /// - `ConfigError::Read` if the file cannot be read
    /// - `ConfigError::Parse` if it is not valid TOML
    /// - `ConfigError::Invalid` if a limit is zero
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                tracing::debug!("loaded config from {}", path.display());
                Self::from_toml(&text)?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    /// `ConfigError::Parse` if the text is not valid TOML.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reject zero limits
    ///
    /// # Errors
    /// `ConfigError::Invalid` naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.body_limit == 0 {
            return Err(ConfigError::Invalid("body_limit must be positive".into()));
        }
        if self.layer.max_source_size == 0 {
            return Err(ConfigError::Invalid(
                "layer.max_source_size must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Builder: listen address
    #[must_use]
    pub fn with_address(mut self, address: SocketAddr) -> Self {
        self.address = address;
        self
    }

    /// Builder: transport
    #[must_use]
    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// Builder: body limit
    #[must_use]
    pub fn with_body_limit(mut self, limit: u64) -> Self {
        self.body_limit = limit;
        self
    }

    /// Builder: layer settings
    #[must_use]
    pub fn with_layer(mut self, layer: LayerConfig) -> Self {
        self.layer = layer;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: SocketAddr::from(([127, 0, 0, 1], 7863)),
            protocol: Protocol::default(),
            body_limit: DEFAULT_BODY_LIMIT,
            layer: LayerConfig::default(),
        }
    }
}
