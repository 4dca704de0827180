//! Server configuration
//!
//! Layered in increasing precedence: built-in defaults, an optional TOML
//! file, then command-line flags and environment variables (resolved by
//! clap in the CLI layer and applied as [`ConfigOverrides`]).
//!
//! ```toml
//! model_path = "/srv/models/potability.json"
//! host = "0.0.0.0"
//! port = 8000
//! max_body_size = 1048576
//! inference_timeout_ms = 5000
//! log_format = "json"
//! ```

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration for the HTTP server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Path to the model artifact, loaded once at startup
    pub model_path: PathBuf,
    /// Interface to bind
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
    /// Upper bound on a single inference call in milliseconds
    pub inference_timeout_ms: u64,
    /// Log output format
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("model.json"),
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_body_size: 1024 * 1024, // 1MB
            inference_timeout_ms: 5000,
            log_format: LogFormat::Json,
        }
    }
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub model_path: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log_format: Option<LogFormat>,
}

impl ServerConfig {
    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Resolve the full configuration and validate it
    pub fn load(file: Option<&Path>, overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let base = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = base.with_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(model_path) = overrides.model_path {
            self.model_path = model_path;
        }
        if let Some(host) = overrides.host {
            self.host = host;
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(log_format) = overrides.log_format {
            self.log_format = log_format;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("model_path must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid("port must be non-zero".to_string()));
        }
        if self.max_body_size == 0 {
            return Err(ConfigError::Invalid(
                "max_body_size must be greater than zero".to_string(),
            ));
        }
        if self.inference_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "inference_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("invalid listen address: {}", e)))
    }

    pub fn inference_timeout(&self) -> Duration {
        Duration::from_millis(self.inference_timeout_ms)
    }
}
