//! semq Configuration Management
//!
//! Handles configuration from a TOML file and environment variables
//! with sensible defaults for local development. The console loop
//! itself takes no flags; everything tunable lives here.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Vector store connection
    pub store: StoreConfig,

    /// Embedding backend
    pub embedding: EmbeddingConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration: defaults, then an optional TOML file, then
    /// environment variables (env takes precedence).
    pub fn load(path: Option<&std::path::Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Override fields from `SEMQ_*` environment variables
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(url) = std::env::var("SEMQ_QDRANT_URL") {
            self.store.qdrant_url = url;
        }
        if let Ok(name) = std::env::var("SEMQ_COLLECTION") {
            self.store.collection = name;
        }
        if let Ok(dim) = std::env::var("SEMQ_VECTOR_DIMENSION") {
            self.store.vector_dimension =
                dim.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "SEMQ_VECTOR_DIMENSION".to_string(),
                    value: dim,
                })?;
        }
        if let Ok(url) = std::env::var("SEMQ_OLLAMA_URL") {
            self.embedding.ollama_url = url;
        }
        if let Ok(model) = std::env::var("SEMQ_EMBEDDING_MODEL") {
            self.embedding.model = model;
        }
        if let Ok(level) = std::env::var("SEMQ_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(filter) = std::env::var("SEMQ_CLIENT_LOG_FILTER") {
            self.logging.client_filter = filter;
        }
        Ok(())
    }
}

/// Vector store connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Qdrant gRPC URL
    pub qdrant_url: String,

    /// Collection holding the persisted vectors
    pub collection: String,

    /// Vector dimension (must match the embedding model)
    pub vector_dimension: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            qdrant_url: "http://localhost:6334".to_string(),
            collection: "my_collection".to_string(),
            vector_dimension: 384, // all-minilm
        }
    }
}

/// Embedding backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Ollama server URL
    pub ollama_url: String,

    /// Embedding model name
    pub model: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            ollama_url: "http://localhost:11434".to_string(),
            model: "all-minilm".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level for semq crates (trace, debug, info, warn, error)
    pub level: String,

    /// Filter directives for third-party clients, applied when the
    /// subscriber is built rather than by mutating global log levels
    pub client_filter: String,
}

impl LoggingConfig {
    /// Combined directive string for an `EnvFilter`
    pub fn directives(&self) -> String {
        if self.client_filter.is_empty() {
            self.level.clone()
        } else {
            format!("{},{}", self.level, self.client_filter)
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            client_filter: "qdrant_client=error,reqwest=warn,hyper=warn,h2=warn".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

impl From<ConfigError> for crate::SemqError {
    fn from(err: ConfigError) -> Self {
        crate::SemqError::Config(err.to_string())
    }
}
