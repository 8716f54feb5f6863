//! Configuration for the prediction service.

use std::fmt;

use axum::http::HeaderName;
use config::{Config as ConfigLoader, Environment, File, FileFormat};
use serde::Deserialize;

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Echo inference error text in 500 responses. When false, clients only
    /// see a generic message and the detail goes to the server log.
    #[serde(default = "default_true")]
    pub expose_error_details: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            expose_error_details: default_true(),
        }
    }
}

#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared secret clients must present.
    #[serde(default)]
    pub api_key: String,
    /// Header carrying the secret.
    #[serde(default = "default_auth_header")]
    pub header: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            header: default_auth_header(),
        }
    }
}

// Keep the secret out of debug output.
impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("api_key", &"<redacted>")
            .field("header", &self.header)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_path")]
    pub model_path: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Append-only request log.
    #[serde(default = "default_log_file")]
    pub file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),
    #[error("auth.api_key is not set (use PREDICT__AUTH__API_KEY or config.toml)")]
    MissingApiKey,
    #[error("auth.header is not a valid header name: {0}")]
    InvalidHeader(String),
}

// Default values
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    5000
}
fn default_true() -> bool {
    true
}
fn default_auth_header() -> String {
    "x-api-key".to_string()
}
fn default_model_path() -> String {
    "model.json".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_file() -> String {
    "app.log".to_string()
}

/// `PREDICT__SECTION__KEY` variables, kept as strings so secrets such as
/// `007` reach `auth.api_key` unchanged. Numeric and boolean fields are
/// still coerced from strings during deserialization.
fn environment() -> Environment {
    Environment::with_prefix("PREDICT").separator("__")
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Configuration sources (in order of precedence):
    /// 1. Environment variables (PREDICT__SECTION__KEY format)
    /// 2. config.toml, or the file named by PREDICT_CONFIG (optional)
    /// 3. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        let file = std::env::var("PREDICT_CONFIG").unwrap_or_else(|_| "config".to_string());
        Self::load_with(&file, environment())
    }

    fn load_with(file: &str, env: Environment) -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            .add_source(File::with_name(file).required(false))
            .add_source(env)
            .build()?;

        Self::finish(config)
    }

    /// Load configuration from TOML text only.
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            .add_source(File::from_str(raw, FileFormat::Toml))
            .build()?;

        Self::finish(config)
    }

    fn finish(config: ConfigLoader) -> Result<Self, ConfigError> {
        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.api_key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        HeaderName::try_from(self.auth.header.as_str())
            .map_err(|_| ConfigError::InvalidHeader(self.auth.header.clone()))?;
        Ok(())
    }

    /// Address the server binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}
