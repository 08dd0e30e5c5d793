//! Configuration module for the Gemini relay server
//!
//! This module handles server configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//! - `utils`: Utility functions for configuration parsing
//!
//! # Example
//! ```rust,no_run
//! use gemini_relay::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

mod env;
mod merge;
mod utils;
mod validation;
mod yaml;

pub use merge::{
    DEFAULT_FLUSH_INTERVAL_BYTES, DEFAULT_HOST, DEFAULT_LOG_LEVEL, DEFAULT_PORT,
    DEFAULT_STATIC_DIR, DEFAULT_VOICE,
};
pub use validation::VALID_LOG_LEVELS;

use crate::core::live::{GeminiLiveConfig, GeminiVoice};

/// TLS configuration for HTTPS and WSS
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// Server configuration
///
/// Contains all configuration needed to run the relay, including:
/// - Server settings (host, port, TLS)
/// - Gemini Live session settings
/// - Audio diagnostics interval
/// - Logging level, static assets and CORS
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // TLS configuration (optional)
    pub tls: Option<TlsConfig>,

    // Gemini Live settings
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_voice: String,
    pub gemini_language_code: String,
    /// Endpoint override, mainly for tests and proxies
    pub gemini_ws_url: String,

    /// Inbound audio bytes between accumulated-audio log lines
    pub flush_interval_bytes: u64,

    /// One of DEBUG, INFO, WARNING, ERROR, CRITICAL
    pub log_level: String,

    /// Directory holding `index.html` and browser assets
    pub static_dir: PathBuf,

    /// CORS allowed origins (comma-separated list or "*" for all)
    /// Default: None (CORS disabled, same-origin only)
    pub cors_allowed_origins: Option<String>,
}

/// Zeroize the API key when ServerConfig is dropped.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        self.gemini_api_key.zeroize();
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// `.env` is loaded by `main` before this is called, so its values are
    /// visible here as ordinary environment variables.
    ///
    /// # Errors
    /// Returns an error if a numeric variable cannot be parsed or validation fails.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let mut config = merge::merge_config(None)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml_config = yaml::YamlConfig::from_file(path)?;
        let mut config = merge::merge_config(Some(yaml_config))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate and normalise the merged configuration in place.
    fn validate(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        validation::validate_api_key(&self.gemini_api_key)?;
        validation::validate_port(self.port)?;
        validation::validate_flush_interval(self.flush_interval_bytes)?;
        validation::validate_tls(&self.tls)?;
        self.log_level = validation::normalize_log_level(&self.log_level)?;
        Ok(())
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if TLS is enabled
    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    /// True when a non-blank Gemini API key is configured.
    pub fn has_api_key(&self) -> bool {
        !self.gemini_api_key.trim().is_empty()
    }

    /// Session settings for a new Gemini Live connection.
    pub fn live_config(&self) -> GeminiLiveConfig {
        GeminiLiveConfig {
            api_key: self.gemini_api_key.clone(),
            model: self.gemini_model.clone(),
            voice: GeminiVoice::from_str_or_default(&self.gemini_voice),
            language_code: self.gemini_language_code.clone(),
            ws_url: self.gemini_ws_url.clone(),
            ..Default::default()
        }
    }

    /// `tracing` level for the configured log level.
    ///
    /// WARNING maps to WARN and CRITICAL to ERROR.
    pub fn tracing_level(&self) -> tracing::Level {
        match self.log_level.to_uppercase().as_str() {
            "DEBUG" => tracing::Level::DEBUG,
            "WARNING" | "WARN" => tracing::Level::WARN,
            "ERROR" | "CRITICAL" => tracing::Level::ERROR,
            _ => tracing::Level::INFO,
        }
    }

    /// Parsed CORS origins, `None` when CORS is not configured.
    pub fn cors_origins(&self) -> Option<Vec<String>> {
        self.cors_allowed_origins
            .as_deref()
            .map(utils::split_origins)
            .filter(|origins| !origins.is_empty())
    }
}
