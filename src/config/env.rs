use std::env;

use super::utils::{env_opt, parse_env};

/// Raw values read from the process environment.
///
/// Nothing is defaulted here; `merge` decides precedence and defaults.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub tls_cert_path: Option<String>,
    pub tls_key_path: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: Option<String>,
    pub gemini_voice: Option<String>,
    pub gemini_language_code: Option<String>,
    pub gemini_ws_url: Option<String>,
    pub flush_interval_bytes: Option<u64>,
    pub log_level: Option<String>,
    pub static_dir: Option<String>,
    pub cors_allowed_origins: Option<String>,
}

impl EnvConfig {
    /// Read all recognised variables. Numeric variables that fail to parse
    /// are an error rather than silently defaulted.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            host: env_opt("HOST"),
            port: parse_env("PORT")?,
            tls_cert_path: env_opt("TLS_CERT_PATH"),
            tls_key_path: env_opt("TLS_KEY_PATH"),
            // The key is taken verbatim; blank keys are rejected by validation.
            gemini_api_key: env::var("GEMINI_API_KEY").ok(),
            gemini_model: env_opt("GEMINI_MODEL"),
            gemini_voice: env_opt("GEMINI_VOICE"),
            gemini_language_code: env_opt("GEMINI_LANGUAGE_CODE"),
            gemini_ws_url: env_opt("GEMINI_WS_URL"),
            flush_interval_bytes: parse_env("FLUSH_INTERVAL_BYTES")?,
            log_level: env_opt("LOG_LEVEL"),
            static_dir: env_opt("STATIC_DIR"),
            cors_allowed_origins: env_opt("CORS_ALLOWED_ORIGINS"),
        })
    }
}
