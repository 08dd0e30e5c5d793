use std::path::PathBuf;

use super::env::EnvConfig;
use super::yaml::YamlConfig;
use super::{ServerConfig, TlsConfig};
use crate::core::live::gemini::{DEFAULT_GEMINI_MODEL, DEFAULT_LANGUAGE_CODE, GEMINI_LIVE_URL};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_VOICE: &str = "Aoede";
/// ~5 seconds of 16kHz mono PCM16.
pub const DEFAULT_FLUSH_INTERVAL_BYTES: u64 = 160_000;
pub const DEFAULT_LOG_LEVEL: &str = "INFO";
pub const DEFAULT_STATIC_DIR: &str = "static";

/// Merge YAML overrides on top of environment variables and defaults.
///
/// Priority: YAML > ENV (including values loaded from `.env`) > defaults.
/// The result is not validated here.
pub fn merge_config(
    yaml_config: Option<YamlConfig>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let env = EnvConfig::load()?;
    let yaml = yaml_config.unwrap_or_default();

    let server = yaml.server.unwrap_or_default();
    let gemini = yaml.gemini.unwrap_or_default();
    let audio = yaml.audio.unwrap_or_default();
    let logging = yaml.logging.unwrap_or_default();
    let security = yaml.security.unwrap_or_default();

    // TLS: YAML wins when it is explicitly enabled or disabled.
    let yaml_tls = server.tls.unwrap_or_default();
    let tls = match yaml_tls.enabled {
        Some(false) => None,
        _ => {
            let cert = yaml_tls.cert_path.or(env.tls_cert_path);
            let key = yaml_tls.key_path.or(env.tls_key_path);
            match (cert, key) {
                (Some(cert), Some(key)) => Some(TlsConfig {
                    cert_path: PathBuf::from(cert),
                    key_path: PathBuf::from(key),
                }),
                (None, None) if yaml_tls.enabled == Some(true) => {
                    return Err("TLS enabled but cert_path and key_path are not set".into());
                }
                (None, None) => None,
                _ => {
                    return Err("TLS requires both a certificate path and a key path".into());
                }
            }
        }
    };

    Ok(ServerConfig {
        host: server
            .host
            .or(env.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port: server.port.or(env.port).unwrap_or(DEFAULT_PORT),
        tls,
        gemini_api_key: gemini.api_key.or(env.gemini_api_key).unwrap_or_default(),
        gemini_model: gemini
            .model
            .or(env.gemini_model)
            .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
        gemini_voice: gemini
            .voice
            .or(env.gemini_voice)
            .unwrap_or_else(|| DEFAULT_VOICE.to_string()),
        gemini_language_code: gemini
            .language_code
            .or(env.gemini_language_code)
            .unwrap_or_else(|| DEFAULT_LANGUAGE_CODE.to_string()),
        gemini_ws_url: gemini
            .ws_url
            .or(env.gemini_ws_url)
            .unwrap_or_else(|| GEMINI_LIVE_URL.to_string()),
        flush_interval_bytes: audio
            .flush_interval_bytes
            .or(env.flush_interval_bytes)
            .unwrap_or(DEFAULT_FLUSH_INTERVAL_BYTES),
        log_level: logging
            .level
            .or(env.log_level)
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        static_dir: PathBuf::from(
            yaml.static_dir
                .or(env.static_dir)
                .unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string()),
        ),
        cors_allowed_origins: security.cors_allowed_origins.or(env.cors_allowed_origins),
    })
}
