use super::TlsConfig;

/// Log levels accepted in configuration, upper-case.
pub const VALID_LOG_LEVELS: [&str; 5] = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"];

/// Ensure the Gemini API key is present and not blank.
pub fn validate_api_key(key: &str) -> Result<(), Box<dyn std::error::Error>> {
    if key.trim().is_empty() {
        return Err("GEMINI_API_KEY cannot be empty".into());
    }
    Ok(())
}

/// Ensure the port is in 1..=65535.
pub fn validate_port(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    if port == 0 {
        return Err("PORT must be between 1 and 65535".into());
    }
    Ok(())
}

/// Upper-case the level and check it against [`VALID_LOG_LEVELS`].
pub fn normalize_log_level(level: &str) -> Result<String, Box<dyn std::error::Error>> {
    let upper = level.trim().to_uppercase();
    if VALID_LOG_LEVELS.contains(&upper.as_str()) {
        Ok(upper)
    } else {
        Err(format!("LOG_LEVEL must be one of {VALID_LOG_LEVELS:?}, got '{level}'").into())
    }
}

pub fn validate_flush_interval(bytes: u64) -> Result<(), Box<dyn std::error::Error>> {
    if bytes == 0 {
        return Err("FLUSH_INTERVAL_BYTES must be greater than 0".into());
    }
    Ok(())
}

/// Check that configured TLS files exist.
pub fn validate_tls(tls: &Option<TlsConfig>) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(tls) = tls {
        if !tls.cert_path.exists() {
            return Err(format!(
                "TLS certificate file not found: {}",
                tls.cert_path.display()
            )
            .into());
        }
        if !tls.key_path.exists() {
            return Err(format!("TLS key file not found: {}", tls.key_path.display()).into());
        }
    }
    Ok(())
}
