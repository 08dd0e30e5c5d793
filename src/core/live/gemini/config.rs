//! Gemini Live API configuration types.
//!
//! This module contains configuration types for the Gemini Live API:
//! - Endpoint and model selection
//! - Prebuilt voice selection
//! - Speech language

use url::Url;

use crate::core::live::base::{LiveError, LiveResult};

/// Gemini Live BidiGenerateContent WebSocket endpoint.
pub const GEMINI_LIVE_URL: &str = "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent";

/// Default Live model.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-exp";

/// Default speech language.
pub const DEFAULT_LANGUAGE_CODE: &str = "es-US";

/// Sample rate of audio produced by the Live API.
pub const GEMINI_OUTPUT_SAMPLE_RATE: u32 = 24000;

// =============================================================================
// Voices
// =============================================================================

/// Prebuilt voices available to Live models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeminiVoice {
    Puck,
    Charon,
    Kore,
    Fenrir,
    #[default]
    Aoede,
    Leda,
    Orus,
    Zephyr,
}

impl GeminiVoice {
    /// Convert to the API parameter value.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Puck => "Puck",
            Self::Charon => "Charon",
            Self::Kore => "Kore",
            Self::Fenrir => "Fenrir",
            Self::Aoede => "Aoede",
            Self::Leda => "Leda",
            Self::Orus => "Orus",
            Self::Zephyr => "Zephyr",
        }
    }

    /// Parse from string, with fallback to default.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "puck" => Self::Puck,
            "charon" => Self::Charon,
            "kore" => Self::Kore,
            "fenrir" => Self::Fenrir,
            "aoede" => Self::Aoede,
            "leda" => Self::Leda,
            "orus" => Self::Orus,
            "zephyr" => Self::Zephyr,
            _ => Self::default(),
        }
    }
}

impl std::fmt::Display for GeminiVoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Session Configuration
// =============================================================================

/// Settings for one Gemini Live session.
#[derive(Debug, Clone)]
pub struct GeminiLiveConfig {
    /// API key sent as the `key` query parameter
    pub api_key: String,
    /// Model name, with or without the `models/` prefix
    pub model: String,
    /// Prebuilt voice for audio responses
    pub voice: GeminiVoice,
    /// BCP-47 language code for speech
    pub language_code: String,
    /// Endpoint override, used to point at a local server in tests
    pub ws_url: String,
    /// Maximum time to wait for `setupComplete`
    pub setup_timeout_ms: u64,
}

impl GeminiLiveConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Fully qualified model resource name.
    pub fn model_resource(&self) -> String {
        if self.model.starts_with("models/") {
            self.model.clone()
        } else {
            format!("models/{}", self.model)
        }
    }

    /// Endpoint URL with the API key attached.
    pub fn build_ws_url(&self) -> LiveResult<Url> {
        let mut url = Url::parse(&self.ws_url)
            .map_err(|e| LiveError::InvalidConfiguration(format!("invalid ws url: {e}")))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }
}

impl Default for GeminiLiveConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            voice: GeminiVoice::default(),
            language_code: DEFAULT_LANGUAGE_CODE.to_string(),
            ws_url: GEMINI_LIVE_URL.to_string(),
            setup_timeout_ms: 10_000,
        }
    }
}
