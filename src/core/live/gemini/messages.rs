//! Gemini Live API WebSocket message types.
//!
//! All messages are JSON objects with exactly one top-level key naming the
//! message kind. Binary payloads travel base64-encoded.
//!
//! # Protocol Overview
//!
//! Client messages (sent to server):
//! - setup - Session configuration, must be the first message
//! - realtimeInput - Streaming audio and activity markers
//! - clientContent - Turn-based text content
//!
//! Server messages (received from server):
//! - setupComplete - Session configuration accepted
//! - serverContent - Model turn, transcriptions and turn boundaries
//! - toolCall / toolCallCancellation - Function calling (unused)
//! - goAway - Server will disconnect soon
//! - usageMetadata - Token accounting

use base64::prelude::*;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::config::GeminiLiveConfig;
use crate::core::live::base::{AudioFormat, LiveError, ModelTurn, RawLiveEvent, TurnPart};

// =============================================================================
// Shared Types
// =============================================================================

/// Inline binary payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    /// Base64-encoded bytes
    pub data: String,
}

/// One part of a content turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<Blob>,
}

/// A content turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// Empty marker object, serialized as `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}

// =============================================================================
// Client Messages
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrebuiltVoiceConfig {
    pub voice_name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    pub prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechConfig {
    pub voice_config: VoiceConfig,
    pub language_code: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<String>,
    pub speech_config: SpeechConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct AutomaticActivityDetection {
    pub disabled: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeInputConfig {
    pub automatic_activity_detection: AutomaticActivityDetection,
}

/// Session setup, the first message on every connection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Setup {
    pub model: String,
    pub generation_config: GenerationConfig,
    pub input_audio_transcription: Empty,
    pub output_audio_transcription: Empty,
    pub realtime_input_config: RealtimeInputConfig,
}

/// Streaming input. Exactly one field is set per message.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<Blob>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_start: Option<Empty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_end: Option<Empty>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientContent {
    pub turns: Vec<Content>,
    pub turn_complete: bool,
}

/// Messages sent to the Live API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ClientMessage {
    Setup(Setup),
    RealtimeInput(RealtimeInput),
    ClientContent(ClientContent),
}

impl ClientMessage {
    /// Setup message for an audio-out session with both transcriptions on
    /// and server-side activity detection off.
    pub fn setup(config: &GeminiLiveConfig) -> Self {
        Self::Setup(Setup {
            model: config.model_resource(),
            generation_config: GenerationConfig {
                response_modalities: vec!["AUDIO".to_string()],
                speech_config: SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: config.voice.as_str().to_string(),
                        },
                    },
                    language_code: config.language_code.clone(),
                },
            },
            input_audio_transcription: Empty {},
            output_audio_transcription: Empty {},
            realtime_input_config: RealtimeInputConfig {
                automatic_activity_detection: AutomaticActivityDetection { disabled: true },
            },
        })
    }

    pub fn audio(data: &[u8], format: AudioFormat) -> Self {
        Self::RealtimeInput(RealtimeInput {
            audio: Some(Blob {
                mime_type: format.mime_type(),
                data: BASE64_STANDARD.encode(data),
            }),
            ..Default::default()
        })
    }

    pub fn activity_start() -> Self {
        Self::RealtimeInput(RealtimeInput {
            activity_start: Some(Empty {}),
            ..Default::default()
        })
    }

    pub fn activity_end() -> Self {
        Self::RealtimeInput(RealtimeInput {
            activity_end: Some(Empty {}),
            ..Default::default()
        })
    }

    pub fn text(text: &str, turn_complete: bool) -> Self {
        Self::ClientContent(ClientContent {
            turns: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(text.to_string()),
                    inline_data: None,
                }],
            }],
            turn_complete,
        })
    }
}

// =============================================================================
// Server Messages
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Transcription {
    #[serde(default)]
    pub text: Option<String>,
}

/// Incremental model output.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerContent {
    pub model_turn: Option<Content>,
    pub turn_complete: bool,
    pub interrupted: bool,
    pub generation_complete: bool,
    pub grounding_metadata: Option<serde_json::Value>,
    pub input_transcription: Option<Transcription>,
    pub output_transcription: Option<Transcription>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoAway {
    pub time_left: Option<String>,
}

/// Any message received from the Live API.
///
/// Fields are checked independently; unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerMessage {
    pub setup_complete: Option<serde_json::Value>,
    pub server_content: Option<ServerContent>,
    pub tool_call: Option<serde_json::Value>,
    pub tool_call_cancellation: Option<serde_json::Value>,
    pub go_away: Option<GoAway>,
    pub usage_metadata: Option<serde_json::Value>,
}

impl TryFrom<ServerContent> for RawLiveEvent {
    type Error = LiveError;

    fn try_from(content: ServerContent) -> Result<Self, Self::Error> {
        let model_turn = content
            .model_turn
            .map(|turn| {
                turn.parts
                    .into_iter()
                    .map(|part| {
                        let inline_data = part
                            .inline_data
                            .map(|blob| {
                                BASE64_STANDARD.decode(&blob.data).map(Bytes::from).map_err(|e| {
                                    LiveError::SerializationError(format!(
                                        "invalid inline audio: {e}"
                                    ))
                                })
                            })
                            .transpose()?;
                        Ok(TurnPart {
                            text: part.text,
                            inline_data,
                        })
                    })
                    .collect::<Result<Vec<_>, LiveError>>()
                    .map(|parts| ModelTurn { parts })
            })
            .transpose()?;

        Ok(RawLiveEvent {
            input_transcription: content.input_transcription.and_then(|t| t.text),
            output_transcription: content.output_transcription.and_then(|t| t.text),
            model_turn,
            turn_complete: content.turn_complete,
            interrupted: content.interrupted,
            grounding_metadata: content.grounding_metadata,
        })
    }
}
