//! Live relay WebSocket message types
//!
//! Browser clients send binary PCM frames plus small JSON control messages,
//! and receive JSON events plus binary response audio.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::core::live::{ClassifiedEvent, ModelState};

/// Status text sent once the upstream session is ready.
pub const CONNECTED_STATUS: &str = "Connected to Gemini Live API";

// =============================================================================
// Incoming Messages (Client -> Server)
// =============================================================================

/// Incoming control messages from the browser
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum LiveIncomingMessage {
    /// Text utterance, forwarded as a complete user turn
    #[serde(rename = "text")]
    Text {
        #[serde(default)]
        content: String,
    },

    /// Keepalive, answered locally with `pong`
    #[serde(rename = "ping")]
    Ping,

    /// User started speaking
    #[serde(rename = "activity_start")]
    ActivityStart,

    /// User stopped speaking
    #[serde(rename = "activity_end")]
    ActivityEnd,

    /// Any other `type` value
    #[serde(other)]
    Unknown,
}

impl LiveIncomingMessage {
    /// Parse a text frame.
    ///
    /// Returns `Ok(None)` for objects without a string `type`, which are
    /// ignored. Text that is not a JSON object is an error.
    pub fn parse(text: &str) -> Result<Option<Self>, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(text)?;

        let Some(object) = value.as_object() else {
            return Err(<serde_json::Error as serde::de::Error>::custom(
                "control message must be a JSON object",
            ));
        };
        if !object.get("type").is_some_and(|t| t.is_string()) {
            return Ok(None);
        }

        serde_json::from_value(value).map(Some)
    }
}

// =============================================================================
// Outgoing Messages (Server -> Client)
// =============================================================================

/// Outgoing JSON messages to the browser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveOutgoingMessage {
    /// Upstream session is ready
    Status { message: String },

    /// Reply to `ping`
    Pong,

    /// Model phase changed
    ModelState { state: ModelState },

    /// What the user said
    InputTranscription { text: String },

    /// What the model said
    OutputTranscription { text: String },

    /// The model finished its turn
    TurnComplete,

    /// The model was interrupted
    Interrupted,

    /// Fatal session error, sent at most once
    Error { message: String },
}

// =============================================================================
// Message Routing
// =============================================================================

/// Message routing for the WebSocket sender task
#[derive(Debug, Clone, PartialEq)]
pub enum LiveMessageRoute {
    /// JSON text message
    Outgoing(LiveOutgoingMessage),
    /// Binary audio data
    Audio(Bytes),
    /// Close connection
    Close,
}

impl LiveMessageRoute {
    /// Fan a classified event out into one route per populated field, in
    /// wire order: model_state, input_transcription, output_transcription,
    /// audio, turn_complete, interrupted.
    pub fn from_classified(event: ClassifiedEvent) -> Vec<Self> {
        let mut routes = Vec::with_capacity(2);

        if let Some(state) = event.model_state {
            routes.push(Self::Outgoing(LiveOutgoingMessage::ModelState { state }));
        }
        if let Some(text) = event.input_transcript {
            routes.push(Self::Outgoing(LiveOutgoingMessage::InputTranscription { text }));
        }
        if let Some(text) = event.output_transcript {
            routes.push(Self::Outgoing(LiveOutgoingMessage::OutputTranscription {
                text,
            }));
        }
        if let Some(audio) = event.audio {
            routes.push(Self::Audio(audio));
        }
        if event.turn_complete {
            routes.push(Self::Outgoing(LiveOutgoingMessage::TurnComplete));
        }
        if event.interrupted {
            routes.push(Self::Outgoing(LiveOutgoingMessage::Interrupted));
        }

        routes
    }
}
