//! Base traits and types for Live conversational providers.
//!
//! A Live provider is a full-duplex session with a conversational model:
//! opaque audio and text go in, a stream of heterogeneous events
//! (transcriptions, model audio, turn boundaries) comes out.
//!
//! # Audio Format
//!
//! Input audio is PCM 16-bit signed little-endian, mono, 16kHz.

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use thiserror::Error;
use tokio::sync::mpsc;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during Live session operations.
#[derive(Debug, Error)]
pub enum LiveError {
    /// Connection to the provider failed or the session setup was rejected
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Operation attempted before `connect` succeeded
    #[error("No active session. Call connect() first")]
    NotConnected,

    /// Forwarding an audio frame to the provider failed
    #[error("Failed to send audio: {0}")]
    AudioForward(String),

    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    /// The provider closed the session
    #[error("Connection closed by provider: {0}")]
    ConnectionClosed(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Provider-specific error
    #[error("Provider error: {0}")]
    ProviderError(String),
}

/// Result type for Live operations.
pub type LiveResult<T> = Result<T, LiveError>;

// =============================================================================
// Audio Format
// =============================================================================

/// Sample format descriptor attached to every forwarded audio frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of interleaved channels
    pub channels: u16,
}

impl AudioFormat {
    /// PCM 16-bit little-endian, 16kHz, mono. The format browsers send.
    pub const PCM16_16K_MONO: AudioFormat = AudioFormat {
        sample_rate: 16_000,
        channels: 1,
    };

    /// MIME type understood by the provider, e.g. `audio/pcm;rate=16000`.
    pub fn mime_type(&self) -> String {
        format!("audio/pcm;rate={}", self.sample_rate)
    }

    /// Bytes per second of audio in this format (16-bit samples).
    pub fn bytes_per_second(&self) -> u64 {
        self.sample_rate as u64 * self.channels as u64 * 2
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self::PCM16_16K_MONO
    }
}

// =============================================================================
// Connection State
// =============================================================================

/// Connection state for Live providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Not connected to the provider
    #[default]
    Disconnected,
    /// Currently connecting
    Connecting,
    /// Connected and ready
    Connected,
    /// Connection failed
    Failed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "Disconnected"),
            ConnectionState::Connecting => write!(f, "Connecting"),
            ConnectionState::Connected => write!(f, "Connected"),
            ConnectionState::Failed => write!(f, "Failed"),
        }
    }
}

// =============================================================================
// Raw Events
// =============================================================================

/// One part of a model turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnPart {
    /// Text emitted by the model
    pub text: Option<String>,
    /// Inline audio emitted by the model (PCM, provider output rate)
    pub inline_data: Option<Bytes>,
}

impl TurnPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    pub fn audio(data: impl Into<Bytes>) -> Self {
        Self {
            text: None,
            inline_data: Some(data.into()),
        }
    }
}

/// Model turn content carried by a raw event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelTurn {
    pub parts: Vec<TurnPart>,
}

/// A raw upstream event.
///
/// The provider decides which fields to include in each event, so every
/// signal is optional and checked independently by the classifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawLiveEvent {
    /// Transcription fragment of what the user said
    pub input_transcription: Option<String>,
    /// Transcription fragment of what the model said
    pub output_transcription: Option<String>,
    /// Model turn content (text and/or inline audio)
    pub model_turn: Option<ModelTurn>,
    /// The model finished its turn
    pub turn_complete: bool,
    /// The model was interrupted by user activity
    pub interrupted: bool,
    /// Grounding/processing metadata
    pub grounding_metadata: Option<serde_json::Value>,
}

/// Stream of raw events handed out by [`BaseLive::responses`].
pub type LiveEventReceiver = mpsc::Receiver<LiveResult<RawLiveEvent>>;

// =============================================================================
// Base Trait
// =============================================================================

/// Base trait for Live conversational providers.
///
/// Send operations take `&self` so they can be driven by one task while the
/// response stream, taken once through [`BaseLive::responses`], is consumed
/// by another. The two directions share no lock.
///
/// # Example
///
/// ```rust,ignore
/// use gemini_relay::core::live::{AudioFormat, BaseLive, GeminiLive, GeminiLiveConfig};
///
/// let mut live = GeminiLive::new(GeminiLiveConfig::new("api-key"))?;
/// live.connect().await?;
/// let mut responses = live.responses()?;
///
/// live.send_audio(pcm_bytes, AudioFormat::PCM16_16K_MONO).await?;
/// while let Some(event) = responses.recv().await {
///     println!("{:?}", event?);
/// }
/// live.disconnect().await?;
/// ```
#[async_trait]
pub trait BaseLive: Send + Sync {
    /// Connect to the provider and complete session setup.
    async fn connect(&mut self) -> LiveResult<()>;

    /// Close the session. Safe to call repeatedly and before `connect`.
    async fn disconnect(&mut self) -> LiveResult<()>;

    /// Check if the provider is connected and ready.
    fn is_ready(&self) -> bool;

    /// Get the current connection state.
    fn get_connection_state(&self) -> ConnectionState;

    /// Send one opaque audio frame tagged with its sample format.
    async fn send_audio(&self, audio_data: Bytes, format: AudioFormat) -> LiveResult<()>;

    /// Send a text utterance from the user.
    async fn send_text(&self, text: &str, end_of_turn: bool) -> LiveResult<()>;

    /// Mark the start of user voice activity.
    async fn send_activity_start(&self) -> LiveResult<()>;

    /// Mark the end of user voice activity.
    async fn send_activity_end(&self) -> LiveResult<()>;

    /// Take the response stream. Available once per connection.
    fn responses(&mut self) -> LiveResult<LiveEventReceiver>;
}

/// Boxed trait object for Live providers.
pub type BoxedLive = Box<dyn BaseLive>;
