//! Live conversational provider module.
//!
//! # Architecture
//!
//! - `BaseLive` trait for provider abstraction
//! - Response stream of raw provider events
//! - `classifier` turns raw events into browser-facing semantic events
//!
//! # Supported Providers
//!
//! - **Gemini Live API** - Full duplex audio with transcription

mod base;
pub mod classifier;
pub mod gemini;

pub use base::{
    AudioFormat, BaseLive, BoxedLive, ConnectionState, LiveError, LiveEventReceiver, LiveResult,
    ModelTurn, RawLiveEvent, TurnPart,
};
pub use classifier::{ClassifiedEvent, ModelState, ModelStateTracker, classify_event};
pub use gemini::{GeminiLive, GeminiLiveConfig, GeminiVoice};
