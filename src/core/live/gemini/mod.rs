//! Gemini Live API module.
//!
//! Full-duplex voice sessions with Gemini models over the
//! BidiGenerateContent WebSocket protocol.
//!
//! # Session Setup
//!
//! - Audio responses with a prebuilt voice and fixed language
//! - Input and output transcription enabled
//! - Server-side activity detection disabled; the client sends explicit
//!   `activityStart` / `activityEnd` markers
//!
//! # Supported Voices
//!
//! Puck, Charon, Kore, Fenrir, Aoede, Leda, Orus, Zephyr

mod client;
mod config;
mod messages;

pub use client::GeminiLive;
pub use config::{
    DEFAULT_GEMINI_MODEL, DEFAULT_LANGUAGE_CODE, GEMINI_LIVE_URL, GEMINI_OUTPUT_SAMPLE_RATE,
    GeminiLiveConfig, GeminiVoice,
};
pub use messages::{ClientMessage, ServerContent, ServerMessage};
