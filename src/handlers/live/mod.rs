//! Live relay WebSocket handlers
//!
//! Relays one browser WebSocket to one Gemini Live session.
//!
//! # Protocol
//!
//! ## Client → Server
//!
//! - **Binary frames**: Audio data (PCM 16-bit, 16kHz, mono)
//! - **text**: `{"type":"text","content":"..."}`, sent as a complete user turn
//! - **ping**: Keepalive, answered with `pong`
//! - **activity_start** / **activity_end**: Manual speech segmentation
//!
//! ## Server → Client
//!
//! - **status**: Upstream session ready
//! - **pong**: Keepalive reply
//! - **model_state**: `speaking`, `thinking` or `listening`
//! - **input_transcription** / **output_transcription**: Transcripts
//! - **turn_complete** / **interrupted**: Turn boundaries
//! - **error**: Fatal session error
//! - **Binary frames**: Model audio (PCM 16-bit, 24kHz, mono)

mod handler;
pub mod messages;
pub mod session;
pub mod stats;

pub use handler::live_handler;
pub use messages::{LiveIncomingMessage, LiveMessageRoute, LiveOutgoingMessage};
pub use session::{InboundFrame, RelayError, RelaySession, RelaySettings};
pub use stats::AudioStats;
