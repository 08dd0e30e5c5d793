//! Mock provider servers
//!
//! Simulates the Gemini Live WebSocket endpoint closely enough to drive the
//! real client end to end: setup handshake, transcriptions, model audio and
//! turn boundaries, plus failure modes for rejected or dropped sessions.

// Not every test binary uses every helper
#![allow(dead_code)]

pub mod websocket_mock;
