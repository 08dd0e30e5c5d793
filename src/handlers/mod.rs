//! HTTP and WebSocket request handlers
//!
//! - `api` - Health check endpoint
//! - `live` - Browser to Gemini Live relay WebSocket

pub mod api;
pub mod live;

pub use live::live_handler;
