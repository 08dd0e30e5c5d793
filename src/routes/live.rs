//! Live relay WebSocket route configuration

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::live::live_handler;
use crate::state::AppState;
use std::sync::Arc;

/// Create the Live relay WebSocket router
///
/// # Endpoint
///
/// `GET /ws` - WebSocket upgrade relayed to a new Gemini Live session
///
/// # Protocol
///
/// After the upgrade the server connects upstream and sends
/// `{"type":"status","message":"Connected to Gemini Live API"}`. The client
/// then streams binary PCM audio and JSON control messages:
///
/// ```json
/// {"type": "activity_start"}
/// {"type": "activity_end"}
/// {"type": "text", "content": "Hola"}
/// {"type": "ping"}
/// ```
///
/// The server replies with `model_state`, transcription, `turn_complete`
/// and `interrupted` messages plus binary response audio.
pub fn create_live_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ws", get(live_handler))
        .layer(TraceLayer::new_for_http())
}
