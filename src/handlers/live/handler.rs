//! Live relay WebSocket handler
//!
//! Bridges one browser WebSocket to one Gemini Live session. The socket is
//! split: a sender task drains [`LiveMessageRoute`]s to the browser, while
//! the [`RelaySession`] consumes inbound frames and drives the upstream
//! session.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt, future};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{Duration, timeout};
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use crate::core::live::GeminiLive;
use crate::state::AppState;

use super::messages::{LiveMessageRoute, LiveOutgoingMessage};
use super::session::{InboundFrame, RelayError, RelaySession, RelaySettings};

/// Channel buffer between the relay and the sender task
const CHANNEL_BUFFER_SIZE: usize = 1024;

/// Maximum WebSocket frame size (10 MB)
const MAX_WS_FRAME_SIZE: usize = 10 * 1024 * 1024;

/// Maximum WebSocket message size (10 MB)
const MAX_WS_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

/// How long queued messages may take to flush after the session ends
const SENDER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Live relay WebSocket handler
///
/// Upgrades the HTTP connection to a WebSocket and relays it to a fresh
/// Gemini Live session.
pub async fn live_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    info!("Live WebSocket connection upgrade requested");

    ws.max_frame_size(MAX_WS_FRAME_SIZE)
        .max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_live_socket(socket, state))
}

async fn handle_live_socket(socket: WebSocket, app_state: Arc<AppState>) {
    let session_id = Uuid::new_v4().to_string();
    let span = info_span!("live_session", %session_id);

    relay_socket(socket, app_state).instrument(span).await
}

async fn relay_socket(socket: WebSocket, app_state: Arc<AppState>) {
    info!("WebSocket client connected");

    let (mut sender, receiver) = socket.split();
    let (message_tx, mut message_rx) = mpsc::channel::<LiveMessageRoute>(CHANNEL_BUFFER_SIZE);

    // Sender task for outgoing messages
    let mut sender_task = tokio::spawn(
        async move {
            while let Some(route) = message_rx.recv().await {
                let should_close = matches!(route, LiveMessageRoute::Close);

                let result = match route {
                    LiveMessageRoute::Outgoing(message) => {
                        match serde_json::to_string(&message) {
                            Ok(json_str) => sender.send(Message::Text(json_str.into())).await,
                            Err(e) => {
                                error!("Failed to serialize outgoing message: {}", e);
                                continue;
                            }
                        }
                    }
                    LiveMessageRoute::Audio(data) => sender.send(Message::Binary(data)).await,
                    LiveMessageRoute::Close => {
                        info!("Closing live WebSocket connection");
                        sender.send(Message::Close(None)).await
                    }
                };

                if let Err(e) = result {
                    error!("Failed to send WebSocket message: {}", e);
                    break;
                }

                if should_close {
                    break;
                }
            }
        }
        .in_current_span(),
    );

    match GeminiLive::new(app_state.config.live_config()) {
        Ok(live) => {
            let inbound = receiver.filter_map(|msg| future::ready(inbound_frame(msg)));
            let settings = RelaySettings::from(&app_state.config);
            let mut session = RelaySession::new(live, settings);

            // Failures were already reported to the browser by the session.
            let _ = session.run(inbound, &message_tx).await;
        }
        Err(e) => {
            error!("Failed to create Gemini Live session: {}", e);
            let _ = message_tx
                .send(LiveMessageRoute::Outgoing(LiveOutgoingMessage::Error {
                    message: e.to_string(),
                }))
                .await;
        }
    }

    let _ = message_tx.send(LiveMessageRoute::Close).await;
    drop(message_tx);

    if timeout(SENDER_DRAIN_TIMEOUT, &mut sender_task).await.is_err() {
        warn!("Timed out flushing messages to browser");
        sender_task.abort();
    }

    info!("WebSocket connection terminated");
}

/// Map one axum frame to a relay frame.
///
/// Ping and pong are answered by axum and skipped here. A peer that drops
/// the socket without a Close frame surfaces as an error and ends the
/// session abnormally; only a Close frame or end of stream is a clean exit.
fn inbound_frame(msg: Result<Message, axum::Error>) -> Option<Result<InboundFrame, RelayError>> {
    match msg {
        Ok(Message::Text(text)) => Some(Ok(InboundFrame::Text(text.as_str().to_owned()))),
        Ok(Message::Binary(data)) => Some(Ok(InboundFrame::Binary(data))),
        Ok(Message::Close(_)) => Some(Ok(InboundFrame::Close)),
        Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => None,
        Err(e) => Some(Err(RelayError::Transport(e.to_string()))),
    }
}
