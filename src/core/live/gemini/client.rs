//! Gemini Live API client implementation.
//!
//! This module provides the Gemini Live client that implements the `BaseLive`
//! trait on top of the BidiGenerateContent WebSocket protocol.
//!
//! # API Reference
//!
//! - Endpoint: `wss://generativelanguage.googleapis.com/ws/...BidiGenerateContent?key=<key>`
//! - Protocol: WebSocket with JSON messages (the server may use binary frames)
//! - Input audio: PCM 16-bit, 16kHz, mono, little-endian, base64 encoded
//! - Output audio: PCM 16-bit, 24kHz, mono, little-endian, base64 encoded

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;

use super::config::GeminiLiveConfig;
use super::messages::{ClientMessage, ServerMessage};
use crate::core::live::base::{
    AudioFormat, BaseLive, ConnectionState, LiveError, LiveEventReceiver, LiveResult,
    RawLiveEvent,
};

/// Channel capacity for WebSocket message sending.
const WS_CHANNEL_CAPACITY: usize = 256;

/// Channel capacity for events handed to the response stream.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// How long `disconnect` waits for the close handshake before aborting.
const CLOSE_GRACE_PERIOD: Duration = Duration::from_millis(500);

type EventSender = mpsc::Sender<LiveResult<RawLiveEvent>>;

// =============================================================================
// Gemini Live Client
// =============================================================================

/// Gemini Live API client.
///
/// Outgoing messages are queued on a channel drained by a spawned connection
/// task, which also parses incoming frames and pushes [`RawLiveEvent`]s onto
/// the response stream. Sending therefore only needs `&self`.
pub struct GeminiLive {
    /// Configuration
    config: GeminiLiveConfig,
    /// Last state set by connect/disconnect
    state: ConnectionState,
    /// Connected flag shared with the connection task
    connected: Arc<AtomicBool>,
    /// WebSocket sender channel
    ws_sender: Option<mpsc::Sender<ClientMessage>>,
    /// Response stream, handed out once by `responses()`
    events_rx: Option<LiveEventReceiver>,
    /// Connection task handle
    connection_handle: Option<JoinHandle<()>>,
}

impl GeminiLive {
    /// Create a client. Fails when no API key is configured.
    pub fn new(config: GeminiLiveConfig) -> LiveResult<Self> {
        if config.api_key.is_empty() {
            return Err(LiveError::InvalidConfiguration(
                "API key is required".to_string(),
            ));
        }

        Ok(Self {
            config,
            state: ConnectionState::Disconnected,
            connected: Arc::new(AtomicBool::new(false)),
            ws_sender: None,
            events_rx: None,
            connection_handle: None,
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &GeminiLiveConfig {
        &self.config
    }

    /// Send a message to the WebSocket.
    async fn send_message(&self, message: ClientMessage) -> LiveResult<()> {
        let Some(sender) = self.ws_sender.as_ref() else {
            return Err(LiveError::NotConnected);
        };
        sender
            .send(message)
            .await
            .map_err(|e| LiveError::WebSocketError(e.to_string()))
    }

    fn ensure_ready(&self) -> LiveResult<()> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(LiveError::NotConnected)
        }
    }

    /// Open the socket, send setup and wait for `setupComplete`.
    async fn establish(&mut self) -> LiveResult<()> {
        let url = self.config.build_ws_url()?;

        let (mut ws, _response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| LiveError::ConnectionFailed(e.to_string()))?;

        let setup = serde_json::to_string(&ClientMessage::setup(&self.config))
            .map_err(|e| LiveError::SerializationError(e.to_string()))?;
        ws.send(Message::Text(setup.into()))
            .await
            .map_err(|e| LiveError::ConnectionFailed(e.to_string()))?;

        let wait_for_setup = async {
            while let Some(msg) = ws.next().await {
                let msg = msg.map_err(|e| LiveError::ConnectionFailed(e.to_string()))?;
                let data: Bytes = match msg {
                    Message::Text(text) => Bytes::copy_from_slice(text.as_str().as_bytes()),
                    Message::Binary(data) => data,
                    Message::Close(frame) => {
                        return Err(LiveError::ConnectionFailed(format!(
                            "session rejected during setup: {}",
                            close_reason(frame.as_ref())
                        )));
                    }
                    _ => continue,
                };
                match serde_json::from_slice::<ServerMessage>(&data) {
                    Ok(message) if message.setup_complete.is_some() => return Ok(()),
                    Ok(_) => tracing::debug!("Ignoring message received before setupComplete"),
                    Err(e) => tracing::warn!("Failed to parse setup response: {}", e),
                }
            }
            Err(LiveError::ConnectionFailed(
                "connection ended during setup".to_string(),
            ))
        };

        tokio::time::timeout(
            Duration::from_millis(self.config.setup_timeout_ms),
            wait_for_setup,
        )
        .await
        .map_err(|_| LiveError::ConnectionFailed("timed out waiting for setupComplete".to_string()))??;

        let (mut ws_sink, mut ws_stream) = ws.split();

        let (tx, mut rx) = mpsc::channel::<ClientMessage>(WS_CHANNEL_CAPACITY);
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let connected = self.connected.clone();

        self.ws_sender = Some(tx);
        self.events_rx = Some(events_rx);
        self.connected.store(true, Ordering::SeqCst);

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    // Handle outgoing messages
                    outgoing = rx.recv() => {
                        let Some(message) = outgoing else {
                            // Sender dropped by disconnect()
                            let _ = ws_sink.send(Message::Close(None)).await;
                            break;
                        };

                        let json = match serde_json::to_string(&message) {
                            Ok(j) => j,
                            Err(e) => {
                                tracing::error!("Failed to serialize message: {}", e);
                                continue;
                            }
                        };

                        if let Err(e) = ws_sink.send(Message::Text(json.into())).await {
                            tracing::error!("Failed to send WebSocket message: {}", e);
                            let _ = events_tx.send(Err(LiveError::WebSocketError(e.to_string()))).await;
                            break;
                        }
                    }

                    // Handle incoming messages
                    incoming = ws_stream.next() => {
                        match incoming {
                            Some(Ok(Message::Text(text))) => {
                                dispatch_server_message(text.as_str().as_bytes(), &events_tx).await;
                            }
                            Some(Ok(Message::Binary(data))) => {
                                dispatch_server_message(&data, &events_tx).await;
                            }
                            Some(Ok(Message::Ping(data))) => {
                                if let Err(e) = ws_sink.send(Message::Pong(data)).await {
                                    tracing::error!("Failed to send pong: {}", e);
                                }
                            }
                            Some(Ok(Message::Close(frame))) => {
                                let reason = close_reason(frame.as_ref());
                                tracing::info!("WebSocket closed by server: {}", reason);
                                let _ = events_tx.send(Err(LiveError::ConnectionClosed(reason))).await;
                                break;
                            }
                            Some(Ok(_)) => {}
                            Some(Err(e)) => {
                                tracing::error!("WebSocket error: {}", e);
                                let _ = events_tx.send(Err(LiveError::WebSocketError(e.to_string()))).await;
                                break;
                            }
                            None => {
                                let _ = events_tx
                                    .send(Err(LiveError::ConnectionClosed("stream ended".to_string())))
                                    .await;
                                break;
                            }
                        }
                    }
                }
            }

            connected.store(false, Ordering::SeqCst);
            tracing::info!("Gemini Live connection task ended");
        });

        self.connection_handle = Some(handle);
        Ok(())
    }
}

/// Parse one server frame and push any model content onto the response stream.
async fn dispatch_server_message(data: &[u8], events_tx: &EventSender) {
    let message = match serde_json::from_slice::<ServerMessage>(data) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!("Failed to parse server message: {}", e);
            return;
        }
    };

    if let Some(go_away) = &message.go_away {
        tracing::warn!(
            time_left = ?go_away.time_left,
            "Gemini Live server is about to close the session"
        );
    }
    if message.tool_call.is_some() || message.tool_call_cancellation.is_some() {
        tracing::debug!("Ignoring tool call message");
    }
    if let Some(usage) = &message.usage_metadata {
        tracing::trace!(usage = %usage, "Usage metadata");
    }

    if let Some(content) = message.server_content {
        let event = RawLiveEvent::try_from(content);
        if let Err(e) = &event {
            tracing::error!("Failed to decode server content: {}", e);
        }
        if events_tx.send(event).await.is_err() {
            tracing::trace!("Response stream dropped, discarding event");
        }
    }
}

fn close_reason(frame: Option<&CloseFrame>) -> String {
    match frame {
        Some(frame) if !frame.reason.is_empty() => {
            format!("{} ({})", frame.reason.as_str(), u16::from(frame.code))
        }
        Some(frame) => format!("code {}", u16::from(frame.code)),
        None => "no close frame".to_string(),
    }
}

#[async_trait]
impl BaseLive for GeminiLive {
    async fn connect(&mut self) -> LiveResult<()> {
        if self.connected.load(Ordering::SeqCst) {
            return Ok(());
        }

        self.state = ConnectionState::Connecting;
        tracing::info!("Connecting to Gemini Live API with model {}", self.config.model);

        match self.establish().await {
            Ok(()) => {
                self.state = ConnectionState::Connected;
                tracing::info!("Connection established with Gemini Live API");
                Ok(())
            }
            Err(e) => {
                self.state = ConnectionState::Failed;
                tracing::error!("Error connecting to Gemini Live API: {}", e);
                Err(e)
            }
        }
    }

    async fn disconnect(&mut self) -> LiveResult<()> {
        self.events_rx = None;
        let was_open = self.ws_sender.take().is_some();

        // Dropping the sender asks the task to send a close frame and exit.
        if let Some(mut handle) = self.connection_handle.take()
            && tokio::time::timeout(CLOSE_GRACE_PERIOD, &mut handle)
                .await
                .is_err()
        {
            handle.abort();
        }

        self.connected.store(false, Ordering::SeqCst);
        self.state = ConnectionState::Disconnected;

        if was_open {
            tracing::info!("Connection closed with Gemini Live API");
        }
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ws_sender.is_some() && self.connected.load(Ordering::SeqCst)
    }

    fn get_connection_state(&self) -> ConnectionState {
        match self.state {
            ConnectionState::Connected if !self.connected.load(Ordering::SeqCst) => {
                ConnectionState::Disconnected
            }
            state => state,
        }
    }

    async fn send_audio(&self, audio_data: Bytes, format: AudioFormat) -> LiveResult<()> {
        self.ensure_ready()?;
        self.send_message(ClientMessage::audio(&audio_data, format))
            .await
            .map_err(|e| LiveError::AudioForward(e.to_string()))
    }

    async fn send_text(&self, text: &str, end_of_turn: bool) -> LiveResult<()> {
        self.ensure_ready()?;
        self.send_message(ClientMessage::text(text, end_of_turn)).await
    }

    async fn send_activity_start(&self) -> LiveResult<()> {
        self.ensure_ready()?;
        self.send_message(ClientMessage::activity_start()).await
    }

    async fn send_activity_end(&self) -> LiveResult<()> {
        self.ensure_ready()?;
        self.send_message(ClientMessage::activity_end()).await
    }

    fn responses(&mut self) -> LiveResult<LiveEventReceiver> {
        self.ensure_ready()?;
        self.events_rx.take().ok_or_else(|| {
            LiveError::ProviderError("response stream already taken".to_string())
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
