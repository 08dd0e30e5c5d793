//! WebSocket mock server for the Gemini Live API
//!
//! Speaks the BidiGenerateContent JSON protocol:
//! - first client message must be `setup`, answered with `setupComplete`
//! - `realtimeInput.audio` is acknowledged with an input transcription
//! - `realtimeInput.activityEnd` produces a model turn (text + audio),
//!   an output transcription and `turnComplete`
//! - `clientContent` echoes the user text as the output transcription

use base64::prelude::*;
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{
    accept_async,
    tungstenite::{
        Message,
        handshake::server::{ErrorResponse, Request, Response},
        protocol::{CloseFrame, frame::coding::CloseCode},
    },
};

/// Transcript the mock reports for any inbound audio
pub const MOCK_INPUT_TRANSCRIPT: &str = "hola";

/// Text part the mock puts in every audio model turn
pub const MOCK_MODEL_TEXT: &str = "Buenos días";

/// PCM the mock returns as model audio
pub const MOCK_MODEL_AUDIO: [u8; 8] = [0, 1, 2, 3, 4, 5, 6, 7];

/// How the mock treats a new session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockBehavior {
    /// Full conversation support
    Normal,
    /// Close with a policy violation instead of `setupComplete`
    RejectSetup,
    /// Complete setup, then close on the first client message
    DropAfterSetup,
    /// Never answer the setup message
    SilentSetup,
}

/// Gemini mock server state
pub struct GeminiMockState {
    pub behavior: MockBehavior,
    /// Send server messages as binary frames, like the production endpoint
    pub binary_frames: bool,
    pub connection_count: AtomicU64,
    /// Every client message received, in order, across all sessions
    pub received: Mutex<Vec<Value>>,
    /// Query string of each accepted connection
    pub queries: Mutex<Vec<String>>,
}

impl GeminiMockState {
    pub fn new(behavior: MockBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            binary_frames: false,
            connection_count: AtomicU64::new(0),
            received: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
        })
    }

    pub fn with_binary_frames(behavior: MockBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            binary_frames: true,
            connection_count: AtomicU64::new(0),
            received: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
        })
    }

    pub fn received(&self) -> Vec<Value> {
        self.received.lock().unwrap().clone()
    }

    /// Received messages whose single top-level key is `kind`
    pub fn received_of(&self, kind: &str) -> Vec<Value> {
        self.received()
            .into_iter()
            .filter(|m| m.get(kind).is_some())
            .collect()
    }

    fn frame(&self, value: Value) -> Message {
        if self.binary_frames {
            Message::Binary(value.to_string().into_bytes().into())
        } else {
            Message::Text(value.to_string().into())
        }
    }
}

/// Handle a single Gemini Live session
async fn handle_gemini_connection(
    stream: TcpStream,
    state: Arc<GeminiMockState>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let query_state = state.clone();
    let record_query = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
        let query = req.uri().query().unwrap_or_default().to_string();
        query_state.queries.lock().unwrap().push(query);
        Ok(resp)
    };
    let ws_stream = tokio_tungstenite::accept_hdr_async(stream, record_query).await?;
    let (mut write, mut read) = ws_stream.split();

    state.connection_count.fetch_add(1, Ordering::Relaxed);

    let mut setup_done = false;

    while let Some(msg) = read.next().await {
        let text = match msg {
            Ok(Message::Text(text)) => text.as_str().to_string(),
            Ok(Message::Binary(data)) => String::from_utf8_lossy(&data).into_owned(),
            Ok(Message::Ping(data)) => {
                write.send(Message::Pong(data)).await?;
                continue;
            }
            Ok(Message::Close(_)) => break,
            Err(e) => {
                eprintln!("WebSocket error: {}", e);
                break;
            }
            _ => continue,
        };

        let Ok(message) = serde_json::from_str::<Value>(&text) else {
            continue;
        };
        state.received.lock().unwrap().push(message.clone());

        if !setup_done {
            if message.get("setup").is_none() {
                break;
            }
            match state.behavior {
                MockBehavior::RejectSetup => {
                    write
                        .send(Message::Close(Some(CloseFrame {
                            code: CloseCode::Policy,
                            reason: "API key not valid".into(),
                        })))
                        .await?;
                    break;
                }
                MockBehavior::SilentSetup => continue,
                _ => {}
            }
            write.send(state.frame(json!({"setupComplete": {}}))).await?;
            setup_done = true;
            continue;
        }

        if state.behavior == MockBehavior::DropAfterSetup {
            write
                .send(Message::Close(Some(CloseFrame {
                    code: CloseCode::Away,
                    reason: "session expired".into(),
                })))
                .await?;
            break;
        }

        for reply in replies_for(&message) {
            write.send(state.frame(reply)).await?;
        }
    }

    state.connection_count.fetch_sub(1, Ordering::Relaxed);
    Ok(())
}

/// Server messages answering one client message
fn replies_for(message: &Value) -> Vec<Value> {
    if let Some(input) = message.get("realtimeInput") {
        if input.get("audio").is_some() {
            return vec![json!({
                "serverContent": {"inputTranscription": {"text": MOCK_INPUT_TRANSCRIPT}}
            })];
        }
        if input.get("activityEnd").is_some() {
            return vec![
                json!({
                    "serverContent": {
                        "modelTurn": {"parts": [
                            {"text": MOCK_MODEL_TEXT},
                            {"inlineData": {
                                "mimeType": "audio/pcm;rate=24000",
                                "data": BASE64_STANDARD.encode(MOCK_MODEL_AUDIO),
                            }},
                        ]}
                    }
                }),
                json!({"usageMetadata": {"totalTokenCount": 42}}),
                json!({"serverContent": {"turnComplete": true}}),
            ];
        }
        return Vec::new();
    }

    if let Some(content) = message.get("clientContent") {
        let text = content["turns"][0]["parts"][0]["text"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        return vec![
            json!({"serverContent": {"outputTranscription": {"text": text}}}),
            json!({"serverContent": {"turnComplete": true}}),
        ];
    }

    Vec::new()
}

/// Start the mock on an ephemeral port and return its address
pub async fn spawn_gemini_mock(state: Arc<GeminiMockState>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let state = state.clone();
            tokio::spawn(async move {
                if let Err(e) = handle_gemini_connection(stream, state).await {
                    eprintln!("Mock connection error: {}", e);
                }
            });
        }
    });

    addr
}

/// Endpoint URL for a mock started with [`spawn_gemini_mock`]
pub fn mock_ws_url(addr: SocketAddr) -> String {
    format!("ws://{}/ws/live", addr)
}

/// Plain `accept_async` server that never speaks, for handshake timeouts
pub async fn spawn_mute_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                if let Ok(mut ws) = accept_async(stream).await {
                    while ws.next().await.is_some() {}
                }
            });
        }
    });

    addr
}
