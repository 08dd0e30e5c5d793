//! Server Startup Tests
//!
//! HTTP routes via `oneshot`, plus a full browser-to-Gemini relay over real
//! sockets against the mock Gemini server.

mod mock_providers;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{body::Body, http::Request, http::StatusCode};
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tower::util::ServiceExt;

use gemini_relay::{ServerConfig, routes, state::AppState};
use mock_providers::websocket_mock::{
    GeminiMockState, MOCK_INPUT_TRANSCRIPT, MOCK_MODEL_AUDIO, MOCK_MODEL_TEXT, MockBehavior,
    mock_ws_url, spawn_gemini_mock,
};

type ClientSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

const FRAME_TIMEOUT: Duration = Duration::from_secs(5);

/// Helper function to create a minimal test configuration
fn create_test_config(api_key: &str, ws_url: String, static_dir: PathBuf) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 8000,
        tls: None,
        gemini_api_key: api_key.to_string(),
        gemini_model: "gemini-2.0-flash-exp".to_string(),
        gemini_voice: "Aoede".to_string(),
        gemini_language_code: "es-US".to_string(),
        gemini_ws_url: ws_url,
        flush_interval_bytes: 160_000,
        log_level: "INFO".to_string(),
        static_dir,
        cors_allowed_origins: None,
    }
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap()
        .to_vec()
}

// =============================================================================
// HTTP routes
// =============================================================================

#[tokio::test]
async fn test_health_reports_api_key() {
    let config = create_test_config("secret", "ws://unused".to_string(), PathBuf::from("static"));
    let app = routes::api::create_api_router().with_state(AppState::new(config));

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(
        body,
        json!({
            "status": "ok",
            "service": "gemini-live-api-test",
            "api_key_configured": true
        })
    );
}

#[tokio::test]
async fn test_health_without_api_key() {
    let config = create_test_config("  ", "ws://unused".to_string(), PathBuf::from("static"));
    let app = routes::api::create_api_router().with_state(AppState::new(config));

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["api_key_configured"], false);
    assert!(!body.to_string().contains("secret"));
}

#[tokio::test]
async fn test_static_client_served() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>relay</h1>").unwrap();
    std::fs::write(dir.path().join("app.js"), "console.log('relay');").unwrap();

    let config = create_test_config("key", "ws://unused".to_string(), dir.path().to_path_buf());
    let app = routes::create_router(AppState::new(config));

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"<h1>relay</h1>");

    let request = Request::builder()
        .uri("/static/app.js")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let request = Request::builder()
        .uri("/static/missing.js")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// WebSocket relay
// =============================================================================

async fn start_relay(behavior: MockBehavior) -> (SocketAddr, Arc<GeminiMockState>) {
    let mock = GeminiMockState::with_binary_frames(behavior);
    let gemini_addr = spawn_gemini_mock(mock.clone()).await;

    let config = create_test_config(
        "test-key",
        mock_ws_url(gemini_addr),
        PathBuf::from("static"),
    );
    let app = routes::create_router(AppState::new(config));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service()).await.ok();
    });

    (addr, mock)
}

async fn next_frame(ws: &mut ClientSocket) -> Message {
    loop {
        let msg = timeout(FRAME_TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for frame")
            .expect("socket ended")
            .expect("socket error");
        if !matches!(msg, Message::Ping(_) | Message::Pong(_)) {
            return msg;
        }
    }
}

async fn next_json(ws: &mut ClientSocket) -> Value {
    match next_frame(ws).await {
        Message::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
        other => panic!("expected text frame, got {other:?}"),
    }
}

async fn send_json(ws: &mut ClientSocket, value: Value) {
    ws.send(Message::Text(value.to_string().into())).await.unwrap();
}

#[tokio::test]
async fn test_relay_text_turn() {
    let (addr, _mock) = start_relay(MockBehavior::Normal).await;
    let (mut ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();

    assert_eq!(
        next_json(&mut ws).await,
        json!({"type": "status", "message": "Connected to Gemini Live API"})
    );

    send_json(&mut ws, json!({"type": "ping"})).await;
    assert_eq!(next_json(&mut ws).await, json!({"type": "pong"}));

    send_json(&mut ws, json!({"type": "text", "content": "Hola"})).await;
    assert_eq!(
        next_json(&mut ws).await,
        json!({"type": "output_transcription", "text": "Hola"})
    );
    assert_eq!(
        next_json(&mut ws).await,
        json!({"type": "model_state", "state": "listening"})
    );
    assert_eq!(next_json(&mut ws).await, json!({"type": "turn_complete"}));

    ws.close(None).await.unwrap();
}

#[tokio::test]
async fn test_relay_audio_turn() {
    let (addr, mock) = start_relay(MockBehavior::Normal).await;
    let (mut ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    next_json(&mut ws).await;

    send_json(&mut ws, json!({"type": "activity_start"})).await;
    ws.send(Message::Binary(vec![0u8; 3200].into())).await.unwrap();
    assert_eq!(
        next_json(&mut ws).await,
        json!({"type": "input_transcription", "text": MOCK_INPUT_TRANSCRIPT})
    );

    send_json(&mut ws, json!({"type": "activity_end"})).await;
    assert_eq!(
        next_json(&mut ws).await,
        json!({"type": "model_state", "state": "speaking"})
    );
    assert_eq!(
        next_json(&mut ws).await,
        json!({"type": "output_transcription", "text": MOCK_MODEL_TEXT})
    );
    match next_frame(&mut ws).await {
        Message::Binary(data) => assert_eq!(data.as_ref(), MOCK_MODEL_AUDIO.as_slice()),
        other => panic!("expected binary audio, got {other:?}"),
    }
    assert_eq!(
        next_json(&mut ws).await,
        json!({"type": "model_state", "state": "listening"})
    );
    assert_eq!(next_json(&mut ws).await, json!({"type": "turn_complete"}));

    ws.close(None).await.unwrap();

    let audio = mock
        .received_of("realtimeInput")
        .into_iter()
        .filter(|m| m["realtimeInput"].get("audio").is_some())
        .count();
    assert_eq!(audio, 1);
}

#[tokio::test]
async fn test_relay_reports_rejected_session() {
    let (addr, _mock) = start_relay(MockBehavior::RejectSetup).await;
    let (mut ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();

    let error = next_json(&mut ws).await;
    assert_eq!(error["type"], "error");
    assert!(
        error["message"]
            .as_str()
            .unwrap()
            .contains("API key not valid")
    );

    assert!(matches!(next_frame(&mut ws).await, Message::Close(_)));
}

#[tokio::test]
async fn test_relay_reports_dropped_session() {
    let (addr, _mock) = start_relay(MockBehavior::DropAfterSetup).await;
    let (mut ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    next_json(&mut ws).await;

    send_json(&mut ws, json!({"type": "text", "content": "Hola"})).await;

    let error = next_json(&mut ws).await;
    assert_eq!(error["type"], "error");
    assert!(matches!(next_frame(&mut ws).await, Message::Close(_)));
}
