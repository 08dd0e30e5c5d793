use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

/// Service name reported by the health check
pub const SERVICE_NAME: &str = "gemini-live-api-test";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub api_key_configured: bool,
}

/// Health check handler
///
/// Reports whether a Gemini API key is configured without revealing it.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: SERVICE_NAME,
        api_key_configured: state.config.has_api_key(),
    })
}
