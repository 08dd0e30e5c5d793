//! Router assembly
//!
//! - `web` - Browser client (`/`, `/static/*`)
//! - `api` - Health check (`/health`)
//! - `live` - Relay WebSocket (`/ws`)

pub mod api;
pub mod live;
pub mod web;

use std::sync::Arc;

use axum::Router;
use http::{HeaderValue, Method, header};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::info;

use crate::state::AppState;

/// Build the full application: every route plus CORS and security headers.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(state.config.cors_origins().as_deref());

    let security_headers = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ));

    web::create_web_router(&state.config.static_dir)
        .merge(api::create_api_router())
        .merge(live::create_live_router())
        .with_state(state)
        .layer(cors)
        .layer(security_headers)
}

/// CORS policy for the configured origins.
///
/// `*` allows any origin without credentials. Without configured origins no
/// `allow_origin` is set, so browsers keep requests same-origin.
pub fn cors_layer(origins: Option<&[String]>) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    match origins {
        Some(origins) if origins.iter().any(|o| o == "*") => base.allow_origin(Any),
        Some(origins) => {
            let origins: Vec<HeaderValue> =
                origins.iter().filter_map(|o| o.parse().ok()).collect();
            base.allow_origin(origins).allow_credentials(true)
        }
        None => {
            info!(
                "CORS not configured, defaulting to same-origin only. \
                 Set CORS_ALLOWED_ORIGINS to enable cross-origin access."
            );
            base
        }
    }
}
