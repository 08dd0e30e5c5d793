//! Browser client routes

use axum::Router;
use tower_http::services::{ServeDir, ServeFile};

use crate::state::AppState;
use std::path::Path;
use std::sync::Arc;

/// Create the router serving the browser client
///
/// # Endpoints
///
/// - `GET /` - `index.html` from the static directory
/// - `GET /static/*` - Any file under the static directory
pub fn create_web_router(static_dir: &Path) -> Router<Arc<AppState>> {
    Router::new()
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .nest_service("/static", ServeDir::new(static_dir))
}
