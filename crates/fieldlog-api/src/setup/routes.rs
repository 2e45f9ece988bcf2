//! Router assembly.

use crate::api_doc::openapi_json;
use crate::handlers::{gallery, health, media_get, root, upload};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    let max_body = state.config.max_upload_size_bytes;

    Router::new()
        .route("/", get(root::root))
        .route("/ping", get(health::ping))
        .route("/upload", post(upload::upload))
        .route("/images/{name}", get(media_get::get_image))
        .route("/gallery", get(gallery::gallery))
        .route("/api-doc/openapi.json", get(openapi_json))
        .layer(DefaultBodyLimit::max(max_body))
        .layer(cors_layer(state.config.cors_origins()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Field devices post from file:// contexts and ad-hoc frontends, so the
/// default is wide open, matching `CORS_ORIGINS=*`.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| o.parse::<HeaderValue>().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods(Any)
        .allow_headers(Any)
}
