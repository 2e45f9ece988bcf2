//! Storage reachability probe.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use fieldlog_core::models::PingResponse;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/ping",
    tag = "fieldlog",
    responses(
        (status = 200, description = "Storage reachable", body = PingResponse),
        (status = 500, description = "Storage unreachable", body = PingResponse)
    )
)]
pub async fn ping(State(state): State<Arc<AppState>>) -> (StatusCode, Json<PingResponse>) {
    // Any round-trip through the gateway proves the backend is reachable;
    // absence of the ledger is a perfectly healthy answer.
    let ok = state.storage.exists(&state.config.ledger_key).await.is_ok();
    let status = if ok {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(PingResponse { ok }))
}
