//! Application setup and initialization.

pub mod routes;
pub mod server;

use crate::state::AppState;
use anyhow::{Context, Result};
use fieldlog_core::Config;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Connect the storage gateway once; the handle is shared for the
    // process lifetime.
    let storage = fieldlog_storage::create_storage(&config)
        .await
        .context("Failed to initialize storage backend")?;

    tracing::info!(
        backend = %storage.backend_type(),
        images_prefix = %config.images_prefix,
        ledger_key = %config.ledger_key,
        "Storage gateway ready"
    );

    let state = Arc::new(AppState::new(config, storage));
    let router = routes::build_router(state.clone());

    Ok((state, router))
}
