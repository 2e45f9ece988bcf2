//! Minimal HTML gallery of recently stored images.

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{extract::State, response::Html};
use std::sync::Arc;

const GALLERY_LIMIT: usize = 120;

pub async fn gallery(
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, HttpAppError> {
    let keys = state
        .storage
        .list(&state.config.images_prefix, GALLERY_LIMIT)
        .await?;

    let cards: String = keys
        .iter()
        .filter_map(|key| key.rsplit('/').next())
        .map(|name| {
            format!(
                "<div style='margin:8px'><img src='/images/{name}' \
                 style='max-width:240px;display:block'><small>{name}</small></div>"
            )
        })
        .collect();

    Ok(Html(format!(
        "<html><body style='font-family:sans-serif;padding:12px'><h3>Gallery</h3>\
         <div style='display:flex;flex-wrap:wrap'>{cards}</div></body></html>"
    )))
}
