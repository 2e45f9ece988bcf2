//! Upload handler: multipart extraction, hard-precondition checks, pipeline
//! invocation, storage upload, URL resolution, and ledger append.

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Multipart, State},
    http::{header, HeaderMap},
    Json,
};
use chrono::Utc;
use fieldlog_core::models::{LedgerRow, UploadResponse};
use fieldlog_core::AppError;
use fieldlog_processing::UploadContext;
use std::path::Path;
use std::sync::Arc;

/// Fields extracted from the multipart form.
#[derive(Debug, Default)]
struct UploadForm {
    image: Option<(String, Vec<u8>)>,
    task_id: String,
    station_id: String,
    note: String,
    latitude: String,
    longitude: String,
}

#[utoipa::path(
    post,
    path = "/upload",
    tag = "fieldlog",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image processed and recorded", body = UploadResponse),
        (status = 400, description = "Missing task id or image", body = ErrorResponse),
        (status = 413, description = "Payload too large", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, headers, multipart), fields(operation = "upload"))]
pub async fn upload(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, HttpAppError> {
    let form = extract_form(multipart).await?;

    // Hard preconditions; nothing has touched disk or storage yet.
    let (original_filename, data) = form
        .image
        .ok_or_else(|| AppError::InvalidInput("no image part".to_string()))?;
    if form.task_id.is_empty() {
        return Err(AppError::InvalidInput("task_id required".to_string()).into());
    }
    if original_filename.is_empty() {
        return Err(AppError::InvalidInput("empty filename".to_string()).into());
    }
    if data.is_empty() {
        return Err(AppError::InvalidInput("empty image payload".to_string()).into());
    }
    if data.len() > state.config.max_upload_size_bytes {
        return Err(AppError::PayloadTooLarge(format!(
            "payload exceeds {} MB",
            state.config.max_upload_size_bytes / 1024 / 1024
        ))
        .into());
    }

    let timestamp = Utc::now();

    // Request-unique working file: task id + timestamp + original name.
    // Both user-supplied parts are reduced to safe base names first.
    let work_name = format!(
        "{}_{}_{}",
        sanitize_filename(&form.task_id),
        timestamp.format("%Y%m%d%H%M%S"),
        sanitize_filename(&original_filename)
    );
    tokio::fs::create_dir_all(&state.config.work_dir)
        .await
        .map_err(|e| AppError::Internal(format!("cannot create work dir: {}", e)))?;
    let work_path = state.config.work_dir.join(&work_name);
    tokio::fs::write(&work_path, &data)
        .await
        .map_err(|e| AppError::Internal(format!("cannot write working file: {}", e)))?;

    let ctx = UploadContext {
        task_id: form.task_id.clone(),
        station_id: form.station_id.clone(),
        latitude: form.latitude.clone(),
        longitude: form.longitude.clone(),
        timestamp,
    };

    let processed = state
        .pipeline
        .process(work_path, ctx)
        .await
        .map_err(|e| AppError::ImageProcessing(e.to_string()))?;

    // Persist the final image
    let final_bytes = tokio::fs::read(&processed.path)
        .await
        .map_err(|e| AppError::Internal(format!("cannot read processed image: {}", e)))?;
    let image_key = state.config.image_key(&processed.file_name);
    state
        .storage
        .put(&image_key, final_bytes, "image/jpeg")
        .await?;

    let image_url = resolve_image_url(&state, &headers, &processed.file_name);

    // Ledger append is best-effort: it degrades internally, and even a total
    // failure must not undo an already-stored image.
    let row = LedgerRow {
        task_id: form.task_id,
        station_id: form.station_id,
        note: form.note,
        image_name: processed.file_name.clone(),
        latitude: form.latitude,
        longitude: form.longitude,
        timestamp,
        image_url: image_url.clone(),
    };
    if let Err(e) = state.ledger.append_row(&row).await {
        tracing::error!(error = %e, "Ledger append failed beyond fallback; row lost");
    }

    // Working file cleanup is best-effort
    if let Err(e) = tokio::fs::remove_file(&processed.path).await {
        tracing::warn!(path = %processed.path.display(), error = %e, "Working file cleanup failed");
    }

    Ok(Json(UploadResponse {
        ok: true,
        saved: processed.file_name.clone(),
        url: image_url,
        exif_gps_written: processed.geotag_written(),
        stamped: processed.stamped(),
    }))
}

/// Pull the image part and text fields out of the multipart form.
async fn extract_form(mut multipart: Multipart) -> Result<UploadForm, HttpAppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("failed to read multipart: {}", e)))?
    {
        let name = field.name().map(|s| s.to_string()).unwrap_or_default();
        match name.as_str() {
            "image" => {
                let filename = field.file_name().map(|s| s.to_string()).unwrap_or_default();
                let data = field.bytes().await.map_err(|e| {
                    AppError::InvalidInput(format!("failed to read image data: {}", e))
                })?;
                form.image = Some((filename, data.to_vec()));
            }
            "task_id" => form.task_id = text_field(field).await?,
            "station_id" => form.station_id = text_field(field).await?,
            "note" => form.note = text_field(field).await?,
            "latitude" => form.latitude = text_field(field).await?,
            "longitude" => form.longitude = text_field(field).await?,
            _ => {}
        }
    }

    Ok(form)
}

async fn text_field(field: axum::extract::multipart::Field<'_>) -> Result<String, HttpAppError> {
    Ok(field
        .text()
        .await
        .map_err(|e| AppError::InvalidInput(format!("failed to read form field: {}", e)))?
        .trim()
        .to_string())
}

/// Keep only the base name; uploaded names must never traverse the work dir.
fn sanitize_filename(filename: &str) -> String {
    Path::new(filename)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "upload".to_string())
        .replace(['\\', ':'], "_")
}

/// Public base URL when configured, else a proxy URL on this host.
fn resolve_image_url(state: &AppState, headers: &HeaderMap, file_name: &str) -> String {
    if let Some(base) = &state.config.base_url {
        return format!("{}/images/{}", base.trim_end_matches('/'), file_name);
    }
    match headers.get(header::HOST).and_then(|h| h.to_str().ok()) {
        Some(host) => format!("http://{}/images/{}", host, file_name),
        None => format!("/images/{}", file_name),
    }
}
