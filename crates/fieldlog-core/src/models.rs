//! Shared wire and ledger models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Header row of the ledger sheet; column order is the row column order.
pub const LEDGER_HEADER: [&str; 8] = [
    "Task ID",
    "Station ID",
    "Note",
    "Image Name",
    "Latitude",
    "Longitude",
    "Timestamp",
    "Image URL",
];

/// One row of the upload ledger. Columns map 1:1 to `LEDGER_HEADER`;
/// the image URL column additionally carries a hyperlink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerRow {
    pub task_id: String,
    pub station_id: String,
    pub note: String,
    pub image_name: String,
    pub latitude: String,
    pub longitude: String,
    pub timestamp: DateTime<Utc>,
    pub image_url: String,
}

impl LedgerRow {
    /// Cell values in column order. Timestamp is rendered `YYYY-MM-DD HH:MM:SS`.
    pub fn cells(&self) -> [String; 8] {
        [
            self.task_id.clone(),
            self.station_id.clone(),
            self.note.clone(),
            self.image_name.clone(),
            self.latitude.clone(),
            self.longitude.clone(),
            self.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            self.image_url.clone(),
        ]
    }

    /// Tab-delimited rendering for the plain-text fallback log.
    pub fn to_fallback_line(&self) -> String {
        self.cells().join("\t")
    }
}

/// Response for a processed upload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub ok: bool,
    /// Stored file name (always ends in `.jpg`)
    pub saved: String,
    /// Retrieval URL for the stored image
    pub url: String,
    /// Whether GPS EXIF was written into the image
    pub exif_gps_written: bool,
    /// Whether the caption overlay was stamped onto the pixels
    pub stamped: bool,
}

/// Response for the storage reachability probe.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PingResponse {
    pub ok: bool,
}
