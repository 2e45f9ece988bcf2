//! GPS EXIF embedding.
//!
//! Splices a freshly built GPS EXIF block into the canonical JPEG. The
//! segment swap leaves pixel data byte-identical; only the APP1 metadata
//! segment changes.

use crate::geo::{encode, Axis};
use crate::gps_exif;
use bytes::Bytes;
use img_parts::jpeg::Jpeg;
use img_parts::ImageEXIF;
use std::fs;
use std::path::Path;

/// Outcome of the geotag stage. Never escalates to a request failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeotagOutcome {
    /// GPS block written into the image
    Written,
    /// Latitude/longitude missing or non-numeric; image untouched
    SkippedInvalidInput,
    /// Load/serialize/save failed; image left as it was
    Failed(String),
}

impl GeotagOutcome {
    pub fn written(&self) -> bool {
        matches!(self, GeotagOutcome::Written)
    }
}

/// Embed GPS coordinates into the JPEG at `path`.
///
/// `lat_str`/`lon_str` are the raw form-field strings; anything that does
/// not parse as a finite float skips the stage. Any pre-existing EXIF block
/// is discarded as untrusted and replaced wholesale with the GPS-only block.
pub fn write_geotag(path: &Path, lat_str: &str, lon_str: &str) -> GeotagOutcome {
    let (lat, lon) = match (
        lat_str.trim().parse::<f64>(),
        lon_str.trim().parse::<f64>(),
    ) {
        (Ok(lat), Ok(lon)) if lat.is_finite() && lon.is_finite() => (lat, lon),
        _ => {
            tracing::info!(lat = %lat_str, lon = %lon_str, "Skipping geotag: invalid lat/lon");
            return GeotagOutcome::SkippedInvalidInput;
        }
    };

    match embed(path, lat, lon) {
        Ok(()) => GeotagOutcome::Written,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Geotag write failed");
            GeotagOutcome::Failed(e.to_string())
        }
    }
}

fn embed(path: &Path, lat: f64, lon: f64) -> Result<(), anyhow::Error> {
    let data = fs::read(path)?;
    let mut jpeg = Jpeg::from_bytes(Bytes::from(data))?;

    if let Some(existing) = jpeg.exif() {
        // Corrupt blocks parse to an error here; either way the old block goes.
        let fields = exif::Reader::new()
            .read_raw(existing.to_vec())
            .map(|e| e.fields().count())
            .unwrap_or(0);
        tracing::debug!(fields, "Replacing existing EXIF block");
    }

    let lat_coord = encode(lat, Axis::Latitude);
    let lon_coord = encode(lon, Axis::Longitude);
    let block = gps_exif::build(&lat_coord, &lon_coord);

    jpeg.set_exif(Some(Bytes::from(block)));

    let out = jpeg.encoder().bytes();
    fs::write(path, &out)?;

    Ok(())
}
