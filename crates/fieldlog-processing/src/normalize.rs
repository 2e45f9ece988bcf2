//! Canonical-format normalization.
//!
//! Every image entering the pipeline leaves this stage as a JPEG. Already
//! canonical files pass through untouched.

use image::codecs::jpeg::JpegEncoder;
use image::ImageReader;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Normalize the image at `path` to JPEG.
///
/// Idempotent: a `.jpg`/`.jpeg` input is returned unchanged with no
/// filesystem churn. Anything else is decoded, flattened to RGB8 (dropping
/// palette/alpha/grey channels), re-encoded at `quality` next to the source
/// with a `.jpg` extension, and the source is deleted. The source is only
/// removed after the destination write has succeeded, so a mid-conversion
/// failure never leaves zero files behind.
pub fn normalize(path: &Path, quality: u8) -> Result<PathBuf, anyhow::Error> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if ext == "jpg" || ext == "jpeg" {
        return Ok(path.to_path_buf());
    }

    let img = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    let rgb = img.to_rgb8();

    let out_path = path.with_extension("jpg");
    let file = fs::File::create(&out_path)?;
    let mut writer = BufWriter::new(file);
    let encoder = JpegEncoder::new_with_quality(&mut writer, quality);
    rgb.write_with_encoder(encoder)?;

    if let Err(e) = fs::remove_file(path) {
        tracing::warn!(path = %path.display(), error = %e, "Failed to remove pre-normalization source");
    }

    tracing::debug!(
        from = %path.display(),
        to = %out_path.display(),
        "Normalized image to JPEG"
    );

    Ok(out_path)
}
