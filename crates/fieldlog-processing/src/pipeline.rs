//! The upload processing pipeline.
//!
//! Chains normalize -> geotag -> stamp over a request-unique working file.
//! Stages run strictly in order; the two enrichment stages report their own
//! outcomes and never fail the pipeline. Image work is CPU-bound and runs
//! under `spawn_blocking`.

use crate::geotag::{write_geotag, GeotagOutcome};
use crate::normalize::normalize;
use crate::stamp::{stamp, StampOptions, StampOutcome};
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Request metadata carried through the pipeline.
#[derive(Debug, Clone)]
pub struct UploadContext {
    pub task_id: String,
    pub station_id: String,
    pub latitude: String,
    pub longitude: String,
    pub timestamp: DateTime<Utc>,
}

/// Result of a pipeline run. `geotag`/`stamp` are `None` when the stage is
/// disabled by configuration.
#[derive(Debug)]
pub struct ProcessedImage {
    pub path: PathBuf,
    pub file_name: String,
    pub geotag: Option<GeotagOutcome>,
    pub stamp: Option<StampOutcome>,
}

impl ProcessedImage {
    pub fn geotag_written(&self) -> bool {
        self.geotag.as_ref().map(|g| g.written()).unwrap_or(false)
    }

    pub fn stamped(&self) -> bool {
        self.stamp.as_ref().map(|s| s.stamped()).unwrap_or(false)
    }
}

/// Pipeline configuration and entry point.
#[derive(Debug, Clone)]
pub struct UploadPipeline {
    pub jpeg_quality: u8,
    pub geotag_enabled: bool,
    pub stamp_enabled: bool,
    pub stamp_options: StampOptions,
}

impl Default for UploadPipeline {
    fn default() -> Self {
        UploadPipeline {
            jpeg_quality: 95,
            geotag_enabled: true,
            stamp_enabled: true,
            stamp_options: StampOptions::default(),
        }
    }
}

impl UploadPipeline {
    /// Process the working file at `source_path` through all stages.
    ///
    /// Only normalization can fail the pipeline (an undecodable image means
    /// there is nothing to upload). Returns the canonical path plus per-stage
    /// outcomes for the response flags.
    pub async fn process(
        &self,
        source_path: PathBuf,
        ctx: UploadContext,
    ) -> Result<ProcessedImage, anyhow::Error> {
        let pipeline = self.clone();
        tokio::task::spawn_blocking(move || pipeline.process_blocking(source_path, &ctx)).await?
    }

    fn process_blocking(
        &self,
        source_path: PathBuf,
        ctx: &UploadContext,
    ) -> Result<ProcessedImage, anyhow::Error> {
        let canonical = normalize(&source_path, self.jpeg_quality)?;
        let file_name = canonical
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| anyhow::anyhow!("working path has no file name"))?;

        let geotag = self
            .geotag_enabled
            .then(|| write_geotag(&canonical, &ctx.latitude, &ctx.longitude));

        let stamp_outcome = self.stamp_enabled.then(|| {
            let lines = caption_lines(ctx, &file_name);
            stamp(&canonical, &lines, &self.stamp_options)
        });

        tracing::info!(
            file = %file_name,
            geotag = ?geotag,
            stamped = stamp_outcome.as_ref().map(|s| s.stamped()),
            "Pipeline complete"
        );

        Ok(ProcessedImage {
            path: canonical,
            file_name,
            geotag,
            stamp: stamp_outcome,
        })
    }
}

/// Caption block burned onto every stamped photo.
fn caption_lines(ctx: &UploadContext, file_name: &str) -> Vec<String> {
    vec![
        format!("Task: {}  |  Station: {}", ctx.task_id, ctx.station_id),
        format!("Lat: {}  |  Lon: {}", ctx.latitude, ctx.longitude),
        format!("Time: {}", ctx.timestamp.format("%Y-%m-%d %H:%M:%S")),
        format!("File: {}", file_name),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use tempfile::tempdir;

    fn ctx() -> UploadContext {
        UploadContext {
            task_id: "T1".to_string(),
            station_id: "S9".to_string(),
            latitude: "24.7136".to_string(),
            longitude: "46.6753".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_full_pipeline_png_input() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("T1_20260101120000_photo.png");
        RgbaImage::from_pixel(320, 240, Rgba([50, 50, 50, 255]))
            .save(&path)
            .unwrap();

        let result = UploadPipeline::default()
            .process(path.clone(), ctx())
            .await
            .unwrap();

        assert!(result.file_name.ends_with(".jpg"));
        assert!(result.path.exists());
        assert!(!path.exists(), "original PNG must be removed");
        assert!(result.geotag_written());
        assert!(result.stamped());
    }

    #[tokio::test]
    async fn test_invalid_coordinates_skip_geotag_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("T1_20260101120000_photo.jpg");
        RgbImage::from_pixel(320, 240, Rgb([50, 50, 50]))
            .save(&path)
            .unwrap();

        let mut context = ctx();
        context.latitude = String::new();
        context.longitude = String::new();

        let result = UploadPipeline::default()
            .process(path, context)
            .await
            .unwrap();

        assert!(!result.geotag_written());
        assert_eq!(result.geotag, Some(GeotagOutcome::SkippedInvalidInput));
        assert!(result.stamped());
    }

    #[tokio::test]
    async fn test_disabled_stages_report_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.jpg");
        RgbImage::from_pixel(64, 64, Rgb([0, 0, 0])).save(&path).unwrap();

        let pipeline = UploadPipeline {
            geotag_enabled: false,
            stamp_enabled: false,
            ..UploadPipeline::default()
        };
        let result = pipeline.process(path, ctx()).await.unwrap();

        assert!(result.geotag.is_none());
        assert!(result.stamp.is_none());
        assert!(!result.geotag_written());
        assert!(!result.stamped());
    }

    #[tokio::test]
    async fn test_undecodable_input_fails_pipeline() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.png");
        std::fs::write(&path, b"not an image").unwrap();

        let result = UploadPipeline::default().process(path, ctx()).await;
        assert!(result.is_err());
    }
}
