//! Application state shared across handlers.

use fieldlog_core::Config;
use fieldlog_ledger::LedgerWriter;
use fieldlog_processing::UploadPipeline;
use fieldlog_storage::Storage;
use std::sync::Arc;

/// Shared state: configuration, the storage gateway handle (connected once
/// at startup), the ledger writer, and the pipeline settings.
pub struct AppState {
    pub config: Config,
    pub storage: Arc<dyn Storage>,
    pub ledger: LedgerWriter,
    pub pipeline: UploadPipeline,
}

impl AppState {
    pub fn new(config: Config, storage: Arc<dyn Storage>) -> Self {
        let ledger = LedgerWriter::new(
            storage.clone(),
            config.ledger_key.clone(),
            config.ledger_sheet.clone(),
            config.fallback_log_key.clone(),
            config.work_dir.clone(),
        );

        let pipeline = UploadPipeline {
            jpeg_quality: config.jpeg_quality,
            geotag_enabled: config.geotag_enabled,
            stamp_enabled: config.stamp_enabled,
            stamp_options: fieldlog_processing::StampOptions {
                scale: config.stamp_scale,
                margin: config.stamp_margin,
                line_spacing: config.stamp_spacing,
                jpeg_quality: config.jpeg_quality,
            },
        };

        AppState {
            config,
            storage,
            ledger,
            pipeline,
        }
    }
}
