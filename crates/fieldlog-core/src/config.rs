//! Configuration module
//!
//! Environment-driven configuration for the upload service: server, storage
//! backend selection, ledger document location, and pipeline tuning knobs.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::storage_types::StorageBackend;

// Defaults
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_MAX_UPLOAD_SIZE_MB: usize = 50;
const DEFAULT_JPEG_QUALITY: u8 = 95;
const DEFAULT_IMAGES_PREFIX: &str = "images/";
const DEFAULT_LEDGER_KEY: &str = "TaskLog.xlsx";
const DEFAULT_LEDGER_SHEET: &str = "TaskLog";
const DEFAULT_FALLBACK_LOG_KEY: &str = "ledger_fallback.log";
const DEFAULT_STAMP_SCALE: u32 = 4;
const DEFAULT_STAMP_MARGIN: u32 = 16;
const DEFAULT_STAMP_SPACING: u32 = 10;

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    /// Public base URL for image links; when unset, links point at this
    /// server's own `/images/` proxy using the request host.
    pub base_url: Option<String>,
    // Storage configuration
    pub storage_backend: Option<StorageBackend>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers
    /// Set only when the bucket allows direct public reads; otherwise image
    /// links go through this server's proxy.
    pub s3_public_base_url: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    // Object keys
    pub images_prefix: String,
    pub ledger_key: String,
    pub ledger_sheet: String,
    pub fallback_log_key: String,
    // Pipeline configuration
    pub work_dir: PathBuf,
    pub max_upload_size_bytes: usize,
    pub jpeg_quality: u8,
    pub geotag_enabled: bool,
    pub stamp_enabled: bool,
    pub stamp_scale: u32,
    pub stamp_margin: u32,
    pub stamp_spacing: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let storage_backend = env::var("STORAGE_BACKEND")
            .ok()
            .map(|s| StorageBackend::from_str(&s))
            .transpose()?;

        let max_upload_size_mb = env::var("MAX_UPLOAD_SIZE_MB")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_UPLOAD_SIZE_MB);

        let work_dir = env::var("WORK_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| env::temp_dir());

        Ok(Config {
            server_port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            cors_origins,
            environment,
            base_url: env::var("BASE_URL").ok().filter(|s| !s.is_empty()),
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            s3_public_base_url: env::var("S3_PUBLIC_BASE_URL").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            images_prefix: env::var("IMAGES_PREFIX")
                .unwrap_or_else(|_| DEFAULT_IMAGES_PREFIX.to_string()),
            ledger_key: env::var("LEDGER_KEY").unwrap_or_else(|_| DEFAULT_LEDGER_KEY.to_string()),
            ledger_sheet: env::var("LEDGER_SHEET")
                .unwrap_or_else(|_| DEFAULT_LEDGER_SHEET.to_string()),
            fallback_log_key: env::var("FALLBACK_LOG_KEY")
                .unwrap_or_else(|_| DEFAULT_FALLBACK_LOG_KEY.to_string()),
            work_dir,
            max_upload_size_bytes: max_upload_size_mb * 1024 * 1024,
            jpeg_quality: env::var("JPEG_QUALITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_JPEG_QUALITY),
            geotag_enabled: env_flag("GEOTAG_ENABLED", true),
            stamp_enabled: env_flag("STAMP_ON_SAVE", true),
            stamp_scale: env::var("STAMP_SCALE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_STAMP_SCALE),
            stamp_margin: DEFAULT_STAMP_MARGIN,
            stamp_spacing: DEFAULT_STAMP_SPACING,
        })
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.cors_origins
    }

    pub fn max_upload_size_bytes(&self) -> usize {
        self.max_upload_size_bytes
    }

    /// Object key for an image name, e.g. `images/{name}`.
    pub fn image_key(&self, name: &str) -> String {
        if name.starts_with(&self.images_prefix) {
            name.to_string()
        } else {
            format!("{}{}", self.images_prefix, name)
        }
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_key_prefixing() {
        let mut config = test_config();
        config.images_prefix = "images/".to_string();
        assert_eq!(config.image_key("a.jpg"), "images/a.jpg");
        assert_eq!(config.image_key("images/a.jpg"), "images/a.jpg");
    }

    #[test]
    fn test_is_production() {
        let mut config = test_config();
        assert!(!config.is_production());
        config.environment = "Production".to_string();
        assert!(config.is_production());
    }

    fn test_config() -> Config {
        Config {
            server_port: 5000,
            cors_origins: vec!["*".to_string()],
            environment: "development".to_string(),
            base_url: None,
            storage_backend: None,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            s3_public_base_url: None,
            local_storage_path: None,
            local_storage_base_url: None,
            images_prefix: "images/".to_string(),
            ledger_key: "TaskLog.xlsx".to_string(),
            ledger_sheet: "TaskLog".to_string(),
            fallback_log_key: "ledger_fallback.log".to_string(),
            work_dir: std::env::temp_dir(),
            max_upload_size_bytes: 50 * 1024 * 1024,
            jpeg_quality: 95,
            geotag_enabled: true,
            stamp_enabled: true,
            stamp_scale: 4,
            stamp_margin: 16,
            stamp_spacing: 10,
        }
    }
}
