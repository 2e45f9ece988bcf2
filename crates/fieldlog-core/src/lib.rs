//! Fieldlog Core Library
//!
//! This crate provides the shared domain models, error types, and configuration
//! used across all Fieldlog components.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{LedgerRow, PingResponse, UploadResponse, LEDGER_HEADER};
pub use storage_types::StorageBackend;
