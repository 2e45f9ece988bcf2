//! Fieldlog Storage Library
//!
//! Storage gateway abstraction and implementations. The pipeline only ever
//! talks to the `Storage` trait; the concrete backend (S3-compatible object
//! store or local filesystem) is chosen at configuration time by the factory.
//!
//! # Storage key format
//!
//! Keys are flat, slash-separated object names, e.g. `images/{filename}` for
//! uploaded photos and `TaskLog.xlsx` for the ledger document. Keys must not
//! contain `..` or a leading `/`.

pub mod factory;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use fieldlog_core::StorageBackend;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{ByteStream, Storage, StorageError, StorageResult};
