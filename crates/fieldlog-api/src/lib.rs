//! Fieldlog API
//!
//! Thin HTTP layer over the upload pipeline: multipart upload, image proxy,
//! gallery, and health probe. All pipeline logic lives in the processing,
//! storage, and ledger crates; handlers here only wire them together.

pub mod api_doc;
pub mod error;
pub mod handlers;
pub mod setup;
pub mod state;
pub mod telemetry;
