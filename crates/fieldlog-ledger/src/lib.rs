//! Fieldlog Ledger Library
//!
//! Append-only XLSX task ledger backed by the storage gateway, with a
//! plain-text fallback log for total ledger failure.

pub mod writer;

pub use writer::{LedgerAppendOutcome, LedgerError, LedgerWriter};
