//! Append-only ledger writer.
//!
//! Every append is a full fetch-mutate-persist cycle over the XLSX document
//! in object storage: download (or bootstrap with the header row), append
//! one row, save locally, upload the whole document back. A lock/permission
//! conflict on the local save is recovered by writing a uniquely named
//! sibling and renaming it over the target. Any other failure degrades to a
//! tab-delimited line in the fallback log; the request still succeeds.
//!
//! Concurrent requests each run their own cycle against the same document,
//! so the last writer wins; rows persisted between another writer's fetch
//! and store are lost. Accepted trade-off, pinned by a test below.

use fieldlog_core::models::{LedgerRow, LEDGER_HEADER};
use fieldlog_storage::{Storage, StorageError};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use umya_spreadsheet::{reader, writer, Spreadsheet, XlsxError};

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Ledger storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Fallback append failed: {0}")]
    FallbackFailed(String),
}

/// How an append was satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerAppendOutcome {
    /// Row landed in the structured XLSX ledger
    Appended,
    /// Structured ledger unusable; row landed in the plain-text fallback log
    FellBack { reason: String },
}

/// Writer for the upload ledger document.
pub struct LedgerWriter {
    storage: Arc<dyn Storage>,
    ledger_key: String,
    sheet_name: String,
    fallback_key: String,
    work_dir: PathBuf,
}

impl LedgerWriter {
    pub fn new(
        storage: Arc<dyn Storage>,
        ledger_key: impl Into<String>,
        sheet_name: impl Into<String>,
        fallback_key: impl Into<String>,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        LedgerWriter {
            storage,
            ledger_key: ledger_key.into(),
            sheet_name: sheet_name.into(),
            fallback_key: fallback_key.into(),
            work_dir: work_dir.into(),
        }
    }

    /// Append one row, falling back to the plain-text log when the
    /// structured ledger cannot be used at all.
    pub async fn append_row(&self, row: &LedgerRow) -> Result<LedgerAppendOutcome, LedgerError> {
        match self.append_structured(row).await {
            Ok(()) => Ok(LedgerAppendOutcome::Appended),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    ledger_key = %self.ledger_key,
                    "Structured ledger append failed, degrading to fallback log"
                );
                self.append_fallback(row).await?;
                Ok(LedgerAppendOutcome::FellBack {
                    reason: e.to_string(),
                })
            }
        }
    }

    async fn append_structured(&self, row: &LedgerRow) -> Result<(), LedgerError> {
        let fetched = match self.storage.get(&self.ledger_key).await {
            Ok(bytes) => Some(bytes),
            Err(StorageError::NotFound(_)) => None,
            Err(e) => return Err(e.into()),
        };

        let local_path = self.work_dir.join(&self.ledger_key);
        let sheet_name = self.sheet_name.clone();
        let row = row.clone();

        // Workbook parse/serialize is CPU-bound; keep it off the async pool.
        let bytes = tokio::task::spawn_blocking(move || {
            mutate_workbook(fetched, local_path, &sheet_name, &row)
        })
        .await
        .map_err(|e| LedgerError::Workbook(format!("workbook task panicked: {}", e)))??;

        self.storage
            .put(&self.ledger_key, bytes, XLSX_CONTENT_TYPE)
            .await?;

        tracing::info!(ledger_key = %self.ledger_key, "Ledger row appended");
        Ok(())
    }

    /// Tab-delimited degradation path. Appends locally, then best-effort
    /// uploads the whole log so the degraded records stay durable too.
    async fn append_fallback(&self, row: &LedgerRow) -> Result<(), LedgerError> {
        let path = self.work_dir.join(&self.fallback_key);
        let line = row.to_fallback_line();

        let append = || -> std::io::Result<()> {
            fs::create_dir_all(&self.work_dir)?;
            let mut file = fs::OpenOptions::new().create(true).append(true).open(&path)?;
            writeln!(file, "{}", line)?;
            Ok(())
        };
        append().map_err(|e| LedgerError::FallbackFailed(e.to_string()))?;

        match fs::read(&path) {
            Ok(bytes) => {
                if let Err(e) = self
                    .storage
                    .put(&self.fallback_key, bytes, "text/plain")
                    .await
                {
                    tracing::warn!(error = %e, "Fallback log upload failed; local copy kept");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Fallback log unreadable after append");
            }
        }

        tracing::info!(fallback_key = %self.fallback_key, "Ledger row appended to fallback log");
        Ok(())
    }
}

/// Open-or-bootstrap, append, and persist the workbook; returns the saved
/// document bytes for re-upload.
fn mutate_workbook(
    fetched: Option<Vec<u8>>,
    local_path: PathBuf,
    sheet_name: &str,
    row: &LedgerRow,
) -> Result<Vec<u8>, LedgerError> {
    if let Some(parent) = local_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut book = match fetched {
        Some(bytes) => {
            fs::write(&local_path, bytes)?;
            reader::xlsx::read(&local_path)
                .map_err(|e| LedgerError::Workbook(format!("cannot open ledger: {}", e)))?
        }
        None => bootstrap_workbook(sheet_name)?,
    };

    let sheet = book
        .get_sheet_by_name_mut(sheet_name)
        .ok_or_else(|| LedgerError::Workbook(format!("sheet '{}' missing", sheet_name)))?;

    let next_row = sheet.get_highest_row() + 1;
    for (idx, value) in row.cells().iter().enumerate() {
        sheet
            .get_cell_mut((idx as u32 + 1, next_row))
            .set_value(value.clone());
    }
    // Column 8 carries a clickable link to the stored image.
    sheet
        .get_cell_mut((8u32, next_row))
        .get_hyperlink_mut()
        .set_url(row.image_url.clone());

    persist_workbook(&book, &local_path)?;

    Ok(fs::read(&local_path)?)
}

/// Fresh ledger: one sheet, header row only.
fn bootstrap_workbook(sheet_name: &str) -> Result<Spreadsheet, LedgerError> {
    let mut book = umya_spreadsheet::new_file();
    let sheet = book
        .get_sheet_mut(&0)
        .ok_or_else(|| LedgerError::Workbook("new workbook has no sheet".to_string()))?;
    sheet.set_name(sheet_name);
    for (idx, title) in LEDGER_HEADER.iter().enumerate() {
        sheet.get_cell_mut((idx as u32 + 1, 1u32)).set_value(*title);
    }
    Ok(book)
}

/// Save in place; when the target is locked or permission-blocked, save to a
/// uniquely named sibling and rename it over the target.
fn persist_workbook(book: &Spreadsheet, local_path: &PathBuf) -> Result<(), LedgerError> {
    match writer::xlsx::write(book, local_path) {
        Ok(()) => Ok(()),
        Err(e) if is_lock_conflict(&e) => {
            let tmp_path = local_path.with_extension(format!("{}.xlsx", uuid::Uuid::new_v4()));
            tracing::warn!(
                target = %local_path.display(),
                tmp = %tmp_path.display(),
                "Ledger file locked; writing via temporary sibling"
            );
            writer::xlsx::write(book, &tmp_path)
                .map_err(|e| LedgerError::Workbook(format!("cannot save ledger: {}", e)))?;
            fs::rename(&tmp_path, local_path)?;
            Ok(())
        }
        Err(e) => Err(LedgerError::Workbook(format!("cannot save ledger: {}", e))),
    }
}

fn is_lock_conflict(err: &XlsxError) -> bool {
    matches!(
        err,
        XlsxError::Io(e) if e.kind() == std::io::ErrorKind::PermissionDenied
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use fieldlog_storage::LocalStorage;
    use tempfile::tempdir;

    fn sample_row(task_id: &str) -> LedgerRow {
        LedgerRow {
            task_id: task_id.to_string(),
            station_id: "S9".to_string(),
            note: "ok".to_string(),
            image_name: format!("{}_20260101120000_photo.jpg", task_id),
            latitude: "24.7136".to_string(),
            longitude: "46.6753".to_string(),
            timestamp: Utc::now(),
            image_url: format!("http://localhost:5000/images/{}_photo.jpg", task_id),
        }
    }

    async fn make_writer(storage_dir: &tempfile::TempDir, work_dir: &tempfile::TempDir) -> LedgerWriter {
        let storage = Arc::new(
            LocalStorage::new(storage_dir.path(), None).await.unwrap(),
        );
        LedgerWriter::new(
            storage,
            "TaskLog.xlsx",
            "TaskLog",
            "ledger_fallback.log",
            work_dir.path(),
        )
    }

    fn open_ledger(bytes: &[u8], dir: &tempfile::TempDir) -> Spreadsheet {
        let path = dir.path().join("readback.xlsx");
        fs::write(&path, bytes).unwrap();
        reader::xlsx::read(&path).unwrap()
    }

    fn cell_value(book: &Spreadsheet, col: u32, row: u32) -> String {
        book.get_sheet_by_name("TaskLog")
            .unwrap()
            .get_value((col, row))
    }

    #[tokio::test]
    async fn test_bootstrap_creates_header_and_one_row() {
        let storage_dir = tempdir().unwrap();
        let work_dir = tempdir().unwrap();
        let ledger = make_writer(&storage_dir, &work_dir).await;

        let outcome = ledger.append_row(&sample_row("T1")).await.unwrap();
        assert_eq!(outcome, LedgerAppendOutcome::Appended);

        let bytes = ledger.storage.get("TaskLog.xlsx").await.unwrap();
        let book = open_ledger(&bytes, &work_dir);

        assert_eq!(cell_value(&book, 1, 1), "Task ID");
        assert_eq!(cell_value(&book, 8, 1), "Image URL");
        assert_eq!(cell_value(&book, 1, 2), "T1");
        assert_eq!(cell_value(&book, 5, 2), "24.7136");
        assert_eq!(
            book.get_sheet_by_name("TaskLog").unwrap().get_highest_row(),
            2
        );
    }

    #[tokio::test]
    async fn test_append_to_existing_adds_last_row() {
        let storage_dir = tempdir().unwrap();
        let work_dir = tempdir().unwrap();
        let ledger = make_writer(&storage_dir, &work_dir).await;

        ledger.append_row(&sample_row("T1")).await.unwrap();
        ledger.append_row(&sample_row("T2")).await.unwrap();
        ledger.append_row(&sample_row("T3")).await.unwrap();

        let bytes = ledger.storage.get("TaskLog.xlsx").await.unwrap();
        let book = open_ledger(&bytes, &work_dir);

        assert_eq!(
            book.get_sheet_by_name("TaskLog").unwrap().get_highest_row(),
            4
        );
        assert_eq!(cell_value(&book, 1, 2), "T1");
        assert_eq!(cell_value(&book, 1, 4), "T3");
    }

    #[tokio::test]
    async fn test_hyperlink_on_eighth_column() {
        let storage_dir = tempdir().unwrap();
        let work_dir = tempdir().unwrap();
        let ledger = make_writer(&storage_dir, &work_dir).await;

        let row = sample_row("T1");
        ledger.append_row(&row).await.unwrap();

        let bytes = ledger.storage.get("TaskLog.xlsx").await.unwrap();
        let book = open_ledger(&bytes, &work_dir);
        let sheet = book.get_sheet_by_name("TaskLog").unwrap();
        let cell = sheet.get_cell((8u32, 2u32)).unwrap();

        assert_eq!(cell.get_value(), row.image_url);
        let link = cell.get_hyperlink().expect("hyperlink set on column 8");
        assert_eq!(link.get_url(), row.image_url);
    }

    #[tokio::test]
    async fn test_corrupt_ledger_degrades_to_fallback() {
        let storage_dir = tempdir().unwrap();
        let work_dir = tempdir().unwrap();
        let ledger = make_writer(&storage_dir, &work_dir).await;

        ledger
            .storage
            .put("TaskLog.xlsx", b"definitely not a workbook".to_vec(), XLSX_CONTENT_TYPE)
            .await
            .unwrap();

        let row = sample_row("T1");
        let outcome = ledger.append_row(&row).await.unwrap();
        assert!(matches!(outcome, LedgerAppendOutcome::FellBack { .. }));

        let log = fs::read_to_string(work_dir.path().join("ledger_fallback.log")).unwrap();
        assert!(log.contains("T1"));
        assert!(log.contains(&row.image_url));
        assert_eq!(log.lines().count(), 1);

        // The degraded record is uploaded too
        let uploaded = ledger.storage.get("ledger_fallback.log").await.unwrap();
        assert!(String::from_utf8_lossy(&uploaded).contains("T1"));
    }

    /// Two writers that fetch the same document state and persist in turn:
    /// the second store overwrites the first, losing its row. This is the
    /// accepted last-writer-wins behavior, not a durability guarantee.
    #[tokio::test]
    async fn test_concurrent_cycles_are_last_writer_wins() {
        let storage_dir = tempdir().unwrap();
        let work_dir = tempdir().unwrap();
        let ledger = make_writer(&storage_dir, &work_dir).await;

        ledger.append_row(&sample_row("T1")).await.unwrap();
        // Writer B fetches now (header + T1)...
        let stale = ledger.storage.get("TaskLog.xlsx").await.unwrap();
        // ...while writer A appends and persists T2.
        ledger.append_row(&sample_row("T2")).await.unwrap();
        // Writer B persists its stale copy last.
        ledger
            .storage
            .put("TaskLog.xlsx", stale, XLSX_CONTENT_TYPE)
            .await
            .unwrap();

        // T2 is gone; the next append lands after T1.
        ledger.append_row(&sample_row("T3")).await.unwrap();
        let bytes = ledger.storage.get("TaskLog.xlsx").await.unwrap();
        let book = open_ledger(&bytes, &work_dir);
        assert_eq!(
            book.get_sheet_by_name("TaskLog").unwrap().get_highest_row(),
            3
        );
        assert_eq!(cell_value(&book, 1, 2), "T1");
        assert_eq!(cell_value(&book, 1, 3), "T3");
    }
}
