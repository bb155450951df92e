//! Error taxonomy for the data engine.
//!
//! Services return `anyhow::Result`, but failures that callers need to
//! branch on are raised as [`DataError`] values so they can be recovered
//! with `Error::downcast_ref`.

use thiserror::Error;

/// Failure categories surfaced by the export/import/backup engine.
#[derive(Debug, Error)]
pub enum DataError {
    /// Export requested with a format string the codec does not know.
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    /// Import file extension/content cannot be decoded. Only JSON snapshots
    /// round-trip; CSV is export-only.
    #[error("{0}")]
    UnsupportedImportFormat(String),

    /// Restore requested against a backup key that does not exist.
    #[error("Backup not found: {0}")]
    BackupNotFound(String),

    /// Underlying key-value store read/write failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Top-level export failure, wrapping the original message.
    #[error("Failed to export data: {0}")]
    ExportFailed(String),
}
