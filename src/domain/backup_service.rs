//! Backup manager.
//!
//! Snapshots the full dataset (password included) as JSON into the
//! key-value store under a timestamp-derived key, and lists, restores and
//! deletes those snapshots. Retention is unbounded; there is deliberately
//! no eviction policy here.

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use log::{info, warn};
use serde::Serialize;
use std::sync::Arc;

use crate::error::DataError;
use crate::storage::KeyValueStore;

use super::export_service::{ExportOptions, ExportService};
use super::import_service::{ImportOptions, ImportOutcome, ImportService};

/// Key namespace backups live under; the suffix is the creation instant
/// in epoch milliseconds, so lexicographic order is creation order.
pub const BACKUP_KEY_PREFIX: &str = "backup_";

/// One stored backup, as shown to the user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupInfo {
    pub key: String,
    /// Human-readable creation time decoded from the key.
    pub date: String,
    /// Approximate payload size, e.g. `"12 KB"`.
    pub size: String,
}

pub struct BackupService {
    export: ExportService,
    store: Arc<dyn KeyValueStore>,
}

impl BackupService {
    pub fn new(export: ExportService, store: Arc<dyn KeyValueStore>) -> Self {
        Self { export, store }
    }

    /// Snapshot the entire dataset and persist it under a fresh
    /// timestamp-derived key. Returns the key.
    pub fn create_backup(&self) -> Result<String> {
        let artifact = self.export.export_data(&ExportOptions::full_json())?;
        let content =
            String::from_utf8(artifact.bytes).context("Backup artifact was not valid UTF-8")?;

        let key = format!("{}{}", BACKUP_KEY_PREFIX, Utc::now().timestamp_millis());
        self.store.set(&key, &content)?;
        info!(
            "💾 BACKUP: Created '{}' ({} KB)",
            key,
            kilobytes(content.len())
        );
        Ok(key)
    }

    /// All stored backups, newest first. Keys whose suffix does not decode
    /// to a timestamp are skipped with a warning.
    pub fn list_backups(&self) -> Result<Vec<BackupInfo>> {
        let mut backups = Vec::new();

        for key in self.store.keys()? {
            if !key.starts_with(BACKUP_KEY_PREFIX) {
                continue;
            }
            let millis: i64 = match key[BACKUP_KEY_PREFIX.len()..].parse() {
                Ok(millis) => millis,
                Err(_) => {
                    warn!("⚠️ BACKUP: Ignoring malformed backup key '{}'", key);
                    continue;
                }
            };
            let date = match Utc.timestamp_millis_opt(millis).single() {
                Some(instant) => instant.format("%Y-%m-%d %H:%M:%S").to_string(),
                None => {
                    warn!("⚠️ BACKUP: Ignoring out-of-range backup key '{}'", key);
                    continue;
                }
            };
            let size_bytes = self.store.get(&key)?.map(|v| v.len()).unwrap_or(0);

            backups.push(BackupInfo {
                key,
                date,
                size: format!("{} KB", kilobytes(size_bytes)),
            });
        }

        backups.sort_by(|a, b| b.key.cmp(&a.key));
        Ok(backups)
    }

    /// Re-import a stored backup. Restores run with full overwrite and
    /// never trigger a nested backup.
    pub fn restore_from_backup(
        &self,
        key: &str,
        import: &ImportService,
    ) -> Result<ImportOutcome> {
        let content = self
            .store
            .get(key)?
            .ok_or_else(|| DataError::BackupNotFound(key.to_string()))?;

        info!("💾 BACKUP: Restoring from '{}'", key);
        Ok(import.import_data(&content, "json", &ImportOptions::for_restore()))
    }

    /// Remove a backup. Deleting a key that does not exist is a no-op.
    pub fn delete_backup(&self, key: &str) -> Result<()> {
        self.store.delete(key)?;
        info!("💾 BACKUP: Deleted '{}'", key);
        Ok(())
    }
}

fn kilobytes(bytes: usize) -> u64 {
    (bytes as f64 / 1024.0).round() as u64
}
