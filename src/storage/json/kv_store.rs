//! File-backed key-value store.
//!
//! One file per key under `store/`. Keys are restricted to a filename-safe
//! alphabet so a key can never escape the store directory.

use anyhow::Result;
use std::fs;
use std::io;
use std::path::PathBuf;

use crate::error::DataError;
use crate::storage::traits::KeyValueStore;

use super::connection::JsonConnection;

#[derive(Clone)]
pub struct FileKvStore {
    connection: JsonConnection,
}

impl FileKvStore {
    pub fn new(connection: JsonConnection) -> Self {
        Self { connection }
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf> {
        Self::validate_key(key)?;
        Ok(self.connection.store_directory().join(key))
    }

    fn validate_key(key: &str) -> Result<()> {
        let valid = !key.is_empty()
            && !key.chars().all(|c| c == '.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if !valid {
            return Err(DataError::Storage(format!("Invalid storage key '{}'", key)).into());
        }
        Ok(())
    }
}

impl KeyValueStore for FileKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.entry_path(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DataError::Storage(format!("Failed to read '{}': {}", key, e)).into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.entry_path(key)?;
        JsonConnection::write_atomic(&path, value)
            .map_err(|e| DataError::Storage(format!("Failed to write '{}': {}", key, e)).into())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = self.entry_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            // Idempotent delete.
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DataError::Storage(format!("Failed to delete '{}': {}", key, e)).into()),
        }
    }

    /// File names outside the key alphabet (a crash-leftover `name~` temp
    /// file, say) are not keys and are not listed.
    fn keys(&self) -> Result<Vec<String>> {
        let dir = self.connection.store_directory();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in fs::read_dir(&dir)
            .map_err(|e| DataError::Storage(format!("Failed to list store: {}", e)))?
        {
            let entry =
                entry.map_err(|e| DataError::Storage(format!("Failed to list store: {}", e)))?;
            if entry.path().is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    if Self::validate_key(name).is_ok() {
                        keys.push(name.to_string());
                    }
                }
            }
        }
        Ok(keys)
    }
}
