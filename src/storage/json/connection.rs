use anyhow::Result;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::models::{Activity, Member, Payment};

use super::kv_store::FileKvStore;
use super::record_repository::JsonRecordRepository;

/// JsonConnection owns the base data directory and hands out repositories
/// and the key-value store rooted under it.
#[derive(Clone)]
pub struct JsonConnection {
    base_directory: PathBuf,
}

impl JsonConnection {
    /// Create a connection over the given base directory, creating it if
    /// it does not exist yet.
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path)?;
            info!("Created base data directory: {}", base_path.display());
        }

        Ok(Self {
            base_directory: base_path,
        })
    }

    /// Create a connection in the default data directory
    /// (`~/Documents/Gym Tracker`, falling back to the home directory).
    pub fn new_default() -> Result<Self> {
        let base = dirs::document_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| anyhow::anyhow!("Could not determine a data directory"))?;
        Self::new(base.join("Gym Tracker"))
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    /// Directory holding the per-category record files.
    pub fn records_directory(&self) -> PathBuf {
        self.base_directory.join("records")
    }

    /// Directory holding the key-value entries.
    pub fn store_directory(&self) -> PathBuf {
        self.base_directory.join("store")
    }

    pub fn create_member_repository(&self) -> JsonRecordRepository<Member> {
        JsonRecordRepository::new(self.clone())
    }

    pub fn create_payment_repository(&self) -> JsonRecordRepository<Payment> {
        JsonRecordRepository::new(self.clone())
    }

    pub fn create_activity_repository(&self) -> JsonRecordRepository<Activity> {
        JsonRecordRepository::new(self.clone())
    }

    pub fn create_kv_store(&self) -> FileKvStore {
        FileKvStore::new(self.clone())
    }

    /// Atomic write pattern: write to a temp file, then rename over the
    /// destination. Parent directories are created on demand.
    ///
    /// The temp file is the destination name with a `~` appended. `~` is
    /// outside the key-value store's key alphabet, so staging a write for
    /// one key can never clobber another key's entry.
    pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut temp_name = path
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("Invalid write path: {}", path.display()))?
            .to_os_string();
        temp_name.push("~");
        let temp_path = path.with_file_name(temp_name);

        fs::write(&temp_path, contents)?;
        fs::rename(&temp_path, path)?;
        Ok(())
    }
}
