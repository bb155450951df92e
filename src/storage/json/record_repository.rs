//! Generic JSON-file record repository.
//!
//! One repository per category, each backed by a single
//! `records/<category>.json` file holding the ordered record array.
//! Mutations are read-modify-write with an atomic rename, so each upsert
//! is atomic per record; there is no cross-record transaction.

use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::marker::PhantomData;
use std::path::PathBuf;

use crate::domain::models::{Activity, Member, Payment, Record};
use crate::storage::traits::RecordStorage;

use super::connection::JsonConnection;

pub type MemberRepository = JsonRecordRepository<Member>;
pub type PaymentRepository = JsonRecordRepository<Payment>;
pub type ActivityRepository = JsonRecordRepository<Activity>;

#[derive(Clone)]
pub struct JsonRecordRepository<R: Record> {
    connection: JsonConnection,
    _marker: PhantomData<R>,
}

impl<R: Record> JsonRecordRepository<R> {
    pub fn new(connection: JsonConnection) -> Self {
        Self {
            connection,
            _marker: PhantomData,
        }
    }

    fn file_path(&self) -> PathBuf {
        self.connection
            .records_directory()
            .join(format!("{}.json", R::CATEGORY))
    }

    fn load(&self) -> Result<Vec<R>> {
        let path = self.file_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let records: Vec<R> = serde_json::from_str(&contents)
            .with_context(|| format!("Corrupt record file {}", path.display()))?;
        Ok(records)
    }

    fn save(&self, records: &[R]) -> Result<()> {
        let contents = serde_json::to_string_pretty(records)?;
        JsonConnection::write_atomic(&self.file_path(), &contents)
    }

    /// Remove a record by id. Returns whether a record was deleted.
    pub fn delete_by_id(&self, id: &str) -> Result<bool> {
        let mut records = self.load()?;
        let before = records.len();
        records.retain(|record| record.id() != id);
        if records.len() == before {
            return Ok(false);
        }
        self.save(&records)?;
        debug!("Deleted {} {}", R::NOUN, id);
        Ok(true)
    }

    /// Number of stored records.
    pub fn count(&self) -> Result<usize> {
        Ok(self.load()?.len())
    }
}

impl<R: Record> RecordStorage<R> for JsonRecordRepository<R> {
    fn get_all(&self) -> Result<Vec<R>> {
        self.load()
    }

    fn get_by_id(&self, id: &str) -> Result<Option<R>> {
        Ok(self.load()?.into_iter().find(|record| record.id() == id))
    }

    fn upsert_by_id(&self, record: &R) -> Result<()> {
        let mut records = self.load()?;
        match records.iter_mut().find(|existing| existing.id() == record.id()) {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }
        self.save(&records)?;
        debug!("Upserted {} {}", R::NOUN, record.id());
        Ok(())
    }
}
