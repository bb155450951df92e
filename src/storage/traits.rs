//! # Storage Traits
//!
//! Contracts the domain services program against. Any backend satisfying
//! these is interchangeable; the shipped implementation stores JSON files
//! on disk, tests substitute the same implementation over a temp dir.

use anyhow::Result;

use crate::domain::models::Record;

/// Keyed storage for one record category (members, payments, activities).
///
/// Upsert-by-id is the unit of atomicity: a multi-record import has no
/// all-or-nothing guarantee beyond the single record write.
pub trait RecordStorage<R: Record>: Send + Sync {
    /// All records, in stored order.
    fn get_all(&self) -> Result<Vec<R>>;

    /// Look a record up by its unique id.
    fn get_by_id(&self, id: &str) -> Result<Option<R>>;

    /// Insert the record, or replace the record with the same id.
    fn upsert_by_id(&self, record: &R) -> Result<()>;
}

/// Flat string key-value storage used for settings, backups and offline
/// change entries.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Idempotent: deleting an absent key succeeds silently.
    fn delete(&self, key: &str) -> Result<()>;

    fn keys(&self) -> Result<Vec<String>>;
}
