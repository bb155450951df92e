//! # JSON File Storage
//!
//! File-based storage backend. Each record category lives in one JSON
//! array file under `records/`, the key-value store keeps one file per
//! key under `store/`. All writes go through an atomic temp-file/rename
//! pattern so a crash mid-write never leaves a half-written file behind.
//!
//! ## Layout
//!
//! ```text
//! data/
//! ├── records/
//! │   ├── members.json
//! │   ├── payments.json
//! │   └── activities.json
//! └── store/
//!     ├── gym_pricing_settings
//!     ├── gym_user_settings
//!     ├── backup_1718000000000
//!     └── offline_member_m1
//! ```

pub mod connection;
pub mod kv_store;
pub mod record_repository;

#[cfg(test)]
pub mod test_utils;

pub use connection::JsonConnection;
pub use kv_store::FileKvStore;
pub use record_repository::{
    ActivityRepository, JsonRecordRepository, MemberRepository, PaymentRepository,
};
