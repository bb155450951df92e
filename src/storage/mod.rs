//! Storage abstraction and the JSON-file backend.

pub mod json;
pub mod traits;

pub use json::{
    ActivityRepository, FileKvStore, JsonConnection, JsonRecordRepository, MemberRepository,
    PaymentRepository,
};
pub use traits::{KeyValueStore, RecordStorage};
