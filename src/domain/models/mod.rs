//! Domain models: the three record categories, the typed settings bags and
//! the dataset snapshot that ties them together for interchange.

pub mod activity;
pub mod member;
pub mod payment;
pub mod settings;
pub mod snapshot;

pub use activity::Activity;
pub use member::Member;
pub use payment::Payment;
pub use settings::{PricingSettings, UserSettings};
pub use snapshot::{
    DatasetSnapshot, SnapshotData, SnapshotMetadata, SnapshotSettings, EXPORT_VERSION, GYM_NAME,
    SUPPORTED_VERSIONS,
};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Contract every record category satisfies.
///
/// Records are semi-opaque: the fields the engine actually inspects are
/// typed, everything else rides along in a flattened `extra` map so an
/// export/import cycle is lossless.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Plural category name, used for storage file names ("members").
    const CATEGORY: &'static str;

    /// Singular noun used in user-facing error messages ("member").
    const NOUN: &'static str;

    /// Unique identifier within the category.
    fn id(&self) -> &str;

    /// Human-readable label for per-record error messages.
    fn label(&self) -> String;
}
