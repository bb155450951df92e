//! The dataset snapshot: the unit of interchange between this installation
//! and an export file, an import file, or a stored backup.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::settings::{PricingSettings, UserSettings};

/// Schema generation written into every export.
pub const EXPORT_VERSION: &str = "2.0";

/// Versions an importer accepts without a compatibility warning.
pub const SUPPORTED_VERSIONS: &[&str] = &["1.0", "2.0"];

/// Fixed installation label recorded in snapshot metadata.
pub const GYM_NAME: &str = "Gym Tracker";

/// Top-level interchange object.
///
/// `data` is the only structurally required field; `version`, `timestamp`
/// and `metadata` default so older or hand-edited files still decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSnapshot {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub metadata: SnapshotMetadata,
    pub data: SnapshotData,
}

/// Category counts plus provenance. Counts are recomputed from the arrays
/// at the moment of export, never carried over from prior state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SnapshotMetadata {
    pub total_members: usize,
    pub total_payments: usize,
    pub total_activities: usize,
    pub exported_by: String,
    pub gym_name: String,
}

/// The actual record payload. Records stay as raw JSON values here so a
/// malformed record surfaces as a per-record import error, not a failure
/// to decode the whole file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SnapshotData {
    pub members: Vec<Value>,
    pub payments: Vec<Value>,
    pub activities: Vec<Value>,
    /// Absent in files produced by tooling that never exports settings;
    /// the importer writes nothing in that case.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<SnapshotSettings>,
}

/// Settings bag inside a snapshot. `password` is present if and only if
/// the export was requested with password inclusion; its absence must not
/// be read as "no password configured".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pricing: Option<PricingSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl DatasetSnapshot {
    /// Empty snapshot skeleton stamped with the current schema version.
    pub fn empty(timestamp: String, exported_by: String) -> Self {
        Self {
            version: EXPORT_VERSION.to_string(),
            timestamp,
            metadata: SnapshotMetadata {
                exported_by,
                gym_name: GYM_NAME.to_string(),
                ..SnapshotMetadata::default()
            },
            data: SnapshotData {
                settings: Some(SnapshotSettings {
                    pricing: Some(PricingSettings::default()),
                    user: Some(UserSettings::default()),
                    password: None,
                }),
                ..SnapshotData::default()
            },
        }
    }
}
