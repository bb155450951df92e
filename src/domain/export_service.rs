//! Export engine.
//!
//! Assembles a dataset snapshot from the repositories (optionally filtered
//! by date window and category selection), delegates serialization to the
//! codec, and returns a downloadable artifact. The engine never performs
//! any download or UI action itself.

use anyhow::{anyhow, Result};
use chrono::{SecondsFormat, Utc};
use log::{error, info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::sync::Arc;

use crate::error::DataError;
use crate::storage::{KeyValueStore, RecordStorage};

use super::codec::{self, ExportFormat};
use super::dates::parse_loose_timestamp;
use super::models::{
    Activity, DatasetSnapshot, Member, Payment, PricingSettings, Record, SnapshotSettings,
    UserSettings,
};

/// Storage keys for the settings bags and the admin password.
pub const PRICING_SETTINGS_KEY: &str = "gym_pricing_settings";
pub const USER_SETTINGS_KEY: &str = "gym_user_settings";
pub const PASSWORD_KEY: &str = "gym_password";

const DEFAULT_USER: &str = "ADMIN";

/// Inclusive date window applied per category during export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub from: String,
    pub to: String,
}

/// What to export and in which encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportOptions {
    pub include_members: bool,
    pub include_payments: bool,
    pub include_activities: bool,
    pub include_settings: bool,
    /// Sensitive-data opt-in: the stored password is only written into the
    /// snapshot when this is set (and settings are included).
    pub include_password: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    pub format: ExportFormat,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_members: true,
            include_payments: true,
            include_activities: true,
            include_settings: true,
            include_password: false,
            date_range: None,
            format: ExportFormat::Json,
        }
    }
}

impl ExportOptions {
    /// Everything, password included, as JSON. This is what backups use.
    pub fn full_json() -> Self {
        Self {
            include_password: true,
            ..Self::default()
        }
    }
}

/// Encoded export ready for the caller to persist or offer as a download.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub filename: String,
}

/// Result of writing an export directly to disk. Mirrors the outcome-value
/// style of the import engine: directory problems are reported here, not
/// thrown.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportToPathResult {
    pub success: bool,
    pub message: String,
    pub file_path: String,
}

/// Export service, constructed with injected repository and key-value
/// store collaborators so tests can substitute storage.
#[derive(Clone)]
pub struct ExportService {
    members: Arc<dyn RecordStorage<Member>>,
    payments: Arc<dyn RecordStorage<Payment>>,
    activities: Arc<dyn RecordStorage<Activity>>,
    store: Arc<dyn KeyValueStore>,
}

impl ExportService {
    pub fn new(
        members: Arc<dyn RecordStorage<Member>>,
        payments: Arc<dyn RecordStorage<Payment>>,
        activities: Arc<dyn RecordStorage<Activity>>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            members,
            payments,
            activities,
            store,
        }
    }

    /// Export the selected categories as a downloadable artifact.
    ///
    /// Any internal failure is wrapped into [`DataError::ExportFailed`]
    /// carrying the original message; no partial artifact is returned.
    pub fn export_data(&self, options: &ExportOptions) -> Result<ExportArtifact> {
        info!(
            "📄 EXPORT: Starting export (format: {:?}, date range: {:?})",
            options.format, options.date_range
        );

        match self.build_artifact(options) {
            Ok(artifact) => {
                info!(
                    "✅ EXPORT: Generated {} ({} bytes)",
                    artifact.filename,
                    artifact.bytes.len()
                );
                Ok(artifact)
            }
            Err(e) => {
                error!("❌ EXPORT: {:#}", e);
                Err(DataError::ExportFailed(e.to_string()).into())
            }
        }
    }

    fn build_artifact(&self, options: &ExportOptions) -> Result<ExportArtifact> {
        let now = Utc::now();
        let timestamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);
        let mut snapshot = DatasetSnapshot::empty(timestamp, self.current_user());

        if options.include_members {
            let members = filter_by_date_range(
                self.members.get_all()?,
                options.date_range.as_ref(),
                |m: &Member| m.membership_start_date.as_deref(),
            )?;
            snapshot.metadata.total_members = members.len();
            snapshot.data.members = to_values(&members)?;
        }

        if options.include_payments {
            let payments = filter_by_date_range(
                self.payments.get_all()?,
                options.date_range.as_ref(),
                |p: &Payment| p.date.as_deref(),
            )?;
            snapshot.metadata.total_payments = payments.len();
            snapshot.data.payments = to_values(&payments)?;
        }

        if options.include_activities {
            let activities = filter_by_date_range(
                self.activities.get_all()?,
                options.date_range.as_ref(),
                |a: &Activity| a.timestamp.as_deref(),
            )?;
            snapshot.metadata.total_activities = activities.len();
            snapshot.data.activities = to_values(&activities)?;
        }

        if options.include_settings {
            let mut settings = SnapshotSettings {
                pricing: Some(self.read_settings_bag::<PricingSettings>(PRICING_SETTINGS_KEY)),
                user: Some(self.read_settings_bag::<UserSettings>(USER_SETTINGS_KEY)),
                password: None,
            };
            if options.include_password {
                let password = self
                    .store
                    .get(PASSWORD_KEY)?
                    .unwrap_or_else(|| DEFAULT_USER.to_string());
                settings.password = Some(password);
            }
            snapshot.data.settings = Some(settings);
        }

        let bytes = codec::encode(&snapshot, options.format)?;
        Ok(ExportArtifact {
            bytes,
            mime_type: options.format.mime_type(),
            filename: format!(
                "gym-export-{}.{}",
                now.format("%Y-%m-%d"),
                options.format.file_extension()
            ),
        })
    }

    /// Export directly to a file, using the Documents folder (then the
    /// home directory) when no path is given.
    pub fn export_to_path(
        &self,
        options: &ExportOptions,
        custom_path: Option<&str>,
    ) -> Result<ExportToPathResult> {
        let artifact = self.export_data(options)?;

        let export_dir = match custom_path {
            Some(path) if !path.trim().is_empty() => {
                std::path::PathBuf::from(sanitize_path(path))
            }
            _ => match dirs::document_dir().or_else(dirs::home_dir) {
                Some(dir) => dir,
                None => {
                    error!("❌ EXPORT: Could not determine default export directory");
                    return Ok(ExportToPathResult {
                        success: false,
                        message: "Failed to determine export directory".to_string(),
                        file_path: String::new(),
                    });
                }
            },
        };

        let file_path = export_dir.join(&artifact.filename);
        if let Err(e) = fs::create_dir_all(&export_dir) {
            error!(
                "❌ EXPORT: Failed to create export directory {}: {}",
                export_dir.display(),
                e
            );
            return Ok(ExportToPathResult {
                success: false,
                message: format!("Failed to create export directory: {}", e),
                file_path: export_dir.to_string_lossy().to_string(),
            });
        }

        match fs::write(&file_path, &artifact.bytes) {
            Ok(()) => {
                let file_path = file_path.to_string_lossy().to_string();
                info!("✅ EXPORT: Wrote export to {}", file_path);
                Ok(ExportToPathResult {
                    success: true,
                    message: format!("File exported successfully to: {}", file_path),
                    file_path,
                })
            }
            Err(e) => {
                error!(
                    "❌ EXPORT: Failed to write export file to {}: {}",
                    file_path.display(),
                    e
                );
                Ok(ExportToPathResult {
                    success: false,
                    message: format!("Failed to write export file: {}", e),
                    file_path: file_path.to_string_lossy().to_string(),
                })
            }
        }
    }

    /// Acting user recorded in snapshot metadata.
    fn current_user(&self) -> String {
        self.read_settings_bag::<UserSettings>(USER_SETTINGS_KEY)
            .username
            .unwrap_or_else(|| DEFAULT_USER.to_string())
    }

    /// Read a typed settings bag, substituting the default on a missing or
    /// corrupt entry rather than failing the export.
    fn read_settings_bag<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.store.get(key) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("⚠️ EXPORT: Corrupt settings under '{}': {}", key, e);
                T::default()
            }),
            Ok(None) => T::default(),
            Err(e) => {
                warn!("⚠️ EXPORT: Could not read settings '{}': {:#}", key, e);
                T::default()
            }
        }
    }
}

fn to_values<R: Record>(records: &[R]) -> Result<Vec<serde_json::Value>> {
    records
        .iter()
        .map(|r| serde_json::to_value(r).map_err(Into::into))
        .collect()
}

/// Keep the records whose date field parses and falls inside the window,
/// inclusive on both ends. Records with a missing or unparseable date are
/// excluded from a filtered export.
fn filter_by_date_range<R: Record>(
    records: Vec<R>,
    range: Option<&DateRange>,
    date_of: impl Fn(&R) -> Option<&str>,
) -> Result<Vec<R>> {
    let Some(range) = range else {
        return Ok(records);
    };
    let from = parse_loose_timestamp(&range.from)
        .ok_or_else(|| anyhow!("Invalid date range start: {}", range.from))?;
    let to = parse_loose_timestamp(&range.to)
        .ok_or_else(|| anyhow!("Invalid date range end: {}", range.to))?;

    Ok(records
        .into_iter()
        .filter(|record| match date_of(record).and_then(parse_loose_timestamp) {
            Some(date) => date >= from && date <= to,
            None => false,
        })
        .collect())
}

/// Clean up a user-supplied export path: surrounding quotes, escaped
/// spaces, trailing separators, and a leading tilde.
fn sanitize_path(path: &str) -> String {
    let mut cleaned = path.trim().to_string();

    if (cleaned.starts_with('"') && cleaned.ends_with('"') && cleaned.len() >= 2)
        || (cleaned.starts_with('\'') && cleaned.ends_with('\'') && cleaned.len() >= 2)
    {
        cleaned = cleaned[1..cleaned.len() - 1].to_string();
    }

    cleaned = cleaned.trim().replace("\\ ", " ");

    while cleaned.ends_with('/') || cleaned.ends_with('\\') {
        cleaned.pop();
    }

    if cleaned.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            if cleaned == "~" {
                cleaned = home.to_string_lossy().to_string();
            } else if cleaned.starts_with("~/") || cleaned.starts_with("~\\") {
                cleaned = home.join(&cleaned[2..]).to_string_lossy().to_string();
            }
        }
    }

    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::codec::ImportFormat;
    use crate::storage::json::test_utils::{
        sample_activity, sample_member, sample_payment, TestHelper,
    };
    use crate::storage::{KeyValueStore as _, RecordStorage as _};

    fn decode_artifact(artifact: &ExportArtifact) -> DatasetSnapshot {
        codec::decode(
            std::str::from_utf8(&artifact.bytes).unwrap(),
            ImportFormat::Json,
        )
        .unwrap()
    }

    #[test]
    fn test_metadata_counts_match_exported_arrays() {
        let helper = TestHelper::new().unwrap();
        helper.members.upsert_by_id(&sample_member("m1", "Sami")).unwrap();
        helper.members.upsert_by_id(&sample_member("m2", "Nadia")).unwrap();
        helper
            .payments
            .upsert_by_id(&sample_payment("p1", 2500.0, "2024-02-10"))
            .unwrap();

        let artifact = helper
            .export_service()
            .export_data(&ExportOptions::default())
            .unwrap();
        let snapshot = decode_artifact(&artifact);

        assert_eq!(snapshot.metadata.total_members, 2);
        assert_eq!(snapshot.metadata.total_payments, 1);
        assert_eq!(snapshot.metadata.total_activities, 0);
        assert_eq!(snapshot.data.members.len(), 2);
        assert_eq!(snapshot.version, "2.0");
    }

    #[test]
    fn test_excluded_categories_stay_empty() {
        let helper = TestHelper::new().unwrap();
        helper.members.upsert_by_id(&sample_member("m1", "Sami")).unwrap();

        let options = ExportOptions {
            include_members: false,
            ..ExportOptions::default()
        };
        let snapshot = decode_artifact(&helper.export_service().export_data(&options).unwrap());

        assert!(snapshot.data.members.is_empty());
        assert_eq!(snapshot.metadata.total_members, 0);
    }

    #[test]
    fn test_date_filter_is_inclusive_and_drops_unparseable() {
        let helper = TestHelper::new().unwrap();

        let mut on_from = sample_member("m1", "OnFrom");
        on_from.membership_start_date = Some("2024-01-01".to_string());
        let mut on_to = sample_member("m2", "OnTo");
        on_to.membership_start_date = Some("2024-06-30".to_string());
        let mut outside = sample_member("m3", "Outside");
        outside.membership_start_date = Some("2023-12-31".to_string());
        let mut garbled = sample_member("m4", "Garbled");
        garbled.membership_start_date = Some("soonish".to_string());
        let mut missing = sample_member("m5", "Missing");
        missing.membership_start_date = None;

        for member in [&on_from, &on_to, &outside, &garbled, &missing] {
            helper.members.upsert_by_id(member).unwrap();
        }

        let options = ExportOptions {
            date_range: Some(DateRange {
                from: "2024-01-01".to_string(),
                to: "2024-06-30".to_string(),
            }),
            ..ExportOptions::default()
        };
        let snapshot = decode_artifact(&helper.export_service().export_data(&options).unwrap());

        let names: Vec<_> = snapshot
            .data
            .members
            .iter()
            .map(|m| m.get("name").unwrap().as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["OnFrom", "OnTo"]);
        assert_eq!(snapshot.metadata.total_members, 2);
    }

    #[test]
    fn test_invalid_date_range_fails_as_export_error() {
        let helper = TestHelper::new().unwrap();
        let options = ExportOptions {
            date_range: Some(DateRange {
                from: "gibberish".to_string(),
                to: "2024-06-30".to_string(),
            }),
            ..ExportOptions::default()
        };

        let err = helper.export_service().export_data(&options).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::ExportFailed(_))
        ));
    }

    #[test]
    fn test_password_is_opt_in() {
        let helper = TestHelper::new().unwrap();
        helper.store.set(PASSWORD_KEY, "hunter2").unwrap();
        let service = helper.export_service();

        let without = decode_artifact(&service.export_data(&ExportOptions::default()).unwrap());
        assert_eq!(without.data.settings.unwrap().password, None);

        let with = decode_artifact(
            &service
                .export_data(&ExportOptions {
                    include_password: true,
                    ..ExportOptions::default()
                })
                .unwrap(),
        );
        assert_eq!(
            with.data.settings.unwrap().password.as_deref(),
            Some("hunter2")
        );
    }

    #[test]
    fn test_password_opt_in_falls_back_to_default() {
        let helper = TestHelper::new().unwrap();
        let snapshot = decode_artifact(
            &helper
                .export_service()
                .export_data(&ExportOptions::full_json())
                .unwrap(),
        );
        assert_eq!(
            snapshot.data.settings.unwrap().password.as_deref(),
            Some("ADMIN")
        );
    }

    #[test]
    fn test_corrupt_settings_bag_exports_as_default() {
        let helper = TestHelper::new().unwrap();
        helper.store.set(PRICING_SETTINGS_KEY, "{{not json").unwrap();

        let snapshot = decode_artifact(
            &helper
                .export_service()
                .export_data(&ExportOptions::default())
                .unwrap(),
        );
        assert_eq!(
            snapshot.data.settings.unwrap().pricing,
            Some(PricingSettings::default())
        );
    }

    #[test]
    fn test_exported_by_reads_username() {
        let helper = TestHelper::new().unwrap();
        helper
            .store
            .set(USER_SETTINGS_KEY, r#"{"username":"reception"}"#)
            .unwrap();

        let snapshot = decode_artifact(
            &helper
                .export_service()
                .export_data(&ExportOptions::default())
                .unwrap(),
        );
        assert_eq!(snapshot.metadata.exported_by, "reception");
    }

    #[test]
    fn test_activity_filtering_uses_timestamp_field() {
        let helper = TestHelper::new().unwrap();
        helper
            .activities
            .upsert_by_id(&sample_activity("a1", "m1", "2024-02-01T08:00:00Z"))
            .unwrap();
        helper
            .activities
            .upsert_by_id(&sample_activity("a2", "m1", "2022-02-01T08:00:00Z"))
            .unwrap();

        let options = ExportOptions {
            date_range: Some(DateRange {
                from: "2024-01-01".to_string(),
                to: "2024-12-31".to_string(),
            }),
            ..ExportOptions::default()
        };
        let snapshot = decode_artifact(&helper.export_service().export_data(&options).unwrap());
        assert_eq!(snapshot.data.activities.len(), 1);
        assert_eq!(snapshot.metadata.total_activities, 1);
    }

    #[test]
    fn test_export_to_path_writes_artifact() {
        let helper = TestHelper::new().unwrap();
        helper.members.upsert_by_id(&sample_member("m1", "Sami")).unwrap();

        let target = helper.connection.base_directory().join("exports");
        let result = helper
            .export_service()
            .export_to_path(
                &ExportOptions::default(),
                Some(target.to_str().unwrap()),
            )
            .unwrap();

        assert!(result.success, "{}", result.message);
        let written = fs::read_to_string(&result.file_path).unwrap();
        assert!(written.contains("\"Sami\""));
    }

    #[test]
    fn test_sanitize_path() {
        assert_eq!(sanitize_path("  /path/to/dir  "), "/path/to/dir");
        assert_eq!(sanitize_path("\"/path/to/dir\""), "/path/to/dir");
        assert_eq!(sanitize_path("'/path/to/dir'"), "/path/to/dir");
        assert_eq!(sanitize_path("/path\\ to\\ dir"), "/path to dir");
        assert_eq!(sanitize_path("/path/to/dir/"), "/path/to/dir");
        assert_eq!(sanitize_path("/path/to/dir\\"), "/path/to/dir");

        if let Some(home) = dirs::home_dir() {
            let expected = home.join("Documents").to_string_lossy().to_string();
            assert_eq!(sanitize_path("~/Documents"), expected);
        }
    }
}
