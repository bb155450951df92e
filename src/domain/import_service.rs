//! Import engine.
//!
//! Parses an uploaded artifact, validates its structure, reconciles every
//! record against existing storage under the configured merge options,
//! and reports a structured outcome. Problems are captured into the
//! outcome value; `import_data` never returns an error to its caller.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::storage::{KeyValueStore, RecordStorage};

use super::backup_service::BackupService;
use super::codec::{self, ImportFormat};
use super::export_service::{PASSWORD_KEY, PRICING_SETTINGS_KEY, USER_SETTINGS_KEY};
use super::models::{Activity, DatasetSnapshot, Member, Payment, Record, SUPPORTED_VERSIONS};

/// What to do when the pre-import backup fails even though the caller
/// asked for one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupFailurePolicy {
    /// Append a warning and continue importing.
    Warn,
    /// Stop before any write; the outcome carries the backup error.
    Abort,
}

impl Default for BackupFailurePolicy {
    fn default() -> Self {
        BackupFailurePolicy::Warn
    }
}

/// Merge behavior for an import run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportOptions {
    /// Carried for caller parity with the export dialog. Replacement is
    /// the repository's upsert semantics, so only `skip_duplicates`
    /// actually changes what happens to an existing record.
    pub overwrite_existing: bool,
    /// Skip records whose id already exists: no error, no count.
    pub skip_duplicates: bool,
    /// Structural validation before any write.
    pub validate_data: bool,
    /// Snapshot the current dataset before mutating anything.
    pub create_backup: bool,
    pub backup_failure_policy: BackupFailurePolicy,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            overwrite_existing: false,
            skip_duplicates: true,
            validate_data: true,
            create_backup: true,
            backup_failure_policy: BackupFailurePolicy::default(),
        }
    }
}

impl ImportOptions {
    /// Options a backup restore runs with: full overwrite, validated, and
    /// never a nested backup.
    pub fn for_restore() -> Self {
        Self {
            overwrite_existing: true,
            skip_duplicates: false,
            validate_data: true,
            create_backup: false,
            backup_failure_policy: BackupFailurePolicy::default(),
        }
    }
}

/// Per-category import counts. `settings` is a flag, not a count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportedCounts {
    pub members: usize,
    pub payments: usize,
    pub activities: usize,
    pub settings: bool,
}

/// Ephemeral result of one import run.
///
/// `success` is true when at least one category imported a record OR no
/// errors were recorded; an empty batch with no errors therefore counts
/// as success.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportOutcome {
    pub success: bool,
    pub imported: ImportedCounts,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Import service. Holds the repositories it writes to, the key-value
/// store for settings, and the backup manager for pre-import snapshots.
pub struct ImportService {
    members: Arc<dyn RecordStorage<Member>>,
    payments: Arc<dyn RecordStorage<Payment>>,
    activities: Arc<dyn RecordStorage<Activity>>,
    store: Arc<dyn KeyValueStore>,
    backup: Arc<BackupService>,
}

impl ImportService {
    pub fn new(
        members: Arc<dyn RecordStorage<Member>>,
        payments: Arc<dyn RecordStorage<Payment>>,
        activities: Arc<dyn RecordStorage<Activity>>,
        store: Arc<dyn KeyValueStore>,
        backup: Arc<BackupService>,
    ) -> Self {
        Self {
            members,
            payments,
            activities,
            store,
            backup,
        }
    }

    /// Import an uploaded file's content. Never fails: every problem ends
    /// up in the outcome's `errors`/`warnings` lists.
    pub fn import_data(
        &self,
        content: &str,
        extension: &str,
        options: &ImportOptions,
    ) -> ImportOutcome {
        info!("📥 IMPORT: Starting import (extension: {})", extension);
        let mut outcome = ImportOutcome::default();
        self.run_import(content, extension, options, &mut outcome);

        outcome.success = outcome.errors.is_empty()
            || outcome.imported.members > 0
            || outcome.imported.payments > 0
            || outcome.imported.activities > 0;

        info!(
            "📥 IMPORT: Finished (success: {}, members: {}, payments: {}, activities: {}, errors: {})",
            outcome.success,
            outcome.imported.members,
            outcome.imported.payments,
            outcome.imported.activities,
            outcome.errors.len()
        );
        outcome
    }

    fn run_import(
        &self,
        content: &str,
        extension: &str,
        options: &ImportOptions,
        outcome: &mut ImportOutcome,
    ) {
        if options.create_backup {
            match self.backup.create_backup() {
                Ok(key) => info!("✅ IMPORT: Created pre-import backup '{}'", key),
                Err(e) => match options.backup_failure_policy {
                    BackupFailurePolicy::Abort => {
                        outcome
                            .errors
                            .push(format!("Backup before import failed: {:#}", e));
                        return;
                    }
                    BackupFailurePolicy::Warn => {
                        warn!("⚠️ IMPORT: Pre-import backup failed: {:#}", e);
                        outcome
                            .warnings
                            .push(format!("Backup before import failed: {:#}", e));
                    }
                },
            }
        }

        let format = match ImportFormat::from_extension(extension) {
            Ok(format) => format,
            Err(e) => {
                outcome.errors.push(e.to_string());
                return;
            }
        };

        let snapshot = match codec::decode(content, format) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                outcome.errors.push(format!("{:#}", e));
                return;
            }
        };

        if options.validate_data {
            let validation_errors = validate_snapshot(&snapshot);
            if !validation_errors.is_empty() {
                outcome.errors = validation_errors;
                return;
            }
        }

        if !snapshot.version.is_empty()
            && !SUPPORTED_VERSIONS.contains(&snapshot.version.as_str())
        {
            outcome.warnings.push(format!(
                "File version ({}) may not be fully compatible",
                snapshot.version
            ));
        }

        // Fixed category order keeps error attribution deterministic.
        outcome.imported.members = self.import_category(
            &snapshot.data.members,
            self.members.as_ref(),
            options,
            &mut outcome.errors,
        );
        outcome.imported.payments = self.import_category(
            &snapshot.data.payments,
            self.payments.as_ref(),
            options,
            &mut outcome.errors,
        );
        outcome.imported.activities = self.import_category(
            &snapshot.data.activities,
            self.activities.as_ref(),
            options,
            &mut outcome.errors,
        );

        if let Some(settings) = &snapshot.data.settings {
            match self.import_settings(settings) {
                Ok(()) => outcome.imported.settings = true,
                Err(e) => outcome
                    .errors
                    .push(format!("Error importing settings: {:#}", e)),
            }
        }
    }

    /// Import one category's raw records. A record failure never aborts
    /// its siblings; each failure contributes one error naming the record.
    fn import_category<R: Record>(
        &self,
        values: &[Value],
        repository: &dyn RecordStorage<R>,
        options: &ImportOptions,
        errors: &mut Vec<String>,
    ) -> usize {
        let mut imported = 0;

        for value in values {
            let id = value.get("id").and_then(Value::as_str);

            if options.skip_duplicates {
                if let Some(id) = id {
                    match repository.get_by_id(id) {
                        // Duplicate: skipped silently, no count, no error.
                        Ok(Some(_)) => continue,
                        Ok(None) => {}
                        Err(e) => {
                            errors.push(format!("Error importing {} {}: {:#}", R::NOUN, id, e));
                            continue;
                        }
                    }
                }
            }

            match serde_json::from_value::<R>(value.clone()) {
                Ok(record) => match repository.upsert_by_id(&record) {
                    Ok(()) => imported += 1,
                    Err(e) => errors.push(format!(
                        "Error importing {} {}: {:#}",
                        R::NOUN,
                        record.label(),
                        e
                    )),
                },
                Err(e) => errors.push(format!(
                    "Error importing {} {}: {}",
                    R::NOUN,
                    value_label(value),
                    e
                )),
            }
        }

        imported
    }

    /// Each sub-bag present in the payload is written independently; the
    /// first write failure is reported as a single settings error.
    fn import_settings(&self, settings: &super::models::SnapshotSettings) -> anyhow::Result<()> {
        if let Some(pricing) = &settings.pricing {
            self.store
                .set(PRICING_SETTINGS_KEY, &serde_json::to_string(pricing)?)?;
        }
        if let Some(user) = &settings.user {
            self.store
                .set(USER_SETTINGS_KEY, &serde_json::to_string(user)?)?;
        }
        if let Some(password) = &settings.password {
            self.store.set(PASSWORD_KEY, password)?;
        }
        Ok(())
    }
}

fn value_label(value: &Value) -> String {
    value
        .get("name")
        .or_else(|| value.get("id"))
        .and_then(Value::as_str)
        .unwrap_or("<unidentified>")
        .to_string()
}

fn has_text_field(value: &Value, field: &str) -> bool {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(|s| !s.is_empty())
        .unwrap_or(false)
}

/// Structural validation: members need `id` and `name`, payments need
/// `id` and a numeric `amount`. Any failure short-circuits the whole
/// import before a single write.
fn validate_snapshot(snapshot: &DatasetSnapshot) -> Vec<String> {
    let mut errors = Vec::new();

    for (index, member) in snapshot.data.members.iter().enumerate() {
        if !has_text_field(member, "id") || !has_text_field(member, "name") {
            errors.push(format!("Member #{}: missing id or name", index + 1));
        }
    }

    for (index, payment) in snapshot.data.payments.iter().enumerate() {
        let amount_ok = payment.get("amount").and_then(Value::as_f64).is_some();
        if !has_text_field(payment, "id") || !amount_ok {
            errors.push(format!("Payment #{}: missing id or amount", index + 1));
        }
    }

    errors
}
