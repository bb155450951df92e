//! Domain layer: interchange codec and the export/import/backup/sync
//! services that orchestrate it against the storage contracts.

pub mod backup_service;
pub mod codec;
pub mod dates;
pub mod export_service;
pub mod import_service;
pub mod models;
pub mod sync_service;

pub use backup_service::{BackupInfo, BackupService};
pub use codec::{ExportFormat, ImportFormat};
pub use export_service::{DateRange, ExportArtifact, ExportOptions, ExportService, ExportToPathResult};
pub use import_service::{BackupFailurePolicy, ImportOptions, ImportOutcome, ImportService, ImportedCounts};
pub use sync_service::{ConnectivityProbe, SyncService, SyncStatus};
