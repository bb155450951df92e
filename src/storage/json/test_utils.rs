//! Test infrastructure: a temp-dir backed connection plus pre-wired
//! repositories and services. The `TempDir` is held so everything is
//! cleaned up even when a test panics.

use anyhow::Result;
use std::sync::Arc;
use tempfile::TempDir;

use crate::domain::backup_service::BackupService;
use crate::domain::export_service::ExportService;
use crate::domain::import_service::ImportService;
use crate::domain::models::{Activity, Member, Payment};

use super::connection::JsonConnection;
use super::kv_store::FileKvStore;
use super::record_repository::{ActivityRepository, MemberRepository, PaymentRepository};

pub struct TestHelper {
    pub connection: JsonConnection,
    pub members: Arc<MemberRepository>,
    pub payments: Arc<PaymentRepository>,
    pub activities: Arc<ActivityRepository>,
    pub store: Arc<FileKvStore>,
    _temp_dir: TempDir,
}

impl TestHelper {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let connection = JsonConnection::new(temp_dir.path())?;
        Ok(Self {
            members: Arc::new(connection.create_member_repository()),
            payments: Arc::new(connection.create_payment_repository()),
            activities: Arc::new(connection.create_activity_repository()),
            store: Arc::new(connection.create_kv_store()),
            connection,
            _temp_dir: temp_dir,
        })
    }

    pub fn export_service(&self) -> ExportService {
        ExportService::new(
            self.members.clone(),
            self.payments.clone(),
            self.activities.clone(),
            self.store.clone(),
        )
    }

    pub fn backup_service(&self) -> BackupService {
        BackupService::new(self.export_service(), self.store.clone())
    }

    pub fn import_service(&self) -> ImportService {
        ImportService::new(
            self.members.clone(),
            self.payments.clone(),
            self.activities.clone(),
            self.store.clone(),
            Arc::new(self.backup_service()),
        )
    }
}

pub fn sample_member(id: &str, name: &str) -> Member {
    Member {
        id: id.to_string(),
        name: name.to_string(),
        membership_status: Some("active".to_string()),
        last_attendance: Some("2024-03-01T09:00:00Z".to_string()),
        phone_number: Some("0555 000 111".to_string()),
        email: None,
        subscription_type: Some("monthly".to_string()),
        sessions_remaining: Some(12),
        payment_status: Some("paid".to_string()),
        membership_start_date: Some("2024-01-15".to_string()),
        extra: serde_json::Map::new(),
    }
}

pub fn sample_payment(id: &str, amount: f64, date: &str) -> Payment {
    Payment {
        id: id.to_string(),
        amount,
        date: Some(date.to_string()),
        subscription_type: Some("monthly".to_string()),
        payment_method: Some("cash".to_string()),
        status: Some("completed".to_string()),
        invoice_number: Some(format!("INV-{}", id)),
        extra: serde_json::Map::new(),
    }
}

pub fn sample_activity(id: &str, member_id: &str, timestamp: &str) -> Activity {
    Activity {
        id: id.to_string(),
        member_id: Some(member_id.to_string()),
        activity_type: Some("check-in".to_string()),
        timestamp: Some(timestamp.to_string()),
        extra: serde_json::Map::new(),
    }
}
