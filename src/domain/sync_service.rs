//! Offline change tracker.
//!
//! Records locally-made mutations with a synced/unsynced flag and surfaces
//! a pending-change count for the UI's sync indicator. "Syncing" is local
//! bookkeeping only: entries are flagged, nothing is transmitted anywhere.
//! Synced entries older than a week are swept away; entries that no longer
//! parse are deleted outright rather than reported.

use anyhow::Result;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex};

use crate::storage::KeyValueStore;

use super::dates::parse_loose_timestamp;

/// Key namespace offline change entries live under.
pub const OFFLINE_KEY_PREFIX: &str = "offline_";

/// How long a synced entry is retained before the sweep removes it.
const RETENTION_DAYS: i64 = 7;

/// Connectivity source injected by the shell; the tracker itself never
/// touches the network.
pub trait ConnectivityProbe: Send + Sync {
    fn is_online(&self) -> bool;
}

/// Advisory status for the UI's sync indicator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub is_online: bool,
    pub last_sync: Option<DateTime<Utc>>,
    pub pending_changes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OfflineEntry {
    data: Value,
    timestamp: String,
    synced: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    synced_at: Option<String>,
}

pub struct SyncService {
    store: Arc<dyn KeyValueStore>,
    probe: Arc<dyn ConnectivityProbe>,
    last_sync: Mutex<Option<DateTime<Utc>>>,
}

impl SyncService {
    pub fn new(store: Arc<dyn KeyValueStore>, probe: Arc<dyn ConnectivityProbe>) -> Self {
        Self {
            store,
            probe,
            last_sync: Mutex::new(None),
        }
    }

    fn entry_key(key: &str) -> String {
        format!("{}{}", OFFLINE_KEY_PREFIX, key)
    }

    /// Record a locally-applied mutation as pending sync.
    pub fn record_change(&self, key: &str, data: Value) -> Result<()> {
        let entry = OfflineEntry {
            data,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            synced: false,
            synced_at: None,
        };
        self.store
            .set(&Self::entry_key(key), &serde_json::to_string(&entry)?)?;
        debug!("📝 SYNC: Recorded offline change '{}'", key);
        Ok(())
    }

    /// Fetch the data recorded for a key. A corrupt entry reads as `None`.
    pub fn get_offline_data(&self, key: &str) -> Result<Option<Value>> {
        let Some(raw) = self.store.get(&Self::entry_key(key))? else {
            return Ok(None);
        };
        match serde_json::from_str::<OfflineEntry>(&raw) {
            Ok(entry) => Ok(Some(entry.data)),
            Err(e) => {
                warn!("⚠️ SYNC: Corrupt offline entry '{}': {}", key, e);
                Ok(None)
            }
        }
    }

    pub fn has_offline_data(&self) -> Result<bool> {
        Ok(self
            .store
            .keys()?
            .iter()
            .any(|key| key.starts_with(OFFLINE_KEY_PREFIX)))
    }

    /// Number of entries still awaiting a sync. Entries that fail to parse
    /// are not counted; the sweep will remove them.
    pub fn pending_changes(&self) -> Result<usize> {
        let mut pending = 0;
        for key in self.offline_keys()? {
            if let Some(raw) = self.store.get(&key)? {
                if let Ok(entry) = serde_json::from_str::<OfflineEntry>(&raw) {
                    if !entry.synced {
                        pending += 1;
                    }
                }
            }
        }
        Ok(pending)
    }

    /// Mark every unsynced entry as synced. Only runs when connectivity is
    /// present; returns whether a sync pass happened. This is local
    /// bookkeeping, no data leaves the machine.
    pub fn sync(&self) -> Result<bool> {
        if !self.probe.is_online() {
            info!("📴 SYNC: Offline, skipping sync pass");
            return Ok(false);
        }

        let now = Utc::now();
        let stamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);
        let mut marked = 0;

        for key in self.offline_keys()? {
            let Some(raw) = self.store.get(&key)? else {
                continue;
            };
            let Ok(mut entry) = serde_json::from_str::<OfflineEntry>(&raw) else {
                continue;
            };
            if entry.synced {
                continue;
            }
            entry.synced = true;
            entry.synced_at = Some(stamp.clone());
            if let Err(e) = self.store.set(&key, &serde_json::to_string(&entry)?) {
                warn!("⚠️ SYNC: Failed to mark '{}' synced: {:#}", key, e);
                continue;
            }
            marked += 1;
        }

        *self.last_sync.lock().unwrap() = Some(now);
        info!("✅ SYNC: Marked {} entries synced", marked);
        Ok(true)
    }

    /// Periodic sweep: delete entries that are synced and older than the
    /// retention window, and delete entries that no longer parse.
    pub fn cleanup_old_entries(&self) -> Result<usize> {
        let cutoff = Utc::now() - Duration::days(RETENTION_DAYS);
        let mut removed = 0;

        for key in self.offline_keys()? {
            let Some(raw) = self.store.get(&key)? else {
                continue;
            };
            match serde_json::from_str::<OfflineEntry>(&raw) {
                Ok(entry) => {
                    let expired = entry.synced
                        && parse_loose_timestamp(&entry.timestamp)
                            .map(|t| t < cutoff)
                            .unwrap_or(false);
                    if expired {
                        self.store.delete(&key)?;
                        removed += 1;
                    }
                }
                Err(_) => {
                    // Corrupt entry: self-heal by dropping it.
                    warn!("⚠️ SYNC: Deleting corrupt offline entry '{}'", key);
                    self.store.delete(&key)?;
                    removed += 1;
                }
            }
        }

        if removed > 0 {
            info!("🧹 SYNC: Swept {} offline entries", removed);
        }
        Ok(removed)
    }

    pub fn status(&self) -> Result<SyncStatus> {
        Ok(SyncStatus {
            is_online: self.probe.is_online(),
            last_sync: *self.last_sync.lock().unwrap(),
            pending_changes: self.pending_changes()?,
        })
    }

    fn offline_keys(&self) -> Result<Vec<String>> {
        Ok(self
            .store
            .keys()?
            .into_iter()
            .filter(|key| key.starts_with(OFFLINE_KEY_PREFIX))
            .collect())
    }
}
