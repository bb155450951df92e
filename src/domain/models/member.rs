use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Record;

/// A gym member record.
///
/// `id` and `name` are the only required fields; everything else is
/// optional and omitted from serialized output when absent, so records
/// created by older app versions survive a round trip unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub membership_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_attendance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sessions_remaining: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<String>,
    /// Date the membership started, used for date-window filtering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub membership_start_date: Option<String>,
    /// Fields this engine does not interpret but must not lose.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for Member {
    const CATEGORY: &'static str = "members";
    const NOUN: &'static str = "member";

    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> String {
        self.name.clone()
    }
}
