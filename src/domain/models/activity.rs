use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Record;

/// A member activity record (check-in, session use, and so on).
/// Only `id` is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_type: Option<String>,
    /// Instant the activity happened, used for date-window filtering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for Activity {
    const CATEGORY: &'static str = "activities";
    const NOUN: &'static str = "activity";

    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> String {
        self.id.clone()
    }
}
