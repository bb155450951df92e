//! Typed settings bags.
//!
//! The stored settings used to be free-form objects; representing them as
//! typed structs with derived defaults means a missing or corrupt stored
//! bag deserializes to a well-defined default instead of an empty map
//! being substituted at runtime. Unknown keys still ride along in the
//! flattened `extra` map.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Subscription pricing configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PricingSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quarterly_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yearly_price: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Per-installation user configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSettings {
    /// Acting user, recorded as `exportedBy` in snapshot metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gym_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
