use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Record;

/// A payment record. Requires `id` and a numeric `amount`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub amount: f64,
    /// Payment date, used for date-window filtering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for Payment {
    const CATEGORY: &'static str = "payments";
    const NOUN: &'static str = "payment";

    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> String {
        self.id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_is_required() {
        let raw = serde_json::json!({ "id": "p1", "date": "2024-01-01" });
        assert!(serde_json::from_value::<Payment>(raw).is_err());
    }

    #[test]
    fn test_optional_fields_omitted_when_absent() {
        let payment: Payment =
            serde_json::from_value(serde_json::json!({ "id": "p1", "amount": 1500.0 })).unwrap();
        let back = serde_json::to_value(&payment).unwrap();
        assert_eq!(back, serde_json::json!({ "id": "p1", "amount": 1500.0 }));
    }
}
