//! # Interchange Codec
//!
//! Converts a [`DatasetSnapshot`] to and from its serialized encodings.
//! JSON is the only bit-exact, round-trippable form; CSV and the
//! spreadsheet HTML are export-only presentation formats. The asymmetry is
//! deliberate and visible in the types: [`ExportFormat`] has three
//! variants, [`ImportFormat`] has one.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Write as _;
use std::str::FromStr;

use crate::error::DataError;

use super::dates::format_display_date;
use super::models::DatasetSnapshot;

/// Output encodings an export can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
    /// HTML tables served with a spreadsheet MIME type, for opening in
    /// Excel and friends.
    Excel,
}

impl ExportFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv;charset=utf-8",
            ExportFormat::Excel => "application/vnd.ms-excel",
        }
    }

    pub fn file_extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Excel => "xls",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "excel" | "xls" => Ok(ExportFormat::Excel),
            other => Err(DataError::UnsupportedFormat(other.to_string()).into()),
        }
    }
}

/// Encodings an import can decode. Only JSON; resolving a `.csv` upload
/// fails here, before any decoding is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Json,
}

impl ImportFormat {
    /// Resolve an uploaded file's extension to a decodable format.
    pub fn from_extension(extension: &str) -> Result<Self> {
        match extension.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "json" => Ok(ImportFormat::Json),
            "csv" => Err(DataError::UnsupportedImportFormat(
                "CSV import is not supported yet. Please use a JSON file".to_string(),
            )
            .into()),
            other => Err(DataError::UnsupportedImportFormat(format!(
                "Unsupported file format '{}'. Please use JSON",
                other
            ))
            .into()),
        }
    }
}

/// Serialize a snapshot into the requested encoding.
pub fn encode(snapshot: &DatasetSnapshot, format: ExportFormat) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_vec_pretty(snapshot)?),
        ExportFormat::Csv => Ok(generate_csv(snapshot).into_bytes()),
        ExportFormat::Excel => Ok(generate_excel(snapshot).into_bytes()),
    }
}

/// Decode file content into a snapshot. Strict on JSON syntax and on the
/// presence of the `data` field, lenient everywhere else.
pub fn decode(content: &str, format: ImportFormat) -> Result<DatasetSnapshot> {
    match format {
        ImportFormat::Json => {
            serde_json::from_str(content).context("File does not contain a valid data snapshot")
        }
    }
}

/// String field lookup on a raw record value; non-string scalars are
/// rendered, missing and null become empty.
fn text(record: &Value, field: &str) -> String {
    match record.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn number(record: &Value, field: &str) -> f64 {
    record.get(field).and_then(Value::as_f64).unwrap_or(0.0)
}

fn format_amount(amount: f64) -> String {
    format!("{:.2}", amount)
}

/// Human-oriented sectioned CSV. One section per non-empty category, every
/// value quoted. Embedded quotes are not escaped, so this output is not
/// round-trippable; it exists for eyeballing in a spreadsheet, not for
/// re-import.
fn generate_csv(snapshot: &DatasetSnapshot) -> String {
    let mut csv = String::new();

    if !snapshot.data.members.is_empty() {
        csv.push_str("=== Members ===\n");
        csv.push_str(
            "Name,Membership Status,Last Attendance,Phone,Email,Subscription Type,Sessions Remaining,Payment Status\n",
        );
        for member in &snapshot.data.members {
            let _ = writeln!(
                csv,
                "\"{}\",\"{}\",\"{}\",\"{}\",\"{}\",\"{}\",\"{}\",\"{}\"",
                text(member, "name"),
                text(member, "membershipStatus"),
                format_display_date(&text(member, "lastAttendance")),
                text(member, "phoneNumber"),
                text(member, "email"),
                text(member, "subscriptionType"),
                number(member, "sessionsRemaining") as u64,
                text(member, "paymentStatus"),
            );
        }
        csv.push('\n');
    }

    if !snapshot.data.payments.is_empty() {
        csv.push_str("=== Payments ===\n");
        csv.push_str("Amount,Date,Subscription Type,Payment Method,Status,Invoice Number\n");
        for payment in &snapshot.data.payments {
            let _ = writeln!(
                csv,
                "\"{}\",\"{}\",\"{}\",\"{}\",\"{}\",\"{}\"",
                format_amount(number(payment, "amount")),
                format_display_date(&text(payment, "date")),
                text(payment, "subscriptionType"),
                text(payment, "paymentMethod"),
                text(payment, "status"),
                text(payment, "invoiceNumber"),
            );
        }
        csv.push('\n');
    }

    csv
}

/// Spreadsheet export: an HTML document with one styled table per
/// non-empty category. Opens in any spreadsheet application.
fn generate_excel(snapshot: &DatasetSnapshot) -> String {
    let mut html = String::from(
        "<html>\n<head>\n<meta charset=\"utf-8\">\n<style>\n\
         table { border-collapse: collapse; width: 100%; margin-bottom: 20px; }\n\
         th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }\n\
         th { background-color: #f2f2f2; font-weight: bold; }\n\
         h2 { color: #333; }\n\
         </style>\n</head>\n<body>\n",
    );
    let _ = writeln!(html, "<h1>Gym Tracker Data Report</h1>");
    let _ = writeln!(
        html,
        "<p>Export date: {}</p>",
        format_display_date(&snapshot.timestamp)
    );

    if !snapshot.data.members.is_empty() {
        let _ = writeln!(
            html,
            "<h2>Members ({})</h2>",
            snapshot.metadata.total_members
        );
        html.push_str("<table>\n<tr><th>Name</th><th>Membership Status</th><th>Last Attendance</th><th>Phone</th><th>Email</th><th>Subscription Type</th><th>Sessions Remaining</th><th>Payment Status</th></tr>\n");
        for member in &snapshot.data.members {
            let _ = writeln!(
                html,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                text(member, "name"),
                text(member, "membershipStatus"),
                format_display_date(&text(member, "lastAttendance")),
                text(member, "phoneNumber"),
                text(member, "email"),
                text(member, "subscriptionType"),
                number(member, "sessionsRemaining") as u64,
                text(member, "paymentStatus"),
            );
        }
        html.push_str("</table>\n");
    }

    if !snapshot.data.payments.is_empty() {
        let _ = writeln!(
            html,
            "<h2>Payments ({})</h2>",
            snapshot.metadata.total_payments
        );
        html.push_str("<table>\n<tr><th>Amount</th><th>Date</th><th>Subscription Type</th><th>Payment Method</th><th>Status</th><th>Invoice Number</th></tr>\n");
        for payment in &snapshot.data.payments {
            let _ = writeln!(
                html,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                format_amount(number(payment, "amount")),
                format_display_date(&text(payment, "date")),
                text(payment, "subscriptionType"),
                text(payment, "paymentMethod"),
                text(payment, "status"),
                text(payment, "invoiceNumber"),
            );
        }
        html.push_str("</table>\n");
    }

    html.push_str("</body></html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{
        DatasetSnapshot, PricingSettings, SnapshotSettings, UserSettings,
    };

    fn snapshot_with_records() -> DatasetSnapshot {
        let mut snapshot =
            DatasetSnapshot::empty("2024-03-05T10:30:00Z".to_string(), "ADMIN".to_string());
        snapshot.data.members = vec![serde_json::json!({
            "id": "m1",
            "name": "Sami",
            "membershipStatus": "active",
            "lastAttendance": "2024-03-01T09:00:00Z",
            "sessionsRemaining": 12
        })];
        snapshot.data.payments = vec![serde_json::json!({
            "id": "p1",
            "amount": 2500.0,
            "date": "2024-02-10",
            "paymentMethod": "cash"
        })];
        snapshot.metadata.total_members = 1;
        snapshot.metadata.total_payments = 1;
        snapshot
    }

    #[test]
    fn test_json_round_trip_is_exact() {
        let mut snapshot = snapshot_with_records();
        snapshot.data.settings = Some(SnapshotSettings {
            pricing: Some(PricingSettings {
                monthly_price: Some(2500.0),
                ..PricingSettings::default()
            }),
            user: Some(UserSettings {
                username: Some("reception".to_string()),
                ..UserSettings::default()
            }),
            password: Some("hunter2".to_string()),
        });

        let bytes = encode(&snapshot, ExportFormat::Json).unwrap();
        let decoded = decode(
            std::str::from_utf8(&bytes).unwrap(),
            ImportFormat::Json,
        )
        .unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn test_csv_contains_section_per_nonempty_category() {
        let bytes = encode(&snapshot_with_records(), ExportFormat::Csv).unwrap();
        let csv = String::from_utf8(bytes).unwrap();

        assert!(csv.contains("=== Members ==="));
        assert!(csv.contains("=== Payments ==="));
        assert!(csv.contains("\"Sami\""));
        assert!(csv.contains("\"2500.00\""));
        assert!(csv.contains("\"2024-02-10\""));
    }

    #[test]
    fn test_csv_skips_empty_categories() {
        let snapshot =
            DatasetSnapshot::empty("2024-03-05T10:30:00Z".to_string(), "ADMIN".to_string());
        let csv = String::from_utf8(encode(&snapshot, ExportFormat::Csv).unwrap()).unwrap();
        assert!(!csv.contains("=== Members ==="));
        assert!(!csv.contains("=== Payments ==="));
    }

    #[test]
    fn test_excel_output_is_html_tables() {
        let bytes = encode(&snapshot_with_records(), ExportFormat::Excel).unwrap();
        let html = String::from_utf8(bytes).unwrap();

        assert!(html.starts_with("<html>"));
        assert!(html.contains("<h2>Members (1)</h2>"));
        assert!(html.contains("<h2>Payments (1)</h2>"));
        assert!(html.contains("<td>Sami</td>"));
    }

    #[test]
    fn test_unknown_export_format_string_is_rejected() {
        let err = "xml".parse::<ExportFormat>().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_csv_extension_cannot_be_imported() {
        let err = ImportFormat::from_extension("csv").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("CSV import is not supported yet"));
        assert!(matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::UnsupportedImportFormat(_))
        ));
    }

    #[test]
    fn test_extension_resolution_ignores_case_and_dot() {
        assert!(ImportFormat::from_extension(".JSON").is_ok());
        assert!(ImportFormat::from_extension("xlsx").is_err());
    }

    #[test]
    fn test_decode_rejects_missing_data_field() {
        assert!(decode(r#"{"version":"2.0"}"#, ImportFormat::Json).is_err());
        assert!(decode("not json", ImportFormat::Json).is_err());
    }
}
