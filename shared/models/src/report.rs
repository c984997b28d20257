//! Report payload handed to the report renderer.
//!
//! The payload is display-ready: every value is already formatted, so a
//! renderer only lays it out.

use serde::{Deserialize, Serialize};

pub const PASSED_LABEL: &str = "PASSED / COMPLIANT";
pub const FAILED_LABEL: &str = "FAILED / DISCREPANCIES FOUND";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBanner {
    pub passed: bool,
    pub label: String,
}

impl StatusBanner {
    pub fn for_verdict(passed: bool) -> Self {
        let label = if passed { PASSED_LABEL } else { FAILED_LABEL };
        Self {
            passed,
            label: label.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub label: String,
    pub value: String,
}

/// One invoice row as displayed, with the math flag from the audit run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemRow {
    pub description: String,
    pub quantity: String,
    pub unit_price: String,
    pub total_price: String,
    pub math_ok: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPayload {
    pub issuer_name: String,
    /// RFC 3339 timestamp supplied by the caller.
    pub generated_at: String,
    pub banner: StatusBanner,
    pub summary: Vec<SummaryRow>,
    pub discrepancies: Vec<String>,
    pub line_items: Vec<LineItemRow>,
    pub invoice_total: String,
    pub documents_fingerprint: String,
}

/// Binary output of a report renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReport {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A rendered report encoded for transport next to the verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedReport {
    pub content_type: String,
    pub base64: String,
}
