//! Report Assembler
//!
//! Maps a verdict into a display-ready [`ReportPayload`]. Line math flags are
//! read from the checks recorded during the audit, never recomputed here.

use chrono::{DateTime, SecondsFormat, Utc};
use freightverify_models::{AuditResult, LineItemRow, ReportPayload, StatusBanner, SummaryRow};
use freightverify_utils::ReportConfig;

#[derive(Debug, Clone)]
pub struct ReportAssembler {
    issuer_name: String,
}

impl ReportAssembler {
    pub fn new(issuer_name: impl Into<String>) -> Self {
        Self {
            issuer_name: issuer_name.into(),
        }
    }

    pub fn from_config(config: &ReportConfig) -> Self {
        Self::new(config.issuer_name.clone())
    }

    /// Deterministic for a given `generated_at`.
    pub fn assemble(&self, result: &AuditResult, generated_at: DateTime<Utc>) -> ReportPayload {
        let documents = result.documents();
        let invoice = &documents.invoice;
        let packing_list = &documents.packing_list;

        let summary = vec![
            row("Invoice Number", invoice.invoice_number.clone()),
            row("Bill of Lading Number", documents.bill_of_lading.bol_number.clone()),
            row("Total Weight (kg)", format!("{:.2} kg", packing_list.gross_weight_kg)),
            row("Total Packages", packing_list.total_packages.to_string()),
            row(
                "Invoice Total Amount",
                format!("{:.2} {}", invoice.total_amount, invoice.currency),
            ),
            row("Total Units Count", packing_list.total_units_count.to_string()),
        ];

        let checks = result.line_item_checks();
        let line_items = invoice
            .line_items
            .iter()
            .enumerate()
            .map(|(index, item)| LineItemRow {
                description: item.description.clone(),
                quantity: item.quantity.normalize().to_string(),
                unit_price: format!("{:.2}", item.unit_price),
                total_price: format!("{:.2}", item.total_price),
                math_ok: checks
                    .iter()
                    .find(|check| check.index == index)
                    .map_or(true, |check| check.within_tolerance),
            })
            .collect();

        ReportPayload {
            issuer_name: self.issuer_name.clone(),
            generated_at: generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            banner: StatusBanner::for_verdict(result.passed()),
            summary,
            discrepancies: result.error_messages(),
            line_items,
            invoice_total: format!("{:.2} {}", invoice.total_amount, invoice.currency),
            documents_fingerprint: documents.fingerprint(),
        }
    }
}

impl Default for ReportAssembler {
    fn default() -> Self {
        Self::from_config(&ReportConfig::default())
    }
}

fn row(label: &str, value: String) -> SummaryRow {
    SummaryRow {
        label: label.to_string(),
        value,
    }
}
