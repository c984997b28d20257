//! Intra-Document Validator
//!
//! Checks each document against itself before anything is compared across
//! documents. Only the Commercial Invoice carries arithmetic today; Packing
//! List and Bill of Lading are limited to the field presence enforced during
//! normalization. New per-document rules belong in [`IntraDocumentValidator::validate`].

use freightverify_models::{Discrepancy, DocumentKind, DocumentSet, ErrorKind, Invoice, LineItemCheck};
use freightverify_utils::{FreightResult, ReconciliationPolicy};
use rust_decimal::Decimal;
use tracing::debug;

use crate::normalizer::{line_items_sum, line_total};

/// Output of the intra-document pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntraDocumentFindings {
    /// One entry per invoice line, in invoice order.
    pub line_item_checks: Vec<LineItemCheck>,
    /// Line item mismatches in invoice order, then the total-sum mismatch.
    pub discrepancies: Vec<Discrepancy>,
}

#[derive(Debug, Clone)]
pub struct IntraDocumentValidator {
    line_item_tolerance: Decimal,
    invoice_total_tolerance: Decimal,
}

impl IntraDocumentValidator {
    pub fn new(policy: &ReconciliationPolicy) -> Self {
        Self {
            line_item_tolerance: policy.line_item_tolerance,
            invoice_total_tolerance: policy.invoice_total_tolerance,
        }
    }

    /// Fails only when the invoice arithmetic leaves the `Decimal` range.
    pub fn validate(&self, documents: &DocumentSet) -> FreightResult<IntraDocumentFindings> {
        let mut findings = IntraDocumentFindings::default();

        self.check_line_items(&documents.invoice, &mut findings)?;
        self.check_invoice_total(&documents.invoice, &mut findings)?;

        Ok(findings)
    }

    fn check_line_items(&self, invoice: &Invoice, findings: &mut IntraDocumentFindings) -> FreightResult<()> {
        for (index, item) in invoice.line_items.iter().enumerate() {
            let calculated = line_total(index, item)?;
            let difference = (calculated - item.total_price).abs();
            let within_tolerance = difference <= self.line_item_tolerance;

            debug!(
                index,
                %calculated,
                total_price = %item.total_price,
                within_tolerance,
                "Line item math check"
            );

            if !within_tolerance {
                findings.discrepancies.push(
                    Discrepancy::new(
                        ErrorKind::LineItemMathMismatch,
                        format!(
                            "Math error in '{}': {} x {:.2} = {:.2} but total shows {:.2}",
                            item.description,
                            item.quantity.normalize(),
                            item.unit_price,
                            calculated,
                            item.total_price
                        ),
                    )
                    .with_field(DocumentKind::Invoice, format!("line_items[{}].total_price", index)),
                );
            }

            findings.line_item_checks.push(LineItemCheck {
                index,
                calculated_total: calculated,
                difference,
                within_tolerance,
            });
        }

        Ok(())
    }

    fn check_invoice_total(&self, invoice: &Invoice, findings: &mut IntraDocumentFindings) -> FreightResult<()> {
        let sum = line_items_sum(invoice)?;
        let difference = (sum - invoice.total_amount).abs();

        debug!(%sum, total_amount = %invoice.total_amount, %difference, "Invoice total check");

        if difference > self.invoice_total_tolerance {
            findings.discrepancies.push(
                Discrepancy::new(
                    ErrorKind::InvoiceTotalMismatch,
                    format!(
                        "Line items sum to {:.2} but invoice total is {:.2}",
                        sum, invoice.total_amount
                    ),
                )
                .with_field(DocumentKind::Invoice, "total_amount")
                .with_field(DocumentKind::Invoice, "line_items"),
            );
        }

        Ok(())
    }
}

impl Default for IntraDocumentValidator {
    fn default() -> Self {
        Self::new(&ReconciliationPolicy::default())
    }
}
