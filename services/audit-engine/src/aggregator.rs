//! Verdict Aggregator
//!
//! The only place a verdict is decided.

use freightverify_models::{AuditResult, Discrepancy, DocumentSet};
use tracing::info;

use crate::intra_document::IntraDocumentFindings;

/// Intra-document findings first, then cross-document ones, order preserved.
pub fn aggregate(
    documents: DocumentSet,
    intra: IntraDocumentFindings,
    cross: Vec<Discrepancy>,
) -> AuditResult {
    let IntraDocumentFindings {
        line_item_checks,
        mut discrepancies,
    } = intra;
    discrepancies.extend(cross);

    let result = AuditResult::from_findings(documents, discrepancies, line_item_checks);

    info!(
        passed = result.passed(),
        discrepancy_count = result.discrepancies().len(),
        invoice_number = %result.documents().invoice.invoice_number,
        "Audit verdict"
    );

    result
}
