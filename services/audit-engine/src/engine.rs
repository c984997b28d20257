use freightverify_models::{AuditResult, DocumentSet, RawDocumentSet};
use freightverify_utils::{FreightResult, ReconciliationPolicy};
use tracing::debug;

use crate::aggregator::aggregate;
use crate::cross_document::{CrossDocumentRule, Reconciler};
use crate::intra_document::IntraDocumentValidator;
use crate::normalizer::{ensure_computable, normalize_document_set};

/// Synchronous reconciliation core: normalize, validate, reconcile, aggregate.
///
/// Holds only the policy-derived rule set, so one engine can serve any number
/// of concurrent audits.
#[derive(Debug)]
pub struct AuditEngine {
    validator: IntraDocumentValidator,
    reconciler: Reconciler,
}

impl AuditEngine {
    pub fn new(policy: &ReconciliationPolicy) -> FreightResult<Self> {
        policy.validate()?;

        Ok(Self {
            validator: IntraDocumentValidator::new(policy),
            reconciler: Reconciler::new(policy),
        })
    }

    /// Add a cross-document rule that runs after the built-in ones.
    pub fn with_rule(mut self, rule: impl CrossDocumentRule + 'static) -> Self {
        self.reconciler = self.reconciler.with_rule(rule);
        self
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.reconciler.rule_names()
    }

    /// Audit an extraction. A malformed field aborts with no result.
    pub fn audit(&self, raw: &RawDocumentSet) -> FreightResult<AuditResult> {
        let documents = normalize_document_set(raw)?;
        self.audit_normalized(documents)
    }

    /// Audit a set built outside the normalizer. Negative values or arithmetic
    /// past the `Decimal` range abort with a malformed-field error.
    pub fn audit_normalized(&self, documents: DocumentSet) -> FreightResult<AuditResult> {
        ensure_computable(&documents)?;

        let intra = self.validator.validate(&documents)?;
        let cross = self.reconciler.reconcile(&documents);

        debug!(
            intra_count = intra.discrepancies.len(),
            cross_count = cross.len(),
            "Checks complete"
        );

        Ok(aggregate(documents, intra, cross))
    }
}

impl Default for AuditEngine {
    fn default() -> Self {
        Self {
            validator: IntraDocumentValidator::default(),
            reconciler: Reconciler::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::documents;
    use freightverify_models::ErrorKind;
    use freightverify_utils::AuditError;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn test_passing_shipment() {
        let result = AuditEngine::default().audit_normalized(documents()).unwrap();
        assert!(result.passed());
        assert_eq!(result.line_item_checks().len(), 1);
    }

    #[test]
    fn test_all_checks_contribute_in_order() {
        let mut docs = documents();
        docs.invoice.total_amount = dec!(120.00);
        docs.bill_of_lading.package_count = 3;

        let result = AuditEngine::default().audit_normalized(docs).unwrap();
        let kinds: Vec<ErrorKind> = result.discrepancies().iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![ErrorKind::InvoiceTotalMismatch, ErrorKind::PackageCountMismatch]);
    }

    #[test]
    fn test_out_of_range_amounts_abort_instead_of_panicking() {
        let mut docs = documents();
        docs.invoice.line_items[0].quantity = dec!(1000000000000000);
        docs.invoice.line_items[0].unit_price = dec!(1000000000000000);

        let error = AuditEngine::default().audit_normalized(docs).unwrap_err();
        assert!(matches!(
            error,
            AuditError::MalformedField { ref field, .. } if field == "line_items[0].quantity"
        ));
    }

    #[test]
    fn test_negative_values_in_hand_built_set_rejected() {
        let mut docs = documents();
        docs.bill_of_lading.gross_weight_kg = Decimal::MIN;

        let error = AuditEngine::default().audit_normalized(docs).unwrap_err();
        assert_eq!(error.error_code(), "MALFORMED_FIELD");
    }

    #[test]
    fn test_rejects_invalid_policy() {
        let policy = ReconciliationPolicy {
            weight_tolerance_kg: dec!(-1),
            ..ReconciliationPolicy::default()
        };

        let error = AuditEngine::new(&policy).unwrap_err();
        assert_eq!(error.error_code(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn test_malformed_raw_input_aborts() {
        let error = AuditEngine::default().audit(&RawDocumentSet::default()).unwrap_err();
        assert!(matches!(error, AuditError::MalformedField { .. }));
    }
}
