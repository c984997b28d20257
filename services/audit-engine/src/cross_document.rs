//! Cross-Document Reconciler
//!
//! Compares the same physical quantity as reported by different documents.
//! Built-in rules always run in this order: weight, packages, units,
//! references. Rules added with [`Reconciler::with_rule`] run after them.

use freightverify_models::{Discrepancy, DocumentKind, DocumentSet, ErrorKind};
use freightverify_utils::{ReconciliationPolicy, ReferenceRequirement, UnitCountRule};
use rust_decimal::Decimal;
use tracing::debug;

use crate::normalizer::identifiers_match;

/// One cross-document consistency rule.
pub trait CrossDocumentRule: Send + Sync {
    fn name(&self) -> &'static str;

    /// Discrepancies found, in a stable order.
    fn check(&self, documents: &DocumentSet) -> Vec<Discrepancy>;
}

/// Packing list vs bill of lading gross weight, within an absolute tolerance.
#[derive(Debug, Clone)]
pub struct WeightRule {
    pub tolerance_kg: Decimal,
}

impl CrossDocumentRule for WeightRule {
    fn name(&self) -> &'static str {
        "weight"
    }

    fn check(&self, documents: &DocumentSet) -> Vec<Discrepancy> {
        let packing = documents.packing_list.gross_weight_kg;
        let lading = documents.bill_of_lading.gross_weight_kg;
        let difference = (packing - lading).abs();

        debug!(%packing, %lading, %difference, tolerance = %self.tolerance_kg, "Weight check");

        if difference <= self.tolerance_kg {
            return Vec::new();
        }

        vec![Discrepancy::new(
            ErrorKind::WeightMismatch,
            format!(
                "Gross weight differs between Packing List ({:.2} kg) and Bill of Lading ({:.2} kg) by {:.2} kg, tolerance {:.2} kg",
                packing, lading, difference, self.tolerance_kg
            ),
        )
        .with_field(DocumentKind::PackingList, "gross_weight_kg")
        .with_field(DocumentKind::BillOfLading, "gross_weight_kg")]
    }
}

/// Package counts are discrete and must match exactly.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackageCountRule;

impl CrossDocumentRule for PackageCountRule {
    fn name(&self) -> &'static str {
        "packages"
    }

    fn check(&self, documents: &DocumentSet) -> Vec<Discrepancy> {
        let packing = documents.packing_list.total_packages;
        let lading = documents.bill_of_lading.package_count;

        debug!(packing, lading, "Package count check");

        if packing == lading {
            return Vec::new();
        }

        vec![Discrepancy::new(
            ErrorKind::PackageCountMismatch,
            format!(
                "Packing List reports {} packages but Bill of Lading reports {}",
                packing, lading
            ),
        )
        .with_field(DocumentKind::PackingList, "total_packages")
        .with_field(DocumentKind::BillOfLading, "package_count")]
    }
}

/// Packing list unit count vs the invoiced quantities, per [`UnitCountRule`].
#[derive(Debug, Clone)]
pub struct UnitCountCheck {
    pub rule: UnitCountRule,
}

impl CrossDocumentRule for UnitCountCheck {
    fn name(&self) -> &'static str {
        "units"
    }

    fn check(&self, documents: &DocumentSet) -> Vec<Discrepancy> {
        let invoiced = documents.invoice.total_quantity();
        let packed = Decimal::from(documents.packing_list.total_units_count);

        let mismatch = match (self.rule, invoiced) {
            (UnitCountRule::Disabled, _) => false,
            // a quantity sum past the Decimal range exceeds any u64 unit count
            (_, None) => true,
            (UnitCountRule::Tolerance { max_divergence }, Some(invoiced)) => {
                (packed - invoiced).abs() > max_divergence
            }
            (UnitCountRule::AtLeastInvoice { max_divergence }, Some(invoiced)) => {
                invoiced - packed > max_divergence
            }
        };

        let invoiced = invoiced.map_or_else(
            || format!("more than {}", Decimal::MAX),
            |quantity| quantity.normalize().to_string(),
        );

        debug!(%invoiced, %packed, mismatch, "Unit count check");

        if !mismatch {
            return Vec::new();
        }

        vec![Discrepancy::new(
            ErrorKind::UnitCountMismatch,
            format!(
                "Invoice has {} units but Packing List has {} units",
                invoiced, packed
            ),
        )
        .with_field(DocumentKind::Invoice, "line_items.quantity")
        .with_field(DocumentKind::PackingList, "total_units_count")]
    }
}

/// The invoice number must appear among each document's references.
#[derive(Debug, Clone)]
pub struct ReferenceRule {
    pub on_bill_of_lading: ReferenceRequirement,
    pub on_packing_list: ReferenceRequirement,
}

impl ReferenceRule {
    fn check_document(
        &self,
        invoice_number: &str,
        document: DocumentKind,
        references: &[String],
        requirement: ReferenceRequirement,
    ) -> Option<Discrepancy> {
        let populated = references.iter().any(|r| !r.trim().is_empty());

        let message = match requirement {
            ReferenceRequirement::Skip => return None,
            ReferenceRequirement::IfPresent if !populated => {
                debug!(%document, "Reference check skipped, no references extracted");
                return None;
            }
            ReferenceRequirement::Required if !populated => format!(
                "Invoice number '{}' is not referenced: the {} carries no document references",
                invoice_number.trim(),
                document.title()
            ),
            _ => {
                if references.iter().any(|r| identifiers_match(r, invoice_number)) {
                    return None;
                }
                format!(
                    "Invoice number '{}' is not referenced on the {}",
                    invoice_number.trim(),
                    document.title()
                )
            }
        };

        Some(
            Discrepancy::new(ErrorKind::ReferenceMismatch, message)
                .with_field(DocumentKind::Invoice, "invoice_number")
                .with_field(document, "referenced_documents"),
        )
    }
}

impl CrossDocumentRule for ReferenceRule {
    fn name(&self) -> &'static str {
        "references"
    }

    fn check(&self, documents: &DocumentSet) -> Vec<Discrepancy> {
        let invoice_number = &documents.invoice.invoice_number;

        [
            (
                DocumentKind::BillOfLading,
                &documents.bill_of_lading.referenced_documents,
                self.on_bill_of_lading,
            ),
            (
                DocumentKind::PackingList,
                &documents.packing_list.referenced_documents,
                self.on_packing_list,
            ),
        ]
        .into_iter()
        .filter_map(|(document, references, requirement)| {
            self.check_document(invoice_number, document, references, requirement)
        })
        .collect()
    }
}

/// Ordered set of cross-document rules.
pub struct Reconciler {
    rules: Vec<Box<dyn CrossDocumentRule>>,
}

impl Reconciler {
    pub fn new(policy: &ReconciliationPolicy) -> Self {
        Self {
            rules: vec![
                Box::new(WeightRule {
                    tolerance_kg: policy.weight_tolerance_kg,
                }),
                Box::new(PackageCountRule),
                Box::new(UnitCountCheck {
                    rule: policy.unit_count,
                }),
                Box::new(ReferenceRule {
                    on_bill_of_lading: policy.invoice_reference_on_bill_of_lading,
                    on_packing_list: policy.invoice_reference_on_packing_list,
                }),
            ],
        }
    }

    /// Append a rule after the built-in ones.
    pub fn with_rule(mut self, rule: impl CrossDocumentRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    pub fn reconcile(&self, documents: &DocumentSet) -> Vec<Discrepancy> {
        self.rules
            .iter()
            .flat_map(|rule| rule.check(documents))
            .collect()
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(&ReconciliationPolicy::default())
    }
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("rules", &self.rule_names())
            .finish()
    }
}
