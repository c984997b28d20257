use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{BillOfLading, DocumentKind, DocumentSet, Invoice, PackingList};

/// Kinds of inconsistency the audit can detect. None of them is fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    LineItemMathMismatch,
    InvoiceTotalMismatch,
    WeightMismatch,
    PackageCountMismatch,
    UnitCountMismatch,
    ReferenceMismatch,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LineItemMathMismatch => write!(f, "LineItemMathMismatch"),
            Self::InvoiceTotalMismatch => write!(f, "InvoiceTotalMismatch"),
            Self::WeightMismatch => write!(f, "WeightMismatch"),
            Self::PackageCountMismatch => write!(f, "PackageCountMismatch"),
            Self::UnitCountMismatch => write!(f, "UnitCountMismatch"),
            Self::ReferenceMismatch => write!(f, "ReferenceMismatch"),
        }
    }
}

/// Points at the document field a discrepancy was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldRef {
    pub document: DocumentKind,
    pub field: String,
}

impl FieldRef {
    pub fn new(document: DocumentKind, field: impl Into<String>) -> Self {
        Self {
            document,
            field: field.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Discrepancy {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldRef>,
}

impl Discrepancy {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, document: DocumentKind, field: impl Into<String>) -> Self {
        self.fields.push(FieldRef::new(document, field));
        self
    }
}

impl std::fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Outcome of the line item arithmetic check for one invoice row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineItemCheck {
    /// Position in `invoice.line_items`.
    pub index: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub calculated_total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub difference: Decimal,
    pub within_tolerance: bool,
}

/// Verdict for one document set.
///
/// Built only through [`AuditResult::from_findings`], which is what the verdict
/// aggregator calls; `passed` is derived there and nowhere else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditResult {
    passed: bool,
    discrepancies: Vec<Discrepancy>,
    line_item_checks: Vec<LineItemCheck>,
    documents: DocumentSet,
}

impl AuditResult {
    pub fn from_findings(
        documents: DocumentSet,
        discrepancies: Vec<Discrepancy>,
        line_item_checks: Vec<LineItemCheck>,
    ) -> Self {
        Self {
            passed: discrepancies.is_empty(),
            discrepancies,
            line_item_checks,
            documents,
        }
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    /// Discrepancies in detection order.
    pub fn discrepancies(&self) -> &[Discrepancy] {
        &self.discrepancies
    }

    pub fn line_item_checks(&self) -> &[LineItemCheck] {
        &self.line_item_checks
    }

    pub fn documents(&self) -> &DocumentSet {
        &self.documents
    }

    /// Display strings of every discrepancy, in order.
    pub fn error_messages(&self) -> Vec<String> {
        self.discrepancies.iter().map(|d| d.to_string()).collect()
    }

    pub fn has_kind(&self, kind: ErrorKind) -> bool {
        self.discrepancies.iter().any(|d| d.kind == kind)
    }
}

/// `data` section of the wire response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditData {
    pub invoice: Invoice,
    pub packing_list: PackingList,
    pub bill_of_lading: BillOfLading,
}

impl From<&DocumentSet> for AuditData {
    fn from(documents: &DocumentSet) -> Self {
        Self {
            invoice: documents.invoice.clone(),
            packing_list: documents.packing_list.clone(),
            bill_of_lading: documents.bill_of_lading.clone(),
        }
    }
}

/// Wire form of an audit: `{ passed, errors, data }` plus the optional report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditResponse {
    pub passed: bool,
    pub errors: Vec<String>,
    pub data: AuditData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_base64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_error: Option<String>,
}

impl From<&AuditResult> for AuditResponse {
    fn from(result: &AuditResult) -> Self {
        Self {
            passed: result.passed(),
            errors: result.error_messages(),
            data: AuditData::from(result.documents()),
            report_base64: None,
            report_error: None,
        }
    }
}
