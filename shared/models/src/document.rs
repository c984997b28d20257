//! Trade document models for the FreightVerify audit system.
//!
//! Two layers live here:
//!
//! - **Raw records** (`Raw*`) exactly as the extraction collaborator hands them
//!   over. Numeric fields may arrive as JSON numbers or as text, and any of them
//!   may be missing.
//! - **Normalized records** (`Invoice`, `PackingList`, `BillOfLading`,
//!   `DocumentSet`) with exact decimals rounded to two fractional digits. These
//!   are what every check reads.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// The three trade documents of one shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Invoice,
    PackingList,
    BillOfLading,
}

impl DocumentKind {
    /// Human readable document title used in messages and reports.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Invoice => "Commercial Invoice",
            Self::PackingList => "Packing List",
            Self::BillOfLading => "Bill of Lading",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invoice => write!(f, "invoice"),
            Self::PackingList => write!(f, "packing_list"),
            Self::BillOfLading => write!(f, "bill_of_lading"),
        }
    }
}

// ===== Raw extraction records =====

/// A numeric field as extracted: either a JSON number or free text such as `"1,250.00"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Number(f64),
    Text(String),
}

impl std::fmt::Display for RawNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{}", value),
            Self::Text(text) => write!(f, "{}", text),
        }
    }
}

impl From<f64> for RawNumber {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for RawNumber {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct RawLineItem {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub quantity: Option<RawNumber>,
    #[serde(default)]
    pub unit_price: Option<RawNumber>,
    #[serde(default)]
    pub total_price: Option<RawNumber>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct RawInvoice {
    #[serde(default)]
    #[validate(custom = "not_blank")]
    pub invoice_number: String,
    #[serde(default)]
    #[validate(custom = "not_blank")]
    pub currency: String,
    #[serde(default)]
    pub total_amount: Option<RawNumber>,
    #[serde(default)]
    #[validate(length(min = 1, message = "Invoice must contain at least one line item"))]
    pub line_items: Vec<RawLineItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct RawPackingList {
    #[serde(default)]
    pub gross_weight_kg: Option<RawNumber>,
    #[serde(default)]
    pub total_packages: Option<RawNumber>,
    #[serde(default)]
    pub total_units_count: Option<RawNumber>,
    /// Identifiers of other documents printed on the packing list, if extracted.
    #[serde(default)]
    pub referenced_documents: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct RawBillOfLading {
    #[serde(default)]
    #[validate(custom = "not_blank")]
    pub bol_number: String,
    #[serde(default)]
    pub gross_weight_kg: Option<RawNumber>,
    #[serde(default)]
    pub package_count: Option<RawNumber>,
    /// Identifiers of other documents printed on the bill of lading, if extracted.
    #[serde(default)]
    pub referenced_documents: Vec<String>,
}

/// Extraction output for one shipment, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct RawDocumentSet {
    #[validate]
    pub invoice: RawInvoice,
    #[validate]
    pub packing_list: RawPackingList,
    #[validate]
    pub bill_of_lading: RawBillOfLading,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("must not be blank".into());
        return Err(error);
    }
    Ok(())
}

// ===== Normalized records =====

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
}

impl LineItem {
    /// `quantity * unit_price`, exact.
    /// `quantity * unit_price`, `None` when the product leaves the `Decimal` range.
    pub fn calculated_total(&self) -> Option<Decimal> {
        self.quantity.checked_mul(self.unit_price)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Invoice {
    pub invoice_number: String,
    pub currency: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub line_items: Vec<LineItem>,
}

impl Invoice {
    /// Sum of line totals, `None` on overflow.
    pub fn line_items_total(&self) -> Option<Decimal> {
        self.line_items
            .iter()
            .try_fold(Decimal::ZERO, |sum, item| sum.checked_add(item.total_price))
    }

    /// Sum of line quantities, `None` on overflow.
    pub fn total_quantity(&self) -> Option<Decimal> {
        self.line_items
            .iter()
            .try_fold(Decimal::ZERO, |sum, item| sum.checked_add(item.quantity))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackingList {
    #[serde(with = "rust_decimal::serde::float")]
    pub gross_weight_kg: Decimal,
    pub total_packages: u32,
    pub total_units_count: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub referenced_documents: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BillOfLading {
    pub bol_number: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub gross_weight_kg: Decimal,
    pub package_count: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub referenced_documents: Vec<String>,
}

/// The unit of work for one audit: exactly one of each document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentSet {
    pub invoice: Invoice,
    pub packing_list: PackingList,
    pub bill_of_lading: BillOfLading,
}

impl DocumentSet {
    /// SHA-256 over the canonical JSON form of the normalized documents.
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        hasher.update(serde_json::to_vec(self).unwrap_or_default());

        hex::encode(hasher.finalize())
    }
}

// ===== Source documents handed to the extraction collaborator =====

/// One uploaded trade document, opaque to the audit core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl SourceDocument {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocuments {
    pub invoice: SourceDocument,
    pub packing_list: SourceDocument,
    pub bill_of_lading: SourceDocument,
}

impl SourceDocuments {
    pub fn get(&self, kind: DocumentKind) -> &SourceDocument {
        match kind {
            DocumentKind::Invoice => &self.invoice,
            DocumentKind::PackingList => &self.packing_list,
            DocumentKind::BillOfLading => &self.bill_of_lading,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_raw_number_accepts_numbers_and_text() {
        let raw: RawLineItem = serde_json::from_str(
            r#"{"description": "Bolts", "quantity": 5, "unit_price": "20.00", "total_price": 100.0}"#,
        )
        .unwrap();

        assert_eq!(raw.quantity, Some(RawNumber::Number(5.0)));
        assert_eq!(raw.unit_price, Some(RawNumber::Text("20.00".to_string())));
    }

    #[test]
    fn test_missing_fields_default() {
        let raw: RawDocumentSet = serde_json::from_str(
            r#"{"invoice": {}, "packing_list": {}, "bill_of_lading": {}}"#,
        )
        .unwrap();

        assert!(raw.invoice.total_amount.is_none());
        assert!(raw.invoice.line_items.is_empty());
        assert!(raw.bill_of_lading.referenced_documents.is_empty());
        assert!(raw.validate().is_err());
    }

    #[test]
    fn test_blank_identifiers_fail_validation() {
        let mut raw = RawDocumentSet::default();
        raw.invoice.invoice_number = "INV-1".to_string();
        raw.invoice.currency = "USD".to_string();
        raw.invoice.line_items.push(RawLineItem::default());
        raw.bill_of_lading.bol_number = "   ".to_string();

        assert!(raw.validate().is_err());

        raw.bill_of_lading.bol_number = "BOL-9".to_string();
        assert!(raw.validate().is_ok());
    }

    #[test]
    fn test_invoice_sums() {
        let invoice = Invoice {
            invoice_number: "INV-1".to_string(),
            currency: "USD".to_string(),
            total_amount: dec!(150.00),
            line_items: vec![
                LineItem {
                    description: "A".to_string(),
                    quantity: dec!(2),
                    unit_price: dec!(50.00),
                    total_price: dec!(100.00),
                },
                LineItem {
                    description: "B".to_string(),
                    quantity: dec!(1),
                    unit_price: dec!(50.00),
                    total_price: dec!(50.00),
                },
            ],
        };

        assert_eq!(invoice.line_items_total(), Some(dec!(150.00)));
        assert_eq!(invoice.total_quantity(), Some(dec!(3)));
        assert_eq!(invoice.line_items[0].calculated_total(), Some(dec!(100.00)));
    }

    #[test]
    fn test_invoice_sums_report_overflow() {
        let huge = LineItem {
            description: "Bulk".to_string(),
            quantity: Decimal::MAX,
            unit_price: dec!(2),
            total_price: Decimal::MAX,
        };
        let invoice = Invoice {
            invoice_number: "INV-2".to_string(),
            currency: "USD".to_string(),
            total_amount: Decimal::MAX,
            line_items: vec![huge.clone(), huge],
        };

        assert_eq!(invoice.line_items[0].calculated_total(), None);
        assert_eq!(invoice.line_items_total(), None);
        assert_eq!(invoice.total_quantity(), None);
    }

    #[test]
    fn test_normalized_records_serialize_as_numbers() {
        let bol = BillOfLading {
            bol_number: "BOL-1".to_string(),
            gross_weight_kg: dec!(50.5),
            package_count: 2,
            referenced_documents: Vec::new(),
        };

        let json = serde_json::to_value(&bol).unwrap();
        assert_eq!(json["gross_weight_kg"], serde_json::json!(50.5));
        assert!(json.get("referenced_documents").is_none());
    }

    #[test]
    fn test_document_kind_display() {
        assert_eq!(DocumentKind::BillOfLading.to_string(), "bill_of_lading");
        assert_eq!(DocumentKind::PackingList.title(), "Packing List");
    }
}
