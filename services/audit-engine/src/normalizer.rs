//! Field Normalizer
//!
//! Turns extracted records into exact decimals at currency/weight precision.
//! Identifier strings are stored verbatim; [`normalize_identifier`] is only
//! used when comparing them.

use std::str::FromStr;

use freightverify_models::{
    BillOfLading, DocumentKind, DocumentSet, Invoice, LineItem, PackingList, RawBillOfLading,
    RawDocumentSet, RawInvoice, RawNumber, RawPackingList,
};
use freightverify_utils::{validate_model, AuditError, FreightResult};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

/// Fractional digits kept for amounts, prices, quantities and weights.
pub const DECIMAL_PLACES: u32 = 2;

/// Round half-up to [`DECIMAL_PLACES`].
pub fn round_amount(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Comparison key for identifiers: surrounding whitespace trimmed, lowercased.
pub fn normalize_identifier(value: &str) -> String {
    value.trim().to_lowercase()
}

pub fn identifiers_match(left: &str, right: &str) -> bool {
    normalize_identifier(left) == normalize_identifier(right)
}

/// Parse a required non-negative decimal and round it to [`DECIMAL_PLACES`].
pub fn parse_amount(document: DocumentKind, field: &str, raw: Option<&RawNumber>) -> FreightResult<Decimal> {
    parse_non_negative(document, field, raw).map(round_amount)
}

/// Parse a required non-negative whole number.
pub fn parse_count(document: DocumentKind, field: &str, raw: Option<&RawNumber>) -> FreightResult<u64> {
    let value = parse_non_negative(document, field, raw)?;

    if !value.fract().is_zero() {
        return Err(AuditError::malformed_field(
            document.to_string(),
            field,
            format!("expected a whole number, got {}", value),
        ));
    }

    value.trunc().to_u64().ok_or_else(|| {
        AuditError::malformed_field(document.to_string(), field, format!("{} is out of range", value))
    })
}

fn parse_package_count(document: DocumentKind, field: &str, raw: Option<&RawNumber>) -> FreightResult<u32> {
    let count = parse_count(document, field, raw)?;
    u32::try_from(count).map_err(|_| {
        AuditError::malformed_field(document.to_string(), field, format!("{} is out of range", count))
    })
}

fn parse_non_negative(document: DocumentKind, field: &str, raw: Option<&RawNumber>) -> FreightResult<Decimal> {
    let malformed = |message: String| AuditError::malformed_field(document.to_string(), field, message);

    let value = match raw {
        None => return Err(malformed("is missing".to_string())),
        Some(RawNumber::Number(number)) => {
            if !number.is_finite() {
                return Err(malformed(format!("{} is not a finite number", number)));
            }
            Decimal::from_f64(*number).ok_or_else(|| malformed(format!("{} is out of range", number)))?
        }
        Some(RawNumber::Text(text)) => parse_text(text).map_err(malformed)?,
    };

    if value.is_sign_negative() && !value.is_zero() {
        return Err(malformed(format!("must not be negative, got {}", value)));
    }

    Ok(value)
}

/// Parse a required weight; it must be strictly positive.
pub fn parse_weight(document: DocumentKind, field: &str, raw: Option<&RawNumber>) -> FreightResult<Decimal> {
    let weight = parse_amount(document, field, raw)?;

    if weight.is_zero() {
        return Err(AuditError::malformed_field(
            document.to_string(),
            field,
            "must be greater than zero",
        ));
    }

    Ok(weight)
}

/// Accepts `"1,250.50"`, `" 42 "`, `"1 000"` and scientific notation.
fn parse_text(text: &str) -> Result<Decimal, String> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return Err("is empty".to_string());
    }

    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .map_err(|_| format!("'{}' is not a number", text))
}

/// `quantity * unit_price` of line `index`, or a malformed-field error when it
/// does not fit in a `Decimal`.
pub fn line_total(index: usize, item: &LineItem) -> FreightResult<Decimal> {
    item.calculated_total().ok_or_else(|| {
        AuditError::malformed_field(
            DocumentKind::Invoice.to_string(),
            format!("line_items[{}].quantity", index),
            format!(
                "{} x {} exceeds the supported numeric range",
                item.quantity, item.unit_price
            ),
        )
    })
}

pub fn line_items_sum(invoice: &Invoice) -> FreightResult<Decimal> {
    invoice.line_items_total().ok_or_else(|| {
        AuditError::malformed_field(
            DocumentKind::Invoice.to_string(),
            "line_items",
            "sum of line totals exceeds the supported numeric range",
        )
    })
}

pub fn quantity_sum(invoice: &Invoice) -> FreightResult<Decimal> {
    invoice.total_quantity().ok_or_else(|| {
        AuditError::malformed_field(
            DocumentKind::Invoice.to_string(),
            "line_items",
            "sum of quantities exceeds the supported numeric range",
        )
    })
}

/// Guards the arithmetic the checks perform: every decimal is non-negative
/// and every product and sum they take stays in the `Decimal` range.
///
/// [`normalize_document_set`] always produces sets that pass.
pub fn ensure_computable(documents: &DocumentSet) -> FreightResult<()> {
    let invoice = &documents.invoice;

    non_negative(DocumentKind::Invoice, "total_amount", invoice.total_amount)?;
    for (index, item) in invoice.line_items.iter().enumerate() {
        let field = |name: &str| format!("line_items[{}].{}", index, name);
        non_negative(DocumentKind::Invoice, &field("quantity"), item.quantity)?;
        non_negative(DocumentKind::Invoice, &field("unit_price"), item.unit_price)?;
        non_negative(DocumentKind::Invoice, &field("total_price"), item.total_price)?;
        line_total(index, item)?;
    }
    line_items_sum(invoice)?;
    quantity_sum(invoice)?;

    non_negative(
        DocumentKind::PackingList,
        "gross_weight_kg",
        documents.packing_list.gross_weight_kg,
    )?;
    non_negative(
        DocumentKind::BillOfLading,
        "gross_weight_kg",
        documents.bill_of_lading.gross_weight_kg,
    )?;

    Ok(())
}

fn non_negative(document: DocumentKind, field: &str, value: Decimal) -> FreightResult<()> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(AuditError::malformed_field(
            document.to_string(),
            field,
            format!("must not be negative, got {}", value),
        ));
    }
    Ok(())
}

/// Validate and normalize a full extraction into a [`DocumentSet`].
///
/// Fails on the first malformed field; no partial set is produced.
pub fn normalize_document_set(raw: &RawDocumentSet) -> FreightResult<DocumentSet> {
    validate_model("document_set", raw)?;

    let documents = DocumentSet {
        invoice: normalize_invoice(&raw.invoice)?,
        packing_list: normalize_packing_list(&raw.packing_list)?,
        bill_of_lading: normalize_bill_of_lading(&raw.bill_of_lading)?,
    };
    ensure_computable(&documents)?;

    Ok(documents)
}

fn normalize_invoice(raw: &RawInvoice) -> FreightResult<Invoice> {
    let kind = DocumentKind::Invoice;

    let line_items = raw
        .line_items
        .iter()
        .enumerate()
        .map(|(index, item)| -> FreightResult<LineItem> {
            let field = |name: &str| format!("line_items[{}].{}", index, name);
            Ok(LineItem {
                description: item.description.clone(),
                quantity: parse_amount(kind, &field("quantity"), item.quantity.as_ref())?,
                unit_price: parse_amount(kind, &field("unit_price"), item.unit_price.as_ref())?,
                total_price: parse_amount(kind, &field("total_price"), item.total_price.as_ref())?,
            })
        })
        .collect::<FreightResult<Vec<_>>>()?;

    Ok(Invoice {
        invoice_number: raw.invoice_number.clone(),
        currency: raw.currency.clone(),
        total_amount: parse_amount(kind, "total_amount", raw.total_amount.as_ref())?,
        line_items,
    })
}

fn normalize_packing_list(raw: &RawPackingList) -> FreightResult<PackingList> {
    let kind = DocumentKind::PackingList;

    Ok(PackingList {
        gross_weight_kg: parse_weight(kind, "gross_weight_kg", raw.gross_weight_kg.as_ref())?,
        total_packages: parse_package_count(kind, "total_packages", raw.total_packages.as_ref())?,
        total_units_count: parse_count(kind, "total_units_count", raw.total_units_count.as_ref())?,
        referenced_documents: raw.referenced_documents.clone(),
    })
}

fn normalize_bill_of_lading(raw: &RawBillOfLading) -> FreightResult<BillOfLading> {
    let kind = DocumentKind::BillOfLading;

    Ok(BillOfLading {
        bol_number: raw.bol_number.clone(),
        gross_weight_kg: parse_weight(kind, "gross_weight_kg", raw.gross_weight_kg.as_ref())?,
        package_count: parse_package_count(kind, "package_count", raw.package_count.as_ref())?,
        referenced_documents: raw.referenced_documents.clone(),
    })
}
