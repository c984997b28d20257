//! Fixtures shared by the unit tests.

use freightverify_models::{BillOfLading, DocumentSet, Invoice, LineItem, PackingList};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub fn line(description: &str, quantity: Decimal, unit_price: Decimal, total_price: Decimal) -> LineItem {
    LineItem {
        description: description.to_string(),
        quantity,
        unit_price,
        total_price,
    }
}

/// A consistent shipment: 5 widgets at 20.00, 2 packages, 50 kg.
pub fn documents() -> DocumentSet {
    DocumentSet {
        invoice: Invoice {
            invoice_number: "INV-100".to_string(),
            currency: "USD".to_string(),
            total_amount: dec!(100.00),
            line_items: vec![line("Widget", dec!(5), dec!(20.00), dec!(100.00))],
        },
        packing_list: PackingList {
            gross_weight_kg: dec!(50.0),
            total_packages: 2,
            total_units_count: 5,
            referenced_documents: Vec::new(),
        },
        bill_of_lading: BillOfLading {
            bol_number: "BOL-7".to_string(),
            gross_weight_kg: dec!(50.0),
            package_count: 2,
            referenced_documents: Vec::new(),
        },
    }
}
