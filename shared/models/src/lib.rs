//! # FreightVerify Domain Models
//!
//! Value records for auditing one shipment's trade paperwork.
//!
//! ## Key Models
//!
//! - **RawDocumentSet**: extraction output as delivered, numeric fields untyped
//! - **DocumentSet**: normalized Commercial Invoice, Packing List and Bill of Lading
//! - **Discrepancy**: one detected inconsistency tagged with an `ErrorKind`
//! - **AuditResult**: pass/fail verdict plus the ordered discrepancy list
//! - **ReportPayload**: display-ready summary for the report renderer
//!
//! Records are immutable once built; every audit stage produces new values.

pub mod audit;
pub mod document;
pub mod report;

pub use audit::*;
pub use document::*;
pub use report::*;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn documents() -> DocumentSet {
        DocumentSet {
            invoice: Invoice {
                invoice_number: "INV-100".to_string(),
                currency: "USD".to_string(),
                total_amount: dec!(100.00),
                line_items: vec![LineItem {
                    description: "Widget".to_string(),
                    quantity: dec!(5),
                    unit_price: dec!(20.00),
                    total_price: dec!(100.00),
                }],
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

    #[test]
    fn test_audit_result_passes_only_when_empty() {
        let clean = AuditResult::from_findings(documents(), Vec::new(), Vec::new());
        assert!(clean.passed());

        let failing = AuditResult::from_findings(
            documents(),
            vec![Discrepancy::new(ErrorKind::PackageCountMismatch, "2 vs 3")],
            Vec::new(),
        );
        assert!(!failing.passed());
        assert!(failing.has_kind(ErrorKind::PackageCountMismatch));
    }

    #[test]
    fn test_discrepancy_display_leads_with_kind() {
        let discrepancy = Discrepancy::new(ErrorKind::WeightMismatch, "off by 2 kg")
            .with_field(DocumentKind::PackingList, "gross_weight_kg")
            .with_field(DocumentKind::BillOfLading, "gross_weight_kg");

        assert_eq!(discrepancy.to_string(), "WeightMismatch: off by 2 kg");
        assert_eq!(discrepancy.fields.len(), 2);
    }

    #[test]
    fn test_response_wire_shape() {
        let result = AuditResult::from_findings(
            documents(),
            vec![Discrepancy::new(ErrorKind::PackageCountMismatch, "2 vs 3")],
            Vec::new(),
        );
        let response = AuditResponse::from(&result);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["passed"], false);
        assert_eq!(json["errors"][0], "PackageCountMismatch: 2 vs 3");
        assert_eq!(json["data"]["invoice"]["invoice_number"], "INV-100");
        assert_eq!(json["data"]["packing_list"]["total_packages"], 2);
        assert_eq!(json["data"]["bill_of_lading"]["bol_number"], "BOL-7");
        assert!(json.get("report_base64").is_none());
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = documents();
        let mut b = documents();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);

        b.bill_of_lading.package_count = 3;
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
