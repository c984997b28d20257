//! Extraction collaborator seam.
//!
//! OCR and AI extraction live outside this crate; they hand over a
//! [`RawDocumentSet`] through [`DocumentExtractor`].

use async_trait::async_trait;
use freightverify_models::{
    DocumentKind, RawBillOfLading, RawDocumentSet, RawInvoice, RawPackingList, SourceDocument,
    SourceDocuments,
};
use freightverify_utils::{AuditError, FreightResult};
use serde::de::DeserializeOwned;
use tracing::debug;

#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract(&self, sources: &SourceDocuments) -> FreightResult<RawDocumentSet>;
}

/// Reads each document from a JSON rendering produced by an upstream extractor.
#[derive(Debug, Clone, Default)]
pub struct JsonSidecarExtractor;

impl JsonSidecarExtractor {
    pub fn new() -> Self {
        Self
    }

    fn decode<T: DeserializeOwned>(kind: DocumentKind, source: &SourceDocument) -> FreightResult<T> {
        if !is_json(&source.content_type) {
            return Err(AuditError::extraction(format!(
                "{} '{}' has unsupported content type '{}'",
                kind.title(),
                source.file_name,
                source.content_type
            )));
        }

        debug!(document = %kind, file_name = %source.file_name, bytes = source.bytes.len(), "Decoding extraction");

        serde_json::from_slice(&source.bytes).map_err(|e| {
            AuditError::extraction(format!(
                "{} '{}' is not a valid extraction record: {}",
                kind.title(),
                source.file_name,
                e
            ))
        })
    }
}

fn is_json(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    essence == "application/json" || essence.ends_with("+json")
}

#[async_trait]
impl DocumentExtractor for JsonSidecarExtractor {
    async fn extract(&self, sources: &SourceDocuments) -> FreightResult<RawDocumentSet> {
        let invoice: RawInvoice = Self::decode(DocumentKind::Invoice, sources.get(DocumentKind::Invoice))?;
        let packing_list: RawPackingList =
            Self::decode(DocumentKind::PackingList, sources.get(DocumentKind::PackingList))?;
        let bill_of_lading: RawBillOfLading =
            Self::decode(DocumentKind::BillOfLading, sources.get(DocumentKind::BillOfLading))?;

        Ok(RawDocumentSet {
            invoice,
            packing_list,
            bill_of_lading,
        })
    }
}
