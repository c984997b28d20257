//! # FreightVerify Audit Engine
//!
//! Cross-checks a shipment's Commercial Invoice, Packing List and Bill of
//! Lading and produces a pass/fail verdict with an ordered discrepancy list.
//!
//! ## Stages
//!
//! - **normalizer**: raw extraction values to exact 2-place decimals
//! - **intra_document**: invoice line math and summed total
//! - **cross_document**: weight, packages, units, references, in that order
//! - **aggregator**: the single pass/fail decision point
//! - **report**: display-ready payload for a [`ReportRenderer`]
//!
//! [`AuditEngine`] is the synchronous core. [`AuditPipeline`] wraps it with
//! the extraction and rendering collaborators and cancellation.

pub mod aggregator;
pub mod cross_document;
pub mod engine;
pub mod extraction;
pub mod intra_document;
pub mod normalizer;
pub mod pipeline;
pub mod renderer;
pub mod report;

#[cfg(test)]
mod test_support;

pub use aggregator::aggregate;
pub use cross_document::{
    CrossDocumentRule, PackageCountRule, Reconciler, ReferenceRule, UnitCountCheck, WeightRule,
};
pub use engine::AuditEngine;
pub use extraction::{DocumentExtractor, JsonSidecarExtractor};
pub use intra_document::{IntraDocumentFindings, IntraDocumentValidator};
pub use normalizer::{normalize_document_set, normalize_identifier};
pub use pipeline::{cancel_pair, AuditOutcome, AuditPipeline, CancelHandle, CancelSignal};
pub use renderer::{HtmlReportRenderer, ReportRenderer};
pub use report::ReportAssembler;
