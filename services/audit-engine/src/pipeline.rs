//! Audit pipeline
//!
//! extraction -> normalize -> validate -> reconcile -> aggregate -> assemble -> render.
//!
//! Only the two collaborator calls suspend. Each one races the caller's
//! [`CancelSignal`]; a cancelled run returns [`AuditError::Cancelled`] and no
//! result.

use std::future::Future;

use base64::{engine::general_purpose, Engine as _};
use chrono::Utc;
use freightverify_models::{AuditResponse, AuditResult, EncodedReport, RawDocumentSet, SourceDocuments};
use freightverify_utils::{AppConfig, AuditError, FreightResult};
use tokio::sync::watch;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::engine::AuditEngine;
use crate::extraction::DocumentExtractor;
use crate::renderer::ReportRenderer;
use crate::report::ReportAssembler;

/// Fires the paired [`CancelSignal`].
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }
}

/// Cancellation observed by the pipeline between and during collaborator calls.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    receiver: watch::Receiver<bool>,
}

pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (sender, receiver) = watch::channel(false);
    (CancelHandle { sender }, CancelSignal { receiver })
}

impl CancelSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        let (_, receiver) = watch::channel(false);
        Self { receiver }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once cancelled. Pending forever if the handle is dropped first.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.receiver.borrow_and_update() {
                return;
            }
            if self.receiver.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    async fn guard<T, F>(&self, stage: &str, future: F) -> FreightResult<T>
    where
        F: Future<Output = FreightResult<T>>,
    {
        let mut signal = self.clone();

        tokio::select! {
            biased;
            _ = signal.cancelled() => {
                warn!(stage, "Audit cancelled");
                Err(AuditError::cancelled(stage))
            }
            result = future => result,
        }
    }
}

/// One completed audit run.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditOutcome {
    pub run_id: Uuid,
    pub result: AuditResult,
    pub report: Option<EncodedReport>,
    /// Set when rendering failed; the verdict is unaffected.
    pub report_error: Option<String>,
}

impl AuditOutcome {
    pub fn to_response(&self) -> AuditResponse {
        let mut response = AuditResponse::from(&self.result);
        response.report_base64 = self.report.as_ref().map(|report| report.base64.clone());
        response.report_error = self.report_error.clone();
        response
    }
}

pub struct AuditPipeline<X, R> {
    extractor: X,
    renderer: R,
    engine: AuditEngine,
    assembler: ReportAssembler,
    reporting: bool,
}

impl<X, R> AuditPipeline<X, R>
where
    X: DocumentExtractor,
    R: ReportRenderer,
{
    pub fn new(extractor: X, renderer: R, engine: AuditEngine) -> Self {
        Self {
            extractor,
            renderer,
            engine,
            assembler: ReportAssembler::default(),
            reporting: true,
        }
    }

    pub fn from_config(extractor: X, renderer: R, config: &AppConfig) -> FreightResult<Self> {
        Ok(Self {
            extractor,
            renderer,
            engine: AuditEngine::new(&config.reconciliation)?,
            assembler: ReportAssembler::from_config(&config.report),
            reporting: config.report.enabled,
        })
    }

    pub fn with_assembler(mut self, assembler: ReportAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn with_reporting(mut self, enabled: bool) -> Self {
        self.reporting = enabled;
        self
    }

    pub fn engine(&self) -> &AuditEngine {
        &self.engine
    }

    /// Extract, audit and render one shipment.
    pub async fn run(&self, sources: &SourceDocuments, cancel: CancelSignal) -> FreightResult<AuditOutcome> {
        let run_id = Uuid::new_v4();

        async {
            let raw = cancel.guard("extraction", self.extractor.extract(sources)).await?;
            self.complete(run_id, &raw, &cancel).await
        }
        .instrument(info_span!("audit", %run_id))
        .await
    }

    /// Audit an extraction that is already in hand.
    pub async fn audit_extracted(&self, raw: &RawDocumentSet) -> FreightResult<AuditOutcome> {
        let run_id = Uuid::new_v4();

        self.complete(run_id, raw, &CancelSignal::never())
            .instrument(info_span!("audit", %run_id))
            .await
    }

    async fn complete(
        &self,
        run_id: Uuid,
        raw: &RawDocumentSet,
        cancel: &CancelSignal,
    ) -> FreightResult<AuditOutcome> {
        let result = self.engine.audit(raw)?;

        let mut outcome = AuditOutcome {
            run_id,
            result,
            report: None,
            report_error: None,
        };

        if !self.reporting {
            return Ok(outcome);
        }

        let payload = self.assembler.assemble(&outcome.result, Utc::now());

        match cancel.guard("report rendering", self.renderer.render(&payload)).await {
            Ok(rendered) => {
                info!(content_type = %rendered.content_type, bytes = rendered.bytes.len(), "Report rendered");
                outcome.report = Some(EncodedReport {
                    content_type: rendered.content_type,
                    base64: general_purpose::STANDARD.encode(rendered.bytes),
                });
            }
            Err(error @ AuditError::Cancelled { .. }) => return Err(error),
            Err(error) => {
                warn!(error = %error, "Report rendering failed, returning verdict without report");
                outcome.report_error = Some(error.to_string());
            }
        }

        Ok(outcome)
    }
}
