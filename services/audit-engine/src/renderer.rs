//! Report Renderer
//!
//! Turning a payload into a binary artifact is a collaborator concern. The
//! HTML renderer here is the built-in certificate; a PDF typesetter plugs in
//! through the same trait.

use async_trait::async_trait;
use freightverify_models::{RenderedReport, ReportPayload};
use freightverify_utils::{AuditError, FreightResult};
use handlebars::Handlebars;

#[async_trait]
pub trait ReportRenderer: Send + Sync {
    async fn render(&self, payload: &ReportPayload) -> FreightResult<RenderedReport>;
}

const CERTIFICATE_TEMPLATE: &str = "certificate";

const CERTIFICATE_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{{issuer_name}} Audit Certificate</title>
<style>body{font-family:Arial,sans-serif;color:#111;margin:32px;}h1,.subtitle,.footer{text-align:center;}.subtitle,.footer{color:#808080;}.banner{color:#fff;font-weight:bold;font-size:18px;text-align:center;padding:12px;}.passed{background:#22c55e;}.failed{background:#ef4444;}table{border-collapse:collapse;width:100%;margin-bottom:16px;}th,td{border:1px solid #999;padding:6px;}th{background:#f0f0f0;}.num{text-align:right;}.errors{color:#ef4444;}.mismatch{background:#fde2e2;}.total td{background:#dcdcdc;font-weight:bold;}.footer{font-style:italic;font-size:11px;}</style>
</head>
<body>
<h1>{{issuer_name}}</h1>
<div class="subtitle">OFFICIAL AUDIT CERTIFICATE</div>
<div class="banner {{#if banner.passed}}passed{{else}}failed{{/if}}">{{banner.label}}</div>
<h2>Document Summary</h2>
<table>
<tr><th>Field</th><th>Value</th></tr>
{{#each summary}}<tr><td>{{label}}</td><td>{{value}}</td></tr>
{{/each}}</table>
{{#if discrepancies}}<h2 class="errors">Discrepancies Found:</h2>
<ul class="errors">
{{#each discrepancies}}<li>{{this}}</li>
{{/each}}</ul>
{{/if}}<h2>Invoice Line Items</h2>
<table>
<tr><th>Description</th><th class="num">Quantity</th><th class="num">Unit Price</th><th class="num">Total Price</th><th>Math</th></tr>
{{#each line_items}}<tr{{#unless math_ok}} class="mismatch"{{/unless}}><td>{{description}}</td><td class="num">{{quantity}}</td><td class="num">{{unit_price}}</td><td class="num">{{total_price}}</td><td>{{#if math_ok}}OK{{else}}MISMATCH{{/if}}</td></tr>
{{/each}}<tr class="total"><td colspan="3" class="num">TOTAL</td><td class="num">{{invoice_total}}</td><td></td></tr>
</table>
<div class="footer">Generated by {{issuer_name}} Compliance Engine | {{generated_at}} | documents {{documents_fingerprint}}</div>
</body>
</html>
"#;

/// Renders the audit certificate as HTML.
pub struct HtmlReportRenderer {
    handlebars: Handlebars<'static>,
}

impl HtmlReportRenderer {
    pub fn new() -> FreightResult<Self> {
        Self::with_template(CERTIFICATE_HTML)
    }

    /// Use a custom certificate layout. Unknown payload fields fail at render time.
    pub fn with_template(source: &str) -> FreightResult<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars
            .register_template_string(CERTIFICATE_TEMPLATE, source)
            .map_err(|e| AuditError::configuration(format!("Invalid report template: {}", e)))?;

        Ok(Self { handlebars })
    }
}

#[async_trait]
impl ReportRenderer for HtmlReportRenderer {
    async fn render(&self, payload: &ReportPayload) -> FreightResult<RenderedReport> {
        let html = self
            .handlebars
            .render(CERTIFICATE_TEMPLATE, payload)
            .map_err(|e| AuditError::report_generation(format!("Failed to render certificate: {}", e)))?;

        Ok(RenderedReport {
            content_type: "text/html; charset=utf-8".to_string(),
            bytes: html.into_bytes(),
        })
    }
}

impl std::fmt::Debug for HtmlReportRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HtmlReportRenderer").finish_non_exhaustive()
    }
}
