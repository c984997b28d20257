use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal and out-of-band failures of an audit call.
///
/// Discrepancies between documents are not errors; they are recorded on the
/// `AuditResult`. Anything here means the caller gets no verdict, except
/// `ReportGeneration`, which travels next to an already computed verdict.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AuditError {
    #[error("Malformed field: {document}.{field} - {message}")]
    MalformedField {
        document: String,
        field: String,
        message: String,
    },

    #[error("Extraction error: {message}")]
    Extraction { message: String },

    #[error("Report generation error: {message}")]
    ReportGeneration { message: String },

    #[error("Audit cancelled during {stage}")]
    Cancelled { stage: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AuditError {
    pub fn malformed_field(
        document: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::MalformedField {
            document: document.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction {
            message: message.into(),
        }
    }

    pub fn report_generation(message: impl Into<String>) -> Self {
        Self::ReportGeneration {
            message: message.into(),
        }
    }

    pub fn cancelled(stage: impl Into<String>) -> Self {
        Self::Cancelled {
            stage: stage.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MalformedField { .. } => "MALFORMED_FIELD",
            Self::Extraction { .. } => "EXTRACTION_ERROR",
            Self::ReportGeneration { .. } => "REPORT_GENERATION_ERROR",
            Self::Cancelled { .. } => "CANCELLED",
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Whether the caller is left without a verdict.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::ReportGeneration { .. })
    }
}

pub type FreightResult<T> = Result<T, AuditError>;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl From<AuditError> for ErrorResponse {
    fn from(error: AuditError) -> Self {
        let details = match &error {
            AuditError::MalformedField { document, field, .. } => Some(serde_json::json!({
                "document": document,
                "field": field,
            })),
            _ => None,
        };

        Self {
            error: error.error_code().to_string(),
            code: error.error_code().to_string(),
            message: error.to_string(),
            details,
        }
    }
}

impl From<serde_json::Error> for AuditError {
    fn from(error: serde_json::Error) -> Self {
        Self::malformed_field("payload", "json", error.to_string())
    }
}

impl From<config::ConfigError> for AuditError {
    fn from(error: config::ConfigError) -> Self {
        Self::configuration(error.to_string())
    }
}
