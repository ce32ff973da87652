use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analysis::parser::SchemaError;
use crate::extraction::ExtractionError;
use crate::llm_client::LlmError;

const RETRY_HINT: &str = "Please try again or check your document formatting.";

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Each pipeline failure keeps its own variant; clients receive a distinct
/// `code` but only a short, generic message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("An analysis is already running for this session")]
    AnalysisInProgress,

    #[error("Session capacity reached ({0} active)")]
    SessionCapacity(usize),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Model call timed out after {}s", .0.as_secs())]
    ModelTimeout(Duration),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Timeout(deadline) => AppError::ModelTimeout(deadline),
            other => AppError::ModelUnavailable(other.to_string()),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AnalysisInProgress => StatusCode::CONFLICT,
            AppError::SessionCapacity(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Extraction(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ModelUnavailable(_) | AppError::Schema(_) => StatusCode::BAD_GATEWAY,
            AppError::ModelTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::AnalysisInProgress => "ANALYSIS_IN_PROGRESS",
            AppError::SessionCapacity(_) => "SERVER_BUSY",
            AppError::Extraction(_) => "EXTRACTION_ERROR",
            AppError::ModelUnavailable(_) => "MODEL_UNAVAILABLE",
            AppError::ModelTimeout(_) => "MODEL_TIMEOUT",
            AppError::Schema(_) => "SCHEMA_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to show an end user. Upstream details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(msg) | AppError::NotFound(msg) => msg.clone(),
            AppError::AnalysisInProgress => {
                "An analysis is already running. Wait for it to finish.".to_string()
            }
            AppError::SessionCapacity(_) => {
                "Too many analyses are running right now.".to_string()
            }
            AppError::Extraction(_) => "Could not read text from the uploaded resume.".to_string(),
            AppError::ModelUnavailable(_) | AppError::ModelTimeout(_) | AppError::Schema(_) => {
                "Analysis failed.".to_string()
            }
            AppError::Internal(_) => "An internal server error occurred".to_string(),
        }
    }

    pub fn hint(&self) -> Option<&'static str> {
        match self {
            AppError::Extraction(_) => {
                Some("Upload a text-based PDF. Scanned documents are not supported.")
            }
            AppError::ModelUnavailable(_) | AppError::ModelTimeout(_) | AppError::Schema(_) => {
                Some(RETRY_HINT)
            }
            AppError::SessionCapacity(_) => Some("Please try again in a minute."),
            _ => None,
        }
    }

    /// Logs the diagnostic detail for failures that are not the caller's fault.
    pub fn log(&self) {
        match self {
            AppError::SessionCapacity(active) => {
                tracing::warn!("Rejecting new session: {active} sessions in flight")
            }
            AppError::Extraction(e) => tracing::warn!("Extraction error: {e}"),
            AppError::ModelUnavailable(msg) => tracing::error!("Model unavailable: {msg}"),
            AppError::ModelTimeout(deadline) => {
                tracing::error!("Model call exceeded {}s deadline", deadline.as_secs())
            }
            AppError::Schema(e) => {
                tracing::error!("Schema error: {e}");
                if let Some(raw) = e.raw_text() {
                    tracing::debug!("Raw model output: {raw}");
                }
            }
            AppError::Internal(e) => tracing::error!("Internal error: {e:?}"),
            _ => {}
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.public_message(),
                "hint": self.hint(),
            }
        }));

        (self.status(), body).into_response()
    }
}
