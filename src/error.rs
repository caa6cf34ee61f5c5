use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::{ai_client::AiServiceError, repository::RepositoryError};

/// Failures a caller of the analysis pipeline can see.
///
/// The AI-side variants carry a message suitable for showing to the pet owner;
/// upstream details go to the logs instead.
#[derive(Debug, Error)]
pub enum DiagnosisError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("AI service requires payment. Please add credits to your workspace.")]
    QuotaExceeded,

    #[error("AI analysis failed")]
    ServiceError { status: Option<u16>, body: String },

    #[error("Failed to save diagnosis: {0}")]
    Persistence(#[source] RepositoryError),

    #[error("Diagnosis {0} not found")]
    NotFound(Uuid),
}

impl DiagnosisError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DiagnosisError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            DiagnosisError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            DiagnosisError::QuotaExceeded => StatusCode::PAYMENT_REQUIRED,
            DiagnosisError::NotFound(_) => StatusCode::NOT_FOUND,
            DiagnosisError::ServiceError { .. } | DiagnosisError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AiServiceError> for DiagnosisError {
    fn from(e: AiServiceError) -> Self {
        match e {
            AiServiceError::RateLimited => DiagnosisError::RateLimited,
            AiServiceError::QuotaExceeded => DiagnosisError::QuotaExceeded,
            AiServiceError::Service { status, body } => DiagnosisError::ServiceError { status, body },
        }
    }
}

impl IntoResponse for DiagnosisError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = ?self, "Error in analyze-skin-condition");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
