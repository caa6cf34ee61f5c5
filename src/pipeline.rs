use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    ai_client::SkinAnalyzer,
    error::DiagnosisError,
    extractor,
    models::{DiagnosisRecord, DiagnosisRequest, DiagnosisResult},
    repository::DiagnosisRepository,
};

/// Moves a diagnosis record from `analyzing` to `completed` or `failed`.
///
/// The upstream submission flow owns `pending` and `analyzing`; this only
/// writes the terminal status. Runs for the same id are not serialized, so
/// the last write wins.
pub struct DiagnosisPipeline {
    analyzer: Arc<dyn SkinAnalyzer>,
    repository: Arc<dyn DiagnosisRepository>,
}

impl DiagnosisPipeline {
    pub fn new(analyzer: Arc<dyn SkinAnalyzer>, repository: Arc<dyn DiagnosisRepository>) -> Self {
        Self { analyzer, repository }
    }

    pub async fn run(&self, request: &DiagnosisRequest) -> Result<DiagnosisResult, DiagnosisError> {
        validate(request)?;
        let id = request.diagnosis_id;
        info!(%id, "🚀 Analyzing skin condition");

        let raw = match self.analyzer.analyze(&request.image_url, &request.problem_description).await {
            Ok(raw) => raw,
            Err(e) => {
                error!(%id, error = %e, retryable = e.is_retryable(), "❌ AI analysis failed");
                let failure = DiagnosisError::from(e);
                let note = failure.to_string();
                if let Err(write_err) = self.repository.mark_failed(id, &note).await {
                    warn!(%id, error = %write_err, "Could not mark diagnosis as failed");
                }
                return Err(failure);
            }
        };

        let result = extractor::extract(&raw);
        info!(
            %id,
            disease = %result.disease_name,
            severity = %result.severity,
            consult = result.should_consult_doctor,
            "🩺 Diagnosis extracted"
        );

        self.repository
            .complete(id, &result)
            .await
            .map_err(DiagnosisError::Persistence)?;

        info!(%id, "✅ Diagnosis completed");
        Ok(result)
    }

    pub async fn fetch(&self, id: Uuid) -> Result<DiagnosisRecord, DiagnosisError> {
        self.repository
            .fetch(id)
            .await
            .map_err(DiagnosisError::Persistence)?
            .ok_or(DiagnosisError::NotFound(id))
    }
}

fn validate(request: &DiagnosisRequest) -> Result<(), DiagnosisError> {
    if request.image_url.is_empty() {
        return Err(DiagnosisError::InvalidInput("imageUrl is required".into()));
    }
    if request.problem_description.is_empty() {
        return Err(DiagnosisError::InvalidInput("problemDescription is required".into()));
    }
    Ok(())
}
