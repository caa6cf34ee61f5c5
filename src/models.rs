use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

/// Inbound payload of the analyze endpoint. Keys are camelCase on the wire.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisRequest {
    pub diagnosis_id: Uuid,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub problem_description: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Mild,
    #[default]
    Moderate,
    Severe,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Mild => "mild",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured diagnosis pulled out of the model's free-text reply.
/// Every field is populated; extraction falls back to defaults instead of leaving gaps.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DiagnosisResult {
    pub disease_name: String,
    pub severity: Severity,
    pub should_consult_doctor: bool,
    pub consultation_reason: String,
    pub cure_suggestions: String,
    pub home_remedies: String,
    pub raw_response: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosisStatus {
    Pending,
    Analyzing,
    Completed,
    Failed,
    Reviewed,
}

/// A row of the `diagnoses` table as far as this service cares about it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DiagnosisRecord {
    pub id: Uuid,
    pub status: DiagnosisStatus,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub problem_description: Option<String>,
    #[serde(default)]
    pub ai_diagnosis: Option<String>,
    #[serde(default)]
    pub disease_name: Option<String>,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub should_consult_doctor: Option<bool>,
    #[serde(default)]
    pub consultation_reason: Option<String>,
    #[serde(default)]
    pub cure_suggestions: Option<String>,
    #[serde(default)]
    pub home_remedies: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl DiagnosisRecord {
    /// A freshly submitted record, as the upload flow leaves it before analysis starts.
    pub fn pending(id: Uuid, image_url: &str, problem_description: &str) -> Self {
        Self {
            id,
            status: DiagnosisStatus::Pending,
            image_url: Some(image_url.to_string()),
            problem_description: Some(problem_description.to_string()),
            ai_diagnosis: None,
            disease_name: None,
            severity: None,
            should_consult_doctor: None,
            consultation_reason: None,
            cure_suggestions: None,
            home_remedies: None,
            created_at: Some(Utc::now()),
        }
    }

    pub fn apply_result(&mut self, result: &DiagnosisResult) {
        self.ai_diagnosis = Some(result.raw_response.clone());
        self.disease_name = Some(result.disease_name.clone());
        self.severity = Some(result.severity);
        self.should_consult_doctor = Some(result.should_consult_doctor);
        self.consultation_reason = Some(result.consultation_reason.clone());
        self.cure_suggestions = Some(result.cure_suggestions.clone());
        self.home_remedies = Some(result.home_remedies.clone());
        self.status = DiagnosisStatus::Completed;
    }
}
