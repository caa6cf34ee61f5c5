use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::Client;
use serde_json::json;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::models::{DiagnosisRecord, DiagnosisResult, DiagnosisStatus};

const TABLE: &str = "diagnoses";

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("diagnosis {0} not found")] NotFound(Uuid),
    #[error("persistence HTTP error: status={status} body={body}")] Http { status: u16, body: String },
    #[error("persistence transport error: {0}")] Transport(String),
}

/// Write and read access to the externally owned `diagnoses` record.
#[async_trait]
pub trait DiagnosisRepository: Send + Sync {
    /// Stores the raw reply, the structured fields and `completed` in one update.
    async fn complete(&self, id: Uuid, result: &DiagnosisResult) -> Result<(), RepositoryError>;
    async fn mark_failed(&self, id: Uuid, note: &str) -> Result<(), RepositoryError>;
    async fn fetch(&self, id: Uuid) -> Result<Option<DiagnosisRecord>, RepositoryError>;
}

/// PostgREST access to a Supabase project using the service-role key.
pub struct SupabaseRepository {
    client: Client,
    rest_url: String,
    service_role_key: String,
}

impl SupabaseRepository {
    pub fn new(url: &str, service_role_key: String) -> Self {
        Self {
            client: Client::new(),
            rest_url: format!("{}/rest/v1", url.trim_end_matches('/')),
            service_role_key,
        }
    }

    fn table_url(&self) -> String {
        format!("{}/{}", self.rest_url, TABLE)
    }

    async fn update(&self, id: Uuid, patch: serde_json::Value) -> Result<(), RepositoryError> {
        let response = self.client
            .patch(self.table_url())
            .query(&[("id", format!("eq.{id}"))])
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await
            .map_err(|e| RepositoryError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| RepositoryError::Transport(e.to_string()))?;
        if !status.is_success() {
            error!(%id, status = status.as_u16(), %body, "❌ Database update error");
            return Err(RepositoryError::Http { status: status.as_u16(), body });
        }

        // PostgREST answers an update that matched nothing with an empty array.
        let rows: Vec<serde_json::Value> = serde_json::from_str(&body).map_err(|e| {
            error!(%id, status = status.as_u16(), %body, "❌ Unreadable update response");
            RepositoryError::Transport(format!("unreadable update response: {e}"))
        })?;
        if rows.is_empty() {
            return Err(RepositoryError::NotFound(id));
        }
        info!(%id, "💾 Diagnosis record updated");
        Ok(())
    }
}

#[async_trait]
impl DiagnosisRepository for SupabaseRepository {
    async fn complete(&self, id: Uuid, result: &DiagnosisResult) -> Result<(), RepositoryError> {
        self.update(id, json!({
            "ai_diagnosis": result.raw_response,
            "disease_name": result.disease_name,
            "severity": result.severity,
            "should_consult_doctor": result.should_consult_doctor,
            "consultation_reason": result.consultation_reason,
            "cure_suggestions": result.cure_suggestions,
            "home_remedies": result.home_remedies,
            "status": DiagnosisStatus::Completed,
        })).await
    }

    async fn mark_failed(&self, id: Uuid, note: &str) -> Result<(), RepositoryError> {
        self.update(id, json!({
            "ai_diagnosis": note,
            "status": DiagnosisStatus::Failed,
        })).await
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<DiagnosisRecord>, RepositoryError> {
        let response = self.client
            .get(self.table_url())
            .query(&[("id", format!("eq.{id}")), ("select", "*".to_string())])
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
            .send()
            .await
            .map_err(|e| RepositoryError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%id, status = status.as_u16(), %body, "❌ Database read error");
            return Err(RepositoryError::Http { status: status.as_u16(), body });
        }
        let rows: Vec<DiagnosisRecord> = response.json().await
            .map_err(|e| RepositoryError::Transport(e.to_string()))?;
        Ok(rows.into_iter().next())
    }
}

/// Process-local store for development runs and tests.
#[derive(Clone, Default)]
pub struct MemoryRepository {
    records: Arc<RwLock<HashMap<Uuid, DiagnosisRecord>>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: DiagnosisRecord) {
        self.records.write().insert(record.id, record);
    }

    pub fn get(&self, id: Uuid) -> Option<DiagnosisRecord> {
        self.records.read().get(&id).cloned()
    }
}

#[async_trait]
impl DiagnosisRepository for MemoryRepository {
    async fn complete(&self, id: Uuid, result: &DiagnosisResult) -> Result<(), RepositoryError> {
        let mut guard = self.records.write();
        let record = guard.get_mut(&id).ok_or(RepositoryError::NotFound(id))?;
        record.apply_result(result);
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, note: &str) -> Result<(), RepositoryError> {
        let mut guard = self.records.write();
        let record = guard.get_mut(&id).ok_or(RepositoryError::NotFound(id))?;
        record.ai_diagnosis = Some(note.to_string());
        record.status = DiagnosisStatus::Failed;
        Ok(())
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<DiagnosisRecord>, RepositoryError> {
        Ok(self.get(id))
    }
}
