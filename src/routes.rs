use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{header, HeaderName},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::{
    error::DiagnosisError,
    models::{DiagnosisRecord, DiagnosisRequest, DiagnosisResult},
    pipeline::DiagnosisPipeline,
};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<DiagnosisPipeline>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/analyze-skin-condition", post(analyze_skin_condition))
        .route("/functions/v1/analyze-skin-condition", post(analyze_skin_condition))
        .route("/api/diagnoses/:id", get(get_diagnosis))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers([
                    header::AUTHORIZATION,
                    header::CONTENT_TYPE,
                    HeaderName::from_static("x-client-info"),
                    HeaderName::from_static("apikey"),
                ]),
        )
        .with_state(state)
}

pub async fn analyze_skin_condition(
    State(state): State<AppState>,
    payload: Result<Json<DiagnosisRequest>, JsonRejection>,
) -> Result<Json<DiagnosisResult>, DiagnosisError> {
    let Json(body) = payload.map_err(|e| DiagnosisError::InvalidInput(e.body_text()))?;
    let result = state.pipeline.run(&body).await?;
    Ok(Json(result))
}

pub async fn get_diagnosis(
    path: Result<Path<Uuid>, PathRejection>,
    State(state): State<AppState>,
) -> Result<Json<DiagnosisRecord>, DiagnosisError> {
    let Path(id) = path.map_err(|e| DiagnosisError::InvalidInput(e.body_text()))?;
    state.pipeline.fetch(id).await.map(Json)
}
