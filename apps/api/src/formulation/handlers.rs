//! Axum route handlers for the Formulation API.

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::IntoResponse,
    Form, Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::archive::{build_archive, ARCHIVE_FILE_NAME};
use crate::corpus::retrieval::RetrievedChunk;
use crate::errors::AppError;
use crate::formulation::formulator::{Formulation, Formulator};
use crate::normalizer::{NormalizedRecord, RecordOrigin};
use crate::state::AppState;

/// Set on archive responses whose record came back empty.
pub const EXTRACTION_WARNING_HEADER: &str = "x-extraction-warning";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Form posted by the landing page.
#[derive(Debug, Deserialize)]
pub struct GenerateForm {
    pub descripcion: String,
}

#[derive(Debug, Deserialize)]
pub struct FormulationRequest {
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct FormulationResponse {
    pub request_id: Uuid,
    pub record: NormalizedRecord,
    pub origin: RecordOrigin,
    pub extraction_failed: bool,
    pub sources: Vec<String>,
    pub context: Vec<RetrievedChunk>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /generar
///
/// Full pipeline. Responds with the zip archive as an attachment.
pub async fn handle_generate_archive(
    State(state): State<AppState>,
    Form(form): Form<GenerateForm>,
) -> Result<impl IntoResponse, AppError> {
    let request_id = Uuid::new_v4();
    let formulation = run_formulation(&state, &form.descripcion)
        .instrument(info_span!("generate_archive", %request_id))
        .await?;

    let archive = build_archive(&formulation.record)?;
    info!(
        "Archive built for request {request_id}: {} bytes",
        archive.len()
    );

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/zip"));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename={ARCHIVE_FILE_NAME}"))
            .map_err(|e| AppError::Internal(e.into()))?,
    );
    if formulation.record.is_empty_extraction() {
        headers.insert(
            EXTRACTION_WARNING_HEADER,
            HeaderValue::from_static("empty-record"),
        );
    }

    Ok((headers, Bytes::from(archive)))
}

/// POST /api/v1/formulations
///
/// Runs the pipeline and returns the normalized record as JSON.
/// Useful for previewing before downloading the archive.
pub async fn handle_formulate(
    State(state): State<AppState>,
    Json(request): Json<FormulationRequest>,
) -> Result<Json<FormulationResponse>, AppError> {
    let request_id = Uuid::new_v4();
    let formulation = run_formulation(&state, &request.description)
        .instrument(info_span!("formulate", %request_id))
        .await?;

    let sources = formulation
        .sources()
        .into_iter()
        .map(str::to_string)
        .collect();
    let Formulation { record, context } = formulation;

    Ok(Json(FormulationResponse {
        request_id,
        origin: record.origin(),
        extraction_failed: record.is_empty_extraction(),
        record,
        sources,
        context,
    }))
}

async fn run_formulation(state: &AppState, description: &str) -> Result<Formulation, AppError> {
    if description.trim().is_empty() {
        return Err(AppError::Validation(
            "description cannot be empty".to_string(),
        ));
    }

    Formulator {
        corpus: &state.corpus,
        retriever: state.retriever.as_ref(),
        generator: state.generator.as_ref(),
        normalizer: &state.normalizer,
        retrieval_k: state.config.retrieval_k,
    }
    .formulate(description)
    .await
}
