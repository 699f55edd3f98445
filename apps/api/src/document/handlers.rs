//! Axum route handlers for LOI document generation and download.

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::document::generator::generate_document;
use crate::errors::AppError;
use crate::extraction::validator::{validate, FieldWarning};
use crate::state::AppState;

const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    /// The reviewed record. Edited by hand, so it is validated like model output.
    pub loi_data: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub filename: String,
    pub download_url: String,
    /// Fields that were replaced by their defaults before rendering.
    pub field_warnings: Vec<FieldWarning>,
}

/// POST /generate-document
///
/// Renders the reviewed record into the LOI template. Blanked or out-of-range
/// fields (nulls, negative amounts) fall back to their defaults and are reported.
pub async fn handle_generate_document(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    if !request.loi_data.is_object() {
        return Err(AppError::Input("loi_data must be an object".to_string()));
    }

    let validated = validate(&request.loi_data);
    for warning in &validated.warnings {
        warn!(path = %warning.path, reason = %warning.reason, "Reviewed field defaulted");
    }

    let stored = generate_document(
        &validated.record,
        &state.config.template_path,
        &state.documents,
        Local::now().date_naive(),
    )
    .await?;

    Ok(Json(GenerateResponse {
        download_url: format!("/download/{}", stored.filename),
        filename: stored.filename,
        field_warnings: validated.warnings,
    }))
}

/// GET /download/:filename
pub async fn handle_download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let bytes = state.documents.open(&filename).await?;
    Ok((
        [
            (header::CONTENT_TYPE, DOCX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        Bytes::from(bytes),
    ))
}
