//! Axum route handlers for transcript extraction.

use axum::{extract::State, Json};
use chrono::Local;
use schemars::Schema;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::extraction::confidence::ConfidenceMap;
use crate::extraction::extractor::{extract, ParseResult};
use crate::extraction::mock::{mock_parse_result, CANONICAL_LEASE_TRANSCRIPT};
use crate::extraction::validator::FieldWarning;
use crate::models::deal::DealRecord;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ParseRequest {
    pub transcript: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ParseResponse {
    pub success: bool,
    pub record: DealRecord,
    pub field_confidences: ConfidenceMap,
    pub low_confidence_fields: Vec<String>,
    pub field_warnings: Vec<FieldWarning>,
    pub message: String,
    /// Source call for mock results, so demos can show what was extracted from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
}

impl ParseResponse {
    fn from_result(result: ParseResult, message: &str) -> Self {
        Self {
            success: true,
            record: result.record,
            field_confidences: result.field_confidences,
            low_confidence_fields: result.low_confidence_fields,
            field_warnings: result.warnings,
            message: message.to_string(),
            transcript: None,
        }
    }
}

/// POST /parse
///
/// Extracts LOI fields with per-field confidence from a call transcript.
pub async fn handle_parse(
    State(state): State<AppState>,
    Json(request): Json<ParseRequest>,
) -> Result<Json<ParseResponse>, AppError> {
    let result = extract(&request.transcript, state.llm.as_ref()).await?;
    Ok(Json(ParseResponse::from_result(
        result,
        "LOI fields extracted successfully",
    )))
}

/// POST /parse/mock
///
/// Returns the canonical lease extraction without calling the model.
pub async fn handle_parse_mock() -> Json<ParseResponse> {
    let result = mock_parse_result(Local::now().date_naive());
    let mut response = ParseResponse::from_result(result, "Mock LOI generated for testing");
    response.transcript = Some(CANONICAL_LEASE_TRANSCRIPT.to_string());
    Json(response)
}

/// GET /schema
///
/// JSON Schema of the LOI record, for form builders and reviewers.
pub async fn handle_schema() -> Json<Schema> {
    Json(schemars::schema_for!(DealRecord))
}
