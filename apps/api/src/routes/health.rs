use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status, version and the configured model.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "loi-api",
        "version": env!("CARGO_PKG_VERSION"),
        "llm_configured": !state.config.groq_api_key.is_empty(),
        "model": state.llm.model(),
    }))
}
