pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::document::handlers as document;
use crate::extraction::handlers as extraction;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Extraction
        .route("/parse", post(extraction::handle_parse))
        .route("/parse/mock", post(extraction::handle_parse_mock))
        .route("/schema", get(extraction::handle_schema))
        // Documents
        .route(
            "/generate-document",
            post(document::handle_generate_document),
        )
        .route("/download/:filename", get(document::handle_download))
        .with_state(state)
}
