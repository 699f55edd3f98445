use std::sync::Arc;

use crate::config::Config;
use crate::document::storage::DocumentStore;
use crate::llm_client::CompletionProvider;

/// Shared application state injected into all route handlers via Axum extractors.
/// Immutable after startup.
#[derive(Clone)]
pub struct AppState {
    /// Groq client in production; a scripted provider in tests.
    pub llm: Arc<dyn CompletionProvider>,
    pub config: Config,
    pub documents: DocumentStore,
}
