// LOI extraction: prompt, model call, field validation, confidence scoring.
// All model calls go through llm_client.

pub mod confidence;
pub mod extractor;
pub mod handlers;
pub mod mock;
pub mod prompts;
pub mod validator;
