use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::document::renderer::RenderError;
use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Field-level validation problems never appear here; they travel as
/// `FieldWarning`s inside a successful parse result.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Model provider unavailable: {0}")]
    TransientExternal(String),

    #[error("Model provider rejected the request: {0}")]
    ProviderRejected(String),

    #[error("Could not parse model output: {0}")]
    ExtractionParse(String),

    #[error("Template configuration error: {0}")]
    TemplateConfig(String),

    #[error("Document generation failed: {0}")]
    Render(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Whether the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::TransientExternal(_))
    }
}

impl From<LlmError> for AppError {
    fn from(e: LlmError) -> Self {
        if e.is_transient() {
            return AppError::TransientExternal(e.to_string());
        }
        match e {
            LlmError::Api { .. } => AppError::ProviderRejected(e.to_string()),
            _ => AppError::ExtractionParse(e.to_string()),
        }
    }
}

impl From<RenderError> for AppError {
    fn from(e: RenderError) -> Self {
        match e {
            RenderError::InvalidTemplate(_) => AppError::TemplateConfig(e.to_string()),
            _ => AppError::Render(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let retryable = self.is_retryable();
        let (status, code, message) = match &self {
            AppError::Input(msg) => (StatusCode::BAD_REQUEST, "INPUT_ERROR", msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::TransientExternal(msg) => {
                tracing::warn!("Transient provider error: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "TRANSIENT_EXTERNAL_ERROR",
                    "The language model service is unavailable. Please retry.".to_string(),
                )
            }
            AppError::ProviderRejected(msg) => {
                tracing::error!("Provider rejected request: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "PROVIDER_REJECTED",
                    "The language model service rejected the request. Check the provider configuration."
                        .to_string(),
                )
            }
            AppError::ExtractionParse(msg) => {
                tracing::error!("Extraction parse error: {msg}");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "EXTRACTION_PARSE_ERROR",
                    msg.clone(),
                )
            }
            AppError::TemplateConfig(msg) => {
                tracing::error!("Template configuration error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "TEMPLATE_CONFIG_ERROR",
                    "The document template is missing or invalid".to_string(),
                )
            }
            AppError::Render(msg) => {
                tracing::error!("Render error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "RENDER_ERROR",
                    msg.clone(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
                "retryable": retryable
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transient_errors_are_retryable() {
        assert!(AppError::TransientExternal("timeout".into()).is_retryable());
        assert!(!AppError::ExtractionParse("bad json".into()).is_retryable());
        assert!(!AppError::TemplateConfig("missing".into()).is_retryable());
        assert!(!AppError::Input("empty".into()).is_retryable());
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::Input("x".into()), StatusCode::BAD_REQUEST),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (
                AppError::TransientExternal("x".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (AppError::ProviderRejected("x".into()), StatusCode::BAD_GATEWAY),
            (
                AppError::ExtractionParse("x".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                AppError::TemplateConfig("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (AppError::Render("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_llm_error_classification() {
        let rate_limited: AppError = LlmError::Api {
            status: 429,
            message: "slow down".into(),
        }
        .into();
        assert!(matches!(rate_limited, AppError::TransientExternal(_)));

        let unauthorized: AppError = LlmError::Api {
            status: 401,
            message: "bad key".into(),
        }
        .into();
        assert!(matches!(unauthorized, AppError::ProviderRejected(_)));

        let truncated: AppError = LlmError::Truncated.into();
        assert!(matches!(truncated, AppError::ExtractionParse(_)));
    }

    #[test]
    fn test_render_error_classification() {
        let missing: AppError = RenderError::InvalidTemplate("no document part".into()).into();
        assert!(matches!(missing, AppError::TemplateConfig(_)));

        let unclosed: AppError = RenderError::UnclosedRegion("is_lease".into()).into();
        assert!(matches!(unclosed, AppError::Render(_)));
    }
}
