//! Extraction orchestrator — transcript in, confidence-annotated `DealRecord` out.
//!
//! Pipeline: input check → one model call → JSON parse → field validation →
//! confidence merge. Only the model call suspends.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::extraction::confidence::{annotate, ConfidenceMap};
use crate::extraction::prompts::{EXTRACTION_PROMPT_TEMPLATE, EXTRACTION_SYSTEM};
use crate::extraction::validator::{validate, FieldWarning};
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{strip_json_fences, CompletionProvider};
use crate::models::deal::DealRecord;

/// Record plus the confidence metadata the reviewer needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseResult {
    pub record: DealRecord,
    pub field_confidences: ConfidenceMap,
    pub low_confidence_fields: Vec<String>,
    pub warnings: Vec<FieldWarning>,
}

/// The two halves of a model response, still untyped.
#[derive(Debug, Clone)]
pub struct ModelPayload {
    pub loi_data: Value,
    pub field_confidences: Value,
}

/// Extracts deal terms from `transcript` with a single model call.
pub async fn extract(
    transcript: &str,
    llm: &dyn CompletionProvider,
) -> Result<ParseResult, AppError> {
    let transcript = transcript.trim();
    // No minimum length: short notes ("tenant wants 2k sq ft") still carry
    // terms, and the reviewer sees every defaulted field.
    if transcript.is_empty() {
        return Err(AppError::Input("transcript cannot be empty".to_string()));
    }

    let prompt = EXTRACTION_PROMPT_TEMPLATE.replace("{transcript}", transcript);
    let system = format!("{EXTRACTION_SYSTEM}\n\n{JSON_ONLY_SYSTEM}");

    info!(
        transcript_chars = transcript.len(),
        model = llm.model(),
        "Extracting LOI terms"
    );
    let text = llm.complete(&prompt, &system).await?;

    let payload = parse_payload(&text)?;
    Ok(build_parse_result(&payload))
}

/// Splits raw model text into `loi_data` and `field_confidences`.
///
/// A response with no recognizable record is an error, never an empty record.
pub fn parse_payload(text: &str) -> Result<ModelPayload, AppError> {
    let value: Value = serde_json::from_str(strip_json_fences(text))
        .map_err(|e| AppError::ExtractionParse(format!("model output is not valid JSON: {e}")))?;

    let Value::Object(mut object) = value else {
        return Err(AppError::ExtractionParse(
            "model output is not a JSON object".to_string(),
        ));
    };

    let field_confidences = object.remove("field_confidences").unwrap_or(Value::Null);

    let loi_data = match object.remove("loi_data") {
        Some(data @ Value::Object(_)) => data,
        Some(_) => {
            return Err(AppError::ExtractionParse(
                "model output 'loi_data' is not an object".to_string(),
            ))
        }
        // Some models return the record at the top level.
        None if looks_like_record(&object) => Value::Object(object),
        None => {
            return Err(AppError::ExtractionParse(
                "model output contains no 'loi_data'".to_string(),
            ))
        }
    };

    Ok(ModelPayload {
        loi_data,
        field_confidences,
    })
}

fn looks_like_record(object: &Map<String, Value>) -> bool {
    ["property_details", "party_information", "financial_terms"]
        .iter()
        .any(|section| object.contains_key(*section))
}

/// Validates the payload and merges confidence. Shared by real and mock extraction.
pub fn build_parse_result(payload: &ModelPayload) -> ParseResult {
    let validated = validate(&payload.loi_data);

    if !validated.unknown_fields.is_empty() {
        warn!(
            fields = ?validated.unknown_fields,
            "Model returned fields outside the LOI schema; ignoring"
        );
    }
    for warning in &validated.warnings {
        warn!(path = %warning.path, reason = %warning.reason, "Field defaulted");
    }

    let report = annotate(
        &payload.field_confidences,
        DealRecord::FIELD_PATHS,
        &validated.warnings,
    );

    info!(
        warnings = validated.warnings.len(),
        low_confidence = report.low_confidence_fields.len(),
        "LOI extraction complete"
    );

    ParseResult {
        record: validated.record,
        field_confidences: report.field_confidences,
        low_confidence_fields: report.low_confidence_fields,
        warnings: validated.warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::mock::CANONICAL_LEASE_TRANSCRIPT;
    use crate::llm_client::testing::{Script, ScriptedProvider};
    use serde_json::json;

    fn model_reply() -> String {
        json!({
            "loi_data": {
                "property_details": {
                    "address": "500 Park Avenue, 10th Floor, New York, NY 10022",
                    "property_type": "Class A Office Space",
                    "square_footage": 8500
                },
                "party_information": {
                    "buyer_tenant_name": "TechStart Innovations LLC",
                    "seller_landlord_name": "Park Avenue Properties Group"
                },
                "financial_terms": {
                    "transaction_type": "Lease",
                    "base_rent": 28000,
                    "escalation_rate": 3.5,
                    "operating_expenses": "Modified Gross"
                },
                "timeline": {"due_diligence_period": 45, "lease_term_months": 84},
                "contingencies": {"custom_contingencies": []},
                "transaction_costs": {
                    "broker_commission_rate": 4.5,
                    "broker_paid_by": "Landlord",
                    "legal_fees_allocation": "Each party pays own"
                }
            },
            "field_confidences": {
                "property_details.address": 98,
                "party_information.buyer_tenant_name": 97,
                "financial_terms.transaction_type": 99,
                "financial_terms.base_rent": 95,
                "timeline.due_diligence_period": 69
            }
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_empty_transcript_rejected_without_model_call() {
        let llm = ScriptedProvider::reply(model_reply());
        let err = extract("   \n\t ", &llm).await.unwrap_err();
        assert!(matches!(err, AppError::Input(_)));
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_extract_happy_path() {
        let llm = ScriptedProvider::reply(model_reply());
        let result = extract(CANONICAL_LEASE_TRANSCRIPT, &llm).await.unwrap();

        assert_eq!(llm.calls(), 1);
        assert_eq!(result.record.timeline.due_diligence_period, 45);
        assert_eq!(result.record.financial_terms.escalation_rate, 3.5);
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
        assert_eq!(result.field_confidences["financial_terms.base_rent"], 95);
        assert!(result
            .low_confidence_fields
            .contains(&"timeline.due_diligence_period".to_string()));
        assert!(!result
            .low_confidence_fields
            .contains(&"financial_terms.base_rent".to_string()));
    }

    #[tokio::test]
    async fn test_every_field_has_confidence_in_range() {
        let llm = ScriptedProvider::reply(model_reply());
        let result = extract("Tenant wants office space.", &llm).await.unwrap();

        assert!(!result.record.financial_terms.transaction_type.is_empty());
        assert_eq!(result.field_confidences.len(), DealRecord::FIELD_PATHS.len());
        assert!(result.field_confidences.values().all(|c| *c <= 100));
        for (path, score) in &result.field_confidences {
            assert_eq!(
                result.low_confidence_fields.contains(path),
                *score < 70,
                "{path}"
            );
        }
    }

    #[tokio::test]
    async fn test_fenced_reply_is_accepted() {
        let llm = ScriptedProvider::reply(format!("```json\n{}\n```", model_reply()));
        assert!(extract("Lease call", &llm).await.is_ok());
    }

    #[tokio::test]
    async fn test_malformed_output_is_parse_error() {
        let llm = ScriptedProvider::reply("{\"loi_data\": {\"property_details\": ");
        let err = extract("Lease call", &llm).await.unwrap_err();
        assert!(matches!(err, AppError::ExtractionParse(_)));
    }

    #[tokio::test]
    async fn test_truncated_output_is_parse_error() {
        let llm = ScriptedProvider::new(Script::Truncated);
        let err = extract("Lease call", &llm).await.unwrap_err();
        assert!(matches!(err, AppError::ExtractionParse(_)));
    }

    #[tokio::test]
    async fn test_provider_outage_is_transient() {
        let llm = ScriptedProvider::new(Script::ApiError(503));
        let err = extract("Lease call", &llm).await.unwrap_err();
        assert!(matches!(err, AppError::TransientExternal(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_bad_credential_is_not_transient() {
        let llm = ScriptedProvider::new(Script::ApiError(401));
        let err = extract("Lease call", &llm).await.unwrap_err();
        assert!(matches!(err, AppError::ProviderRejected(_)));
    }

    #[test]
    fn test_payload_without_record_is_error() {
        let err = parse_payload(r#"{"answer": "I could not find any terms"}"#).unwrap_err();
        assert!(matches!(err, AppError::ExtractionParse(_)));

        let err = parse_payload(r#"[1, 2, 3]"#).unwrap_err();
        assert!(matches!(err, AppError::ExtractionParse(_)));

        let err = parse_payload(r#"{"loi_data": "none"}"#).unwrap_err();
        assert!(matches!(err, AppError::ExtractionParse(_)));
    }

    #[test]
    fn test_top_level_record_is_accepted() {
        let payload = parse_payload(
            r#"{"property_details": {"address": "1 Main St"}, "field_confidences": {"property_details.address": 90}}"#,
        )
        .unwrap();
        assert_eq!(payload.loi_data["property_details"]["address"], "1 Main St");
        assert!(payload.loi_data.get("field_confidences").is_none());
        assert_eq!(payload.field_confidences["property_details.address"], 90);
    }

    #[test]
    fn test_defaulted_fields_are_low_confidence() {
        let payload = ModelPayload {
            loi_data: json!({"financial_terms": {"transaction_type": "Purchase"}}),
            field_confidences: json!({"property_details.address": 99}),
        };
        let result = build_parse_result(&payload);
        assert_eq!(
            result.record.property_details.address,
            crate::extraction::validator::DEFAULT_ADDRESS
        );
        assert!(result.field_confidences["property_details.address"] <= 10);
        assert!(result
            .low_confidence_fields
            .contains(&"property_details.address".to_string()));
    }
}
