//! Confidence estimator — normalizes the model's self-reported per-field confidence.
//!
//! Confidence is a flat map keyed by dotted field path, so this module never
//! needs to know the shape of `DealRecord`; callers pass the expected paths.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::extraction::validator::{coerce_number, FieldWarning};

/// Fields scored below this are flagged for human review.
pub const LOW_CONFIDENCE_THRESHOLD: u8 = 70;

/// Used when the model reports nothing (or nonsense) for a field.
pub const MISSING_CONFIDENCE: u8 = 0;

/// Ceiling for any field the validator had to default or coerce.
pub const DEFAULTED_FIELD_CONFIDENCE: u8 = 10;

pub type ConfidenceMap = BTreeMap<String, u8>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfidenceReport {
    pub field_confidences: ConfidenceMap,
    /// Sorted paths with confidence below [`LOW_CONFIDENCE_THRESHOLD`].
    pub low_confidence_fields: Vec<String>,
}

/// Builds the confidence map for `expected_paths` from the raw
/// `field_confidences` value returned by the model.
pub fn annotate(
    raw: &Value,
    expected_paths: &[&str],
    warnings: &[FieldWarning],
) -> ConfidenceReport {
    let mut reported = BTreeMap::new();
    flatten(raw, String::new(), &mut reported);

    let field_confidences: ConfidenceMap = expected_paths
        .iter()
        .map(|path| {
            let mut score = reported
                .get(*path)
                .and_then(|v| coerce_number(v))
                .map(clamp_score)
                .unwrap_or(MISSING_CONFIDENCE);
            if warnings.iter().any(|w| w.path == *path) {
                score = score.min(DEFAULTED_FIELD_CONFIDENCE);
            }
            (path.to_string(), score)
        })
        .collect();

    let low_confidence_fields = low_confidence_fields(&field_confidences);

    ConfidenceReport {
        field_confidences,
        low_confidence_fields,
    }
}

/// All paths scored strictly below the threshold.
pub fn low_confidence_fields(confidences: &ConfidenceMap) -> Vec<String> {
    confidences
        .iter()
        .filter(|(_, score)| **score < LOW_CONFIDENCE_THRESHOLD)
        .map(|(path, _)| path.clone())
        .collect()
}

fn clamp_score(raw: f64) -> u8 {
    raw.round().clamp(0.0, 100.0) as u8
}

/// `{"a": {"b": 90}}` and `{"a.b": 90}` both yield `a.b -> 90`.
fn flatten<'a>(value: &'a Value, prefix: String, out: &mut BTreeMap<String, &'a Value>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(child, path, out);
            }
        }
        leaf if !prefix.is_empty() => {
            out.insert(prefix, leaf);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PATHS: &[&str] = &[
        "financial_terms.base_rent",
        "financial_terms.escalation_rate",
        "property_details.address",
    ];

    #[test]
    fn test_threshold_boundaries() {
        let raw = json!({
            "financial_terms.base_rent": 69,
            "financial_terms.escalation_rate": 70,
            "property_details.address": 71
        });
        let report = annotate(&raw, PATHS, &[]);
        assert_eq!(report.low_confidence_fields, vec!["financial_terms.base_rent"]);
        assert_eq!(report.field_confidences["financial_terms.escalation_rate"], 70);
    }

    #[test]
    fn test_scores_are_clamped() {
        let raw = json!({
            "financial_terms.base_rent": 150,
            "financial_terms.escalation_rate": -20,
            "property_details.address": 89.6
        });
        let report = annotate(&raw, PATHS, &[]);
        assert_eq!(report.field_confidences["financial_terms.base_rent"], 100);
        assert_eq!(report.field_confidences["financial_terms.escalation_rate"], 0);
        assert_eq!(report.field_confidences["property_details.address"], 90);
    }

    #[test]
    fn test_missing_confidence_defaults_to_zero() {
        let raw = json!({"property_details.address": 95});
        let report = annotate(&raw, PATHS, &[]);
        assert_eq!(report.field_confidences["financial_terms.base_rent"], 0);
        assert_eq!(
            report.low_confidence_fields,
            vec!["financial_terms.base_rent", "financial_terms.escalation_rate"]
        );
    }

    #[test]
    fn test_non_object_confidences_mean_all_low() {
        let report = annotate(&json!("high"), PATHS, &[]);
        assert_eq!(report.field_confidences.len(), PATHS.len());
        assert_eq!(report.low_confidence_fields.len(), PATHS.len());
    }

    #[test]
    fn test_string_scores_are_parsed() {
        let raw = json!({"property_details.address": "85", "financial_terms.base_rent": "high"});
        let report = annotate(&raw, PATHS, &[]);
        assert_eq!(report.field_confidences["property_details.address"], 85);
        assert_eq!(report.field_confidences["financial_terms.base_rent"], 0);
    }

    #[test]
    fn test_nested_confidences_are_flattened() {
        let raw = json!({
            "financial_terms": {"base_rent": 92, "escalation_rate": 40},
            "property_details": {"address": 99}
        });
        let report = annotate(&raw, PATHS, &[]);
        assert_eq!(report.field_confidences["financial_terms.base_rent"], 92);
        assert_eq!(report.low_confidence_fields, vec!["financial_terms.escalation_rate"]);
    }

    #[test]
    fn test_unexpected_paths_are_ignored() {
        let raw = json!({"property_details.address": 95, "made.up": 10});
        let report = annotate(&raw, PATHS, &[]);
        assert!(!report.field_confidences.contains_key("made.up"));
    }

    #[test]
    fn test_warned_fields_are_capped() {
        let raw = json!({"property_details.address": 95});
        let warnings = vec![FieldWarning {
            path: "property_details.address".into(),
            reason: "required field missing".into(),
        }];
        let report = annotate(&raw, PATHS, &warnings);
        assert_eq!(
            report.field_confidences["property_details.address"],
            DEFAULTED_FIELD_CONFIDENCE
        );
        assert!(report
            .low_confidence_fields
            .contains(&"property_details.address".to_string()));
    }

    #[test]
    fn test_every_score_in_range() {
        let raw = json!({
            "financial_terms.base_rent": 1e9,
            "financial_terms.escalation_rate": -1e9,
            "property_details.address": null
        });
        let report = annotate(&raw, PATHS, &[]);
        assert!(report.field_confidences.values().all(|s| *s <= 100));
    }
}
