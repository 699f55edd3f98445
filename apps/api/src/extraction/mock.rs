//! Mock extraction for demos and integration tests. No model call is made;
//! the canonical payload goes through the same validator and confidence
//! estimator as a real response.

use chrono::{Duration, NaiveDate};
use serde_json::{json, Value};

use crate::extraction::extractor::{build_parse_result, ModelPayload, ParseResult};

/// The broker call the mock payload was extracted from.
pub const CANONICAL_LEASE_TRANSCRIPT: &str = "\
Broker (Sarah Chen, Manhattan Commercial Realty): Thanks for jumping on. I have TechStart Innovations, \
a Delaware LLC, ready to move on the tenth floor at 500 Park Avenue.
Owner (Park Avenue Properties Group): Good. That's the full floor, 8,500 square feet, Class A, river views.
Broker: They'd sign a seven year lease, 84 months, at $45 a foot, so $28,000 a month, with 3.5% annual bumps.
Owner: We can do that on a modified gross basis. We'd want two months of rent as a deposit, $56,000.
Broker: Fine. They're asking for three months free and $35 a foot in TI.
Owner: Agreed, as long as we finish the common area buildout first.
Broker: They'll need 45 days of due diligence and approval of the final space plan. No financing contingency.
Owner: Commencement about ninety days out, and the LOI is open for two weeks. Our side pays your 4.5% commission.
Broker: They also want a right of first refusal on the eleventh floor and directory signage.";

/// Canonical lease extraction. `today` anchors the relative dates in the deal.
pub fn mock_parse_result(today: NaiveDate) -> ParseResult {
    build_parse_result(&mock_payload(today))
}

fn mock_payload(today: NaiveDate) -> ModelPayload {
    let loi_expiration = (today + Duration::days(14)).format("%Y-%m-%d").to_string();
    let commencement = (today + Duration::days(90)).format("%Y-%m-%d").to_string();

    let loi_data = json!({
        "property_details": {
            "address": "500 Park Avenue, 10th Floor, New York, NY 10022",
            "property_type": "Class A Office Space",
            "square_footage": 8500,
            "description": "Full-floor office space with Hudson River views"
        },
        "party_information": {
            "buyer_tenant_name": "TechStart Innovations LLC",
            "buyer_tenant_entity": "Delaware Limited Liability Company",
            "seller_landlord_name": "Park Avenue Properties Group",
            "seller_landlord_entity": null
        },
        "financial_terms": {
            "transaction_type": "Lease",
            "purchase_price": null,
            "base_rent": 28000.0,
            "rent_per_sqft": 45.0,
            "escalation_rate": 3.5,
            "security_deposit": 56000.0,
            "operating_expenses": "Modified Gross"
        },
        "timeline": {
            "loi_expiration_date": loi_expiration,
            "due_diligence_period": 45,
            "lease_commencement_date": commencement,
            "lease_term_months": 84,
            "closing_date": null,
            "free_rent_period": 3
        },
        "contingencies": {
            "financing_contingency": false,
            "inspection_contingency": true,
            "environmental_contingency": true,
            "zoning_approval": false,
            "custom_contingencies": [
                "Subject to landlord completing buildout of common areas",
                "Tenant approval of final space plan"
            ]
        },
        "transaction_costs": {
            "broker_commission_rate": 4.5,
            "broker_paid_by": "Landlord",
            "legal_fees_allocation": "Each party pays own",
            "title_insurance_paid_by": null,
            "tenant_improvement_allowance": 35.0
        },
        "additional_terms": "• Right of first refusal on the 11th floor\n• Signage rights on building directory",
        "broker_information": "Sarah Chen, Manhattan Commercial Realty"
    });

    ModelPayload {
        loi_data,
        field_confidences: mock_confidences(),
    }
}

fn mock_confidences() -> Value {
    json!({
        "property_details.address": 97,
        "property_details.property_type": 90,
        "property_details.square_footage": 98,
        "property_details.description": 75,
        "party_information.buyer_tenant_name": 98,
        "party_information.buyer_tenant_entity": 92,
        "party_information.seller_landlord_name": 95,
        "party_information.seller_landlord_entity": 20,
        "financial_terms.transaction_type": 99,
        "financial_terms.purchase_price": 90,
        "financial_terms.base_rent": 97,
        "financial_terms.rent_per_sqft": 97,
        "financial_terms.escalation_rate": 96,
        "financial_terms.security_deposit": 94,
        "financial_terms.operating_expenses": 90,
        "timeline.loi_expiration_date": 65,
        "timeline.due_diligence_period": 96,
        "timeline.lease_commencement_date": 60,
        "timeline.lease_term_months": 98,
        "timeline.closing_date": 90,
        "timeline.free_rent_period": 95,
        "contingencies.financing_contingency": 92,
        "contingencies.inspection_contingency": 40,
        "contingencies.environmental_contingency": 30,
        "contingencies.zoning_approval": 30,
        "contingencies.custom_contingencies": 88,
        "transaction_costs.broker_commission_rate": 95,
        "transaction_costs.broker_paid_by": 92,
        "transaction_costs.legal_fees_allocation": 20,
        "transaction_costs.title_insurance_paid_by": 15,
        "transaction_costs.tenant_improvement_allowance": 94,
        "additional_terms": 85,
        "broker_information": 80
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::confidence::LOW_CONFIDENCE_THRESHOLD;
    use crate::models::deal::DealRecord;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
    }

    #[test]
    fn test_mock_matches_canonical_terms() {
        let result = mock_parse_result(today());
        let r = &result.record;
        assert!(r.financial_terms.transaction_type.to_lowercase().contains("lease"));
        assert_eq!(r.timeline.due_diligence_period, 45);
        assert_eq!(r.financial_terms.escalation_rate, 3.5);
        assert_eq!(r.party_information.buyer_tenant_name, "TechStart Innovations LLC");
        assert_eq!(r.financial_terms.purchase_price, None);
        assert_eq!(
            r.timeline.loi_expiration_date,
            NaiveDate::from_ymd_opt(2026, 1, 29)
        );
    }

    #[test]
    fn test_mock_validates_cleanly() {
        let result = mock_parse_result(today());
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    }

    #[test]
    fn test_mock_scores_every_field() {
        let result = mock_parse_result(today());
        assert_eq!(result.field_confidences.len(), DealRecord::FIELD_PATHS.len());
        let expected_low: Vec<String> = result
            .field_confidences
            .iter()
            .filter(|(_, c)| **c < LOW_CONFIDENCE_THRESHOLD)
            .map(|(p, _)| p.clone())
            .collect();
        assert_eq!(result.low_confidence_fields, expected_low);
        assert!(result
            .low_confidence_fields
            .contains(&"timeline.loi_expiration_date".to_string()));
    }

    #[test]
    fn test_mock_is_deterministic_for_a_given_day() {
        let a = mock_parse_result(today());
        let b = mock_parse_result(today());
        assert_eq!(a.record, b.record);
        assert_eq!(a.field_confidences, b.field_confidences);
    }

    #[test]
    fn test_transcript_mentions_tenant() {
        assert!(CANONICAL_LEASE_TRANSCRIPT.contains("TechStart Innovations"));
    }
}
