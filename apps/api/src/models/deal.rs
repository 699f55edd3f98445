//! The structured deal-term record extracted from a broker call transcript.

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PropertyDetails {
    pub address: String,
    pub property_type: String,
    pub square_footage: Option<u64>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PartyInformation {
    pub buyer_tenant_name: String,
    pub buyer_tenant_entity: Option<String>,
    pub seller_landlord_name: String,
    pub seller_landlord_entity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FinancialTerms {
    /// Free text such as "Lease" or "Purchase". Drives every lease/purchase branch downstream.
    pub transaction_type: String,
    pub purchase_price: Option<f64>,
    /// Monthly base rent.
    pub base_rent: Option<f64>,
    /// Annual rent per square foot.
    pub rent_per_sqft: Option<f64>,
    #[serde(default)]
    pub escalation_rate: f64,
    pub security_deposit: Option<f64>,
    pub operating_expenses: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Timeline {
    pub loi_expiration_date: Option<NaiveDate>,
    /// Days.
    #[serde(default)]
    pub due_diligence_period: u32,
    pub lease_commencement_date: Option<NaiveDate>,
    pub lease_term_months: Option<u32>,
    pub closing_date: Option<NaiveDate>,
    /// Months.
    pub free_rent_period: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Contingencies {
    pub financing_contingency: bool,
    pub inspection_contingency: bool,
    pub environmental_contingency: bool,
    pub zoning_approval: bool,
    #[serde(default)]
    pub custom_contingencies: Vec<String>,
}

impl Default for Contingencies {
    fn default() -> Self {
        Self {
            financing_contingency: true,
            inspection_contingency: true,
            environmental_contingency: true,
            zoning_approval: false,
            custom_contingencies: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TransactionCosts {
    /// Percent, e.g. `4.5` for 4.5%.
    pub broker_commission_rate: f64,
    pub broker_paid_by: String,
    pub legal_fees_allocation: String,
    pub title_insurance_paid_by: Option<String>,
    /// Dollars per square foot.
    pub tenant_improvement_allowance: Option<f64>,
}

/// Complete LOI record for one transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DealRecord {
    pub property_details: PropertyDetails,
    pub party_information: PartyInformation,
    pub financial_terms: FinancialTerms,
    pub timeline: Timeline,
    #[serde(default)]
    pub contingencies: Contingencies,
    pub transaction_costs: TransactionCosts,
    pub additional_terms: Option<String>,
    pub broker_information: Option<String>,
}

impl DealRecord {
    /// Every leaf field as a dotted path. Confidence scores are keyed by these.
    pub const FIELD_PATHS: &'static [&'static str] = &[
        "property_details.address",
        "property_details.property_type",
        "property_details.square_footage",
        "property_details.description",
        "party_information.buyer_tenant_name",
        "party_information.buyer_tenant_entity",
        "party_information.seller_landlord_name",
        "party_information.seller_landlord_entity",
        "financial_terms.transaction_type",
        "financial_terms.purchase_price",
        "financial_terms.base_rent",
        "financial_terms.rent_per_sqft",
        "financial_terms.escalation_rate",
        "financial_terms.security_deposit",
        "financial_terms.operating_expenses",
        "timeline.loi_expiration_date",
        "timeline.due_diligence_period",
        "timeline.lease_commencement_date",
        "timeline.lease_term_months",
        "timeline.closing_date",
        "timeline.free_rent_period",
        "contingencies.financing_contingency",
        "contingencies.inspection_contingency",
        "contingencies.environmental_contingency",
        "contingencies.zoning_approval",
        "contingencies.custom_contingencies",
        "transaction_costs.broker_commission_rate",
        "transaction_costs.broker_paid_by",
        "transaction_costs.legal_fees_allocation",
        "transaction_costs.title_insurance_paid_by",
        "transaction_costs.tenant_improvement_allowance",
        "additional_terms",
        "broker_information",
    ];

    /// Case-insensitive substring match on `transaction_type`.
    pub fn is_lease(&self) -> bool {
        self.financial_terms
            .transaction_type
            .to_lowercase()
            .contains("lease")
    }

    /// Case-insensitive substring match on `transaction_type`.
    /// Not exclusive with [`DealRecord::is_lease`]: "Sublease Option to Purchase" is both.
    pub fn is_purchase(&self) -> bool {
        self.financial_terms
            .transaction_type
            .to_lowercase()
            .contains("purchase")
    }
}
