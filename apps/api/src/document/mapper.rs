//! Template data mapper — flattens a `DealRecord` into the key/value set the
//! document template consumes.
//!
//! Pure and total: every key in [`TemplateData::KEYS`] is always present, and
//! absent optional values become `N/A`, `TBD` or `None`, never an empty string.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::deal::DealRecord;

pub const NOT_AVAILABLE: &str = "N/A";
pub const TO_BE_DETERMINED: &str = "TBD";
pub const NONE: &str = "None";

/// A placeholder value or a conditional-region flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TemplateValue {
    Text(String),
    Flag(bool),
}

impl TemplateValue {
    /// Text used when the value fills a `{placeholder}`.
    pub fn as_text(&self) -> String {
        match self {
            TemplateValue::Text(s) => s.clone(),
            TemplateValue::Flag(b) => b.to_string(),
        }
    }

    /// Whether a `{#flag}` region keyed by this value is emitted.
    pub fn is_truthy(&self) -> bool {
        match self {
            TemplateValue::Text(s) => !s.is_empty(),
            TemplateValue::Flag(b) => *b,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateData(BTreeMap<String, TemplateValue>);

impl TemplateData {
    /// Every key produced by [`to_template_data`].
    pub const KEYS: &'static [&'static str] = &[
        "address",
        "property_type",
        "square_footage",
        "description",
        "buyer_tenant_name",
        "buyer_tenant_entity",
        "seller_landlord_name",
        "seller_landlord_entity",
        "transaction_type",
        "purchase_price",
        "base_rent",
        "rent_per_sqft",
        "escalation_rate",
        "security_deposit",
        "operating_expenses",
        "loi_expiration_date",
        "due_diligence_period",
        "lease_commencement_date",
        "lease_term_months",
        "closing_date",
        "free_rent_period",
        "financing_contingency",
        "financing_contingency_text",
        "inspection_contingency",
        "inspection_contingency_text",
        "environmental_contingency",
        "environmental_contingency_text",
        "zoning_approval",
        "zoning_approval_text",
        "custom_contingencies",
        "broker_commission_rate",
        "broker_paid_by",
        "legal_fees_allocation",
        "title_insurance_paid_by",
        "tenant_improvement_allowance",
        "additional_terms",
        "broker_information",
        "is_lease",
        "is_purchase",
    ];

    pub fn insert_text(&mut self, key: &str, value: impl Into<String>) {
        self.0
            .insert(key.to_string(), TemplateValue::Text(value.into()));
    }

    pub fn insert_flag(&mut self, key: &str, value: bool) {
        self.0.insert(key.to_string(), TemplateValue::Flag(value));
    }

    pub fn get(&self, key: &str) -> Option<&TemplateValue> {
        self.0.get(key)
    }

    /// Missing keys are false.
    pub fn is_truthy(&self, key: &str) -> bool {
        self.get(key).is_some_and(TemplateValue::is_truthy)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

pub fn to_template_data(record: &DealRecord) -> TemplateData {
    let mut data = TemplateData::default();

    let p = &record.property_details;
    data.insert_text("address", non_empty_or(&p.address, NOT_AVAILABLE));
    data.insert_text("property_type", non_empty_or(&p.property_type, NOT_AVAILABLE));
    data.insert_text(
        "square_footage",
        p.square_footage
            .map(|sf| format!("{} sq ft", group_thousands(&sf.to_string())))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
    );
    data.insert_text("description", text_or(&p.description, NOT_AVAILABLE));

    let parties = &record.party_information;
    data.insert_text("buyer_tenant_name", non_empty_or(&parties.buyer_tenant_name, NOT_AVAILABLE));
    data.insert_text(
        "buyer_tenant_entity",
        text_or(&parties.buyer_tenant_entity, NOT_AVAILABLE),
    );
    data.insert_text("seller_landlord_name", non_empty_or(&parties.seller_landlord_name, NOT_AVAILABLE));
    data.insert_text(
        "seller_landlord_entity",
        text_or(&parties.seller_landlord_entity, NOT_AVAILABLE),
    );

    let f = &record.financial_terms;
    data.insert_text("transaction_type", non_empty_or(&f.transaction_type, NOT_AVAILABLE));
    data.insert_text("purchase_price", format_currency(f.purchase_price));
    data.insert_text("base_rent", format_currency(f.base_rent));
    data.insert_text("rent_per_sqft", format_per_sqft(f.rent_per_sqft));
    data.insert_text("escalation_rate", format_percent(f.escalation_rate));
    data.insert_text("security_deposit", format_currency(f.security_deposit));
    data.insert_text(
        "operating_expenses",
        non_empty_or(&f.operating_expenses, NOT_AVAILABLE),
    );

    let t = &record.timeline;
    data.insert_text("loi_expiration_date", format_date(t.loi_expiration_date));
    data.insert_text(
        "due_diligence_period",
        format!("{} days", t.due_diligence_period),
    );
    data.insert_text(
        "lease_commencement_date",
        format_date(t.lease_commencement_date),
    );
    data.insert_text(
        "lease_term_months",
        format_months(t.lease_term_months, TO_BE_DETERMINED),
    );
    data.insert_text("closing_date", format_date(t.closing_date));
    data.insert_text("free_rent_period", format_months(t.free_rent_period, NONE));

    let c = &record.contingencies;
    for (key, value) in [
        ("financing_contingency", c.financing_contingency),
        ("inspection_contingency", c.inspection_contingency),
        ("environmental_contingency", c.environmental_contingency),
        ("zoning_approval", c.zoning_approval),
    ] {
        data.insert_flag(key, value);
        data.insert_text(&format!("{key}_text"), if value { "Yes" } else { "No" });
    }
    data.insert_text(
        "custom_contingencies",
        format_bullets(&c.custom_contingencies),
    );

    let costs = &record.transaction_costs;
    data.insert_text(
        "broker_commission_rate",
        format_percent(costs.broker_commission_rate),
    );
    data.insert_text(
        "broker_paid_by",
        non_empty_or(&costs.broker_paid_by, NOT_AVAILABLE),
    );
    data.insert_text(
        "legal_fees_allocation",
        non_empty_or(&costs.legal_fees_allocation, NOT_AVAILABLE),
    );
    data.insert_text(
        "title_insurance_paid_by",
        text_or(&costs.title_insurance_paid_by, NOT_AVAILABLE),
    );
    data.insert_text(
        "tenant_improvement_allowance",
        format_per_sqft(costs.tenant_improvement_allowance),
    );

    data.insert_text("additional_terms", text_or(&record.additional_terms, NONE));
    data.insert_text(
        "broker_information",
        text_or(&record.broker_information, NOT_AVAILABLE),
    );

    // Not mutually exclusive: "Sublease Option to Purchase" sets both.
    data.insert_flag("is_lease", record.is_lease());
    data.insert_flag("is_purchase", record.is_purchase());

    debug_assert!(TemplateData::KEYS.iter().all(|key| data.get(key).is_some()));
    data
}

fn text_or(value: &Option<String>, placeholder: &str) -> String {
    match value.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => placeholder.to_string(),
    }
}

fn non_empty_or(value: &str, placeholder: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        placeholder.to_string()
    } else {
        value.to_string()
    }
}

/// `$` + thousands-grouped amount with two decimals, or `N/A`.
pub fn format_currency(amount: Option<f64>) -> String {
    let Some(amount) = amount else {
        return NOT_AVAILABLE.to_string();
    };
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{sign}${}.{cents}", group_thousands(whole))
}

/// Long-form date such as `March 1, 2026`, or `TBD`.
pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%B %-d, %Y").to_string())
        .unwrap_or_else(|| TO_BE_DETERMINED.to_string())
}

pub fn format_percent(rate: f64) -> String {
    format!("{}%", trim_decimal(rate))
}

fn format_per_sqft(amount: Option<f64>) -> String {
    match amount {
        Some(_) => format!("{} / sq ft", format_currency(amount)),
        None => NOT_AVAILABLE.to_string(),
    }
}

fn format_months(months: Option<u32>, placeholder: &str) -> String {
    match months {
        Some(1) => "1 month".to_string(),
        Some(n) => format!("{n} months"),
        None => placeholder.to_string(),
    }
}

/// One `• item` per line, or `None`.
pub fn format_bullets(items: &[String]) -> String {
    if items.is_empty() {
        return NONE.to_string();
    }
    items
        .iter()
        .map(|item| format!("• {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `3.50` → `3.5`, `5.00` → `5`.
fn trim_decimal(value: f64) -> String {
    let fixed = format!("{value:.2}");
    fixed
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
