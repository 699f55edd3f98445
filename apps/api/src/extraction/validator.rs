//! Schema validator — converts the untrusted model payload into a typed `DealRecord`.
//!
//! Policy is best-effort: a field that is missing, mistyped or out of range is
//! replaced by its documented default and reported as a `FieldWarning`. The
//! record as a whole never fails, because a human reviews every field.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::deal::{
    Contingencies, DealRecord, FinancialTerms, PartyInformation, PropertyDetails, Timeline,
    TransactionCosts,
};

pub const DEFAULT_ADDRESS: &str = "[Address Not Specified]";
pub const DEFAULT_PROPERTY_TYPE: &str = "Office Space";
pub const DEFAULT_TENANT_NAME: &str = "[Tenant Name Not Specified]";
pub const DEFAULT_LANDLORD_NAME: &str = "[Landlord Name Not Specified]";
pub const DEFAULT_TRANSACTION_TYPE: &str = "Lease";
pub const DEFAULT_OPERATING_EXPENSES: &str = "NNN";
pub const DEFAULT_BROKER_COMMISSION_RATE: f64 = 5.0;
pub const DEFAULT_BROKER_PAID_BY: &str = "Seller/Landlord";
pub const DEFAULT_LEGAL_FEES_ALLOCATION: &str = "Each party pays own";

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%B %d, %Y", "%b %d, %Y"];

static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+(\.\d+)?").expect("valid number regex"));

/// A field that could not be taken verbatim from the model output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldWarning {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct Validated {
    pub record: DealRecord,
    pub warnings: Vec<FieldWarning>,
    /// Dotted paths present in the payload that the record has no field for.
    pub unknown_fields: Vec<String>,
}

/// Validates the `loi_data` object returned by the model.
pub fn validate(raw: &Value) -> Validated {
    let mut v = Validator::default();
    let root = v.object(raw, "loi_data");

    let property = v.section(root, "property_details");
    let property_details = PropertyDetails {
        address: v.required_string(property, "property_details", "address", DEFAULT_ADDRESS),
        property_type: v.required_string(
            property,
            "property_details",
            "property_type",
            DEFAULT_PROPERTY_TYPE,
        ),
        square_footage: v
            .optional_integer(property, "property_details", "square_footage", true)
            .map(u64::from),
        description: v.optional_string(property, "property_details", "description"),
    };

    let parties = v.section(root, "party_information");
    let party_information = PartyInformation {
        buyer_tenant_name: v.required_string(
            parties,
            "party_information",
            "buyer_tenant_name",
            DEFAULT_TENANT_NAME,
        ),
        buyer_tenant_entity: v.optional_string(parties, "party_information", "buyer_tenant_entity"),
        seller_landlord_name: v.required_string(
            parties,
            "party_information",
            "seller_landlord_name",
            DEFAULT_LANDLORD_NAME,
        ),
        seller_landlord_entity: v.optional_string(
            parties,
            "party_information",
            "seller_landlord_entity",
        ),
    };

    let financial = v.section(root, "financial_terms");
    let transaction_type = v.required_string(
        financial,
        "financial_terms",
        "transaction_type",
        DEFAULT_TRANSACTION_TYPE,
    );
    let lowered = transaction_type.to_lowercase();
    if !lowered.contains("lease") && !lowered.contains("purchase") {
        v.warn(
            "financial_terms.transaction_type",
            format!("'{transaction_type}' names neither a lease nor a purchase"),
        );
    }
    let financial_terms = FinancialTerms {
        transaction_type,
        purchase_price: v.optional_number(financial, "financial_terms", "purchase_price"),
        base_rent: v.optional_number(financial, "financial_terms", "base_rent"),
        rent_per_sqft: v.optional_number(financial, "financial_terms", "rent_per_sqft"),
        escalation_rate: v
            .optional_number(financial, "financial_terms", "escalation_rate")
            .unwrap_or(0.0),
        security_deposit: v.optional_number(financial, "financial_terms", "security_deposit"),
        operating_expenses: v
            .optional_string(financial, "financial_terms", "operating_expenses")
            .unwrap_or_else(|| DEFAULT_OPERATING_EXPENSES.to_string()),
    };

    let timeline_obj = v.section(root, "timeline");
    let timeline = Timeline {
        loi_expiration_date: v.optional_date(timeline_obj, "timeline", "loi_expiration_date"),
        due_diligence_period: v
            .optional_integer(timeline_obj, "timeline", "due_diligence_period", false)
            .unwrap_or(0),
        lease_commencement_date: v.optional_date(
            timeline_obj,
            "timeline",
            "lease_commencement_date",
        ),
        lease_term_months: v.optional_integer(timeline_obj, "timeline", "lease_term_months", true),
        closing_date: v.optional_date(timeline_obj, "timeline", "closing_date"),
        free_rent_period: v.optional_integer(timeline_obj, "timeline", "free_rent_period", false),
    };

    let contingencies_obj = v.section(root, "contingencies");
    let defaults = Contingencies::default();
    let contingencies = Contingencies {
        financing_contingency: v.boolean(
            contingencies_obj,
            "contingencies",
            "financing_contingency",
            defaults.financing_contingency,
        ),
        inspection_contingency: v.boolean(
            contingencies_obj,
            "contingencies",
            "inspection_contingency",
            defaults.inspection_contingency,
        ),
        environmental_contingency: v.boolean(
            contingencies_obj,
            "contingencies",
            "environmental_contingency",
            defaults.environmental_contingency,
        ),
        zoning_approval: v.boolean(
            contingencies_obj,
            "contingencies",
            "zoning_approval",
            defaults.zoning_approval,
        ),
        custom_contingencies: v.string_list(
            contingencies_obj,
            "contingencies",
            "custom_contingencies",
        ),
    };

    let costs = v.section(root, "transaction_costs");
    let transaction_costs = TransactionCosts {
        broker_commission_rate: v
            .optional_number(costs, "transaction_costs", "broker_commission_rate")
            .unwrap_or(DEFAULT_BROKER_COMMISSION_RATE),
        broker_paid_by: v
            .optional_string(costs, "transaction_costs", "broker_paid_by")
            .unwrap_or_else(|| DEFAULT_BROKER_PAID_BY.to_string()),
        legal_fees_allocation: v
            .optional_string(costs, "transaction_costs", "legal_fees_allocation")
            .unwrap_or_else(|| DEFAULT_LEGAL_FEES_ALLOCATION.to_string()),
        title_insurance_paid_by: v.optional_string(
            costs,
            "transaction_costs",
            "title_insurance_paid_by",
        ),
        tenant_improvement_allowance: v.optional_number(
            costs,
            "transaction_costs",
            "tenant_improvement_allowance",
        ),
    };

    let additional_terms = v.free_text(root, "", "additional_terms");
    let broker_information = v.free_text(root, "", "broker_information");

    let unknown_fields = collect_unknown_fields(root);

    Validated {
        record: DealRecord {
            property_details,
            party_information,
            financial_terms,
            timeline,
            contingencies,
            transaction_costs,
            additional_terms,
            broker_information,
        },
        warnings: v.warnings,
        unknown_fields,
    }
}

#[derive(Default)]
struct Validator {
    warnings: Vec<FieldWarning>,
}

fn join_path(section: &str, key: &str) -> String {
    if section.is_empty() {
        key.to_string()
    } else {
        format!("{section}.{key}")
    }
}

impl Validator {
    fn warn(&mut self, path: &str, reason: impl Into<String>) {
        self.warnings.push(FieldWarning {
            path: path.to_string(),
            reason: reason.into(),
        });
    }

    fn object<'a>(&mut self, value: &'a Value, path: &str) -> Option<&'a Map<String, Value>> {
        match value {
            Value::Object(map) => Some(map),
            Value::Null => None,
            other => {
                self.warn(path, format!("expected an object, got {}", kind(other)));
                None
            }
        }
    }

    fn section<'a>(
        &mut self,
        root: Option<&'a Map<String, Value>>,
        name: &str,
    ) -> Option<&'a Map<String, Value>> {
        let value = root.and_then(|r| r.get(name))?;
        self.object(value, name)
    }

    /// Null and absent are treated alike.
    fn field<'a>(obj: Option<&'a Map<String, Value>>, key: &str) -> Option<&'a Value> {
        obj.and_then(|o| o.get(key)).filter(|v| !v.is_null())
    }

    fn required_string(
        &mut self,
        obj: Option<&Map<String, Value>>,
        section: &str,
        key: &str,
        default: &str,
    ) -> String {
        let path = join_path(section, key);
        match Self::field(obj, key) {
            None => {
                self.warn(&path, "required field missing");
                default.to_string()
            }
            Some(value) => match scalar_text(value) {
                Some(s) if !s.is_empty() => s,
                Some(_) => {
                    self.warn(&path, "required field empty");
                    default.to_string()
                }
                None => {
                    self.warn(&path, format!("expected a string, got {}", kind(value)));
                    default.to_string()
                }
            },
        }
    }

    fn optional_string(
        &mut self,
        obj: Option<&Map<String, Value>>,
        section: &str,
        key: &str,
    ) -> Option<String> {
        let value = Self::field(obj, key)?;
        match scalar_text(value) {
            Some(s) if s.is_empty() => None,
            Some(s) => Some(s),
            None => {
                self.warn(
                    &join_path(section, key),
                    format!("expected a string, got {}", kind(value)),
                );
                None
            }
        }
    }

    /// Like `optional_string`, but flattens arrays and objects into bullet lines.
    fn free_text(
        &mut self,
        obj: Option<&Map<String, Value>>,
        section: &str,
        key: &str,
    ) -> Option<String> {
        let value = Self::field(obj, key)?;
        let path = join_path(section, key);
        match value {
            Value::Array(items) => {
                self.warn(&path, "expected text, flattened a list into bullets");
                let lines: Vec<String> = items
                    .iter()
                    .filter_map(scalar_text)
                    .filter(|s| !s.is_empty())
                    .map(|s| format!("• {s}"))
                    .collect();
                (!lines.is_empty()).then(|| lines.join("\n"))
            }
            Value::Object(map) => {
                self.warn(&path, "expected text, flattened an object into bullets");
                let lines: Vec<String> = map
                    .iter()
                    .map(|(k, v)| match scalar_text(v) {
                        Some(s) => format!("• {k}: {s}"),
                        None => format!("• {k}: {v}"),
                    })
                    .collect();
                (!lines.is_empty()).then(|| lines.join("\n"))
            }
            _ => self.optional_string(obj, section, key),
        }
    }

    fn optional_number(
        &mut self,
        obj: Option<&Map<String, Value>>,
        section: &str,
        key: &str,
    ) -> Option<f64> {
        let value = Self::field(obj, key)?;
        let path = join_path(section, key);
        match coerce_number(value) {
            Some(n) if n < 0.0 => {
                self.warn(&path, format!("negative value {n} is not allowed"));
                None
            }
            Some(n) => Some(n),
            None => {
                self.warn(&path, format!("expected a number, got {value}"));
                None
            }
        }
    }

    /// `positive` rejects zero as well as negatives.
    fn optional_integer(
        &mut self,
        obj: Option<&Map<String, Value>>,
        section: &str,
        key: &str,
        positive: bool,
    ) -> Option<u32> {
        let n = self.optional_number(obj, section, key)?;
        let path = join_path(section, key);
        if n.fract() != 0.0 {
            self.warn(&path, format!("expected a whole number, rounded {n}"));
        }
        let rounded = n.round();
        if rounded > f64::from(u32::MAX) {
            self.warn(&path, format!("value {n} is out of range"));
            return None;
        }
        if positive && rounded == 0.0 {
            self.warn(&path, "expected a positive number, got 0");
            return None;
        }
        Some(rounded as u32)
    }

    fn optional_date(
        &mut self,
        obj: Option<&Map<String, Value>>,
        section: &str,
        key: &str,
    ) -> Option<NaiveDate> {
        let value = Self::field(obj, key)?;
        let parsed = value.as_str().and_then(parse_date);
        if parsed.is_none() {
            self.warn(
                &join_path(section, key),
                format!("expected a calendar date, got {value}"),
            );
        }
        parsed
    }

    fn boolean(
        &mut self,
        obj: Option<&Map<String, Value>>,
        section: &str,
        key: &str,
        default: bool,
    ) -> bool {
        let Some(value) = Self::field(obj, key) else {
            return default;
        };
        let parsed = match value {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => match n.as_i64() {
                Some(0) => Some(false),
                Some(1) => Some(true),
                _ => None,
            },
            Value::String(s) => match s.trim().to_lowercase().as_str() {
                "true" | "yes" | "y" => Some(true),
                "false" | "no" | "n" => Some(false),
                _ => None,
            },
            _ => None,
        };
        parsed.unwrap_or_else(|| {
            self.warn(
                &join_path(section, key),
                format!("expected true or false, got {value}"),
            );
            default
        })
    }

    fn string_list(
        &mut self,
        obj: Option<&Map<String, Value>>,
        section: &str,
        key: &str,
    ) -> Vec<String> {
        let Some(value) = Self::field(obj, key) else {
            return Vec::new();
        };
        let path = join_path(section, key);
        match value {
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    match scalar_text(item) {
                        Some(s) if !s.is_empty() => out.push(s),
                        Some(_) => {}
                        None => self.warn(&path, format!("skipped non-text item {item}")),
                    }
                }
                out
            }
            Value::String(s) if s.trim().is_empty() => Vec::new(),
            Value::String(s) => vec![s.trim().to_string()],
            other => {
                self.warn(&path, format!("expected a list of strings, got {}", kind(other)));
                Vec::new()
            }
        }
    }
}

/// Strings are trimmed; numbers and booleans are rendered as text.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Accepts JSON numbers and strings such as "$28,000", "3.5%" or "8,500 sq ft".
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number_text(s),
        _ => None,
    }
}

fn parse_number_text(text: &str) -> Option<f64> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    LEADING_NUMBER
        .find(&cleaned)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|n| n.is_finite())
}

pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            // ISO timestamps such as "2026-03-01T00:00:00Z"
            text.get(..10)
                .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        })
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

fn is_known_section(name: &str) -> bool {
    DealRecord::FIELD_PATHS
        .iter()
        .any(|p| p.split_once('.').is_some_and(|(section, _)| section == name))
}

fn collect_unknown_fields(root: Option<&Map<String, Value>>) -> Vec<String> {
    let Some(root) = root else {
        return Vec::new();
    };
    let mut unknown = Vec::new();
    for (key, value) in root {
        if is_known_section(key) {
            if let Value::Object(section) = value {
                for field in section.keys() {
                    let path = format!("{key}.{field}");
                    if !DealRecord::FIELD_PATHS.contains(&path.as_str()) {
                        unknown.push(path);
                    }
                }
            }
        } else if !DealRecord::FIELD_PATHS.contains(&key.as_str()) {
            unknown.push(key.clone());
        }
    }
    unknown
}
