//! Condition values
//!
//! Rule conditions arrive as loosely shaped JSON (`"Delhi"`, `["Delhi"]`,
//! `"Any"`, `"50000-100000"`). They are parsed once into [`FieldCondition`]
//! so the matcher never re-interprets raw JSON.

use crate::error::{CoreError, Result};
use crate::types::LeadField;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Condition value that accepts every lead value
pub const ANY_SENTINEL: &str = "Any";

/// One acceptable budget entry
#[derive(Debug, Clone, PartialEq)]
pub enum BudgetBound {
    /// Inclusive numeric range written as `"min-max"`
    Range { min: f64, max: f64 },
    /// Exact amount, already stripped of currency symbols and separators
    Exact(String),
    /// Unparseable entry; never matches
    Malformed(String),
}

impl BudgetBound {
    /// Parse a budget entry such as `"₹50,000-1,00,000"` or `"75000"`
    pub fn parse(raw: &str) -> Self {
        let cleaned = strip_amount(raw);
        if cleaned.is_empty() {
            return BudgetBound::Malformed(raw.to_string());
        }

        match cleaned[1..].find('-').map(|i| i + 1) {
            Some(split) => {
                let (min, max) = (&cleaned[..split], &cleaned[split + 1..]);
                match (min.parse::<f64>(), max.parse::<f64>()) {
                    (Ok(min), Ok(max)) => BudgetBound::Range { min, max },
                    _ => BudgetBound::Malformed(raw.to_string()),
                }
            }
            None => BudgetBound::Exact(cleaned),
        }
    }

    /// Test a lead budget value against this bound
    pub fn accepts(&self, lead_value: &str) -> bool {
        let cleaned = strip_amount(lead_value);
        match self {
            BudgetBound::Range { min, max } => cleaned
                .parse::<f64>()
                .map(|amount| amount >= *min && amount <= *max)
                .unwrap_or(false),
            BudgetBound::Exact(expected) => !cleaned.is_empty() && cleaned == *expected,
            BudgetBound::Malformed(_) => false,
        }
    }

    fn to_raw(&self) -> String {
        match self {
            BudgetBound::Range { min, max } => format!("{}-{}", min, max),
            BudgetBound::Exact(amount) => amount.clone(),
            BudgetBound::Malformed(raw) => raw.clone(),
        }
    }
}

/// Keep digits, decimal point and range dash; drops currency symbols, commas and spaces
fn strip_amount(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect()
}

/// Condition declared by a rule for one lead field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldCondition {
    /// Empty or `"Any"`: never constrains the lead
    Any,
    /// Lead value must be one of these scalars
    OneOf(Vec<String>),
    /// `preferred_budget` entries
    Budget(Vec<BudgetBound>),
}

impl FieldCondition {
    /// Build a condition for `field` from plain string values
    pub fn for_field<I, S>(field: LeadField, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values
            .into_iter()
            .map(Into::into)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if values.is_empty() || values.iter().any(|v| v == ANY_SENTINEL) {
            return FieldCondition::Any;
        }

        if field == LeadField::PreferredBudget {
            FieldCondition::Budget(values.iter().map(|v| BudgetBound::parse(v)).collect())
        } else {
            FieldCondition::OneOf(values)
        }
    }

    /// Parse a raw JSON condition value
    pub fn from_json(field: LeadField, value: &JsonValue) -> Result<Self> {
        let scalars = match value {
            JsonValue::Null => Vec::new(),
            JsonValue::Array(items) => items
                .iter()
                .map(|item| json_scalar(field, item))
                .collect::<Result<Vec<_>>>()?
                .into_iter()
                .flatten()
                .collect(),
            other => json_scalar(field, other)?.into_iter().collect(),
        };
        Ok(Self::for_field(field, scalars))
    }

    pub fn is_any(&self) -> bool {
        matches!(self, FieldCondition::Any)
    }

    fn to_json(&self) -> JsonValue {
        match self {
            FieldCondition::Any => JsonValue::String(ANY_SENTINEL.to_string()),
            FieldCondition::OneOf(values) => {
                JsonValue::Array(values.iter().cloned().map(JsonValue::String).collect())
            }
            FieldCondition::Budget(bounds) => JsonValue::Array(
                bounds
                    .iter()
                    .map(|b| JsonValue::String(b.to_raw()))
                    .collect(),
            ),
        }
    }
}

fn json_scalar(field: LeadField, value: &JsonValue) -> Result<Option<String>> {
    match value {
        JsonValue::Null => Ok(None),
        JsonValue::String(s) => Ok(Some(s.clone())),
        JsonValue::Number(n) => Ok(Some(match n.as_i64() {
            Some(i) => i.to_string(),
            None => n.to_string(),
        })),
        JsonValue::Bool(b) => Ok(Some(b.to_string())),
        JsonValue::Array(_) | JsonValue::Object(_) => Err(CoreError::InvalidCondition {
            field: field.as_str().to_string(),
            reason: "nested values are not supported".to_string(),
        }),
    }
}

/// The condition map of an assignment rule, keyed by lead field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, JsonValue>",
    into = "BTreeMap<String, JsonValue>"
)]
pub struct RuleConditions {
    fields: BTreeMap<LeadField, FieldCondition>,
}

impl RuleConditions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Constrain `field` to the given values
    pub fn with_values<I, S>(mut self, field: LeadField, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields
            .insert(field, FieldCondition::for_field(field, values));
        self
    }

    /// Declare `field` with the `"Any"` sentinel
    pub fn with_any(mut self, field: LeadField) -> Self {
        self.fields.insert(field, FieldCondition::Any);
        self
    }

    pub fn get(&self, field: LeadField) -> Option<&FieldCondition> {
        self.fields.get(&field)
    }

    /// Conditions that actually constrain a lead, in priority order
    pub fn applicable(&self) -> impl Iterator<Item = (LeadField, &FieldCondition)> {
        self.fields
            .iter()
            .filter(|(_, condition)| !condition.is_any())
            .map(|(field, condition)| (*field, condition))
    }

    pub fn applicable_count(&self) -> usize {
        self.applicable().count()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl TryFrom<BTreeMap<String, JsonValue>> for RuleConditions {
    type Error = CoreError;

    fn try_from(raw: BTreeMap<String, JsonValue>) -> Result<Self> {
        let mut fields = BTreeMap::new();
        for (key, value) in raw {
            match LeadField::from_name(&key) {
                Some(field) => {
                    fields.insert(field, FieldCondition::from_json(field, &value)?);
                }
                None => log::warn!("Ignoring unknown rule condition field '{}'", key),
            }
        }
        Ok(Self { fields })
    }
}

impl From<RuleConditions> for BTreeMap<String, JsonValue> {
    fn from(conditions: RuleConditions) -> Self {
        conditions
            .fields
            .iter()
            .map(|(field, condition)| (field.as_str().to_string(), condition.to_json()))
            .collect()
    }
}
