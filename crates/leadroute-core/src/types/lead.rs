//! Normalized lead representation

use crate::error::{CoreError, Result};
use crate::types::LeadField;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A lead attribute value: either a single scalar or a list of scalars
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LeadValue {
    Text(String),
    List(Vec<String>),
}

impl LeadValue {
    /// A value counts as absent when it is blank or an empty list
    pub fn is_empty(&self) -> bool {
        match self {
            LeadValue::Text(s) => s.trim().is_empty(),
            LeadValue::List(items) => items.iter().all(|s| s.trim().is_empty()),
        }
    }

    /// All scalar members
    pub fn values(&self) -> Vec<&str> {
        match self {
            LeadValue::Text(s) => vec![s.as_str()],
            LeadValue::List(items) => items.iter().map(String::as_str).collect(),
        }
    }

    /// The scalar itself, or the first list element
    pub fn first(&self) -> Option<&str> {
        match self {
            LeadValue::Text(s) => Some(s.as_str()),
            LeadValue::List(items) => items.first().map(String::as_str),
        }
    }
}

impl From<&str> for LeadValue {
    fn from(s: &str) -> Self {
        LeadValue::Text(s.to_string())
    }
}

impl From<String> for LeadValue {
    fn from(s: String) -> Self {
        LeadValue::Text(s)
    }
}

impl From<Vec<&str>> for LeadValue {
    fn from(items: Vec<&str>) -> Self {
        LeadValue::List(items.into_iter().map(str::to_string).collect())
    }
}

/// Identity fields; required before a lead may be routed, never matched on
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadIdentity {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

impl LeadIdentity {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
        }
    }
}

/// Canonical lead: identity plus at most one value per matching field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    #[serde(flatten)]
    pub identity: LeadIdentity,

    #[serde(default)]
    pub attributes: BTreeMap<LeadField, LeadValue>,
}

impl Lead {
    /// Create a lead with the given identity and no attributes
    pub fn new(identity: LeadIdentity) -> Self {
        Self {
            identity,
            attributes: BTreeMap::new(),
        }
    }

    /// Set an attribute (builder style); empty values are dropped
    pub fn with(mut self, field: LeadField, value: impl Into<LeadValue>) -> Self {
        self.set(field, value.into());
        self
    }

    /// Set an attribute; empty values remove the field
    pub fn set(&mut self, field: LeadField, value: LeadValue) {
        if value.is_empty() {
            self.attributes.remove(&field);
        } else {
            self.attributes.insert(field, value);
        }
    }

    /// Present, non-empty value for a field
    pub fn get(&self, field: LeadField) -> Option<&LeadValue> {
        self.attributes.get(&field).filter(|v| !v.is_empty())
    }

    /// Ensure name, email and phone are all present
    pub fn validate_identity(&self) -> Result<()> {
        let checks = [
            ("name", &self.identity.name),
            ("email", &self.identity.email),
            ("phone", &self.identity.phone),
        ];
        for (label, value) in checks {
            if value.trim().is_empty() {
                return Err(CoreError::MissingIdentity(label.to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> LeadIdentity {
        LeadIdentity::new("Asha", "asha@example.com", "9999999999")
    }

    #[test]
    fn test_empty_values_are_absent() {
        let lead = Lead::new(identity())
            .with(LeadField::Mode, "  ")
            .with(LeadField::PreferredCity, LeadValue::List(vec![]));

        assert!(lead.get(LeadField::Mode).is_none());
        assert!(lead.get(LeadField::PreferredCity).is_none());
        assert!(lead.attributes.is_empty());
    }

    #[test]
    fn test_first_of_list() {
        let value = LeadValue::from(vec!["MBA", "BBA"]);
        assert_eq!(value.first(), Some("MBA"));
        assert_eq!(value.values(), vec!["MBA", "BBA"]);
    }

    #[test]
    fn test_identity_validation() {
        assert!(Lead::new(identity()).validate_identity().is_ok());

        let missing_phone = Lead::new(LeadIdentity::new("Asha", "asha@example.com", ""));
        assert_eq!(
            missing_phone.validate_identity(),
            Err(CoreError::MissingIdentity("phone".to_string()))
        );
    }

    #[test]
    fn test_lead_deserializes_from_flat_json() {
        let json = serde_json::json!({
            "name": "Asha",
            "email": "asha@example.com",
            "phone": "9999999999",
            "attributes": {
                "preferred_city": ["Delhi"],
                "mode": "Online"
            }
        });

        let lead: Lead = serde_json::from_value(json).unwrap();
        assert_eq!(lead.identity.name, "Asha");
        assert_eq!(
            lead.get(LeadField::PreferredCity),
            Some(&LeadValue::List(vec!["Delhi".to_string()]))
        );
        assert_eq!(lead.get(LeadField::Mode), Some(&LeadValue::from("Online")));
    }
}
