//! Lead normalization
//!
//! Inbound lead payloads use inconsistent keys (`utm_campaign`, `utmCampaign`,
//! `UTM-Campaign`, ...) and sometimes only carry UTM data inside the landing
//! page URL. [`ConditionNormalizer`] folds all of that into one [`Lead`].
//!
//! Keys are compared after lowercasing and dropping `_`, `-` and spaces.
//! For each field the first non-empty alias wins; URL-derived UTM values are
//! only used when every explicit alias is empty.

use crate::types::{Lead, LeadField, LeadIdentity, LeadValue};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

const UTM_CAMPAIGN_ALIASES: &[&str] = &["utmcampaign", "campaign", "campaignname"];
const UTM_CAMPAIGN_ID_ALIASES: &[&str] = &["utmcampaignid", "campaignid"];
const DESTINATION_NUMBER_ALIASES: &[&str] = &["destinationnumber", "destination", "didnumber"];

const NAME_ALIASES: &[&str] = &["name", "fullname", "studentname", "leadname"];
const EMAIL_ALIASES: &[&str] = &["email", "emailid", "emailaddress"];
const PHONE_ALIASES: &[&str] = &["phone", "phonenumber", "mobile", "mobilenumber", "contactnumber"];

/// Aliases for fields other than `utmCampaign`, which has its own fallback chain
fn aliases(field: LeadField) -> &'static [&'static str] {
    match field {
        LeadField::UtmCampaign => UTM_CAMPAIGN_ALIASES,
        LeadField::FirstSourceUrl => &[
            "firstsourceurl",
            "sourceurl",
            "landingpageurl",
            "landingpage",
            "pageurl",
        ],
        LeadField::Source => &["source", "utmsource", "leadsource"],
        LeadField::Mode => &["mode", "preferredmode", "studymode", "learningmode"],
        LeadField::PreferredBudget => &["preferredbudget", "budget"],
        LeadField::CurrentProfession => &["currentprofession", "profession", "occupation"],
        LeadField::PreferredLevel => &["preferredlevel", "level", "courselevel"],
        LeadField::PreferredDegree => &["preferreddegree", "degree"],
        LeadField::PreferredSpecialization => &["preferredspecialization", "specialization"],
        LeadField::PreferredCity => &["preferredcity", "city"],
        LeadField::PreferredState => &["preferredstate", "state"],
    }
}

pub struct ConditionNormalizer;

impl ConditionNormalizer {
    /// Normalize a raw JSON lead; non-object input yields an empty lead
    pub fn normalize_value(raw: &JsonValue) -> Lead {
        match raw {
            JsonValue::Object(map) => Self::normalize(map),
            _ => Lead::default(),
        }
    }

    /// Normalize a raw lead object into the canonical field set
    pub fn normalize(raw: &Map<String, JsonValue>) -> Lead {
        let index: BTreeMap<String, &JsonValue> = raw
            .iter()
            .map(|(key, value)| (canonical_key(key), value))
            .collect();

        let mut lead = Lead::new(LeadIdentity {
            name: lookup_text(&index, NAME_ALIASES).unwrap_or_else(|| joined_name(&index)),
            email: lookup_text(&index, EMAIL_ALIASES).unwrap_or_default(),
            phone: lookup_text(&index, PHONE_ALIASES).unwrap_or_default(),
        });

        for field in LeadField::PRIORITY_ORDER {
            if let Some(value) = lookup(&index, aliases(field)) {
                lead.set(field, value);
            }
        }

        let utm = lead
            .get(LeadField::FirstSourceUrl)
            .and_then(LeadValue::first)
            .map(Self::parse_utm_params)
            .unwrap_or_default();

        if lead.get(LeadField::UtmCampaign).is_none() {
            let campaign = lookup(&index, UTM_CAMPAIGN_ID_ALIASES)
                .or_else(|| utm.get("utmcampaign").cloned().map(LeadValue::Text))
                .or_else(|| {
                    // Business fallback: the dialled number identifies the campaign
                    lookup(&index, DESTINATION_NUMBER_ALIASES)
                });
            if let Some(campaign) = campaign {
                lead.set(LeadField::UtmCampaign, campaign);
            }
        }

        if lead.get(LeadField::Source).is_none() {
            if let Some(source) = utm.get("utmsource") {
                lead.set(LeadField::Source, LeadValue::Text(source.clone()));
            }
        }

        lead
    }

    /// Parse the query string of `url` into canonical-key → decoded value pairs
    ///
    /// `https://x.com/p?utm_campaign=spring%20intake&utm_source=google#top`
    /// yields `{"utmcampaign": "spring intake", "utmsource": "google"}`.
    pub fn parse_utm_params(url: &str) -> BTreeMap<String, String> {
        let Some((_, query)) = url.split_once('?') else {
            return BTreeMap::new();
        };
        let query = query.split('#').next().unwrap_or_default();

        query
            .split('&')
            .filter_map(|pair| {
                let (key, value) = pair.split_once('=')?;
                let value = value.replace('+', " ");
                let decoded = urlencoding::decode(&value)
                    .map(|v| v.into_owned())
                    .unwrap_or(value);
                let decoded = decoded.trim().to_string();
                if key.is_empty() || decoded.is_empty() {
                    None
                } else {
                    Some((canonical_key(key), decoded))
                }
            })
            .collect()
    }
}

fn canonical_key(key: &str) -> String {
    key.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

fn lookup(index: &BTreeMap<String, &JsonValue>, aliases: &[&str]) -> Option<LeadValue> {
    aliases
        .iter()
        .filter_map(|alias| index.get(*alias))
        .filter_map(|value| json_to_lead_value(value))
        .find(|value| !value.is_empty())
}

fn lookup_text(index: &BTreeMap<String, &JsonValue>, aliases: &[&str]) -> Option<String> {
    lookup(index, aliases)
        .and_then(|value| value.first().map(|s| s.trim().to_string()))
        .filter(|s| !s.is_empty())
}

fn joined_name(index: &BTreeMap<String, &JsonValue>) -> String {
    let first = lookup_text(index, &["firstname"]).unwrap_or_default();
    let last = lookup_text(index, &["lastname"]).unwrap_or_default();
    format!("{} {}", first, last).trim().to_string()
}

fn json_to_lead_value(value: &JsonValue) -> Option<LeadValue> {
    match value {
        JsonValue::Array(items) => {
            let items: Vec<String> = items.iter().filter_map(json_scalar).collect();
            Some(LeadValue::List(items))
        }
        other => json_scalar(other).map(LeadValue::Text),
    }
}

fn json_scalar(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.trim().to_string()),
        JsonValue::Number(n) => Some(match n.as_i64() {
            Some(i) => i.to_string(),
            None => n.to_string(),
        }),
        JsonValue::Bool(b) => Some(b.to_string()),
        JsonValue::Null | JsonValue::Array(_) | JsonValue::Object(_) => None,
    }
}
