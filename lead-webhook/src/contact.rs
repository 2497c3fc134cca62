//! Field normalization from a raw lead record to a CRM contact payload.

use crate::errors::UpsertError;
use serde::Serialize;
use serde_json::Value;

/// `source` used when the record does not name one
pub const DEFAULT_SOURCE: &str = "Supabase";

// Candidate column names per field, highest priority first
const FIRST_NAME_KEYS: &[&str] = &["first_name", "firstname", "firstName"];
const LAST_NAME_KEYS: &[&str] = &["last_name", "lastname", "lastName"];
const PHONE_KEYS: &[&str] = &["phone", "phone_number"];
const NAME_KEYS: &[&str] = &["name"];
const EMAIL_KEYS: &[&str] = &["email"];
const SOURCE_KEYS: &[&str] = &["source"];

/// Treats `null` and `""` as absent. Everything else passes through unchanged.
pub fn pick(value: Option<&Value>) -> Option<&Value> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(v) => Some(v),
    }
}

/// First candidate key holding a present value.
pub fn first_present<'a>(record: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| pick(record.get(key)))
}

/// Keeps the digits and a single leading `+`, then makes sure the result starts with `+`.
///
/// No length or country code validation happens here; `"abc"` becomes `"+"`.
pub fn normalize_phone(raw: Option<&str>) -> Option<String> {
    let raw = raw?;

    let mut out = String::with_capacity(raw.len() + 1);
    out.push('+');
    for ch in raw.chars() {
        if ch.is_ascii_digit() {
            out.push(ch);
        }
    }

    Some(out)
}

fn phone_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        other => {
            tracing::warn!(value = %other, "Ignoring phone value that is neither string nor number");
            None
        }
    }
}

/// Body of the CRM upsert request. Absent fields are left out of the JSON entirely.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPayload {
    pub location_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,
}

impl ContactPayload {
    /// Builds the payload for `record`, failing when neither email nor phone survives.
    pub fn from_record(record: &Value, location_id: &str) -> Result<Self, UpsertError> {
        let phone = first_present(record, PHONE_KEYS)
            .and_then(phone_text)
            .and_then(|raw| normalize_phone(Some(&raw)));

        let payload = ContactPayload {
            location_id: location_id.to_string(),
            first_name: first_present(record, FIRST_NAME_KEYS).cloned(),
            last_name: first_present(record, LAST_NAME_KEYS).cloned(),
            name: first_present(record, NAME_KEYS).cloned(),
            email: first_present(record, EMAIL_KEYS).cloned(),
            phone,
            source: Some(
                first_present(record, SOURCE_KEYS)
                    .cloned()
                    .unwrap_or_else(|| Value::from(DEFAULT_SOURCE)),
            ),
        };

        if payload.email.is_none() && payload.phone.is_none() {
            return Err(UpsertError::MissingContactInfo);
        }

        Ok(payload)
    }
}

/// Column names of the record, for logging.
pub fn record_keys(record: &Value) -> Vec<&str> {
    record
        .as_object()
        .map(|map| map.keys().map(String::as_str).collect())
        .unwrap_or_default()
}
