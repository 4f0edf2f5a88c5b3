//! Conversion of store values into transport-safe JSON

use super::types::{OpaqueValue, StoreValue};
use crate::types::{JsonObject, JsonValue};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;
use std::collections::BTreeMap;

/// Convert a store value into JSON.
///
/// Total: every value produces some JSON. Unknown kinds fall back to an
/// object of their public attributes, or to their string form.
pub fn normalize(value: &StoreValue) -> JsonValue {
    match value {
        StoreValue::Null | StoreValue::ServerTimestamp => JsonValue::Null,
        StoreValue::Boolean(b) => JsonValue::Bool(*b),
        StoreValue::Integer(i) => JsonValue::from(*i),
        // NaN and infinities have no JSON form
        StoreValue::Double(f) => {
            serde_json::Number::from_f64(*f).map_or(JsonValue::Null, JsonValue::Number)
        }
        StoreValue::Timestamp(ts) => JsonValue::String(format_timestamp(ts)),
        StoreValue::GeoPoint(point) => json!({
            "latitude": point.latitude,
            "longitude": point.longitude,
        }),
        StoreValue::Reference(reference) => JsonValue::String(reference.path.clone()),
        StoreValue::Map(map) => JsonValue::Object(normalize_fields(map)),
        StoreValue::Array(items) => JsonValue::Array(items.iter().map(normalize).collect()),
        StoreValue::Bytes(bytes) => JsonValue::String(String::from_utf8_lossy(bytes).into_owned()),
        StoreValue::Other(opaque) => normalize_opaque(opaque),
        StoreValue::String(s) => JsonValue::String(s.clone()),
    }
}

/// Normalize every field of a document body, keeping the keys
pub fn normalize_fields(fields: &BTreeMap<String, StoreValue>) -> JsonObject {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), normalize(value)))
        .collect()
}

/// ISO 8601 with an explicit `+00:00` offset
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

fn normalize_opaque(opaque: &OpaqueValue) -> JsonValue {
    match &opaque.attributes {
        Some(attributes) => JsonValue::Object(
            attributes
                .iter()
                .filter(|(key, _)| !key.starts_with('_'))
                .map(|(key, value)| (key.clone(), normalize(value)))
                .collect(),
        ),
        None => JsonValue::String(opaque.repr.clone()),
    }
}
