//! Firestore REST value encoding
//!
//! Every value on the wire is a single-key object naming its kind, e.g.
//! `{"integerValue": "42"}` or `{"mapValue": {"fields": {...}}}`.
//! Document and reference names are absolute
//! (`projects/p/databases/d/documents/users/alice`); inside the crate they
//! are kept relative to the documents root.

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use crate::value::{DocumentRef, GeoPoint, OpaqueValue, RawDocument, StoreValue};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;
use std::collections::BTreeMap;

/// Decode one typed REST value
pub fn decode_value(value: &JsonValue, documents_root: &str) -> Result<StoreValue> {
    let Some(object) = value.as_object() else {
        return Err(Error::decode(format!(
            "expected a typed value object, got {value}"
        )));
    };
    let Some((kind, inner)) = object.iter().next() else {
        return Err(Error::decode("empty value object"));
    };

    let decoded = match kind.as_str() {
        "nullValue" => StoreValue::Null,
        "booleanValue" => StoreValue::Boolean(
            inner
                .as_bool()
                .ok_or_else(|| Error::decode(format!("bad booleanValue: {inner}")))?,
        ),
        "integerValue" => StoreValue::Integer(decode_integer(inner)?),
        "doubleValue" => StoreValue::Double(decode_double(inner)?),
        "timestampValue" => {
            let raw = inner
                .as_str()
                .ok_or_else(|| Error::decode(format!("bad timestampValue: {inner}")))?;
            let ts = DateTime::parse_from_rfc3339(raw)
                .map_err(|e| Error::decode(format!("bad timestampValue '{raw}': {e}")))?;
            StoreValue::Timestamp(ts.with_timezone(&Utc))
        }
        "stringValue" => StoreValue::String(inner.as_str().unwrap_or_default().to_string()),
        "bytesValue" => {
            let raw = inner.as_str().unwrap_or_default();
            let bytes = STANDARD
                .decode(raw)
                .map_err(|e| Error::decode(format!("bad bytesValue: {e}")))?;
            StoreValue::Bytes(bytes)
        }
        "referenceValue" => {
            let name = inner.as_str().unwrap_or_default();
            StoreValue::Reference(DocumentRef::new(relative_name(name, documents_root)))
        }
        // Zero coordinates are omitted on the wire
        "geoPointValue" => StoreValue::GeoPoint(GeoPoint::new(
            inner.get("latitude").and_then(JsonValue::as_f64).unwrap_or(0.0),
            inner.get("longitude").and_then(JsonValue::as_f64).unwrap_or(0.0),
        )),
        "arrayValue" => {
            let items = match inner.get("values").and_then(JsonValue::as_array) {
                Some(values) => values
                    .iter()
                    .map(|v| decode_value(v, documents_root))
                    .collect::<Result<Vec<_>>>()?,
                None => Vec::new(),
            };
            StoreValue::Array(items)
        }
        "mapValue" => StoreValue::Map(decode_fields(inner.get("fields"), documents_root)?),
        other => decode_unknown(other, inner),
    };
    Ok(decoded)
}

/// Decode a `fields` object into a document body
pub fn decode_fields(
    fields: Option<&JsonValue>,
    documents_root: &str,
) -> Result<BTreeMap<String, StoreValue>> {
    let Some(fields) = fields.and_then(JsonValue::as_object) else {
        return Ok(BTreeMap::new());
    };
    fields
        .iter()
        .map(|(name, value)| Ok((name.clone(), decode_value(value, documents_root)?)))
        .collect()
}

/// Decode a REST `Document`
pub fn decode_document(document: &JsonValue, documents_root: &str) -> Result<RawDocument> {
    let name = document
        .get("name")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| Error::decode("document without a name"))?;
    let path = relative_name(name, documents_root);

    // An empty document carries no `fields` at all
    match document.get("fields") {
        Some(fields) => Ok(RawDocument::new(
            path,
            decode_fields(Some(fields), documents_root)?,
        )),
        None => Ok(RawDocument::tombstone(path)),
    }
}

/// Encode a value for use in a filter or cursor
pub fn encode_value(value: &StoreValue, documents_root: &str) -> JsonValue {
    match value {
        StoreValue::Null | StoreValue::ServerTimestamp => json!({"nullValue": null}),
        StoreValue::Boolean(b) => json!({"booleanValue": b}),
        StoreValue::Integer(i) => json!({"integerValue": i.to_string()}),
        StoreValue::Double(f) => encode_double(*f),
        StoreValue::Timestamp(ts) => json!({"timestampValue": encode_timestamp(ts)}),
        StoreValue::String(s) => json!({"stringValue": s}),
        StoreValue::Bytes(bytes) => json!({"bytesValue": STANDARD.encode(bytes)}),
        StoreValue::Reference(reference) => {
            json!({"referenceValue": format!("{documents_root}/{}", reference.path)})
        }
        StoreValue::GeoPoint(point) => json!({
            "geoPointValue": {"latitude": point.latitude, "longitude": point.longitude}
        }),
        StoreValue::Array(items) => {
            let values: Vec<JsonValue> =
                items.iter().map(|v| encode_value(v, documents_root)).collect();
            json!({"arrayValue": {"values": values}})
        }
        StoreValue::Map(fields) => {
            let encoded: JsonObject = fields
                .iter()
                .map(|(k, v)| (k.clone(), encode_value(v, documents_root)))
                .collect();
            json!({"mapValue": {"fields": encoded}})
        }
        StoreValue::Other(opaque) => json!({"stringValue": opaque.repr}),
    }
}

/// Strip the documents root from an absolute resource name
fn relative_name(name: &str, documents_root: &str) -> String {
    name.strip_prefix(documents_root)
        .map(|rest| rest.trim_start_matches('/'))
        .unwrap_or(name)
        .to_string()
}

// int64 travels as a string; accept a bare number too
fn decode_integer(inner: &JsonValue) -> Result<i64> {
    match inner {
        JsonValue::String(s) => s
            .parse()
            .map_err(|e| Error::decode(format!("bad integerValue '{s}': {e}"))),
        JsonValue::Number(n) => n
            .as_i64()
            .ok_or_else(|| Error::decode(format!("bad integerValue: {n}"))),
        other => Err(Error::decode(format!("bad integerValue: {other}"))),
    }
}

fn decode_double(inner: &JsonValue) -> Result<f64> {
    match inner {
        JsonValue::Number(n) => n
            .as_f64()
            .ok_or_else(|| Error::decode(format!("bad doubleValue: {n}"))),
        JsonValue::String(s) => match s.as_str() {
            "NaN" => Ok(f64::NAN),
            "Infinity" => Ok(f64::INFINITY),
            "-Infinity" => Ok(f64::NEG_INFINITY),
            other => other
                .parse()
                .map_err(|e| Error::decode(format!("bad doubleValue '{other}': {e}"))),
        },
        other => Err(Error::decode(format!("bad doubleValue: {other}"))),
    }
}

fn encode_double(f: f64) -> JsonValue {
    if f.is_nan() {
        json!({"doubleValue": "NaN"})
    } else if f.is_infinite() {
        let name = if f > 0.0 { "Infinity" } else { "-Infinity" };
        json!({"doubleValue": name})
    } else {
        json!({"doubleValue": f})
    }
}

fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn decode_unknown(kind: &str, inner: &JsonValue) -> StoreValue {
    let opaque = OpaqueValue::new(kind, inner.to_string());
    StoreValue::Other(match inner {
        JsonValue::Object(map) => opaque.with_attributes(
            map.iter()
                .map(|(k, v)| (k.clone(), StoreValue::from_plain_json(v)))
                .collect(),
        ),
        _ => opaque,
    })
}
