//! Store value types
//!
//! These mirror the value kinds a Firestore document can hold.

use crate::types::JsonValue;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// A single value as stored in a document
#[derive(Debug, Clone, PartialEq)]
pub enum StoreValue {
    /// Explicit null
    Null,
    /// Placeholder for a server-assigned write time that has not resolved yet
    ServerTimestamp,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    Timestamp(DateTime<Utc>),
    String(String),
    /// Raw bytes, not necessarily UTF-8
    Bytes(Vec<u8>),
    /// Reference to another document
    Reference(DocumentRef),
    GeoPoint(GeoPoint),
    Array(Vec<StoreValue>),
    Map(BTreeMap<String, StoreValue>),
    /// A value kind this crate does not know about
    Other(OpaqueValue),
}

/// Latitude/longitude pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a new geographic point
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Reference to a document, by path relative to the database root
/// (e.g. `users/alice` or `users/alice/orders/o1`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentRef {
    pub path: String,
}

impl DocumentRef {
    /// Create a reference from a relative document path
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Document identity (last path segment)
    pub fn id(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Path of the collection holding this document
    pub fn collection_path(&self) -> &str {
        self.path
            .rsplit_once('/')
            .map_or("", |(collection, _)| collection)
    }
}

impl std::fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path)
    }
}

/// An unrecognized value kind, kept for best-effort output
#[derive(Debug, Clone, PartialEq)]
pub struct OpaqueValue {
    /// Name of the value kind as reported by the store
    pub type_name: String,
    /// Introspected attributes, if the value exposes any
    pub attributes: Option<BTreeMap<String, StoreValue>>,
    /// String form, used when there is nothing to introspect
    pub repr: String,
}

impl OpaqueValue {
    /// Opaque value with only a string form
    pub fn new(type_name: impl Into<String>, repr: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            attributes: None,
            repr: repr.into(),
        }
    }

    /// Attach introspected attributes
    #[must_use]
    pub fn with_attributes(mut self, attributes: BTreeMap<String, StoreValue>) -> Self {
        self.attributes = Some(attributes);
        self
    }
}

impl StoreValue {
    /// Convenience constructor for string values
    pub fn string(s: impl Into<String>) -> Self {
        Self::String(s.into())
    }

    /// Convenience constructor for reference values
    pub fn reference(path: impl Into<String>) -> Self {
        Self::Reference(DocumentRef::new(path))
    }

    /// Build a store value from plain JSON.
    ///
    /// Integral numbers become `Integer`, other numbers `Double`; there is no
    /// way to express timestamps, bytes or references in plain JSON.
    pub fn from_plain_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Boolean(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => Self::Double(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => Self::String(s.clone()),
            JsonValue::Array(items) => {
                Self::Array(items.iter().map(Self::from_plain_json).collect())
            }
            JsonValue::Object(map) => Self::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_plain_json(v)))
                    .collect(),
            ),
        }
    }

    /// Short name of the value kind, for logs
    pub fn kind(&self) -> &str {
        match self {
            StoreValue::Null => "null",
            StoreValue::ServerTimestamp => "server_timestamp",
            StoreValue::Boolean(_) => "boolean",
            StoreValue::Integer(_) => "integer",
            StoreValue::Double(_) => "double",
            StoreValue::Timestamp(_) => "timestamp",
            StoreValue::String(_) => "string",
            StoreValue::Bytes(_) => "bytes",
            StoreValue::Reference(_) => "reference",
            StoreValue::GeoPoint(_) => "geopoint",
            StoreValue::Array(_) => "array",
            StoreValue::Map(_) => "map",
            StoreValue::Other(opaque) => &opaque.type_name,
        }
    }
}

impl From<&str> for StoreValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for StoreValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for StoreValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for StoreValue {
    fn from(f: f64) -> Self {
        Self::Double(f)
    }
}

impl From<bool> for StoreValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<DateTime<Utc>> for StoreValue {
    fn from(ts: DateTime<Utc>) -> Self {
        Self::Timestamp(ts)
    }
}

/// One document as returned by a query
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    /// Document path relative to the database root
    pub reference: DocumentRef,
    /// Document body; `None` when the store returned no body at all
    pub fields: Option<BTreeMap<String, StoreValue>>,
}

impl RawDocument {
    /// Create a document with a body
    pub fn new(path: impl Into<String>, fields: BTreeMap<String, StoreValue>) -> Self {
        Self {
            reference: DocumentRef::new(path),
            fields: Some(fields),
        }
    }

    /// Create a document whose body is absent
    pub fn tombstone(path: impl Into<String>) -> Self {
        Self {
            reference: DocumentRef::new(path),
            fields: None,
        }
    }

    /// Document identity
    pub fn id(&self) -> &str {
        self.reference.id()
    }

    /// Relative document path
    pub fn path(&self) -> &str {
        &self.reference.path
    }

    /// Look up a top-level field
    pub fn get(&self, field: &str) -> Option<&StoreValue> {
        self.fields.as_ref()?.get(field)
    }

    /// A missing or empty body carries nothing to extract
    pub fn is_tombstone(&self) -> bool {
        self.fields.as_ref().map_or(true, BTreeMap::is_empty)
    }
}
