//! Schema types
//!
//! `TypeTag` and `DeclaredSchema` are what the extractor reasons about;
//! `JsonSchema` and `SchemaProperty` are their JSON Schema rendering.

use crate::types::{EXTRACTED_AT_FIELD, ID_FIELD};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Type Tags
// ============================================================================

/// Declared type of one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeTag {
    String,
    Integer,
    Number,
    Boolean,
    DateTime,
    Object,
    Array(Box<TypeTag>),
}

impl TypeTag {
    /// Array of the given item type
    pub fn array_of(item: TypeTag) -> Self {
        TypeTag::Array(Box::new(item))
    }

    /// Parse a configured type name. Unknown names fall back to string.
    pub fn from_config(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "integer" => TypeTag::Integer,
            "number" => TypeTag::Number,
            "boolean" => TypeTag::Boolean,
            "datetime" => TypeTag::DateTime,
            "object" => TypeTag::Object,
            "array" => TypeTag::array_of(TypeTag::String),
            _ => TypeTag::String,
        }
    }

    /// Render as a nullable JSON Schema property
    pub fn to_property(&self) -> SchemaProperty {
        match self {
            TypeTag::String => SchemaProperty::nullable(JsonType::String),
            TypeTag::Integer => SchemaProperty::nullable(JsonType::Integer),
            TypeTag::Number => SchemaProperty::nullable(JsonType::Number),
            TypeTag::Boolean => SchemaProperty::nullable(JsonType::Boolean),
            TypeTag::DateTime => {
                SchemaProperty::nullable(JsonType::String).with_format("date-time")
            }
            TypeTag::Object => SchemaProperty::open_object(),
            TypeTag::Array(item) => SchemaProperty::array(item.to_property()),
        }
    }
}

impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeTag::String => write!(f, "string"),
            TypeTag::Integer => write!(f, "integer"),
            TypeTag::Number => write!(f, "number"),
            TypeTag::Boolean => write!(f, "boolean"),
            TypeTag::DateTime => write!(f, "datetime"),
            TypeTag::Object => write!(f, "object"),
            TypeTag::Array(item) => write!(f, "array<{item}>"),
        }
    }
}

// ============================================================================
// Declared Schema
// ============================================================================

/// The output schema of one collection for one run.
///
/// `fields` is a lower bound on record shape: the store enforces no schema,
/// so undeclared fields are always allowed through.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclaredSchema {
    /// Collection the schema belongs to
    pub stream: String,
    /// Declared fields
    pub fields: BTreeMap<String, TypeTag>,
    /// Primary key fields
    pub key_properties: Vec<String>,
    /// Replication key, if the collection is incremental
    pub replication_key: Option<String>,
    /// Whether undeclared fields may appear in records
    pub additional_properties: bool,
}

impl DeclaredSchema {
    /// Schema with only the identity and extraction-timestamp fields
    pub fn new(stream: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(ID_FIELD.to_string(), TypeTag::String);
        fields.insert(EXTRACTED_AT_FIELD.to_string(), TypeTag::DateTime);

        Self {
            stream: stream.into(),
            fields,
            key_properties: vec![ID_FIELD.to_string()],
            replication_key: None,
            additional_properties: true,
        }
    }

    /// Declare (or redeclare) a field
    pub fn insert(&mut self, name: impl Into<String>, tag: TypeTag) {
        self.fields.insert(name.into(), tag);
    }

    /// Declared type of a field
    pub fn field_type(&self, name: &str) -> Option<&TypeTag> {
        self.fields.get(name)
    }

    /// Render as a JSON Schema document
    pub fn to_json_schema(&self) -> JsonSchema {
        let mut schema = JsonSchema::new();
        for (name, tag) in &self.fields {
            schema.add_property(name, tag.to_property());
        }
        schema.additional_properties = self.additional_properties;
        schema
    }
}

// ============================================================================
// JSON Schema rendering
// ============================================================================

/// JSON Schema type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    Null,
}

impl std::fmt::Display for JsonType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JsonType::String => write!(f, "string"),
            JsonType::Number => write!(f, "number"),
            JsonType::Integer => write!(f, "integer"),
            JsonType::Boolean => write!(f, "boolean"),
            JsonType::Object => write!(f, "object"),
            JsonType::Array => write!(f, "array"),
            JsonType::Null => write!(f, "null"),
        }
    }
}

/// JSON type can be a single type or array of types (for nullable)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonTypeOrArray {
    Single(JsonType),
    Multiple(Vec<JsonType>),
}

impl JsonTypeOrArray {
    /// Create a single type
    pub fn single(t: JsonType) -> Self {
        JsonTypeOrArray::Single(t)
    }

    /// Create a nullable type
    pub fn nullable(t: JsonType) -> Self {
        if t == JsonType::Null {
            JsonTypeOrArray::Single(JsonType::Null)
        } else {
            JsonTypeOrArray::Multiple(vec![t, JsonType::Null])
        }
    }

    /// Check if this type is nullable
    pub fn is_nullable(&self) -> bool {
        match self {
            JsonTypeOrArray::Single(JsonType::Null) => true,
            JsonTypeOrArray::Multiple(types) => types.contains(&JsonType::Null),
            _ => false,
        }
    }

    /// Get the primary (non-null) type
    pub fn primary_type(&self) -> Option<&JsonType> {
        match self {
            JsonTypeOrArray::Single(t) => Some(t),
            JsonTypeOrArray::Multiple(types) => types.iter().find(|t| **t != JsonType::Null),
        }
    }
}

/// JSON Schema property definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaProperty {
    /// Property type(s)
    #[serde(rename = "type")]
    pub json_type: JsonTypeOrArray,

    /// Format hint (e.g., "date-time")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Nested properties (for objects)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, SchemaProperty>>,

    /// Additional properties allowed (for objects)
    #[serde(
        rename = "additionalProperties",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<bool>,

    /// Array items schema
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaProperty>>,
}

impl SchemaProperty {
    /// Create a nullable property
    pub fn nullable(json_type: JsonType) -> Self {
        Self {
            json_type: JsonTypeOrArray::nullable(json_type),
            format: None,
            properties: None,
            additional_properties: None,
            items: None,
        }
    }

    /// Nullable object with no declared properties
    pub fn open_object() -> Self {
        Self {
            properties: Some(BTreeMap::new()),
            additional_properties: Some(true),
            ..Self::nullable(JsonType::Object)
        }
    }

    /// Nullable array with item schema
    pub fn array(items: SchemaProperty) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::nullable(JsonType::Array)
        }
    }

    /// Set format hint
    #[must_use]
    pub fn with_format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }

    /// Check if nullable
    pub fn is_nullable(&self) -> bool {
        self.json_type.is_nullable()
    }
}

/// Full JSON Schema document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonSchema {
    /// Schema type (always "object" for top-level)
    #[serde(rename = "type")]
    pub json_type: JsonType,

    /// Object properties
    #[serde(default)]
    pub properties: BTreeMap<String, SchemaProperty>,

    /// Allow additional properties
    #[serde(rename = "additionalProperties", default = "default_true")]
    pub additional_properties: bool,
}

fn default_true() -> bool {
    true
}

impl Default for JsonSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonSchema {
    /// Create a new empty schema
    pub fn new() -> Self {
        Self {
            json_type: JsonType::Object,
            properties: BTreeMap::new(),
            additional_properties: true,
        }
    }

    /// Add a property
    pub fn add_property(&mut self, name: &str, property: SchemaProperty) {
        self.properties.insert(name.to_string(), property);
    }

    /// Convert to JSON value
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
