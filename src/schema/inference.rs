//! Type inference from sampled documents

use super::types::TypeTag;
use crate::store::DocumentStore;
use crate::value::{RawDocument, StoreValue};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Default number of documents sampled per collection
pub const DEFAULT_SAMPLE_SIZE: usize = 10;

/// Derive the declared type of a single value.
///
/// Null carries no evidence and maps to string, so that later non-null
/// values can still live under one declared type. A pending server timestamp
/// reads back as null and is treated the same way.
pub fn infer_type(value: &StoreValue) -> TypeTag {
    match value {
        StoreValue::Null | StoreValue::ServerTimestamp => TypeTag::String,
        StoreValue::Timestamp(_) => TypeTag::DateTime,
        StoreValue::Boolean(_) => TypeTag::Boolean,
        StoreValue::Integer(_) => TypeTag::Integer,
        StoreValue::Double(_) => TypeTag::Number,
        StoreValue::String(_) | StoreValue::Bytes(_) | StoreValue::Reference(_) => {
            TypeTag::String
        }
        StoreValue::GeoPoint(_) | StoreValue::Map(_) => TypeTag::Object,
        StoreValue::Array(items) => match items.first() {
            Some(first) => TypeTag::array_of(infer_type(first)),
            None => TypeTag::array_of(TypeTag::String),
        },
        StoreValue::Other(opaque) => {
            if opaque.attributes.is_some() {
                TypeTag::Object
            } else {
                TypeTag::String
            }
        }
    }
}

/// Samples a collection and fixes a type per field
#[derive(Debug, Clone)]
pub struct SchemaInferrer {
    sample_size: usize,
}

impl Default for SchemaInferrer {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaInferrer {
    /// Create an inferrer with the default sample size
    pub fn new() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }

    /// Set the number of documents to sample
    #[must_use]
    pub fn with_sample_size(mut self, size: usize) -> Self {
        self.sample_size = size;
        self
    }

    /// Field types from documents in sample order.
    ///
    /// The first document carrying a field decides its type; later documents
    /// never override it. At most `sample_size` documents are considered.
    pub fn infer_fields(&self, documents: &[RawDocument]) -> BTreeMap<String, TypeTag> {
        let mut fields = BTreeMap::new();

        for document in documents.iter().take(self.sample_size) {
            let Some(body) = &document.fields else {
                continue;
            };
            for (name, value) in body {
                fields
                    .entry(name.clone())
                    .or_insert_with(|| infer_type(value));
            }
        }

        fields
    }

    /// Sample a collection and infer its field types.
    ///
    /// A failed sample is logged and yields no fields; discovery carries on
    /// with the minimal schema.
    pub async fn sample_and_infer(
        &self,
        store: &dyn DocumentStore,
        collection: &str,
    ) -> BTreeMap<String, TypeTag> {
        match store.sample(collection, self.sample_size).await {
            Ok(documents) => {
                let fields = self.infer_fields(&documents);
                debug!(
                    "Inferred {} fields for '{}' from {} sampled documents",
                    fields.len(),
                    collection,
                    documents.len()
                );
                fields
            }
            Err(e) => {
                warn!(
                    "Schema sampling failed for '{}', using minimal schema: {}",
                    collection, e
                );
                BTreeMap::new()
            }
        }
    }
}
