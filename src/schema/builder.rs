//! Declared schema construction

use super::inference::SchemaInferrer;
use super::types::{DeclaredSchema, TypeTag};
use crate::config::CollectionSpec;
use crate::store::DocumentStore;
use crate::types::ReplicationKeyType;

/// Declared type of a replication key
pub fn replication_key_tag(kind: ReplicationKeyType) -> TypeTag {
    match kind {
        ReplicationKeyType::Timestamp => TypeTag::DateTime,
        ReplicationKeyType::String => TypeTag::String,
        ReplicationKeyType::Integer => TypeTag::Integer,
    }
}

/// Build the schema of one collection for one run.
///
/// Configured field types win outright and the store is never sampled.
/// Otherwise a bounded sample is run through the inferrer.
pub async fn build_schema(
    spec: &CollectionSpec,
    store: &dyn DocumentStore,
    inferrer: &SchemaInferrer,
) -> DeclaredSchema {
    let mut schema = DeclaredSchema::new(&spec.name);

    if let Some(key) = &spec.replication_key {
        schema.insert(key, replication_key_tag(spec.replication_key_type));
        schema.replication_key = Some(key.clone());
    }

    match &spec.schema {
        Some(configured) => {
            for (name, tag) in configured {
                schema.insert(name, TypeTag::from_config(tag));
            }
        }
        None => {
            for (name, tag) in inferrer.sample_and_infer(store, &spec.name).await {
                schema.insert(name, tag);
            }
        }
    }

    schema
}
