//! Execution engine module
//!
//! Runs one collection from checkpoint to emitted records.
//!
//! # Overview
//!
//! The engine module provides:
//! - `Extractor` - builds the schema once, walks the collection and tracks
//!   the cursor
//! - `Message` / `RecordSink` - what a run produces and where it goes
//! - `SyncStats` - counters for a run
//!
//! Cursor state is never persisted here. The extractor reads the starting
//! cursor and emits `Message::State`; the sink decides what to store.

mod types;

pub use types::{Message, RecordSink, SyncStats};

use crate::config::CollectionSpec;
use crate::error::Result;
use crate::pagination::{build_paginator, extract};
use crate::schema::{build_schema, DeclaredSchema, SchemaInferrer};
use crate::state::{format_cursor, parse_cursor, CheckpointStore};
use crate::store::{DocumentStore, Query};
use crate::types::{JsonObject, JsonValue, ReplicationKeyType, EXTRACTED_AT_FIELD, ID_FIELD};
use crate::value::{normalize, normalize_fields, store_cmp, RawDocument, StoreValue};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Extracts collections from a document store
#[derive(Clone)]
pub struct Extractor {
    store: Arc<dyn DocumentStore>,
    inferrer: SchemaInferrer,
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("inferrer", &self.inferrer)
            .finish_non_exhaustive()
    }
}

impl Extractor {
    /// Create an extractor over a store
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            inferrer: SchemaInferrer::new(),
        }
    }

    /// Use a custom schema inferrer
    #[must_use]
    pub fn with_inferrer(mut self, inferrer: SchemaInferrer) -> Self {
        self.inferrer = inferrer;
        self
    }

    /// Build the declared schema of a collection
    pub async fn discover(&self, spec: &CollectionSpec) -> DeclaredSchema {
        build_schema(spec, self.store.as_ref(), &self.inferrer).await
    }

    /// Run a one-document query to prove the collection is reachable
    pub async fn check(&self, spec: &CollectionSpec) -> Result<usize> {
        let query = Query::new(&spec.name).limit(1);
        self.store
            .run_query(&query)
            .await
            .map(|docs| docs.len())
            .map_err(|e| e.in_collection(&spec.name))
    }

    /// Extract one collection.
    ///
    /// Emits the schema, then one record per non-empty document. Any fatal
    /// error is reported with the collection name attached.
    pub async fn run(
        &self,
        spec: &CollectionSpec,
        checkpoint: &dyn CheckpointStore,
        sink: &mut dyn RecordSink,
    ) -> Result<SyncStats> {
        self.run_collection(spec, checkpoint, sink)
            .await
            .map_err(|e| e.in_collection(&spec.name))
    }

    async fn run_collection(
        &self,
        spec: &CollectionSpec,
        checkpoint: &dyn CheckpointStore,
        sink: &mut dyn RecordSink,
    ) -> Result<SyncStats> {
        let started = Instant::now();
        let mut stats = SyncStats::new();

        let start = match &spec.replication_key {
            Some(key) => match checkpoint.read(&spec.name).await? {
                Some(raw) => {
                    info!("Resuming '{}' after {} = {}", spec.name, key, raw);
                    Some(parse_cursor(&raw, spec.replication_key_type)?)
                }
                None => None,
            },
            None => None,
        };
        info!("Starting {} sync for '{}'", spec.sync_mode(), spec.name);

        let schema = self.discover(spec).await;
        sink.emit(Message::schema(&spec.name, schema)).await?;

        let ordered = spec.pagination.is_ordered();
        let mut cursor = Cursor::new(spec, start.clone());
        let mut documents = extract(self.store.as_ref(), build_paginator(spec, start));

        while let Some(document) = documents.try_next().await? {
            stats.documents_fetched += 1;

            let Some(fields) = document.fields.as_ref().filter(|f| !f.is_empty()) else {
                debug!("Skipping empty document '{}'", document.path());
                stats.tombstones_skipped += 1;
                continue;
            };

            let extracted_at = Utc::now();
            let record = build_record(&document, fields, extracted_at);
            sink.emit(Message::record(&spec.name, record, extracted_at)).await?;
            stats.records_synced += 1;

            if cursor.advance(fields) && ordered {
                if let Some(message) = cursor.state_message() {
                    sink.emit(message).await?;
                }
            }
        }

        if cursor.moved && !ordered {
            if let Some(message) = cursor.state_message() {
                sink.emit(message).await?;
            }
        }

        stats.streams_synced = 1;
        stats.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            "Completed '{}': {} records from {} documents ({} skipped) in {}ms",
            spec.name,
            stats.records_synced,
            stats.documents_fetched,
            stats.tombstones_skipped,
            stats.duration_ms
        );

        Ok(stats)
    }
}

// ============================================================================
// Records and cursors
// ============================================================================

/// Normalize a document body and attach the synthetic fields
pub fn build_record(
    document: &RawDocument,
    fields: &BTreeMap<String, StoreValue>,
    extracted_at: DateTime<Utc>,
) -> JsonObject {
    let mut record = normalize_fields(fields);
    record.insert(
        ID_FIELD.to_string(),
        JsonValue::String(document.id().to_string()),
    );
    record.insert(
        EXTRACTED_AT_FIELD.to_string(),
        normalize(&StoreValue::Timestamp(extracted_at)),
    );
    record
}

/// In-memory cursor of one run. Only ever moves forward.
struct Cursor {
    stream: String,
    key: Option<String>,
    kind: ReplicationKeyType,
    value: Option<StoreValue>,
    moved: bool,
}

impl Cursor {
    fn new(spec: &CollectionSpec, start: Option<StoreValue>) -> Self {
        Self {
            stream: spec.name.clone(),
            key: spec.replication_key.clone(),
            kind: spec.replication_key_type,
            value: start,
            moved: false,
        }
    }

    /// Take a document's key value if it is greater than the current cursor
    fn advance(&mut self, fields: &BTreeMap<String, StoreValue>) -> bool {
        let Some(key) = &self.key else {
            return false;
        };
        let Some(candidate) = fields.get(key) else {
            return false;
        };
        if !matches_key_type(candidate, self.kind) {
            debug!(
                "Ignoring {} value of '{}' for a {} cursor",
                candidate.kind(),
                key,
                self.kind
            );
            return false;
        }

        let greater = self
            .value
            .as_ref()
            .map_or(true, |current| store_cmp(candidate, current) == Ordering::Greater);
        if greater {
            self.value = Some(candidate.clone());
            self.moved = true;
        }
        greater
    }

    fn state_message(&self) -> Option<Message> {
        let key = self.key.as_ref()?;
        let value = self.value.as_ref()?;
        Some(Message::state(&self.stream, key, format_cursor(value)))
    }
}

fn matches_key_type(value: &StoreValue, kind: ReplicationKeyType) -> bool {
    matches!(
        (value, kind),
        (StoreValue::Timestamp(_), ReplicationKeyType::Timestamp)
            | (StoreValue::String(_), ReplicationKeyType::String)
            | (StoreValue::Integer(_), ReplicationKeyType::Integer)
    )
}
