//! In-process document store

use super::types::{FieldFilter, FilterOp, Query};
use super::DocumentStore;
use crate::error::Result;
use crate::types::DOCUMENT_ID_PATH;
use crate::value::{same_kind, store_cmp, RawDocument, StoreValue};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Documents held in memory, keyed by collection path.
///
/// Evaluates queries the way the REST backend does: filtered documents
/// missing an ordered field are excluded, results are ordered by the
/// requested fields then by document identity.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    collections: Arc<RwLock<BTreeMap<String, Vec<RawDocument>>>>,
    issued: Arc<Mutex<Vec<Query>>>,
    query_count: Arc<AtomicUsize>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-loaded with one collection
    pub fn with_documents(collection: &str, documents: Vec<RawDocument>) -> Self {
        let mut collections = BTreeMap::new();
        collections.insert(collection.to_string(), documents);
        Self {
            collections: Arc::new(RwLock::new(collections)),
            ..Self::default()
        }
    }

    /// Add a document, replacing any document at the same path
    pub async fn insert(&self, collection: &str, document: RawDocument) {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        docs.retain(|d| d.reference != document.reference);
        docs.push(document);
    }

    /// Remove a document by path
    pub async fn remove(&self, collection: &str, path: &str) {
        let mut collections = self.collections.write().await;
        if let Some(docs) = collections.get_mut(collection) {
            docs.retain(|d| d.path() != path);
        }
    }

    /// Number of queries run so far
    pub fn query_count(&self) -> usize {
        self.query_count.load(AtomicOrdering::SeqCst)
    }

    /// Every query run so far, in order
    pub async fn issued_queries(&self) -> Vec<Query> {
        self.issued.lock().await.clone()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn run_query(&self, query: &Query) -> Result<Vec<RawDocument>> {
        self.query_count.fetch_add(1, AtomicOrdering::SeqCst);
        self.issued.lock().await.push(query.clone());

        let collections = self.collections.read().await;
        let Some(docs) = collections.get(&query.collection) else {
            return Ok(Vec::new());
        };

        let order_fields = effective_order(&query.order_by);
        let mut matched: Vec<(Vec<StoreValue>, &RawDocument)> = docs
            .iter()
            .filter(|doc| query.filters.iter().all(|f| matches_filter(doc, f)))
            .filter_map(|doc| order_key(doc, &order_fields).map(|key| (key, doc)))
            .collect();

        matched.sort_by(|(a, _), (b, _)| cmp_keys(a, b));

        if let Some(cursor) = &query.start_after {
            matched.retain(|(key, _)| {
                let prefix = &key[..cursor.len().min(key.len())];
                cmp_keys(prefix, cursor) == Ordering::Greater
            });
        }

        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(matched
            .into_iter()
            .take(limit)
            .map(|(_, doc)| doc.clone())
            .collect())
    }
}

/// Requested ordering plus the implicit identity tiebreak
fn effective_order(order_by: &[String]) -> Vec<String> {
    let mut fields = order_by.to_vec();
    if fields.last().map(String::as_str) != Some(DOCUMENT_ID_PATH) {
        fields.push(DOCUMENT_ID_PATH.to_string());
    }
    fields
}

fn field_value(doc: &RawDocument, field: &str) -> Option<StoreValue> {
    if field == DOCUMENT_ID_PATH {
        return Some(StoreValue::Reference(doc.reference.clone()));
    }
    doc.get(field).cloned()
}

fn matches_filter(doc: &RawDocument, filter: &FieldFilter) -> bool {
    let Some(value) = field_value(doc, &filter.field) else {
        return false;
    };
    match filter.op {
        FilterOp::GreaterThan => {
            same_kind(&value, &filter.value)
                && store_cmp(&value, &filter.value) == Ordering::Greater
        }
    }
}

fn order_key(doc: &RawDocument, fields: &[String]) -> Option<Vec<StoreValue>> {
    fields.iter().map(|f| field_value(doc, f)).collect()
}

fn cmp_keys(a: &[StoreValue], b: &[StoreValue]) -> Ordering {
    for (left, right) in a.iter().zip(b) {
        let ord = store_cmp(left, right);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}
