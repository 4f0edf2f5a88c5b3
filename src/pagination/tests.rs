//! Pagination tests

use super::*;
use crate::config::CollectionSpec;
use crate::store::{DocumentStore, MemoryStore, Query};
use crate::types::{PaginationStrategy, ReplicationKeyType};
use crate::value::{RawDocument, StoreValue};
use futures::{StreamExt, TryStreamExt};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;

fn numbered(collection: &str, count: usize) -> MemoryStore {
    let docs = (0..count)
        .map(|i| {
            let fields = BTreeMap::from([(
                "n".to_string(),
                StoreValue::Integer(i64::try_from(i).unwrap()),
            )]);
            RawDocument::new(format!("{collection}/doc-{i:03}"), fields)
        })
        .collect();
    MemoryStore::with_documents(collection, docs)
}

fn keyed(collection: &str, entries: &[(&str, i64)]) -> MemoryStore {
    let docs = entries
        .iter()
        .map(|(id, n)| {
            let fields = BTreeMap::from([("updated_at".to_string(), StoreValue::Integer(*n))]);
            RawDocument::new(format!("{collection}/{id}"), fields)
        })
        .collect();
    MemoryStore::with_documents(collection, docs)
}

async fn collect_ids(store: &MemoryStore, paginator: Box<dyn Paginator>) -> Vec<String> {
    extract(store, paginator)
        .map_ok(|doc| doc.id().to_string())
        .try_collect()
        .await
        .unwrap()
}

// ============================================================================
// State Tests
// ============================================================================

#[test]
fn test_pagination_state_remaining() {
    let mut state = PaginationState::new();
    assert_eq!(state.remaining(None), None);
    assert_eq!(state.remaining(Some(3)), Some(3));

    state.add_batch(&[RawDocument::tombstone("c/a"), RawDocument::tombstone("c/b")]);
    assert_eq!(state.total_fetched, 2);
    assert_eq!(state.batches, 1);
    assert_eq!(state.remaining(Some(3)), Some(1));
    assert_eq!(state.remaining(Some(1)), Some(0));
    assert_eq!(state.last_document.as_ref().unwrap().path, "c/b");
}

#[test]
fn test_done_paginator_issues_no_query() {
    let paginator = FilteredPaginator::new("users", 10);
    let mut state = PaginationState::new();
    assert!(paginator.next_query(&state).is_some());
    state.mark_done();
    assert!(paginator.next_query(&state).is_none());
}

// ============================================================================
// Filtered Pagination Tests
// ============================================================================

#[tokio::test]
async fn test_full_scan_terminates_on_short_batch() {
    let store = numbered("items", 5);
    let ids = collect_ids(&store, Box::new(FilteredPaginator::new("items", 2))).await;

    assert_eq!(ids.len(), 5);
    // ceil(5 / 2) batches
    assert_eq!(store.query_count(), 3);

    let queries = store.issued_queries().await;
    assert_eq!(queries[0].start_after, None);
    assert_eq!(
        queries[1].start_after,
        Some(vec![StoreValue::reference("items/doc-001")])
    );
    assert!(queries.iter().all(|q| q.limit == Some(2)));
}

#[tokio::test]
async fn test_exact_multiple_needs_empty_batch() {
    let store = numbered("items", 4);
    let ids = collect_ids(&store, Box::new(FilteredPaginator::new("items", 2))).await;
    assert_eq!(ids.len(), 4);
    assert_eq!(store.query_count(), 3);
}

#[tokio::test]
async fn test_limit_stops_issuing_queries() {
    let store = numbered("items", 10);
    let paginator = FilteredPaginator::new("items", 2).with_limit(Some(3));
    let ids = collect_ids(&store, Box::new(paginator)).await;

    assert_eq!(ids, vec!["doc-000", "doc-001", "doc-002"]);
    assert_eq!(store.query_count(), 2);
    let limits: Vec<_> = store
        .issued_queries()
        .await
        .iter()
        .map(|q| q.limit)
        .collect();
    assert_eq!(limits, vec![Some(2), Some(1)]);
}

#[tokio::test]
async fn test_filtered_resumption_is_strictly_greater() {
    let store = keyed("events", &[("a", 30), ("b", 10), ("c", 20), ("d", 40)]);
    let paginator =
        FilteredPaginator::new("events", 10).resume_after("updated_at", StoreValue::Integer(20));
    let ids = collect_ids(&store, Box::new(paginator)).await;

    // identity order, not key order
    assert_eq!(ids, vec!["a", "d"]);
}

#[tokio::test]
async fn test_stream_is_lazy() {
    let store = numbered("items", 10);
    let mut stream = extract(&store, Box::new(FilteredPaginator::new("items", 3)));

    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.id(), "doc-000");
    assert_eq!(store.query_count(), 1);

    drop(stream);
    assert_eq!(store.query_count(), 1);
}

#[tokio::test]
async fn test_insert_after_last_seen_identity_is_picked_up() {
    let store = numbered("items", 4);
    let mut stream = extract(&store, Box::new(FilteredPaginator::new("items", 2)));

    let mut seen = Vec::new();
    for _ in 0..2 {
        seen.push(stream.next().await.unwrap().unwrap().id().to_string());
    }
    // Inserted behind the cursor: never seen. Ahead of it: seen once.
    for (path, n) in [("items/doc-000a", 0), ("items/doc-009", 9)] {
        let fields = BTreeMap::from([("n".to_string(), StoreValue::Integer(n))]);
        store.insert("items", RawDocument::new(path, fields)).await;
    }
    while let Some(doc) = stream.next().await {
        seen.push(doc.unwrap().id().to_string());
    }

    assert_eq!(seen, vec!["doc-000", "doc-001", "doc-002", "doc-003", "doc-009"]);
}

// ============================================================================
// Ordered Pagination Tests
// ============================================================================

#[tokio::test]
async fn test_ordered_sweep_is_strictly_increasing() {
    let store = keyed(
        "events",
        &[("a", 30), ("b", 10), ("c", 20), ("d", 20), ("e", 50), ("f", 40)],
    );
    let paginator = OrderedPaginator::new("events", "updated_at", 2)
        .starting_after(Some(StoreValue::Integer(10)));
    let ids = collect_ids(&store, Box::new(paginator)).await;

    assert_eq!(ids, vec!["c", "d", "a", "f", "e"]);

    let queries = store.issued_queries().await;
    assert_eq!(queries[0].start_after, Some(vec![StoreValue::Integer(10)]));
    assert_eq!(
        queries[1].start_after,
        Some(vec![StoreValue::Integer(20), StoreValue::reference("events/d")])
    );
    assert_eq!(queries[0].order_by, vec!["updated_at", "__name__"]);
}

#[tokio::test]
async fn test_ordered_limit_caps_whole_sweep() {
    let store = keyed("events", &[("a", 1), ("b", 2), ("c", 3), ("d", 4), ("e", 5)]);
    let paginator = OrderedPaginator::new("events", "updated_at", 2).with_limit(Some(3));
    let ids = collect_ids(&store, Box::new(paginator)).await;

    assert_eq!(ids, vec!["a", "b", "c"]);
    assert_eq!(store.query_count(), 2);
}

#[test]
fn test_ordered_batch_without_key_is_an_error() {
    let paginator = OrderedPaginator::new("events", "updated_at", 2);
    let mut state = PaginationState::new();
    let batch = vec![RawDocument::tombstone("events/x")];
    assert!(paginator.process_batch(&batch, 2, &mut state).is_err());
}

// ============================================================================
// Construction Tests
// ============================================================================

#[test]
fn test_build_paginator_picks_strategy() {
    let full = CollectionSpec::new("users").with_batch_size(7);
    let query = build_paginator(&full, None)
        .next_query(&PaginationState::new())
        .unwrap();
    assert_eq!(query, Query::new("users").order_by_id().limit(7));

    let filtered = CollectionSpec::new("users")
        .with_replication_key("updated_at", ReplicationKeyType::Integer);
    let paginator = build_paginator(&filtered, Some(StoreValue::Integer(5)));
    assert_eq!(paginator.name(), "filtered");
    let query = paginator.next_query(&PaginationState::new()).unwrap();
    assert_eq!(query.filters.len(), 1);
    assert_eq!(query.filters[0].value, StoreValue::Integer(5));

    let ordered = filtered.with_pagination(PaginationStrategy::Ordered);
    assert_eq!(build_paginator(&ordered, None).name(), "ordered");
}

#[tokio::test]
async fn test_store_error_propagates() {
    struct Unreachable;

    #[async_trait::async_trait]
    impl DocumentStore for Unreachable {
        async fn run_query(&self, _query: &Query) -> crate::error::Result<Vec<RawDocument>> {
            Err(crate::error::Error::query("store unreachable"))
        }
    }

    let store = Unreachable;
    let result: crate::error::Result<Vec<RawDocument>> =
        extract(&store, Box::new(FilteredPaginator::new("users", 2)))
            .try_collect()
            .await;
    assert!(result.is_err());
}
