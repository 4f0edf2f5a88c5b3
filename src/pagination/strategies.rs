//! Pagination strategy implementations
//!
//! Index requirements differ:
//!
//! - [`FilteredPaginator`] filters on the replication key and pages by
//!   document identity. It needs no composite index, but records only come
//!   out in identity order, so the cursor is only known at the end.
//! - [`OrderedPaginator`] orders by the replication key and pages by a
//!   `(key, identity)` cursor. It may need an index on the key and yields one
//!   strictly increasing sweep.

use super::types::{batch_ends_walk, NextPage, PaginationState, Paginator};
use crate::config::CollectionSpec;
use crate::error::{Error, Result};
use crate::store::{FieldFilter, Query};
use crate::value::{RawDocument, StoreValue};

// ============================================================================
// Filtered Pagination
// ============================================================================

/// `where key > start`, ordered and paged by document identity.
///
/// Without a start value this is a plain full scan.
#[derive(Debug, Clone)]
pub struct FilteredPaginator {
    /// Collection path
    pub collection: String,
    /// Documents per query
    pub batch_size: usize,
    /// Cap on documents per run
    pub limit: Option<usize>,
    /// Resumption filter
    pub filter: Option<FieldFilter>,
}

impl FilteredPaginator {
    /// Full scan of a collection
    pub fn new(collection: impl Into<String>, batch_size: usize) -> Self {
        Self {
            collection: collection.into(),
            batch_size,
            limit: None,
            filter: None,
        }
    }

    /// Only visit documents whose `key` is greater than `start`
    #[must_use]
    pub fn resume_after(mut self, key: impl Into<String>, start: StoreValue) -> Self {
        self.filter = Some(FieldFilter::greater_than(key, start));
        self
    }

    /// Cap the documents per run
    #[must_use]
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }
}

impl Paginator for FilteredPaginator {
    fn next_query(&self, state: &PaginationState) -> Option<Query> {
        if state.done {
            return None;
        }
        let size = batch_limit(self.batch_size, state.remaining(self.limit))?;

        let mut query = Query::new(&self.collection);
        if let Some(filter) = &self.filter {
            query = query.filter(filter.clone());
        }
        query = query.order_by_id().limit(size);
        if let Some(last) = &state.last_document {
            query = query.start_after(vec![StoreValue::Reference(last.clone())]);
        }
        Some(query)
    }

    fn process_batch(
        &self,
        batch: &[RawDocument],
        requested: usize,
        state: &mut PaginationState,
    ) -> Result<NextPage> {
        state.add_batch(batch);

        if batch_ends_walk(batch, requested, self.limit, state) {
            state.mark_done();
            return Ok(NextPage::Done);
        }
        Ok(NextPage::Continue)
    }

    fn name(&self) -> &'static str {
        "filtered"
    }
}

// ============================================================================
// Ordered Pagination
// ============================================================================

/// `order by key, identity`, resumed with a value cursor
#[derive(Debug, Clone)]
pub struct OrderedPaginator {
    /// Collection path
    pub collection: String,
    /// Replication key to order by
    pub replication_key: String,
    /// Documents per query
    pub batch_size: usize,
    /// Cap on documents for the whole sweep
    pub limit: Option<usize>,
    /// Value to start after on the first query
    pub start: Option<StoreValue>,
}

impl OrderedPaginator {
    /// Sweep a collection in replication-key order
    pub fn new(
        collection: impl Into<String>,
        replication_key: impl Into<String>,
        batch_size: usize,
    ) -> Self {
        Self {
            collection: collection.into(),
            replication_key: replication_key.into(),
            batch_size,
            limit: None,
            start: None,
        }
    }

    /// Start after a stored cursor value
    #[must_use]
    pub fn starting_after(mut self, start: Option<StoreValue>) -> Self {
        self.start = start;
        self
    }

    /// Cap the documents for the whole sweep
    #[must_use]
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }
}

impl Paginator for OrderedPaginator {
    fn next_query(&self, state: &PaginationState) -> Option<Query> {
        if state.done {
            return None;
        }
        let size = batch_limit(self.batch_size, state.remaining(self.limit))?;

        let mut query = Query::new(&self.collection)
            .order_by(&self.replication_key)
            .order_by_id()
            .limit(size);

        // Ties on the key are broken by identity, so a full cursor never
        // skips or repeats documents sharing a key value.
        match (&state.last_value, &state.last_document) {
            (Some(value), Some(last)) => {
                let cursor = vec![value.clone(), StoreValue::Reference(last.clone())];
                query = query.start_after(cursor);
            }
            _ => {
                if let Some(start) = &self.start {
                    query = query.start_after(vec![start.clone()]);
                }
            }
        }
        Some(query)
    }

    fn process_batch(
        &self,
        batch: &[RawDocument],
        requested: usize,
        state: &mut PaginationState,
    ) -> Result<NextPage> {
        state.add_batch(batch);

        if let Some(last) = batch.last() {
            let value = last.get(&self.replication_key).ok_or_else(|| {
                Error::query(format!(
                    "ordered query returned '{}' without '{}'",
                    last.path(),
                    self.replication_key
                ))
            })?;
            state.last_value = Some(value.clone());
        }

        if batch_ends_walk(batch, requested, self.limit, state) {
            state.mark_done();
            return Ok(NextPage::Done);
        }
        Ok(NextPage::Continue)
    }

    fn name(&self) -> &'static str {
        "ordered"
    }
}

// ============================================================================
// Construction
// ============================================================================

/// Pick the paginator for a collection.
///
/// Collections without a replication key are always full scans.
pub fn build_paginator(spec: &CollectionSpec, start: Option<StoreValue>) -> Box<dyn Paginator> {
    match &spec.replication_key {
        Some(key) if spec.pagination.is_ordered() => Box::new(
            OrderedPaginator::new(&spec.name, key, spec.batch_size)
                .starting_after(start)
                .with_limit(spec.limit),
        ),
        Some(key) => {
            let mut paginator =
                FilteredPaginator::new(&spec.name, spec.batch_size).with_limit(spec.limit);
            if let Some(start) = start {
                paginator = paginator.resume_after(key, start);
            }
            Box::new(paginator)
        }
        None => Box::new(
            FilteredPaginator::new(&spec.name, spec.batch_size).with_limit(spec.limit),
        ),
    }
}

/// `min(batch_size, remaining)`, or `None` once the quota is spent
fn batch_limit(batch_size: usize, remaining: Option<usize>) -> Option<usize> {
    match remaining {
        Some(0) => None,
        Some(remaining) => Some(batch_size.min(remaining)),
        None => Some(batch_size),
    }
}
