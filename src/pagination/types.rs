//! Pagination types and traits
//!
//! Defines the core pagination abstractions used by both strategies.

use crate::error::Result;
use crate::store::Query;
use crate::value::{DocumentRef, RawDocument, StoreValue};

/// Result of processing one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextPage {
    /// Another query may return more documents
    Continue,
    /// No more queries should be issued
    Done,
}

impl NextPage {
    /// Check if this is a done result
    pub fn is_done(self) -> bool {
        matches!(self, Self::Done)
    }
}

/// Tracks pagination progress across batches
#[derive(Debug, Clone, Default)]
pub struct PaginationState {
    /// Identity of the last document fetched (tombstones included)
    pub last_document: Option<DocumentRef>,
    /// Replication-key value of the last document fetched
    pub last_value: Option<StoreValue>,
    /// Documents fetched so far
    pub total_fetched: usize,
    /// Queries issued so far
    pub batches: usize,
    /// Is pagination complete?
    pub done: bool,
}

impl PaginationState {
    /// Create a new pagination state
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark pagination as complete
    pub fn mark_done(&mut self) {
        self.done = true;
    }

    /// Documents still allowed under an optional cap
    pub fn remaining(&self, limit: Option<usize>) -> Option<usize> {
        limit.map(|l| l.saturating_sub(self.total_fetched))
    }

    /// Record a fetched batch
    pub fn add_batch(&mut self, batch: &[RawDocument]) {
        self.batches += 1;
        self.total_fetched += batch.len();
        if let Some(last) = batch.last() {
            self.last_document = Some(last.reference.clone());
        }
    }
}

/// Core trait for pagination strategies
pub trait Paginator: Send + Sync {
    /// The next query to issue, or `None` when pagination is complete
    fn next_query(&self, state: &PaginationState) -> Option<Query>;

    /// Fold a batch into the state and decide whether to continue.
    ///
    /// `requested` is the limit the batch's query asked for.
    fn process_batch(
        &self,
        batch: &[RawDocument],
        requested: usize,
        state: &mut PaginationState,
    ) -> Result<NextPage>;

    /// Short name, for logs
    fn name(&self) -> &'static str;
}

/// Decide whether a batch ends pagination
pub fn batch_ends_walk(
    batch: &[RawDocument],
    requested: usize,
    limit: Option<usize>,
    state: &PaginationState,
) -> bool {
    batch.is_empty() || batch.len() < requested || state.remaining(limit) == Some(0)
}
