//! Lazy document stream over a paginator

use super::types::{PaginationState, Paginator};
use crate::error::Result;
use crate::store::DocumentStore;
use crate::value::RawDocument;
use futures::stream::{self, Stream};
use std::collections::VecDeque;
use std::pin::Pin;
use tracing::debug;

/// Documents in query order, fetched one batch at a time
pub type DocumentStream<'a> = Pin<Box<dyn Stream<Item = Result<RawDocument>> + Send + 'a>>;

struct Walk<'a> {
    store: &'a dyn DocumentStore,
    paginator: Box<dyn Paginator>,
    state: PaginationState,
    buffer: VecDeque<RawDocument>,
}

/// Walk a collection with the given paginator.
///
/// At most one batch is held in memory. The next query is only issued once
/// the buffered batch has been consumed; dropping the stream stops the walk.
pub fn extract<'a>(
    store: &'a dyn DocumentStore,
    paginator: Box<dyn Paginator>,
) -> DocumentStream<'a> {
    let walk = Walk {
        store,
        paginator,
        state: PaginationState::new(),
        buffer: VecDeque::new(),
    };

    Box::pin(stream::try_unfold(walk, next_document))
}

async fn next_document<'a>(mut walk: Walk<'a>) -> Result<Option<(RawDocument, Walk<'a>)>> {
    loop {
        if let Some(document) = walk.buffer.pop_front() {
            return Ok(Some((document, walk)));
        }

        let Some(query) = walk.paginator.next_query(&walk.state) else {
            debug!(
                "{} pagination finished after {} queries, {} documents",
                walk.paginator.name(),
                walk.state.batches,
                walk.state.total_fetched
            );
            return Ok(None);
        };

        let requested = query.limit.unwrap_or(usize::MAX);
        debug!(
            "Query {} on '{}' (limit {})",
            walk.state.batches + 1,
            query.collection,
            requested
        );
        let batch = walk.store.run_query(&query).await?;
        let next = walk
            .paginator
            .process_batch(&batch, requested, &mut walk.state)?;
        if next.is_done() {
            debug!("Final batch of {} documents", batch.len());
        }
        walk.buffer.extend(batch);
    }
}
