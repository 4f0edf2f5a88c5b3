//! Document store access
//!
//! [`DocumentStore`] is the seam between the extraction engine and the
//! actual database. Two implementations ship with the crate:
//!
//! - [`FirestoreStore`] - the Firestore REST API (`runQuery`)
//! - [`MemoryStore`] - an in-process store evaluating the same query model
//!
//! Queries are never retried here; failures propagate to the caller.

mod codec;
mod firestore;
mod memory;
mod types;

pub use codec::{decode_document, decode_value, encode_value};
pub use firestore::FirestoreStore;
pub use memory::MemoryStore;
pub use types::{FieldFilter, FilterOp, Query};

use crate::error::Result;
use crate::value::RawDocument;
use async_trait::async_trait;

/// A queryable collection store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Run one bounded query and return its documents in result order
    async fn run_query(&self, query: &Query) -> Result<Vec<RawDocument>>;

    /// Fetch up to `size` documents in whatever order the store prefers
    async fn sample(&self, collection: &str, size: usize) -> Result<Vec<RawDocument>> {
        self.run_query(&Query::new(collection).limit(size)).await
    }
}
