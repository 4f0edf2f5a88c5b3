//! State management module
//!
//! Handles cursor tracking and checkpointing between runs.
//!
//! # Overview
//!
//! The state module provides:
//! - [`CheckpointStore`] - read/write contract for a collection's last cursor
//! - [`StateManager`] - Singer-style bookmarks, in memory or file-backed
//! - [`parse_cursor`] / [`format_cursor`] - the string form of cursors

mod cursor;
mod manager;
mod types;

pub use cursor::{format_cursor, parse_cursor};
pub use manager::StateManager;
pub use types::{Bookmark, State};

use crate::error::Result;
use async_trait::async_trait;

/// Where the last cursor of each collection is kept between runs
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Stored cursor of a collection, if any
    async fn read(&self, collection: &str) -> Result<Option<String>>;

    /// Replace the stored cursor of a collection
    async fn write(&self, collection: &str, value: &str) -> Result<()>;
}
