//! Common types used throughout firestore-tap
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// Well-known field names
// ============================================================================

/// Synthetic field holding the document identity
pub const ID_FIELD: &str = "_id";

/// Synthetic field holding the extraction timestamp
pub const EXTRACTED_AT_FIELD: &str = "_sdc_extracted_at";

/// Pseudo field path the store uses for document identity ordering
pub const DOCUMENT_ID_PATH: &str = "__name__";

// ============================================================================
// Sync Mode
// ============================================================================

/// Synchronization mode for a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Full refresh - scan the whole collection every time
    #[default]
    FullRefresh,
    /// Incremental - only fetch documents past the stored cursor
    Incremental,
}

impl std::fmt::Display for SyncMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncMode::FullRefresh => write!(f, "full_refresh"),
            SyncMode::Incremental => write!(f, "incremental"),
        }
    }
}

// ============================================================================
// Replication Key Type
// ============================================================================

/// How a stored cursor string is turned back into a query value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplicationKeyType {
    /// ISO 8601 timestamp
    #[default]
    Timestamp,
    /// Plain string, compared lexicographically
    String,
    /// 64-bit integer
    Integer,
}

impl std::fmt::Display for ReplicationKeyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplicationKeyType::Timestamp => write!(f, "timestamp"),
            ReplicationKeyType::String => write!(f, "string"),
            ReplicationKeyType::Integer => write!(f, "integer"),
        }
    }
}

// ============================================================================
// Pagination Strategy
// ============================================================================

/// How incremental runs walk a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationStrategy {
    /// `where key > cursor`, paged by document identity.
    /// Needs no composite index; ordered by key only within a batch.
    #[default]
    Filtered,
    /// `order by key`, paged by a value cursor.
    /// May need an index on the key; yields one strictly ordered sweep.
    Ordered,
}

impl PaginationStrategy {
    /// Whether records come out in replication-key order across the whole run
    pub fn is_ordered(self) -> bool {
        matches!(self, Self::Ordered)
    }
}

// ============================================================================
// Utilities
// ============================================================================

/// Extension trait for Option<String> to handle empty strings
pub trait OptionStringExt {
    /// Returns None if the string is empty
    fn none_if_empty(self) -> Option<String>;
}

impl OptionStringExt for Option<String> {
    fn none_if_empty(self) -> Option<String> {
        self.filter(|s| !s.is_empty())
    }
}

impl OptionStringExt for String {
    fn none_if_empty(self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}
