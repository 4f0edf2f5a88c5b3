//! State types for tracking sync progress
//!
//! Serialized as Singer-style bookmarks and persisted between runs.

use crate::types::JsonValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Complete state for a tap
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Per-collection bookmarks
    #[serde(default)]
    pub bookmarks: BTreeMap<String, Bookmark>,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the bookmark of a collection
    pub fn bookmark(&self, stream: &str) -> Option<&Bookmark> {
        self.bookmarks.get(stream)
    }

    /// Stored cursor of a collection, in string form
    pub fn get_cursor(&self, stream: &str) -> Option<String> {
        self.bookmarks.get(stream)?.cursor_string()
    }

    /// Set the cursor of a collection, keeping its replication key
    pub fn set_cursor(&mut self, stream: &str, cursor: String) {
        self.bookmarks
            .entry(stream.to_string())
            .or_default()
            .replication_key_value = Some(JsonValue::String(cursor));
    }

    /// Replace the bookmark of a collection
    pub fn set_bookmark(&mut self, stream: &str, replication_key: &str, cursor: String) {
        self.bookmarks.insert(
            stream.to_string(),
            Bookmark {
                replication_key: Some(replication_key.to_string()),
                replication_key_value: Some(JsonValue::String(cursor)),
            },
        );
    }
}

/// Progress of one collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    /// Field the cursor was taken from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_key: Option<String>,

    /// Last emitted replication-key value.
    ///
    /// Written as a string; numbers left by other tools are accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_key_value: Option<JsonValue>,
}

impl Bookmark {
    /// Cursor value in string form, if usable
    pub fn cursor_string(&self) -> Option<String> {
        match self.replication_key_value.as_ref()? {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}
