//! Cursor string codec
//!
//! Checkpoints hold cursors as strings. Timestamps are written with an
//! explicit offset and read back whether they end in `Z` or an offset.

use crate::error::{Error, Result};
use crate::types::{JsonValue, ReplicationKeyType};
use crate::value::{normalize, StoreValue};
use chrono::{DateTime, Utc};

/// Parse a stored cursor back into a typed value
pub fn parse_cursor(raw: &str, kind: ReplicationKeyType) -> Result<StoreValue> {
    match kind {
        ReplicationKeyType::String => Ok(StoreValue::String(raw.to_string())),
        ReplicationKeyType::Integer => raw
            .trim()
            .parse::<i64>()
            .map(StoreValue::Integer)
            .map_err(|e| Error::Checkpoint {
                message: format!("invalid integer cursor '{raw}': {e}"),
            }),
        ReplicationKeyType::Timestamp => {
            let trimmed = raw.trim();
            let text = match trimmed.strip_suffix('Z') {
                Some(head) => format!("{head}+00:00"),
                None => trimmed.to_string(),
            };
            DateTime::parse_from_rfc3339(&text)
                .map(|ts| StoreValue::Timestamp(ts.with_timezone(&Utc)))
                .map_err(|e| Error::Checkpoint {
                    message: format!("invalid timestamp cursor '{raw}': {e}"),
                })
        }
    }
}

/// String form of a cursor value, as it appears in emitted records
pub fn format_cursor(value: &StoreValue) -> String {
    match normalize(value) {
        JsonValue::String(s) => s,
        other => other.to_string(),
    }
}
