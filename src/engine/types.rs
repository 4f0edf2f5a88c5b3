//! Engine types
//!
//! Message types emitted by the extractor, and the sink they go to.

use crate::error::Result;
use crate::schema::DeclaredSchema;
use crate::types::JsonObject;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A message emitted during sync
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Declared schema, emitted once before any record of the stream
    Schema {
        /// Stream name
        stream: String,
        /// The declared schema
        schema: DeclaredSchema,
    },
    /// One normalized record
    Record {
        /// Stream name
        stream: String,
        /// Flat record, synthetic fields included
        record: JsonObject,
        /// When the document was extracted
        time_extracted: DateTime<Utc>,
    },
    /// Cursor update
    State {
        /// Stream name
        stream: String,
        /// Replication key the cursor was taken from
        replication_key: String,
        /// Cursor in its stored string form
        value: String,
    },
}

impl Message {
    /// Create a schema message
    pub fn schema(stream: impl Into<String>, schema: DeclaredSchema) -> Self {
        Self::Schema {
            stream: stream.into(),
            schema,
        }
    }

    /// Create a record message
    pub fn record(
        stream: impl Into<String>,
        record: JsonObject,
        time_extracted: DateTime<Utc>,
    ) -> Self {
        Self::Record {
            stream: stream.into(),
            record,
            time_extracted,
        }
    }

    /// Create a state message
    pub fn state(
        stream: impl Into<String>,
        replication_key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::State {
            stream: stream.into(),
            replication_key: replication_key.into(),
            value: value.into(),
        }
    }

    /// Stream the message belongs to
    pub fn stream(&self) -> &str {
        match self {
            Self::Schema { stream, .. }
            | Self::Record { stream, .. }
            | Self::State { stream, .. } => stream,
        }
    }

    /// Check if this is a schema message
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema { .. })
    }

    /// Check if this is a record message
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record { .. })
    }

    /// Check if this is a state message
    pub fn is_state(&self) -> bool {
        matches!(self, Self::State { .. })
    }
}

/// Receives messages as the extractor produces them
#[async_trait]
pub trait RecordSink: Send {
    /// Handle one message
    async fn emit(&mut self, message: Message) -> Result<()>;
}

/// Collects messages in memory
#[async_trait]
impl RecordSink for Vec<Message> {
    async fn emit(&mut self, message: Message) -> Result<()> {
        self.push(message);
        Ok(())
    }
}

/// Statistics from a sync operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Documents returned by the store
    pub documents_fetched: usize,
    /// Records emitted
    pub records_synced: usize,
    /// Documents skipped for having no body
    pub tombstones_skipped: usize,
    /// Streams completed
    pub streams_synced: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl SyncStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold another run's stats into this one
    pub fn merge(&mut self, other: &SyncStats) {
        self.documents_fetched += other.documents_fetched;
        self.records_synced += other.records_synced;
        self.tombstones_skipped += other.tombstones_skipped;
        self.streams_synced += other.streams_synced;
        self.duration_ms += other.duration_ms;
    }
}
