//! Singer-style message output

use super::commands::OutputFormat;
use crate::engine::{Message, RecordSink};
use crate::error::{Result, ResultExt};
use crate::schema::DeclaredSchema;
use crate::state::StateManager;
use crate::types::JsonValue;
use async_trait::async_trait;
use serde_json::json;
use std::io::Write;

/// Writes `SCHEMA` / `RECORD` / `STATE` lines and keeps the state file
/// current as state messages pass through.
pub struct SingerSink<W> {
    writer: W,
    state: StateManager,
    format: OutputFormat,
}

impl<W: Write + Send> SingerSink<W> {
    /// Create a sink writing to `writer`
    pub fn new(writer: W, state: StateManager, format: OutputFormat) -> Self {
        Self {
            writer,
            state,
            format,
        }
    }

    /// Consume the sink, returning the writer
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_line(&mut self, message: &JsonValue) -> Result<()> {
        let line = match self.format {
            OutputFormat::Json => serde_json::to_string(message)?,
            OutputFormat::Pretty => serde_json::to_string_pretty(message)?,
        };
        writeln!(self.writer, "{line}").context("writing message to output")
    }
}

#[async_trait]
impl<W: Write + Send> RecordSink for SingerSink<W> {
    async fn emit(&mut self, message: Message) -> Result<()> {
        let line = match message {
            Message::Schema { stream, schema } => schema_message(&stream, &schema),
            Message::Record {
                stream,
                record,
                time_extracted,
            } => json!({
                "type": "RECORD",
                "stream": stream,
                "record": record,
                "time_extracted": time_extracted.to_rfc3339(),
            }),
            Message::State {
                stream,
                replication_key,
                value,
            } => {
                self.state
                    .set_bookmark(&stream, &replication_key, value)
                    .await?;
                let snapshot = self.state.snapshot().await;
                json!({
                    "type": "STATE",
                    "value": snapshot,
                })
            }
        };
        self.write_line(&line)
    }
}

/// `SCHEMA` message of a collection
pub fn schema_message(stream: &str, schema: &DeclaredSchema) -> JsonValue {
    let bookmarks: Vec<&str> = schema.replication_key.iter().map(String::as_str).collect();
    json!({
        "type": "SCHEMA",
        "stream": stream,
        "schema": schema.to_json_schema().to_json(),
        "key_properties": schema.key_properties,
        "bookmark_properties": bookmarks,
    })
}

/// Catalog entry of a collection
pub fn catalog_entry(schema: &DeclaredSchema) -> JsonValue {
    let method = if schema.replication_key.is_some() {
        "INCREMENTAL"
    } else {
        "FULL_TABLE"
    };
    json!({
        "tap_stream_id": schema.stream,
        "stream": schema.stream,
        "schema": schema.to_json_schema().to_json(),
        "key_properties": schema.key_properties,
        "replication_key": schema.replication_key,
        "replication_method": method,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn lines(bytes: &[u8]) -> Vec<JsonValue> {
        String::from_utf8_lossy(bytes)
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_emits_singer_lines() {
        let mut schema = DeclaredSchema::new("users");
        schema.replication_key = Some("updated_at".to_string());
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut record = crate::types::JsonObject::new();
        record.insert("_id".to_string(), json!("u1"));

        let state = StateManager::in_memory();
        let mut sink = SingerSink::new(Vec::<u8>::new(), state, OutputFormat::Json);
        sink.emit(Message::schema("users", schema)).await.unwrap();
        sink.emit(Message::record("users", record, ts)).await.unwrap();
        sink.emit(Message::state("users", "updated_at", "30"))
            .await
            .unwrap();

        let out = lines(&sink.into_inner());
        assert_eq!(out.len(), 3);
        assert_eq!(out[0]["type"], "SCHEMA");
        assert_eq!(out[0]["key_properties"], json!(["_id"]));
        assert_eq!(out[0]["bookmark_properties"], json!(["updated_at"]));
        assert_eq!(
            out[1],
            json!({
                "type": "RECORD",
                "stream": "users",
                "record": {"_id": "u1"},
                "time_extracted": "2024-01-01T00:00:00+00:00"
            })
        );
        assert_eq!(
            out[2],
            json!({
                "type": "STATE",
                "value": {"bookmarks": {"users": {
                    "replication_key": "updated_at",
                    "replication_key_value": "30"
                }}}
            })
        );
    }

    #[tokio::test]
    async fn test_state_messages_reach_the_state_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let state = StateManager::from_file(&path).unwrap();

        let mut sink = SingerSink::new(Vec::<u8>::new(), state, OutputFormat::Json);
        sink.emit(Message::state("events", "seq", "7")).await.unwrap();

        let reloaded = StateManager::from_file(&path).unwrap();
        assert_eq!(reloaded.get_cursor("events").await.as_deref(), Some("7"));
    }

    #[test]
    fn test_catalog_entry() {
        let entry = catalog_entry(&DeclaredSchema::new("users"));
        assert_eq!(entry["replication_method"], "FULL_TABLE");
        assert_eq!(entry["replication_key"], JsonValue::Null);
        assert_eq!(entry["schema"]["additionalProperties"], true);
    }
}
