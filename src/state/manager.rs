//! State manager implementation
//!
//! Provides file-based state persistence with atomic writes.

use super::types::State;
use super::CheckpointStore;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Holds the bookmarks of a run, optionally backed by a file
#[derive(Debug, Clone)]
pub struct StateManager {
    /// Path to the state file; empty in memory-only mode
    path: PathBuf,
    /// Current state (cached)
    state: Arc<RwLock<State>>,
    /// Whether to save on every update
    auto_save: bool,
}

impl StateManager {
    /// Create a file-backed manager starting from empty state
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            state: Arc::new(RwLock::new(State::new())),
            auto_save: true,
        }
    }

    /// Create an in-memory state manager (no file persistence)
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::new(),
            state: Arc::new(RwLock::new(State::new())),
            auto_save: false,
        }
    }

    /// Load a state file if it exists, otherwise start empty
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|e| Error::State {
                message: format!("Failed to read state file: {e}"),
            })?;
            parse_state(&contents)?
        } else {
            State::new()
        };

        Ok(Self {
            path,
            state: Arc::new(RwLock::new(state)),
            auto_save: true,
        })
    }

    /// In-memory manager seeded from a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self {
            path: PathBuf::new(),
            state: Arc::new(RwLock::new(parse_state(json)?)),
            auto_save: false,
        })
    }

    /// Save current state to file
    pub async fn save(&self) -> Result<()> {
        if self.is_in_memory() {
            return Ok(());
        }

        let contents = self.to_json_pretty().await?;

        // Write to temp file first, then rename for atomicity
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| Error::State {
                message: format!("Failed to write state file: {e}"),
            })?;

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| Error::State {
                message: format!("Failed to rename state file: {e}"),
            })?;

        debug!("State saved to {}", self.path.display());
        Ok(())
    }

    /// Snapshot of the current state
    pub async fn snapshot(&self) -> State {
        self.state.read().await.clone()
    }

    /// Export state as JSON string
    pub async fn to_json(&self) -> Result<String> {
        let state = self.state.read().await;
        serde_json::to_string(&*state).map_err(|e| Error::State {
            message: format!("Failed to serialize state: {e}"),
        })
    }

    /// Export state as pretty-printed JSON string
    pub async fn to_json_pretty(&self) -> Result<String> {
        let state = self.state.read().await;
        serde_json::to_string_pretty(&*state).map_err(|e| Error::State {
            message: format!("Failed to serialize state: {e}"),
        })
    }

    /// Get cursor for a collection
    pub async fn get_cursor(&self, stream: &str) -> Option<String> {
        self.state.read().await.get_cursor(stream)
    }

    /// Record a collection's replication key and cursor
    pub async fn set_bookmark(
        &self,
        stream: &str,
        replication_key: &str,
        cursor: String,
    ) -> Result<()> {
        self.state
            .write()
            .await
            .set_bookmark(stream, replication_key, cursor);

        if self.auto_save {
            self.save().await?;
        }
        Ok(())
    }

    /// Clear state for a specific collection
    pub async fn clear_stream(&self, stream: &str) -> Result<()> {
        self.state.write().await.bookmarks.remove(stream);

        if self.auto_save {
            self.save().await?;
        }
        Ok(())
    }

    /// Get the state file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if using in-memory mode
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str().is_empty()
    }
}

#[async_trait]
impl CheckpointStore for StateManager {
    async fn read(&self, collection: &str) -> Result<Option<String>> {
        Ok(self.get_cursor(collection).await)
    }

    async fn write(&self, collection: &str, value: &str) -> Result<()> {
        self.state
            .write()
            .await
            .set_cursor(collection, value.to_string());

        if self.auto_save {
            self.save().await?;
        }
        Ok(())
    }
}

fn parse_state(contents: &str) -> Result<State> {
    serde_json::from_str(contents).map_err(|e| Error::State {
        message: format!("Failed to parse state: {e}"),
    })
}
