//! # firestore-tap
//!
//! Incremental extraction of Cloud Firestore collections into typed, flat
//! records.
//!
//! ## Features
//!
//! - **Full and Incremental Sync**: Whole-collection scans, or a single
//!   monotonic replication key resumed from a stored cursor
//! - **Two Pagination Modes**: Identity-paged `where` filter (no composite
//!   index) or a strictly ordered value-cursor sweep
//! - **Schema Discovery**: Declared field types from configuration or from a
//!   bounded document sample, always open to undeclared fields
//! - **Total Normalization**: Timestamps, geo points, references, bytes and
//!   unknown value kinds all become plain JSON
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use firestore_tap::config::TapConfig;
//! use firestore_tap::engine::Extractor;
//! use firestore_tap::state::StateManager;
//! use firestore_tap::store::FirestoreStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> firestore_tap::Result<()> {
//!     let config = TapConfig::from_file("tap.yaml")?;
//!     config.validate()?;
//!
//!     let extractor = Extractor::new(Arc::new(FirestoreStore::from_config(&config)?));
//!     let state = StateManager::from_file("state.json")?;
//!
//!     let mut messages = Vec::new();
//!     for spec in &config.collections {
//!         extractor.run(spec, &state, &mut messages).await?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  cli: discover / read / check         → SCHEMA RECORD STATE   │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │
//! ┌──────────────────────────────┴───────────────────────────────┐
//! │  engine::Extractor   checkpoint → schema → walk → records     │
//! └───────┬───────────────┬───────────────┬──────────────┬───────┘
//!         │               │               │              │
//! ┌───────┴──────┐ ┌──────┴──────┐ ┌──────┴──────┐ ┌─────┴──────┐
//! │    schema    │ │ pagination  │ │    value    │ │   state    │
//! │ infer, build │ │ filtered,   │ │ normalize,  │ │ bookmarks, │
//! │              │ │ ordered     │ │ ordering    │ │ cursors    │
//! └──────────────┘ └──────┬──────┘ └─────────────┘ └────────────┘
//!                         │
//!                 ┌───────┴───────┐
//!                 │     store     │  REST runQuery / in-memory
//!                 ├───────────────┤
//!                 │  http · auth  │  bearer tokens, rate limit
//!                 └───────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Tap and collection configuration
pub mod config;

/// Store values, documents and normalization
pub mod value;

/// Declared schemas and type inference
pub mod schema;

/// Query model and document store backends
pub mod store;

/// Credential resolution and bearer tokens
pub mod auth;

/// HTTP client with rate limiting
pub mod http;

/// Pagination strategies
pub mod pagination;

/// Checkpoint state and cursor codec
pub mod state;

/// Collection extraction
pub mod engine;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
