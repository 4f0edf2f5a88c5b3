//! CLI module
//!
//! Command-line interface for running the tap.
//!
//! # Commands
//!
//! - `check` - Run a one-document query per collection
//! - `discover` - Print the catalog with declared schemas
//! - `read` - Extract records as `SCHEMA` / `RECORD` / `STATE` lines

mod commands;
mod runner;
mod sink;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::{select_collections, Runner};
pub use sink::{catalog_entry, schema_message, SingerSink};
