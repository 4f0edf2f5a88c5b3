//! Schema module
//!
//! Turns an a-priori unknown, per-document field set into a declared output
//! schema.
//!
//! # Features
//!
//! - **Type Inference**: One [`TypeTag`] per store value kind
//! - **Sampling**: First-seen type wins over a bounded sample
//! - **Configured Types**: Explicit field types skip sampling entirely
//! - **Open Schemas**: Undeclared fields are always allowed through

mod builder;
mod inference;
mod types;

pub use builder::{build_schema, replication_key_tag};
pub use inference::{infer_type, SchemaInferrer, DEFAULT_SAMPLE_SIZE};
pub use types::{DeclaredSchema, JsonSchema, JsonType, JsonTypeOrArray, SchemaProperty, TypeTag};
