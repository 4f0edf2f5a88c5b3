//! Store-native values and their normalization
//!
//! The store adapter decodes every document into a closed tagged union,
//! [`StoreValue`]. Everything downstream (type inference, normalization,
//! cursor comparison) matches on that union instead of probing values for
//! timestamp-like or geopoint-like shapes.
//!
//! # Overview
//!
//! - `StoreValue` / `RawDocument` - what the store hands back
//! - `normalize` - total conversion of a store value into JSON
//! - `store_cmp` - the store's cross-type ordering, used for cursors

mod normalize;
mod order;
mod types;

pub use normalize::{normalize, normalize_fields};
pub use order::{same_kind, store_cmp};
pub use types::{DocumentRef, GeoPoint, OpaqueValue, RawDocument, StoreValue};

#[cfg(test)]
mod tests;
