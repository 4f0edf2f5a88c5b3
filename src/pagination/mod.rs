//! Pagination module
//!
//! Supports: filtered (identity-paged) and ordered (value-cursor) walks
//!
//! # Overview
//!
//! A paginator turns progress so far into the next bounded query and
//! decides when a collection is exhausted. [`extract`] drives a paginator
//! against a store and yields documents lazily, one batch in memory at a
//! time.

mod stream;
mod strategies;
mod types;

pub use stream::{extract, DocumentStream};
pub use strategies::{build_paginator, FilteredPaginator, OrderedPaginator};
pub use types::{NextPage, PaginationState, Paginator};

#[cfg(test)]
mod tests;
