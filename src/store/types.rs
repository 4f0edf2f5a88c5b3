//! Query model shared by every store backend

use crate::types::DOCUMENT_ID_PATH;
use crate::value::StoreValue;

/// Comparison operator of a field filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// `field > value`
    GreaterThan,
}

impl FilterOp {
    /// Wire name of the operator
    pub fn as_str(self) -> &'static str {
        match self {
            FilterOp::GreaterThan => "GREATER_THAN",
        }
    }
}

/// A single-field comparison
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub op: FilterOp,
    pub value: StoreValue,
}

impl FieldFilter {
    /// `field > value`
    pub fn greater_than(field: impl Into<String>, value: StoreValue) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::GreaterThan,
            value,
        }
    }
}

/// One bounded query against a collection.
///
/// Ordering is always ascending. `start_after` holds one value per
/// `order_by` entry (a prefix is allowed); a value for [`DOCUMENT_ID_PATH`]
/// is a `StoreValue::Reference`.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Collection path, possibly nested (`users/u1/orders`)
    pub collection: String,
    /// Filters, all of which must hold
    pub filters: Vec<FieldFilter>,
    /// Fields to order by
    pub order_by: Vec<String>,
    /// Exclusive start cursor
    pub start_after: Option<Vec<StoreValue>>,
    /// Maximum documents to return
    pub limit: Option<usize>,
}

impl Query {
    /// Unfiltered, unordered query over a collection
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filters: Vec::new(),
            order_by: Vec::new(),
            start_after: None,
            limit: None,
        }
    }

    /// Add a filter
    #[must_use]
    pub fn filter(mut self, filter: FieldFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Add an ordering field
    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by.push(field.into());
        self
    }

    /// Order by document identity
    #[must_use]
    pub fn order_by_id(self) -> Self {
        self.order_by(DOCUMENT_ID_PATH)
    }

    /// Set the exclusive start cursor
    #[must_use]
    pub fn start_after(mut self, values: Vec<StoreValue>) -> Self {
        self.start_after = Some(values);
        self
    }

    /// Set the result cap
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}
