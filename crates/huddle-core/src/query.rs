//! Query semantics shared by all store backends.
//!
//! A query names a collection, at most one filter, and at most one ordering.
//! Matching and ordering are defined here, in one place, so every backend
//! (and the in-memory test store) agrees on exactly which documents a feed
//! carries and in what order. Without an explicit ordering a backend
//! delivers its natural id order.

use std::cmp::Ordering;

use serde_json::Value;

use crate::store::DocRef;

/// Document filter. At most one per query.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Field equals a value.
    Eq {
        /// Field name.
        field: String,
        /// Value to compare against.
        value: Value,
    },

    /// Array field contains a value.
    ArrayContains {
        /// Field name; must hold an array.
        field: String,
        /// Element to look for.
        value: Value,
    },
}

impl Filter {
    /// Equality filter on a field.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq { field: field.into(), value: value.into() }
    }

    /// Membership filter on an array field.
    pub fn array_contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::ArrayContains { field: field.into(), value: value.into() }
    }

    /// Whether a document satisfies this filter.
    pub fn matches(&self, doc: &crate::store::Document) -> bool {
        match self {
            Self::Eq { field, value } => doc.get(field) == Some(value),
            Self::ArrayContains { field, value } => {
                doc.get(field).and_then(Value::as_array).is_some_and(|arr| arr.contains(value))
            },
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Smallest value first.
    Ascending,
    /// Largest value first.
    Descending,
}

/// Ordering on a single field, ties broken by document id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Field to order on.
    pub field: String,
    /// Sort direction.
    pub direction: Direction,
}

impl OrderBy {
    /// Ascending order on a field.
    pub fn ascending(field: impl Into<String>) -> Self {
        Self { field: field.into(), direction: Direction::Ascending }
    }

    /// Descending order on a field.
    pub fn descending(field: impl Into<String>) -> Self {
        Self { field: field.into(), direction: Direction::Descending }
    }
}

/// A collection query: filter plus ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Collection to read.
    pub collection: String,
    /// Optional filter.
    pub filter: Option<Filter>,
    /// Optional ordering.
    pub order_by: Option<OrderBy>,
}

impl Query {
    /// Query over a whole collection.
    pub fn collection(name: impl Into<String>) -> Self {
        Self { collection: name.into(), filter: None, order_by: None }
    }

    /// Attach a filter.
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Attach an ordering.
    pub fn with_order(mut self, order_by: OrderBy) -> Self {
        self.order_by = Some(order_by);
        self
    }

    /// Whether a document belongs to this query's result set.
    pub fn matches(&self, doc: &crate::store::Document) -> bool {
        self.filter.as_ref().is_none_or(|f| f.matches(doc))
    }

    /// Sort a result set in place per `order_by`.
    ///
    /// No-op without an ordering: the backend's natural id order stands.
    pub fn sort(&self, items: &mut [DocRef]) {
        let Some(order_by) = &self.order_by else {
            return;
        };

        items.sort_by(|a, b| {
            let av = a.doc.get(&order_by.field).unwrap_or(&Value::Null);
            let bv = b.doc.get(&order_by.field).unwrap_or(&Value::Null);
            let by_field = match order_by.direction {
                Direction::Ascending => compare_values(av, bv),
                Direction::Descending => compare_values(av, bv).reverse(),
            };
            by_field.then_with(|| a.id.cmp(&b.id))
        });
    }
}

/// Total order over JSON values: by type rank, then by value within a type.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .unwrap_or(0.0)
            .partial_cmp(&y.as_f64().unwrap_or(0.0))
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}
