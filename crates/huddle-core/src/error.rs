//! Error taxonomy for the store boundary.
//!
//! Strongly-typed errors instead of `std::io::Error` so callers can
//! distinguish recoverable outcomes (a missing document) from rejected
//! operations. Nothing here is fatal; every failure is recoverable by
//! retrying the triggering user action.

use thiserror::Error;

use crate::types::DocId;

/// Errors surfaced by a [`DocumentStore`](crate::store::DocumentStore).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A one-shot read failed.
    #[error("read failed: {reason}")]
    Read {
        /// Backend-supplied failure description.
        reason: String,
    },

    /// A write was rejected by the backend.
    #[error("write rejected: {reason}")]
    Write {
        /// Backend-supplied failure description.
        reason: String,
    },

    /// A targeted operation addressed a document that does not exist.
    #[error("{collection}/{id} not found")]
    NotFound {
        /// Collection that was addressed.
        collection: String,
        /// Id that was addressed.
        id: DocId,
    },

    /// A live feed reported a failure.
    ///
    /// Delivered in-band through the feed, never returned from a call.
    /// Consumers log it and keep their last-known-good data.
    #[error("subscription error: {reason}")]
    Subscription {
        /// Backend-supplied failure description.
        reason: String,
    },

    /// An entity failed to (de)serialize at the document boundary.
    #[error("document codec error: {reason}")]
    Codec {
        /// Serde failure description.
        reason: String,
    },
}

impl StoreError {
    /// Returns true if the error means the addressed document is absent.
    ///
    /// Absence is an error only for targeted updates and deletes; optional
    /// reads represent it as `Ok(None)` instead.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Shorthand for a [`StoreError::NotFound`].
    pub fn not_found(collection: &str, id: &DocId) -> Self {
        Self::NotFound { collection: collection.to_owned(), id: id.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_classified() {
        let err = StoreError::not_found("channels", &DocId::new("c1"));
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "channels/c1 not found");

        assert!(!StoreError::Write { reason: "quota".into() }.is_not_found());
    }
}
