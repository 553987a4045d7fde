//! The façade type and shared write-path helpers.

use std::sync::Arc;

use serde_json::Value;

use huddle_core::{Clock, Document, DocumentStore, Timestamp, types::fields};

/// Typed conversation store API.
///
/// Stateless: owns only a handle to the backing store and the clock used
/// to stamp `created_at`/`updated_at` on writes. Cheap to clone; clones
/// share the store.
pub struct ChatApi<S, C> {
    pub(crate) store: Arc<S>,
    clock: C,
}

impl<S, C: Clone> Clone for ChatApi<S, C> {
    fn clone(&self) -> Self {
        Self { store: Arc::clone(&self.store), clock: self.clock.clone() }
    }
}

impl<S: DocumentStore, C: Clock> ChatApi<S, C> {
    /// Build a façade over a store and a clock.
    pub fn new(store: Arc<S>, clock: C) -> Self {
        Self { store, clock }
    }

    /// The backing store handle.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Current wall-clock time from the injected clock.
    pub(crate) fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Patch applying an author edit to a message body.
    pub(crate) fn edit_patch(&self, text: &str) -> Document {
        let mut patch = Document::new();
        patch.insert(fields::TEXT.to_owned(), Value::String(text.to_owned()));
        patch.insert(fields::IS_EDITED.to_owned(), Value::Bool(true));
        patch.insert(fields::UPDATED_AT.to_owned(), timestamp_value(self.now()));
        patch
    }
}

/// A [`Timestamp`] as a document field value.
pub(crate) fn timestamp_value(ts: Timestamp) -> Value {
    Value::from(ts.as_millis())
}
