//! The backing document store interface.
//!
//! The chat engine is written against [`DocumentStore`], never against a
//! concrete backend. One-shot operations return futures; continuous reads
//! return a [`Subscription`] whose feed carries the full current matching
//! set on every push, never a delta. That full-replace contract is what
//! lets everything downstream converge without merge logic.

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::{error::StoreError, query::Query, types::DocId};

/// A store document: a JSON-shaped field map.
pub type Document = serde_json::Map<String, Value>;

/// A raw document paired with its store id.
#[derive(Debug, Clone, PartialEq)]
pub struct DocRef {
    /// Store-assigned id.
    pub id: DocId,
    /// Raw field map.
    pub doc: Document,
}

/// One push from a live feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// The full current matching set. Replaces everything delivered before.
    Snapshot(Vec<DocRef>),

    /// The feed failed.
    ///
    /// In-band only: the feed stays registered and may deliver again.
    /// Consumers log this and keep their last-known-good data.
    Error(StoreError),
}

/// A live feed over a query plus its release handle.
///
/// Dropping the subscription (or calling [`Subscription::cancel`])
/// releases the backend listener. Release alone does not guarantee that an
/// already-delivered event is not still sitting in the channel; consumers
/// that need hard teardown guard application with a generation counter.
pub struct Subscription {
    events: mpsc::UnboundedReceiver<FeedEvent>,
    _guard: CancelGuard,
}

impl Subscription {
    /// Build a subscription from a feed channel and a release callback.
    ///
    /// Backends call this from their `listen` implementation; the callback
    /// runs exactly once, on cancel or drop.
    pub fn new(
        events: mpsc::UnboundedReceiver<FeedEvent>,
        on_cancel: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self { events, _guard: CancelGuard { on_cancel: Some(Box::new(on_cancel)) } }
    }

    /// Next feed event. `None` once the backend closes the feed.
    pub async fn next(&mut self) -> Option<FeedEvent> {
        self.events.recv().await
    }

    /// Release the backend listener.
    pub fn cancel(self) {}
}

struct CancelGuard {
    on_cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        if let Some(release) = self.on_cancel.take() {
            release();
        }
    }
}

/// Abstract multi-writer, eventually-visible document store.
///
/// Four semantic guarantees every implementation must provide:
///
/// - `create` makes the new document visible to feeds no earlier than the
///   returned future resolves; callers never assume it is visible sooner.
/// - `get` represents absence as `Ok(None)`; targeted `update`/`delete` of
///   a missing id surface [`StoreError::NotFound`] (delete is NOT
///   idempotent).
/// - feed pushes from one subscription arrive in emission order, each
///   carrying the full matching set; there is no cross-subscription
///   ordering.
/// - `listen` delivers an initial snapshot of the current matching set.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Create a document; the store assigns and returns its id.
    async fn create(&self, collection: &str, doc: Document) -> Result<DocId, StoreError>;

    /// Create or fully replace a document at a caller-chosen id.
    async fn put(&self, collection: &str, id: &DocId, doc: Document) -> Result<(), StoreError>;

    /// Merge a partial patch into an existing document.
    async fn update(&self, collection: &str, id: &DocId, patch: Document)
    -> Result<(), StoreError>;

    /// Apply one patch to many documents.
    ///
    /// The default implementation loops [`DocumentStore::update`] and stops
    /// at the first failure; backends with a native batch primitive should
    /// override it.
    async fn update_many(
        &self,
        collection: &str,
        ids: &[DocId],
        patch: Document,
    ) -> Result<(), StoreError> {
        for id in ids {
            self.update(collection, id, patch.clone()).await?;
        }
        Ok(())
    }

    /// Delete a document. Deleting a missing id is an error.
    async fn delete(&self, collection: &str, id: &DocId) -> Result<(), StoreError>;

    /// Read one document. Absent is `Ok(None)`, not an error.
    async fn get(&self, collection: &str, id: &DocId) -> Result<Option<Document>, StoreError>;

    /// One-shot query.
    async fn query(&self, query: &Query) -> Result<Vec<DocRef>, StoreError>;

    /// Register a live feed over a query.
    fn listen(&self, query: Query) -> Subscription;
}

/// Encode an entity into a store document.
pub fn encode<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(doc)) => Ok(doc),
        Ok(other) => Err(StoreError::Codec {
            reason: format!("expected an object document, got {other}"),
        }),
        Err(err) => Err(StoreError::Codec { reason: err.to_string() }),
    }
}

/// Decode a store document into an entity.
pub fn decode<T: DeserializeOwned>(doc: Document) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(doc)).map_err(|err| StoreError::Codec {
        reason: err.to_string(),
    })
}
