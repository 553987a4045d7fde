//! In-memory document store with push fan-out.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

use async_trait::async_trait;
use tokio::sync::mpsc;

use huddle_core::{
    DocId, DocRef, Document, DocumentStore, FeedEvent, Query, StoreError, Subscription,
};

/// In-process [`DocumentStore`] for tests.
///
/// Ids are zero-padded counters, so id order equals insertion order and is
/// stable across runs. Every mutation recomputes each listener's full
/// matching set and pushes it, matching the full-replace feed contract.
/// Fault injection knobs exercise the error paths the engine has to
/// tolerate.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<String, BTreeMap<DocId, Document>>,
    listeners: HashMap<u64, Listener>,
    next_doc: u64,
    next_listener: u64,
    /// `Some(n)`: the next `n` writes succeed, the one after fails once.
    write_fault: Option<u64>,
    /// `Some(n)`: the next `n` reads succeed, the one after fails once.
    read_fault: Option<u64>,
}

struct Listener {
    query: Query,
    sender: mpsc::UnboundedSender<FeedEvent>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arrange for the write after the next `successes` writes to fail.
    ///
    /// `fail_writes_after(0)` fails the very next write. The fault fires
    /// once and clears.
    pub fn fail_writes_after(&self, successes: u64) {
        self.lock().write_fault = Some(successes);
    }

    /// Arrange for the read after the next `successes` reads to fail.
    ///
    /// Applies to `get` and `query`; feeds are unaffected. The fault fires
    /// once and clears.
    pub fn fail_reads_after(&self, successes: u64) {
        self.lock().read_fault = Some(successes);
    }

    /// Push a feed error to every active listener.
    pub fn emit_feed_error(&self, reason: &str) {
        let mut inner = self.lock();
        let event = FeedEvent::Error(StoreError::Subscription { reason: reason.to_owned() });
        inner.listeners.retain(|_, l| l.sender.send(event.clone()).is_ok());
    }

    /// Number of documents currently in a collection.
    pub fn document_count(&self, collection: &str) -> usize {
        self.lock().collections.get(collection).map_or(0, BTreeMap::len)
    }

    /// Number of active feed listeners.
    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Inner {
    /// Consume one write-fault tick. Returns an error if this write fails.
    fn check_write_fault(&mut self) -> Result<(), StoreError> {
        match self.write_fault {
            Some(0) => {
                self.write_fault = None;
                Err(StoreError::Write { reason: "injected write failure".into() })
            },
            Some(remaining) => {
                self.write_fault = Some(remaining - 1);
                Ok(())
            },
            None => Ok(()),
        }
    }

    /// Consume one read-fault tick. Returns an error if this read fails.
    fn check_read_fault(&mut self) -> Result<(), StoreError> {
        match self.read_fault {
            Some(0) => {
                self.read_fault = None;
                Err(StoreError::Read { reason: "injected read failure".into() })
            },
            Some(remaining) => {
                self.read_fault = Some(remaining - 1);
                Ok(())
            },
            None => Ok(()),
        }
    }

    fn snapshot(&self, query: &Query) -> Vec<DocRef> {
        let mut items: Vec<DocRef> = self
            .collections
            .get(&query.collection)
            .into_iter()
            .flatten()
            .filter(|(_, doc)| query.matches(doc))
            .map(|(id, doc)| DocRef { id: id.clone(), doc: doc.clone() })
            .collect();
        query.sort(&mut items);
        items
    }

    /// Push each listener its recomputed matching set; drop closed feeds.
    fn notify(&mut self) {
        let snapshots: Vec<(u64, Vec<DocRef>)> = self
            .listeners
            .iter()
            .map(|(id, l)| (*id, self.snapshot(&l.query)))
            .collect();

        for (id, snapshot) in snapshots {
            let closed = self
                .listeners
                .get(&id)
                .is_some_and(|l| l.sender.send(FeedEvent::Snapshot(snapshot)).is_err());
            if closed {
                self.listeners.remove(&id);
            }
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create(&self, collection: &str, doc: Document) -> Result<DocId, StoreError> {
        let mut inner = self.lock();
        inner.check_write_fault()?;

        inner.next_doc += 1;
        let id = DocId::new(format!("doc-{:08}", inner.next_doc));
        inner.collections.entry(collection.to_owned()).or_default().insert(id.clone(), doc);
        inner.notify();
        Ok(id)
    }

    async fn put(&self, collection: &str, id: &DocId, doc: Document) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.check_write_fault()?;

        inner.collections.entry(collection.to_owned()).or_default().insert(id.clone(), doc);
        inner.notify();
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        id: &DocId,
        patch: Document,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.check_write_fault()?;

        let doc = inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;
        for (field, value) in patch {
            doc.insert(field, value);
        }
        inner.notify();
        Ok(())
    }

    async fn update_many(
        &self,
        collection: &str,
        ids: &[DocId],
        patch: Document,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.check_write_fault()?;

        // All-or-nothing: verify every target before touching any of them.
        let docs = inner
            .collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::not_found(collection, ids.first().unwrap_or(&DocId::new(""))))?;
        if let Some(missing) = ids.iter().find(|id| !docs.contains_key(*id)) {
            return Err(StoreError::not_found(collection, missing));
        }

        for id in ids {
            if let Some(doc) = docs.get_mut(id) {
                for (field, value) in patch.clone() {
                    doc.insert(field, value);
                }
            }
        }
        inner.notify();
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &DocId) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.check_write_fault()?;

        inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;
        inner.notify();
        Ok(())
    }

    async fn get(&self, collection: &str, id: &DocId) -> Result<Option<Document>, StoreError> {
        let mut inner = self.lock();
        inner.check_read_fault()?;
        Ok(inner.collections.get(collection).and_then(|docs| docs.get(id)).cloned())
    }

    async fn query(&self, query: &Query) -> Result<Vec<DocRef>, StoreError> {
        let mut inner = self.lock();
        inner.check_read_fault()?;
        Ok(inner.snapshot(query))
    }

    fn listen(&self, query: Query) -> Subscription {
        let mut inner = self.lock();
        let (sender, receiver) = mpsc::unbounded_channel();

        // Initial snapshot so consumers have content before the first change.
        sender.send(FeedEvent::Snapshot(inner.snapshot(&query))).ok();

        inner.next_listener += 1;
        let listener_id = inner.next_listener;
        inner.listeners.insert(listener_id, Listener { query, sender });

        let registry: Weak<Mutex<Inner>> = Arc::downgrade(&self.inner);
        Subscription::new(receiver, move || {
            if let Some(inner) = registry.upgrade() {
                inner
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .listeners
                    .remove(&listener_id);
            }
        })
    }
}
