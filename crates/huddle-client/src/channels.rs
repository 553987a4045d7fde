//! Channel operations.

use serde_json::Value;

use huddle_core::{
    Channel, Clock, DocId, DocumentStore, Query, Subscription,
    store::encode,
    types::{collections, fields},
};

use crate::{ChatApi, ClientError, api::timestamp_value};

impl<S: DocumentStore, C: Clock> ChatApi<S, C> {
    /// Create a channel.
    pub async fn create_channel(&self, name: &str) -> Result<DocId, ClientError> {
        let channel =
            Channel { name: name.to_owned(), created_at: self.now(), updated_at: None };
        Ok(self.store.create(collections::CHANNELS, encode(&channel)?).await?)
    }

    /// Rename a channel, stamping its modification time.
    pub async fn rename_channel(&self, id: &DocId, name: &str) -> Result<(), ClientError> {
        let mut patch = huddle_core::Document::new();
        patch.insert(fields::NAME.to_owned(), Value::String(name.to_owned()));
        patch.insert(fields::UPDATED_AT.to_owned(), timestamp_value(self.now()));
        self.store.update(collections::CHANNELS, id, patch).await?;
        Ok(())
    }

    /// Delete a channel. Terminal; the store's native error surfaces if the
    /// channel no longer exists.
    pub async fn delete_channel(&self, id: &DocId) -> Result<(), ClientError> {
        self.store.delete(collections::CHANNELS, id).await?;
        Ok(())
    }

    /// Live feed over the channel list, in the store's delivered order.
    pub fn listen_channels(&self) -> Subscription {
        self.store.listen(Query::collection(collections::CHANNELS))
    }
}
