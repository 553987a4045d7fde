//! Channel message operations.

use huddle_core::{
    Clock, DocId, DocItem, DocumentStore, Filter, Message, MessageRef, OrderBy, Query,
    Subscription, UserId,
    store::encode,
    types::{collections, fields},
};

use crate::{ChatApi, ClientError};

fn channel_messages_query(channel: &DocId) -> Query {
    Query::collection(collections::MESSAGES)
        .with_filter(Filter::eq(fields::CHANNEL_ID, channel.as_str()))
        .with_order(OrderBy::ascending(fields::CREATED_AT))
}

impl<S: DocumentStore, C: Clock> ChatApi<S, C> {
    /// Post a message to a channel.
    ///
    /// The caller must not assume the message is visible in a concurrently
    /// active feed before that feed's next push.
    pub async fn post_channel_message(
        &self,
        author: &UserId,
        channel: &DocId,
        text: &str,
    ) -> Result<DocId, ClientError> {
        let now = self.now();
        let message = Message {
            author_id: author.clone(),
            channel_id: channel.clone(),
            text: text.to_owned(),
            created_at: now,
            updated_at: now,
            is_edited: false,
        };
        Ok(self.store.create(collections::MESSAGES, encode(&message)?).await?)
    }

    /// One-shot read of a channel's history, oldest first.
    pub async fn fetch_channel_messages(
        &self,
        channel: &DocId,
    ) -> Result<Vec<MessageRef>, ClientError> {
        let raw = self.store.query(&channel_messages_query(channel)).await?;
        Ok(raw.into_iter().map(DocItem::decode).collect::<Result<_, _>>()?)
    }

    /// Live feed over a channel's messages, oldest first.
    pub fn listen_channel_messages(&self, channel: &DocId) -> Subscription {
        self.store.listen(channel_messages_query(channel))
    }

    /// Replace a message's body as an author edit.
    ///
    /// Marks the message edited and bumps its modification time; authorship
    /// is untouched.
    pub async fn edit_channel_message(&self, id: &DocId, text: &str) -> Result<(), ClientError> {
        self.store.update(collections::MESSAGES, id, self.edit_patch(text)).await?;
        Ok(())
    }

    /// Delete a message. Deleting a missing id surfaces the store's error.
    pub async fn delete_channel_message(&self, id: &DocId) -> Result<(), ClientError> {
        self.store.delete(collections::MESSAGES, id).await?;
        Ok(())
    }
}
