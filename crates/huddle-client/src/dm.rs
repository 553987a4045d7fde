//! DM chat and DM message operations, including thread resolution.

use serde_json::Value;

use huddle_core::{
    Clock, DmChat, DmChatRef, DmMessage, DmMessageRef, DocId, DocItem, DocumentStore, Filter,
    LastMessage, OrderBy, Query, Subscription, UserId,
    store::encode,
    types::{collections, fields},
};

use crate::{ChatApi, ClientError, api::timestamp_value};

fn dm_chats_query(user: &UserId) -> Query {
    Query::collection(collections::DM_CHATS)
        .with_filter(Filter::array_contains(fields::PARTICIPANTS, user.as_str()))
}

fn dm_messages_query(chat: &DocId) -> Query {
    Query::collection(collections::DM_MESSAGES)
        .with_filter(Filter::eq(fields::DM_CHAT_ID, chat.as_str()))
        .with_order(OrderBy::ascending(fields::CREATED_AT))
}

impl<S: DocumentStore, C: Clock> ChatApi<S, C> {
    /// Find the existing DM chat between two users, if any.
    ///
    /// Participant order does not matter: the query pivots on the first
    /// user and the scan checks the second.
    pub async fn find_dm_chat(
        &self,
        user: &UserId,
        peer: &UserId,
    ) -> Result<Option<DmChatRef>, ClientError> {
        let raw = self.store.query(&dm_chats_query(user)).await?;
        for item in raw {
            let chat: DmChatRef = DocItem::decode(item)?;
            if chat.data.has_participant(peer) {
                return Ok(Some(chat));
            }
        }
        Ok(None)
    }

    /// Resolve the DM chat for a participant pair, creating it on miss.
    ///
    /// Always a fresh read; no local cache is consulted. Two clients
    /// resolving the same pair for the first time can both miss the scan
    /// and create twin chats. That race is accepted: closing it needs a
    /// store-side uniqueness constraint (a deterministic key over the
    /// sorted pair), which this layer does not impose. Callers tolerate
    /// duplicate threads.
    pub async fn find_or_create_dm_chat(
        &self,
        user: &UserId,
        peer: &UserId,
    ) -> Result<DocId, ClientError> {
        if user == peer {
            return Err(ClientError::SelfChat);
        }
        if let Some(existing) = self.find_dm_chat(user, peer).await? {
            return Ok(existing.id);
        }

        let now = self.now();
        let chat = DmChat {
            participants: vec![user.clone(), peer.clone()],
            created_at: now,
            updated_at: now,
            last_message: None,
        };
        Ok(self.store.create(collections::DM_CHATS, encode(&chat)?).await?)
    }

    /// One-shot read of a user's DM chats, most recently active first.
    pub async fn fetch_dm_chats(&self, user: &UserId) -> Result<Vec<DmChatRef>, ClientError> {
        let query = dm_chats_query(user).with_order(OrderBy::descending(fields::UPDATED_AT));
        let raw = self.store.query(&query).await?;
        Ok(raw.into_iter().map(DocItem::decode).collect::<Result<_, _>>()?)
    }

    /// Live feed over a user's DM chats, most recently active first.
    pub fn listen_dm_chats(&self, user: &UserId) -> Subscription {
        self.store.listen(dm_chats_query(user).with_order(OrderBy::descending(fields::UPDATED_AT)))
    }

    /// Send a DM message and refresh the parent chat's preview.
    ///
    /// Two writes, not a transaction: the message create and the parent's
    /// `updated_at`/`last_message` patch. If the patch fails the message
    /// still exists and the parent keeps a stale preview; the error is
    /// surfaced so the caller can retry.
    pub async fn send_dm_message(
        &self,
        chat: &DocId,
        sender: &UserId,
        text: &str,
    ) -> Result<DocId, ClientError> {
        let now = self.now();
        let message = DmMessage {
            sender_id: sender.clone(),
            dm_chat_id: chat.clone(),
            text: text.to_owned(),
            created_at: now,
            updated_at: now,
            is_edited: false,
            is_read: false,
        };
        let id = self.store.create(collections::DM_MESSAGES, encode(&message)?).await?;

        let preview =
            LastMessage { text: text.to_owned(), sender_id: sender.clone(), sent_at: now };
        let mut patch = huddle_core::Document::new();
        patch.insert(fields::UPDATED_AT.to_owned(), timestamp_value(now));
        patch.insert(fields::LAST_MESSAGE.to_owned(), Value::Object(encode(&preview)?));
        self.store.update(collections::DM_CHATS, chat, patch).await?;

        Ok(id)
    }

    /// One-shot read of a chat's messages, oldest first.
    pub async fn fetch_dm_messages(&self, chat: &DocId) -> Result<Vec<DmMessageRef>, ClientError> {
        let raw = self.store.query(&dm_messages_query(chat)).await?;
        Ok(raw.into_iter().map(DocItem::decode).collect::<Result<_, _>>()?)
    }

    /// Live feed over a chat's messages, oldest first.
    pub fn listen_dm_messages(&self, chat: &DocId) -> Subscription {
        self.store.listen(dm_messages_query(chat))
    }

    /// Replace a DM message's body as an author edit.
    pub async fn edit_dm_message(&self, id: &DocId, text: &str) -> Result<(), ClientError> {
        self.store.update(collections::DM_MESSAGES, id, self.edit_patch(text)).await?;
        Ok(())
    }

    /// Delete a DM message. Deleting a missing id surfaces the store's error.
    pub async fn delete_dm_message(&self, id: &DocId) -> Result<(), ClientError> {
        self.store.delete(collections::DM_MESSAGES, id).await?;
        Ok(())
    }

    /// Mark a batch of DM messages read.
    pub async fn mark_read(&self, ids: &[DocId]) -> Result<(), ClientError> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut patch = huddle_core::Document::new();
        patch.insert(fields::IS_READ.to_owned(), Value::Bool(true));
        self.store.update_many(collections::DM_MESSAGES, ids, patch).await?;
        Ok(())
    }
}
