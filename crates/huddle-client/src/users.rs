//! User directory operations.
//!
//! Profiles are keyed by the identity provider's user id, not by a
//! store-assigned id, so lookups address documents directly.

use serde_json::Value;

use huddle_core::{
    Clock, DocId, DocumentStore, Query, UserId, UserProfile, UserRef,
    store::{decode, encode},
    types::{collections, fields},
};

use crate::{ChatApi, ClientError};

impl<S: DocumentStore, C: Clock> ChatApi<S, C> {
    /// Read a user's profile. Absent is `Ok(None)`, not an error.
    pub async fn get_user(&self, uid: &UserId) -> Result<Option<UserProfile>, ClientError> {
        match self.store.get(collections::USERS, &DocId::from(uid)).await? {
            Some(doc) => Ok(Some(decode(doc)?)),
            None => Ok(None),
        }
    }

    /// Create or replace a user's profile at their identity id.
    pub async fn put_user(&self, uid: &UserId, profile: &UserProfile) -> Result<(), ClientError> {
        self.store.put(collections::USERS, &DocId::from(uid), encode(profile)?).await?;
        Ok(())
    }

    /// Read the whole user directory.
    pub async fn fetch_users(&self) -> Result<Vec<UserRef>, ClientError> {
        let raw = self.store.query(&Query::collection(collections::USERS)).await?;
        let mut users = Vec::with_capacity(raw.len());
        for item in raw {
            users.push(UserRef { id: item.id, data: decode(item.doc)? });
        }
        Ok(users)
    }

    /// Search the directory by display name or email.
    ///
    /// Case-insensitive substring match; a blank term returns everyone.
    /// The directory is small enough that this filters a full fetch
    /// locally rather than pushing the match to the store.
    pub async fn search_users(&self, term: &str) -> Result<Vec<UserRef>, ClientError> {
        let users = self.fetch_users().await?;
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(users);
        }
        Ok(users
            .into_iter()
            .filter(|user| {
                user.data.display_name.to_lowercase().contains(&needle)
                    || user.data.email.to_lowercase().contains(&needle)
            })
            .collect())
    }

    /// Flip a user's online flag.
    pub async fn set_online(&self, uid: &UserId, online: bool) -> Result<(), ClientError> {
        let mut patch = huddle_core::Document::new();
        patch.insert(fields::IS_ONLINE.to_owned(), Value::Bool(online));
        self.store.update(collections::USERS, &DocId::from(uid), patch).await?;
        Ok(())
    }
}
