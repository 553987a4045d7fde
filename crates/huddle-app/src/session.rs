//! Process-lifetime session orchestration.
//!
//! [`ChatSession`] glues the pieces together: it reacts to the identity
//! provider's two-state signal (signed in with an id / signed out), routes
//! conversation selection through the synchronization manager, and wraps
//! every one-shot operation in the request-status lifecycle so failures
//! land in the state store as a retained `failed` status instead of being
//! swallowed.
//!
//! One-shot operations are never cancelled: a request started before a
//! navigation still completes and writes its outcome. Conversation feeds,
//! by contrast, are torn down on every switch.

use std::{future::Future, sync::Arc};

use huddle_client::{ChatApi, ClientError};
use huddle_core::{Clock, DocId, DocumentStore, UserId, UserProfile, UserRef, WorkplaceRef};

use crate::{
    action::StateAction,
    error::SessionError,
    handle::StateHandle,
    state::{ConversationId, RequestKind},
    sync::SyncManager,
};

/// The engine's top-level object: state, store API, and synchronization
/// manager under one lifecycle.
///
/// Created once at app start; there is no teardown beyond [`sign_out`]
/// for a process-lifetime instance.
///
/// [`sign_out`]: ChatSession::sign_out
pub struct ChatSession<S, C> {
    api: ChatApi<S, C>,
    state: StateHandle,
    sync: SyncManager<S, C>,
}

impl<S: DocumentStore, C: Clock> ChatSession<S, C> {
    /// Build a session over a backing store and clock.
    pub fn new(store: Arc<S>, clock: C) -> Self {
        let api = ChatApi::new(store, clock);
        let state = StateHandle::new();
        let sync = SyncManager::new(api.clone(), state.clone());
        Self { api, state, sync }
    }

    /// Handle to the application state, for the rendering layer.
    pub fn state(&self) -> &StateHandle {
        &self.state
    }

    /// The underlying store API.
    pub fn api(&self) -> &ChatApi<S, C> {
        &self.api
    }

    /// React to the identity provider reporting a signed-in user.
    ///
    /// Read-through profile creation: first sign-in writes the provider's
    /// profile to the directory. Then the conversation-list watches start
    /// and the directory is fetched.
    pub async fn sign_in(&mut self, uid: UserId, profile: UserProfile) -> Result<(), SessionError> {
        if self.api.get_user(&uid).await?.is_none() {
            self.api.put_user(&uid, &profile).await?;
        }
        if let Err(err) = self.api.set_online(&uid, true).await {
            tracing::warn!(%err, "failed to flag user online");
        }

        self.state.dispatch(StateAction::SignedIn { user_id: uid.clone() });
        self.sync.watch_channels();
        self.sync.watch_dm_chats(&uid);
        self.refresh_users().await
    }

    /// React to the identity provider reporting sign-out.
    ///
    /// Tears down every subscription and resets the state. The online
    /// flag is cleared best-effort; a failure there must not block
    /// sign-out.
    pub async fn sign_out(&mut self) {
        if let Some(uid) = self.state.read(|s| s.current_user().cloned()) {
            if let Err(err) = self.api.set_online(&uid, false).await {
                tracing::warn!(%err, "failed to clear online flag");
            }
        }
        self.sync.stop();
        self.state.dispatch(StateAction::SignedOut);
    }

    /// Make a channel the current conversation.
    pub fn select_channel(&mut self, id: DocId) {
        self.sync.select_channel(id);
    }

    /// Deselect the current conversation.
    pub fn clear_conversation(&mut self) {
        self.sync.clear_conversation();
    }

    /// Open (or create) the DM thread with `peer` and select it.
    pub async fn open_dm(&mut self, peer: &UserId) -> Result<DocId, SessionError> {
        let me = self.current_user()?;
        let chat_id = with_status(
            &self.state,
            RequestKind::Send,
            self.api.find_or_create_dm_chat(&me, peer),
        )
        .await?;
        self.sync.select_dm_chat(chat_id.clone());
        Ok(chat_id)
    }

    /// Send a message to the current conversation.
    pub async fn send_message(&self, text: &str) -> Result<DocId, SessionError> {
        let me = self.current_user()?;
        match self.current_conversation()? {
            ConversationId::Channel(id) => {
                with_status(
                    &self.state,
                    RequestKind::Send,
                    self.api.post_channel_message(&me, &id, text),
                )
                .await
            },
            ConversationId::Dm(id) => {
                with_status(&self.state, RequestKind::Send, self.api.send_dm_message(&id, &me, text))
                    .await
            },
        }
    }

    /// Edit a message in the current conversation as its author.
    pub async fn edit_message(&self, id: &DocId, text: &str) -> Result<(), SessionError> {
        match self.current_conversation()? {
            ConversationId::Channel(_) => {
                with_status(&self.state, RequestKind::Update, self.api.edit_channel_message(id, text))
                    .await
            },
            ConversationId::Dm(_) => {
                with_status(&self.state, RequestKind::Update, self.api.edit_dm_message(id, text))
                    .await
            },
        }
    }

    /// Delete a message from the current conversation.
    pub async fn delete_message(&self, id: &DocId) -> Result<(), SessionError> {
        match self.current_conversation()? {
            ConversationId::Channel(_) => {
                with_status(&self.state, RequestKind::Delete, self.api.delete_channel_message(id))
                    .await
            },
            ConversationId::Dm(_) => {
                with_status(&self.state, RequestKind::Delete, self.api.delete_dm_message(id)).await
            },
        }
    }

    /// Create a channel.
    pub async fn create_channel(&self, name: &str) -> Result<DocId, SessionError> {
        with_status(&self.state, RequestKind::Send, self.api.create_channel(name)).await
    }

    /// Rename a channel.
    pub async fn rename_channel(&self, id: &DocId, name: &str) -> Result<(), SessionError> {
        with_status(&self.state, RequestKind::Update, self.api.rename_channel(id, name)).await
    }

    /// Delete a channel; if it was the current conversation, deselect it.
    pub async fn delete_channel(&mut self, id: &DocId) -> Result<(), SessionError> {
        with_status(&self.state, RequestKind::Delete, self.api.delete_channel(id)).await?;

        let was_current = self.state.read(|s| {
            matches!(s.current_conversation(), Some(ConversationId::Channel(c)) if c == id)
        });
        if was_current {
            self.sync.clear_conversation();
        }
        Ok(())
    }

    /// Mark the current thread's unread incoming messages read.
    ///
    /// Returns how many messages the batch covered.
    pub async fn mark_thread_read(&self) -> Result<usize, SessionError> {
        let me = self.current_user()?;
        let ids = self.state.read(|s| s.unread_message_ids(&me));
        if ids.is_empty() {
            return Ok(0);
        }
        with_status(&self.state, RequestKind::Update, self.api.mark_read(&ids)).await?;
        Ok(ids.len())
    }

    /// Refresh the user directory into the state store.
    pub async fn refresh_users(&self) -> Result<(), SessionError> {
        let users = with_status(&self.state, RequestKind::Fetch, self.api.fetch_users()).await?;
        self.state.dispatch(StateAction::SetUsers(users));
        Ok(())
    }

    /// Search the user directory. Pass-through; no state is written.
    pub async fn search_users(&self, term: &str) -> Result<Vec<UserRef>, SessionError> {
        Ok(self.api.search_users(term).await?)
    }

    /// Create a workplace owned by the signed-in user.
    pub async fn create_workplace(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<DocId, SessionError> {
        let me = self.current_user()?;
        with_status(&self.state, RequestKind::Send, self.api.create_workplace(&me, name, description))
            .await
    }

    /// List the signed-in user's workplaces.
    pub async fn list_workplaces(&self) -> Result<Vec<WorkplaceRef>, SessionError> {
        let me = self.current_user()?;
        with_status(&self.state, RequestKind::Fetch, self.api.list_workplaces(&me)).await
    }

    fn current_user(&self) -> Result<UserId, SessionError> {
        self.state.read(|s| s.current_user().cloned()).ok_or(SessionError::NotSignedIn)
    }

    fn current_conversation(&self) -> Result<ConversationId, SessionError> {
        self.state
            .read(|s| s.current_conversation().cloned())
            .ok_or(SessionError::NoConversation)
    }
}

/// Run a one-shot operation through the request-status lifecycle.
///
/// `idle → loading → idle` on success, `→ failed` with the message
/// retained on error. The typed result is returned either way; nothing is
/// swallowed.
async fn with_status<T>(
    state: &StateHandle,
    kind: RequestKind,
    operation: impl Future<Output = Result<T, ClientError>>,
) -> Result<T, SessionError> {
    state.dispatch(StateAction::RequestStarted(kind));
    match operation.await {
        Ok(value) => {
            state.dispatch(StateAction::RequestSucceeded(kind));
            Ok(value)
        },
        Err(err) => {
            state.dispatch(StateAction::RequestFailed { kind, message: err.to_string() });
            Err(err.into())
        },
    }
}
