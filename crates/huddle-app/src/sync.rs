//! Subscription lifecycle per live context.
//!
//! [`SyncManager`] owns every outstanding feed: the channel list, the DM
//! chat list, and the active conversation's messages. Each context is a
//! [`FeedSlot`] holding a generation counter and the spawned task handles.
//! Replacing a context retires the slot first (bump the generation, abort
//! the tasks) and only then dispatches the superseding state, so a late
//! callback from a retired subscription can never mutate state.
//!
//! Feed pushes carry the full matching set and full-replace their state
//! slot; the history fetch issued on a conversation switch races the feed
//! freely because both writers converge on the same slot.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;

use huddle_client::ChatApi;
use huddle_core::{
    Channel, Clock, DmChat, DocId, DocItem, DocRef, DocumentStore, FeedEvent, UserId,
};

use crate::{
    action::StateAction,
    handle::StateHandle,
    state::{ConversationId, MessageView, RequestKind},
};

/// One live context: a generation counter plus its running tasks.
///
/// The generation is shared with every task the slot ever spawned; a task
/// whose captured generation no longer matches is retired and must not
/// touch state.
struct FeedSlot {
    generation: Arc<AtomicU64>,
    tasks: Vec<JoinHandle<()>>,
}

impl FeedSlot {
    fn new() -> Self {
        Self { generation: Arc::new(AtomicU64::new(0)), tasks: Vec::new() }
    }

    /// Retire the current subscription and return the next generation.
    ///
    /// The bump is ordered before any superseding dispatch takes the state
    /// lock, which is what makes teardown synchronous with respect to the
    /// caller: a retired task's guarded dispatch observes the bump and
    /// drops its action. Aborting the tasks also drops their
    /// subscriptions, releasing the backend listeners.
    fn retire(&mut self) -> u64 {
        let next = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        for task in self.tasks.drain(..) {
            task.abort();
        }
        next
    }

    fn guard(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.generation)
    }
}

impl Drop for FeedSlot {
    fn drop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

/// Owns the subscription lifecycle for every live context.
pub struct SyncManager<S, C> {
    api: ChatApi<S, C>,
    state: StateHandle,
    channels: FeedSlot,
    dm_chats: FeedSlot,
    messages: FeedSlot,
}

impl<S: DocumentStore, C: Clock> SyncManager<S, C> {
    /// Build a manager writing into `state` through `api`'s store.
    pub fn new(api: ChatApi<S, C>, state: StateHandle) -> Self {
        Self {
            api,
            state,
            channels: FeedSlot::new(),
            dm_chats: FeedSlot::new(),
            messages: FeedSlot::new(),
        }
    }

    /// Subscribe the channel list, replacing any previous subscription.
    pub fn watch_channels(&mut self) {
        let generation = self.channels.retire();
        let guard = self.channels.guard();
        let api = self.api.clone();
        let state = self.state.clone();

        self.channels.tasks.push(tokio::spawn(async move {
            let mut feed = api.listen_channels();
            while let Some(event) = feed.next().await {
                match event {
                    FeedEvent::Snapshot(raw) => {
                        let channels = decode_all::<Channel>(raw);
                        let applied = state.dispatch_guarded(
                            &guard,
                            generation,
                            StateAction::SetChannels(channels),
                        );
                        if !applied {
                            break;
                        }
                    },
                    FeedEvent::Error(err) => {
                        tracing::warn!(%err, "channel feed error; keeping last known list");
                    },
                }
            }
        }));
    }

    /// Subscribe a user's DM chat list, replacing any previous
    /// subscription. Also issues a one-shot fetch so the list renders
    /// before the feed's first push; fetch and feed race and converge.
    pub fn watch_dm_chats(&mut self, user: &UserId) {
        let generation = self.dm_chats.retire();

        {
            let guard = self.dm_chats.guard();
            let api = self.api.clone();
            let state = self.state.clone();
            let user = user.clone();
            self.dm_chats.tasks.push(tokio::spawn(async move {
                state.dispatch_guarded(
                    &guard,
                    generation,
                    StateAction::RequestStarted(RequestKind::Fetch),
                );
                match api.fetch_dm_chats(&user).await {
                    Ok(chats) => {
                        state.dispatch_guarded(
                            &guard,
                            generation,
                            StateAction::SetDmChats(chats),
                        );
                        state.dispatch_guarded(
                            &guard,
                            generation,
                            StateAction::RequestSucceeded(RequestKind::Fetch),
                        );
                    },
                    Err(err) => {
                        tracing::warn!(%err, "dm chat fetch failed");
                        state.dispatch_guarded(
                            &guard,
                            generation,
                            StateAction::RequestFailed {
                                kind: RequestKind::Fetch,
                                message: err.to_string(),
                            },
                        );
                    },
                }
            }));
        }

        let guard = self.dm_chats.guard();
        let api = self.api.clone();
        let state = self.state.clone();
        let user = user.clone();
        self.dm_chats.tasks.push(tokio::spawn(async move {
            let mut feed = api.listen_dm_chats(&user);
            while let Some(event) = feed.next().await {
                match event {
                    FeedEvent::Snapshot(raw) => {
                        let chats = decode_all::<DmChat>(raw);
                        let applied = state.dispatch_guarded(
                            &guard,
                            generation,
                            StateAction::SetDmChats(chats),
                        );
                        if !applied {
                            break;
                        }
                    },
                    FeedEvent::Error(err) => {
                        tracing::warn!(%err, "dm chat feed error; keeping last known list");
                    },
                }
            }
        }));
    }

    /// Make a channel the current conversation.
    pub fn select_channel(&mut self, id: DocId) {
        self.select(ConversationId::Channel(id));
    }

    /// Make a DM thread the current conversation.
    pub fn select_dm_chat(&mut self, id: DocId) {
        self.select(ConversationId::Dm(id));
    }

    /// Deselect the current conversation and retire its subscription.
    pub fn clear_conversation(&mut self) {
        self.messages.retire();
        self.state.dispatch(StateAction::ClearConversation);
    }

    /// Retire every subscription. Used on sign-out.
    pub fn stop(&mut self) {
        self.channels.retire();
        self.dm_chats.retire();
        self.messages.retire();
    }

    /// Switch the active conversation.
    ///
    /// Retires the previous message subscription first, dispatches the
    /// selection (clearing the slot), then starts the racing history fetch
    /// and live feed.
    fn select(&mut self, conversation: ConversationId) {
        let generation = self.messages.retire();
        self.state.dispatch(StateAction::SelectConversation(conversation.clone()));
        tracing::debug!(?conversation, "conversation selected");

        {
            let guard = self.messages.guard();
            let api = self.api.clone();
            let state = self.state.clone();
            let conversation = conversation.clone();
            self.messages.tasks.push(tokio::spawn(async move {
                state.dispatch_guarded(
                    &guard,
                    generation,
                    StateAction::RequestStarted(RequestKind::Fetch),
                );
                let fetched: Result<Vec<MessageView>, huddle_client::ClientError> = match &conversation {
                    ConversationId::Channel(id) => api
                        .fetch_channel_messages(id)
                        .await
                        .map(|items| items.into_iter().map(MessageView::from).collect()),
                    ConversationId::Dm(id) => api
                        .fetch_dm_messages(id)
                        .await
                        .map(|items| items.into_iter().map(MessageView::from).collect()),
                };
                match fetched {
                    Ok(messages) => {
                        state.dispatch_guarded(
                            &guard,
                            generation,
                            StateAction::SetMessages(messages),
                        );
                        state.dispatch_guarded(
                            &guard,
                            generation,
                            StateAction::RequestSucceeded(RequestKind::Fetch),
                        );
                    },
                    Err(err) => {
                        tracing::warn!(%err, "history fetch failed");
                        state.dispatch_guarded(
                            &guard,
                            generation,
                            StateAction::RequestFailed {
                                kind: RequestKind::Fetch,
                                message: err.to_string(),
                            },
                        );
                    },
                }
            }));
        }

        let guard = self.messages.guard();
        let api = self.api.clone();
        let state = self.state.clone();
        self.messages.tasks.push(tokio::spawn(async move {
            let mut feed = match &conversation {
                ConversationId::Channel(id) => api.listen_channel_messages(id),
                ConversationId::Dm(id) => api.listen_dm_messages(id),
            };
            while let Some(event) = feed.next().await {
                match event {
                    FeedEvent::Snapshot(raw) => {
                        let messages = snapshot_views(&conversation, raw);
                        let applied = state.dispatch_guarded(
                            &guard,
                            generation,
                            StateAction::SetMessages(messages),
                        );
                        if !applied {
                            break;
                        }
                    },
                    FeedEvent::Error(err) => {
                        tracing::warn!(%err, "message feed error; keeping last known list");
                    },
                }
            }
        }));
    }
}

/// Decode a raw snapshot, skipping (and logging) undecodable documents.
fn decode_all<T: DeserializeOwned>(raw: Vec<DocRef>) -> Vec<DocItem<T>> {
    raw.into_iter()
        .filter_map(|item| match DocItem::decode(item) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                tracing::warn!(%err, "skipping undecodable document");
                None
            },
        })
        .collect()
}

/// Decode a message snapshot for whichever kind of conversation is active.
fn snapshot_views(conversation: &ConversationId, raw: Vec<DocRef>) -> Vec<MessageView> {
    match conversation {
        ConversationId::Channel(_) => {
            decode_all::<huddle_core::Message>(raw).into_iter().map(MessageView::from).collect()
        },
        ConversationId::Dm(_) => {
            decode_all::<huddle_core::DmMessage>(raw).into_iter().map(MessageView::from).collect()
        },
    }
}
