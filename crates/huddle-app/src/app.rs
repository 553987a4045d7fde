//! The application state machine.
//!
//! [`AppState`] is the canonical in-memory projection of the conversation
//! state. It is a pure state machine: [`AppState::apply`] consumes one
//! [`StateAction`] at a time, selectors expose the result. No I/O
//! dependencies, fully testable without a store.
//!
//! Ordering invariants are enforced here, at the single write point, so
//! no delivery race between a history fetch and a feed push can produce an
//! out-of-order or duplicated list.

use std::collections::HashSet;

use huddle_core::{ChannelRef, DmChatRef, DocId, UserId, UserRef};

use crate::{
    action::StateAction,
    state::{ConversationId, MessageView, RequestKind, RequestStatus, RequestStatuses},
};

/// Canonical application state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    /// Signed-in user. `None` between sign-out and the next sign-in.
    current_user: Option<UserId>,
    /// User directory.
    users: Vec<UserRef>,
    /// Channel list, in delivered order.
    channels: Vec<ChannelRef>,
    /// DM chat list, most recently active first.
    dm_chats: Vec<DmChatRef>,
    /// Current conversation. `None` when nothing is selected.
    current: Option<ConversationId>,
    /// Messages of the current conversation, oldest first.
    messages: Vec<MessageView>,
    /// Per-family request status.
    statuses: RequestStatuses,
}

impl AppState {
    /// Empty signed-out state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one action.
    pub fn apply(&mut self, action: StateAction) {
        match action {
            StateAction::SignedIn { user_id } => {
                self.current_user = Some(user_id);
            },
            StateAction::SignedOut => {
                *self = Self::new();
            },
            StateAction::SetUsers(users) => {
                self.users = users;
            },
            StateAction::SetChannels(channels) => {
                self.channels = channels;
            },
            StateAction::SetDmChats(mut chats) => {
                sort_dm_chats(&mut chats);
                self.dm_chats = chats;
            },
            StateAction::UpsertDmChat(chat) => {
                match self.dm_chats.iter_mut().find(|c| c.id == chat.id) {
                    Some(existing) => *existing = chat,
                    None => self.dm_chats.push(chat),
                }
                sort_dm_chats(&mut self.dm_chats);
            },
            StateAction::SelectConversation(conversation) => {
                self.current = Some(conversation);
                self.messages.clear();
            },
            StateAction::ClearConversation => {
                self.current = None;
                self.messages.clear();
            },
            StateAction::SetMessages(mut messages) => {
                sort_messages(&mut messages);
                self.messages = messages;
            },
            StateAction::RequestStarted(kind) => {
                self.statuses.set(kind, RequestStatus::Loading);
            },
            StateAction::RequestSucceeded(kind) => {
                self.statuses.set(kind, RequestStatus::Idle);
            },
            StateAction::RequestFailed { kind, message } => {
                self.statuses.set(kind, RequestStatus::Failed { message });
            },
        }
    }

    /// Signed-in user.
    pub fn current_user(&self) -> Option<&UserId> {
        self.current_user.as_ref()
    }

    /// User directory.
    pub fn users(&self) -> &[UserRef] {
        &self.users
    }

    /// Channel list, in delivered order.
    pub fn channels(&self) -> &[ChannelRef] {
        &self.channels
    }

    /// DM chat list, most recently active first.
    pub fn dm_chats(&self) -> &[DmChatRef] {
        &self.dm_chats
    }

    /// Current conversation. `None` when nothing is selected.
    pub fn current_conversation(&self) -> Option<&ConversationId> {
        self.current.as_ref()
    }

    /// Messages of the current conversation, oldest first.
    pub fn messages(&self) -> &[MessageView] {
        &self.messages
    }

    /// Status of one request family.
    pub fn status(&self, kind: RequestKind) -> &RequestStatus {
        self.statuses.get(kind)
    }

    /// Ids of unread messages in the current thread not authored by
    /// `reader`. Feeds the batched mark-as-read.
    pub fn unread_message_ids(&self, reader: &UserId) -> Vec<DocId> {
        self.messages
            .iter()
            .filter(|m| m.is_read == Some(false) && m.author_id != *reader)
            .map(|m| m.id.clone())
            .collect()
    }
}

/// Sort by `(created_at, id)` and drop duplicate ids, keeping the first
/// (earliest) occurrence.
fn sort_messages(messages: &mut Vec<MessageView>) {
    messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    let mut seen = HashSet::with_capacity(messages.len());
    messages.retain(|m| seen.insert(m.id.clone()));
}

/// Most recently active first, ties broken by id.
fn sort_dm_chats(chats: &mut [DmChatRef]) {
    chats.sort_by(|a, b| {
        b.data.updated_at.cmp(&a.data.updated_at).then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use huddle_core::{DmChat, Timestamp};

    use super::*;

    fn view(id: &str, created_at: u64) -> MessageView {
        MessageView {
            id: DocId::new(id),
            author_id: UserId::new("u1"),
            text: format!("msg {id}"),
            created_at: Timestamp::from_millis(created_at),
            updated_at: Timestamp::from_millis(created_at),
            is_edited: false,
            is_read: None,
        }
    }

    fn chat(id: &str, updated_at: u64) -> DmChatRef {
        DmChatRef {
            id: DocId::new(id),
            data: DmChat {
                participants: vec![UserId::new("u1"), UserId::new("u2")],
                created_at: Timestamp::from_millis(0),
                updated_at: Timestamp::from_millis(updated_at),
                last_message: None,
            },
        }
    }

    #[test]
    fn set_messages_sorts_and_dedups() {
        let mut state = AppState::new();
        state.apply(StateAction::SetMessages(vec![
            view("b", 5),
            view("a", 5),
            view("c", 1),
            view("a", 5),
        ]));

        let ids: Vec<&str> = state.messages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["c", "a", "b"]);
    }

    #[test]
    fn reapplying_a_snapshot_is_idempotent() {
        let snapshot = vec![view("a", 2), view("b", 1)];

        let mut state = AppState::new();
        state.apply(StateAction::SetMessages(snapshot.clone()));
        let first = state.clone();

        state.apply(StateAction::SetMessages(snapshot));
        assert_eq!(state, first);
    }

    #[test]
    fn selecting_a_conversation_clears_the_message_slot() {
        let mut state = AppState::new();
        state.apply(StateAction::SetMessages(vec![view("a", 1)]));

        state.apply(StateAction::SelectConversation(ConversationId::Channel(DocId::new("c2"))));

        assert!(state.messages().is_empty());
        assert_eq!(
            state.current_conversation(),
            Some(&ConversationId::Channel(DocId::new("c2")))
        );
    }

    #[test]
    fn upsert_replaces_by_id_and_resorts() {
        let mut state = AppState::new();
        state.apply(StateAction::SetDmChats(vec![chat("x", 10), chat("y", 20)]));
        assert_eq!(state.dm_chats()[0].id.as_str(), "y");

        state.apply(StateAction::UpsertDmChat(chat("x", 30)));

        assert_eq!(state.dm_chats().len(), 2);
        assert_eq!(state.dm_chats()[0].id.as_str(), "x");
        assert_eq!(state.dm_chats()[0].data.updated_at, Timestamp::from_millis(30));
    }

    #[test]
    fn upsert_inserts_unknown_chats() {
        let mut state = AppState::new();
        state.apply(StateAction::UpsertDmChat(chat("x", 10)));
        assert_eq!(state.dm_chats().len(), 1);
    }

    #[test]
    fn status_machine_retains_failure_messages() {
        let mut state = AppState::new();

        state.apply(StateAction::RequestStarted(RequestKind::Send));
        assert!(state.status(RequestKind::Send).is_loading());
        assert!(!state.status(RequestKind::Fetch).is_loading());

        state.apply(StateAction::RequestFailed {
            kind: RequestKind::Send,
            message: "quota exceeded".into(),
        });
        assert_eq!(state.status(RequestKind::Send).error_message(), Some("quota exceeded"));

        state.apply(StateAction::RequestStarted(RequestKind::Send));
        state.apply(StateAction::RequestSucceeded(RequestKind::Send));
        assert_eq!(state.status(RequestKind::Send), &RequestStatus::Idle);
    }

    #[test]
    fn sign_out_resets_everything() {
        let mut state = AppState::new();
        state.apply(StateAction::SignedIn { user_id: UserId::new("u1") });
        state.apply(StateAction::SetDmChats(vec![chat("x", 1)]));
        state.apply(StateAction::SetMessages(vec![view("a", 1)]));
        state.apply(StateAction::RequestStarted(RequestKind::Fetch));

        state.apply(StateAction::SignedOut);

        assert_eq!(state, AppState::new());
    }

    #[test]
    fn unread_ids_skip_own_and_read_messages() {
        let me = UserId::new("me");
        let mut own = view("own", 1);
        own.author_id = me.clone();
        own.is_read = Some(false);
        let mut unread = view("unread", 2);
        unread.is_read = Some(false);
        let mut read = view("read", 3);
        read.is_read = Some(true);
        let channel_msg = view("plain", 4);

        let mut state = AppState::new();
        state.apply(StateAction::SetMessages(vec![own, unread, read, channel_msg]));

        assert_eq!(state.unread_message_ids(&me), vec![DocId::new("unread")]);
    }
}
