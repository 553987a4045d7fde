//! State store actions.
//!
//! The only way state changes: one [`StateAction`] applied at a time.
//! List-carrying actions are full replacements (the feed contract), with
//! the single-item [`StateAction::UpsertDmChat`] as the targeted
//! exception.

use huddle_core::{ChannelRef, DmChatRef, UserId, UserRef};

use crate::state::{ConversationId, MessageView, RequestKind};

/// An atomic mutation of the application state.
#[derive(Debug, Clone, PartialEq)]
pub enum StateAction {
    /// The identity provider reported a signed-in user.
    SignedIn {
        /// The signed-in user.
        user_id: UserId,
    },

    /// The identity provider reported sign-out. Resets all state.
    SignedOut,

    /// Replace the user directory.
    SetUsers(Vec<UserRef>),

    /// Replace the channel list, in delivered order.
    SetChannels(Vec<ChannelRef>),

    /// Replace the DM chat list. Stored most recently active first.
    SetDmChats(Vec<DmChatRef>),

    /// Upsert a single DM chat by id. The list is re-sorted afterwards.
    UpsertDmChat(DmChatRef),

    /// Select the current conversation and clear the message slot.
    SelectConversation(ConversationId),

    /// Deselect the current conversation and clear the message slot.
    ClearConversation,

    /// Replace the current message list.
    ///
    /// Used by both history fetches and feed pushes; stored sorted by
    /// `(created_at, id)` and deduplicated by id, whatever order the
    /// writer delivered.
    SetMessages(Vec<MessageView>),

    /// A request family entered flight.
    RequestStarted(RequestKind),

    /// A request family completed successfully.
    RequestSucceeded(RequestKind),

    /// A request family failed; the message is retained.
    RequestFailed {
        /// The failed family.
        kind: RequestKind,
        /// Failure description for the error region.
        message: String,
    },
}
