//! Observable application state types.
//!
//! The view model the rendering layer reads: normalized messages, the
//! current-conversation selector, and per-family request status. These
//! types carry no protocol detail beyond what the UI needs.

use huddle_core::{DmMessageRef, DocId, MessageRef, Timestamp, UserId};

/// The selected conversation.
///
/// One value selects either a channel or a DM thread, never both; the
/// "exactly one current conversation" invariant is structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConversationId {
    /// A channel, by store id.
    Channel(DocId),
    /// A DM thread, by store id.
    Dm(DocId),
}

impl ConversationId {
    /// The underlying store id.
    pub fn doc_id(&self) -> &DocId {
        match self {
            Self::Channel(id) | Self::Dm(id) => id,
        }
    }

    /// Whether this selects a DM thread.
    pub fn is_dm(&self) -> bool {
        matches!(self, Self::Dm(_))
    }
}

/// A message normalized for display.
///
/// Channel messages and DM messages share one shape here; the read flag
/// only exists for DM messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    /// Store id.
    pub id: DocId,
    /// Author (channel message) or sender (DM message).
    pub author_id: UserId,
    /// Message body.
    pub text: String,
    /// Creation time; primary ordering key.
    pub created_at: Timestamp,
    /// Last edit time.
    pub updated_at: Timestamp,
    /// Whether the body was edited after sending.
    pub is_edited: bool,
    /// Read flag. `None` for channel messages, which have no receipt.
    pub is_read: Option<bool>,
}

impl From<MessageRef> for MessageView {
    fn from(item: MessageRef) -> Self {
        Self {
            id: item.id,
            author_id: item.data.author_id,
            text: item.data.text,
            created_at: item.data.created_at,
            updated_at: item.data.updated_at,
            is_edited: item.data.is_edited,
            is_read: None,
        }
    }
}

impl From<DmMessageRef> for MessageView {
    fn from(item: DmMessageRef) -> Self {
        Self {
            id: item.id,
            author_id: item.data.sender_id,
            text: item.data.text,
            created_at: item.data.created_at,
            updated_at: item.data.updated_at,
            is_edited: item.data.is_edited,
            is_read: Some(item.data.is_read),
        }
    }
}

/// Async operation family tracked by the state store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// One-shot reads: history, lists, directory.
    Fetch,
    /// Creations: messages, channels, chats, workplaces.
    Send,
    /// In-place modifications: edits, renames, read receipts.
    Update,
    /// Deletions.
    Delete,
}

/// Status of one request family.
///
/// `idle → loading → idle | failed`; there is no cancelled state. A failed
/// status retains its message until the family runs again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RequestStatus {
    /// Nothing in flight; last run (if any) succeeded.
    #[default]
    Idle,
    /// A request is in flight.
    Loading,
    /// The last request failed.
    Failed {
        /// The retained failure message.
        message: String,
    },
}

impl RequestStatus {
    /// Whether a request is in flight.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// The retained failure message, if the last request failed.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Failed { message } => Some(message),
            _ => None,
        }
    }
}

/// Status of every request family.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestStatuses {
    fetch: RequestStatus,
    send: RequestStatus,
    update: RequestStatus,
    delete: RequestStatus,
}

impl RequestStatuses {
    /// Status of one family.
    pub fn get(&self, kind: RequestKind) -> &RequestStatus {
        match kind {
            RequestKind::Fetch => &self.fetch,
            RequestKind::Send => &self.send,
            RequestKind::Update => &self.update,
            RequestKind::Delete => &self.delete,
        }
    }

    pub(crate) fn set(&mut self, kind: RequestKind, status: RequestStatus) {
        let slot = match kind {
            RequestKind::Fetch => &mut self.fetch,
            RequestKind::Send => &mut self.send,
            RequestKind::Update => &mut self.update,
            RequestKind::Delete => &mut self.delete,
        };
        *slot = status;
    }
}
