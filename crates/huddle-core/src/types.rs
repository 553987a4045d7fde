//! Entities, identifiers, and reference wrappers.
//!
//! These are the data shapes shared by every layer: plain serde structs that
//! round-trip through store documents. Wire field names are the struct field
//! names (`snake_case`). Entities carry no behavior beyond construction
//! helpers; everything above this module operates on them.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    error::StoreError,
    store::{DocRef, decode},
};

/// Opaque store-assigned document identifier.
///
/// Ordering is the store's id order: lexicographic, arbitrary but stable.
/// It is the tie-breaker for every timestamp-ordered collection.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocId(String);

impl DocId {
    /// Wrap a raw store id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for DocId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// External identity-provider user id.
///
/// Not store-assigned: the identity provider owns this namespace. User
/// profile documents are keyed by it directly.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap a raw identity id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<&UserId> for DocId {
    fn from(uid: &UserId) -> Self {
        Self::new(uid.as_str())
    }
}

/// Wall-clock timestamp in milliseconds since the Unix epoch.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Construct from milliseconds since the Unix epoch.
    pub fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Milliseconds since the Unix epoch.
    pub fn as_millis(self) -> u64 {
        self.0
    }
}

/// A group conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Display name. The only editable field.
    pub name: String,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last rename time. Absent until the first rename.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

/// A message inside a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Author. Immutable; edits never reassign authorship.
    pub author_id: UserId,
    /// Owning channel. A message never moves between channels.
    pub channel_id: DocId,
    /// Message body.
    pub text: String,
    /// Creation time. Primary ordering key within a channel.
    pub created_at: Timestamp,
    /// Last edit time; equals `created_at` until edited.
    pub updated_at: Timestamp,
    /// Whether the body was edited after sending.
    pub is_edited: bool,
}

/// Denormalized preview of the newest message in a DM chat.
///
/// Maintained by the send path so chat lists render without fetching
/// history. Best-effort: the preview write is separate from the message
/// write and may lag behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastMessage {
    /// Body of the newest message.
    pub text: String,
    /// Sender of the newest message.
    pub sender_id: UserId,
    /// Send time of the newest message.
    pub sent_at: Timestamp,
}

/// A one-to-one conversation between two users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmChat {
    /// Exactly two distinct participants. Immutable after creation.
    pub participants: Vec<UserId>,
    /// Creation time.
    pub created_at: Timestamp,
    /// Bumped on every send; the DM list sorts by it, newest first.
    pub updated_at: Timestamp,
    /// Preview of the newest message. Absent until the first send.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message: Option<LastMessage>,
}

impl DmChat {
    /// Whether `user` is one of the two participants.
    pub fn has_participant(&self, user: &UserId) -> bool {
        self.participants.iter().any(|p| p == user)
    }
}

/// A message inside a DM chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmMessage {
    /// Sender. Immutable; edits never reassign authorship.
    pub sender_id: UserId,
    /// Owning chat. A message never moves between chats.
    pub dm_chat_id: DocId,
    /// Message body.
    pub text: String,
    /// Creation time. Primary ordering key within a chat.
    pub created_at: Timestamp,
    /// Last edit time; equals `created_at` until edited.
    pub updated_at: Timestamp,
    /// Whether the body was edited after sending.
    pub is_edited: bool,
    /// Whether the recipient has read the message.
    pub is_read: bool,
}

/// A user's directory profile.
///
/// Keyed by [`UserId`], not by a store-assigned id. Created on first
/// sign-in from the identity provider's profile data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Display name from the identity provider.
    pub display_name: String,
    /// Email from the identity provider.
    pub email: String,
    /// Avatar URL. Empty string when the provider supplies none.
    pub profile_picture: String,
    /// Presence-adjacent online flag.
    pub is_online: bool,
}

/// Member role within a workplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkplaceRole {
    /// Created the workplace.
    Owner,
    /// Can manage members.
    Admin,
    /// Regular member.
    Member,
    /// Limited external participant.
    Guest,
}

/// A workplace grouping users, channels, and chats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workplace {
    /// Display name.
    pub name: String,
    /// The creating user.
    pub owner_id: UserId,
    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last modification time.
    pub updated_at: Timestamp,
    /// Optional icon URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

/// A user's membership in a workplace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkplaceMember {
    /// The workplace joined.
    pub workplace_id: DocId,
    /// The joining user.
    pub user_id: UserId,
    /// Role within the workplace.
    pub role: WorkplaceRole,
    /// Join time.
    pub joined_at: Timestamp,
}

/// An entity paired with its store id.
///
/// The unit that flows through subscriptions and into the application
/// state: the store assigns ids, so an entity on its own cannot be
/// addressed for updates or deletes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocItem<T> {
    /// Store-assigned id.
    pub id: DocId,
    /// The entity.
    pub data: T,
}

impl<T: DeserializeOwned> DocItem<T> {
    /// Decode a raw store document into a typed reference.
    pub fn decode(raw: DocRef) -> Result<Self, StoreError> {
        Ok(Self { id: raw.id, data: decode(raw.doc)? })
    }
}

/// A channel with its store id.
pub type ChannelRef = DocItem<Channel>;
/// A channel message with its store id.
pub type MessageRef = DocItem<Message>;
/// A DM chat with its store id.
pub type DmChatRef = DocItem<DmChat>;
/// A DM message with its store id.
pub type DmMessageRef = DocItem<DmMessage>;
/// A user profile with its identity id.
pub type UserRef = DocItem<UserProfile>;
/// A workplace with its store id.
pub type WorkplaceRef = DocItem<Workplace>;

/// Logical collection names in the backing store.
pub mod collections {
    /// Channels.
    pub const CHANNELS: &str = "channels";
    /// Channel messages, tagged with `channel_id`.
    pub const MESSAGES: &str = "messages";
    /// DM chats, tagged with a two-element `participants` array.
    pub const DM_CHATS: &str = "dm_chats";
    /// DM messages, tagged with `dm_chat_id`.
    pub const DM_MESSAGES: &str = "dm_messages";
    /// User profiles, keyed by identity id.
    pub const USERS: &str = "users";
    /// Workplaces.
    pub const WORKPLACES: &str = "workplaces";
    /// Workplace memberships.
    pub const WORKPLACE_MEMBERS: &str = "workplace_members";
}

/// Document field names used in filters and patches.
///
/// Must match the serde field names of the entities above.
pub mod fields {
    /// `Channel::name`.
    pub const NAME: &str = "name";
    /// `Message::channel_id`.
    pub const CHANNEL_ID: &str = "channel_id";
    /// `DmMessage::dm_chat_id`.
    pub const DM_CHAT_ID: &str = "dm_chat_id";
    /// `DmChat::participants`.
    pub const PARTICIPANTS: &str = "participants";
    /// Creation timestamp, shared by every entity.
    pub const CREATED_AT: &str = "created_at";
    /// Modification timestamp, shared by every entity.
    pub const UPDATED_AT: &str = "updated_at";
    /// Message body.
    pub const TEXT: &str = "text";
    /// Edit marker on messages.
    pub const IS_EDITED: &str = "is_edited";
    /// Read marker on DM messages.
    pub const IS_READ: &str = "is_read";
    /// `DmChat::last_message` preview.
    pub const LAST_MESSAGE: &str = "last_message";
    /// `WorkplaceMember::user_id`.
    pub const USER_ID: &str = "user_id";
    /// `UserProfile::is_online`.
    pub const IS_ONLINE: &str = "is_online";
}
