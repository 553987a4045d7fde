//! Core data model and backing-store interface for huddle.
//!
//! Defines the entities shared by every layer of the chat engine, the
//! reference wrappers that flow through subscriptions, and the abstract
//! [`DocumentStore`] interface the rest of the system is written against.
//! No concrete backend lives here; production code plugs in a remote
//! document store, tests plug in the in-memory store from `huddle-harness`.
//!
//! # Components
//!
//! - [`types`]: entities, identifiers, and the [`DocItem`] reference wrapper
//! - [`store`]: the [`DocumentStore`] trait and the [`Subscription`] feed
//! - [`query`]: filter and ordering semantics shared by all store backends
//! - [`clock`]: time source abstraction for deterministic tests
//! - [`error`]: the store-boundary error taxonomy

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod clock;
pub mod error;
pub mod query;
pub mod store;
pub mod types;

pub use clock::{Clock, SystemClock};
pub use error::StoreError;
pub use query::{Direction, Filter, OrderBy, Query};
pub use store::{DocRef, Document, DocumentStore, FeedEvent, Subscription};
pub use types::{
    Channel, ChannelRef, DmChat, DmChatRef, DmMessage, DmMessageRef, DocId, DocItem, LastMessage,
    Message, MessageRef, Timestamp, UserId, UserProfile, UserRef, Workplace, WorkplaceMember,
    WorkplaceRef, WorkplaceRole,
};
