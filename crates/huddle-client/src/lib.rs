//! Conversation store API.
//!
//! [`ChatApi`] is a thin, stateless, typed façade over the abstract
//! [`DocumentStore`](huddle_core::DocumentStore): every conversation
//! operation the engine performs (channel CRUD, message send/edit/delete,
//! DM thread resolution, read receipts, the user directory, workplaces),
//! expressed as one call that encodes entities, stamps timestamps from the
//! injected clock, and hands raw feeds back to the caller.
//!
//! The façade holds no caches and no subscriptions; lifecycle management
//! belongs to the synchronization layer above it.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod api;
mod channels;
mod dm;
mod error;
mod messages;
mod users;
mod workplaces;

pub use api::ChatApi;
pub use error::ClientError;
