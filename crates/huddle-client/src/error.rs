//! Client-level errors.

use thiserror::Error;

use huddle_core::StoreError;

/// Errors from conversation store operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The backing store rejected or failed the operation.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A DM chat was requested between a user and themselves.
    ///
    /// A chat's participant pair must be two distinct users; the original
    /// send surface never offers self as a peer, so this is rejected
    /// outright rather than modelled.
    #[error("direct message chat requires two distinct participants")]
    SelfChat,
}

impl ClientError {
    /// Returns true if the error means an addressed document is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(err) if err.is_not_found())
    }
}
