//! Session-level errors.

use thiserror::Error;

use huddle_client::ClientError;

/// Errors from session operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// A conversation store operation failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// An operation required a signed-in user.
    #[error("no user is signed in")]
    NotSignedIn,

    /// An operation required a selected conversation.
    #[error("no conversation is selected")]
    NoConversation,
}
