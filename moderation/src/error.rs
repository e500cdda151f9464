//! Error types for moderation

use thiserror::Error;
use treasury_core::UserId;

/// Result type for moderation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Moderation errors
#[derive(Debug, Error)]
pub enum Error {
    /// No active mute for this user
    #[error("user {0} is not muted")]
    NotMuted(UserId),

    /// Store-side failure
    #[error(transparent)]
    Ledger(#[from] treasury_core::Error),
}
