//! Error types for the treasury

use crate::types::{Coins, UserId};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type for treasury operations
pub type Result<T> = std::result::Result<T, Error>;

/// Treasury errors
///
/// Business outcomes (`NotRegistered`, `InsufficientFunds`, ...) are
/// expected and surfaced to the caller for user-facing messaging.
/// `Storage` and `Serialization` are the only process-level faults.
#[derive(Error, Debug)]
pub enum Error {
    /// User has no account
    #[error("user {0} is not registered")]
    NotRegistered(UserId),

    /// Account already exists
    #[error("user {0} is already registered")]
    AlreadyRegistered(UserId),

    /// Debit or transfer exceeds the available balance
    #[error("user {user} has {available} coins, needs {needed}")]
    InsufficientFunds {
        /// Account that came up short
        user: UserId,
        /// Amount the operation required
        needed: Coins,
        /// Balance at the time of the attempt
        available: Coins,
    },

    /// Transfer target is not acceptable (e.g. self-transfer)
    #[error("invalid transfer target: {0}")]
    InvalidTarget(String),

    /// Beg attempted before the cooldown elapsed
    #[error("too soon, next attempt allowed at {next}")]
    TooSoon {
        /// When the next attempt is allowed
        next: DateTime<Utc>,
    },

    /// Unrecognized medal key
    #[error("unknown medal: {0}")]
    UnknownMedal(String),

    /// Snapshot store error
    #[error("storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Concurrency error (flush actor mailbox closed, etc.)
    #[error("concurrency error: {0}")]
    Concurrency(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
