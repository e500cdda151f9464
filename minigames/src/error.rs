//! Error types for the game engines

use thiserror::Error;
use treasury_core::UserId;

/// Result type for game operations
pub type Result<T> = std::result::Result<T, Error>;

/// Which game a duplicate-activity rejection refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameKind {
    /// Ticket lottery
    Lottery,
    /// Staged horse race
    Race,
    /// Timed giveaway
    Giveaway,
    /// Long-running tournament
    Tournament,
}

impl std::fmt::Display for GameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GameKind::Lottery => "lottery",
            GameKind::Race => "race",
            GameKind::Giveaway => "giveaway",
            GameKind::Tournament => "tournament",
        };
        write!(f, "{}", name)
    }
}

/// Game engine errors
///
/// These are recoverable business outcomes the command layer turns into
/// user-facing replies, not process faults.
#[derive(Debug, Error)]
pub enum Error {
    /// A game of this kind is already in progress
    #[error("a {0} is already running")]
    AlreadyRunning(GameKind),

    /// No lottery to act on
    #[error("no lottery is running")]
    NoActiveLottery,

    /// No race to act on
    #[error("no race is running")]
    NoActiveRace,

    /// No giveaway to act on
    #[error("no giveaway is running")]
    NoActiveGiveaway,

    /// No tournament to act on
    #[error("no tournament is running")]
    NoActiveTournament,

    /// The user already holds a stake in this game
    #[error("user {0} already participates")]
    AlreadyParticipated(UserId),

    /// The user is not part of this game
    #[error("user {0} does not participate")]
    NotParticipating(UserId),

    /// Start parameters out of range
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// Nobody to resolve the game for
    #[error("no participants")]
    NoParticipants,

    /// Ledger-side failure
    #[error(transparent)]
    Ledger(#[from] treasury_core::Error),
}
