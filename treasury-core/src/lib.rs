//! Guild Treasury Core
//!
//! In-memory account ledger with write-behind snapshot persistence.
//!
//! # Architecture
//!
//! - **Single Writer**: One lock around the bank, never held across an await
//! - **Write-Behind**: Mutations mark the ledger dirty; a flush actor
//!   writes one whole snapshot after a quiet window
//! - **Whole-Document Snapshots**: One versioned JSON file per collection
//! - **Recoverable Outcomes**: Business failures (not registered, broke,
//!   on cooldown) are typed errors the caller turns into user replies
//!
//! # Invariants
//!
//! - Coin conservation: transfers and game pots never mint or burn coins
//! - No negative balances: every debit is checked before it mutates
//! - A rejected operation leaves the ledger untouched

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications, clippy::all)]

pub mod bank;
pub mod config;
pub mod error;
pub mod flush;
pub mod metrics;
pub mod storage;
pub mod treasury;
pub mod types;

// Re-exports
pub use bank::{Bank, BegOutcome, WeeklyClaim};
pub use config::{Config, EconomyConfig, FlushConfig, SweepConfig};
pub use error::{Error, Result};
pub use flush::{spawn_flush_actor, FlushHandle};
pub use metrics::Metrics;
pub use storage::{Store, SNAPSHOT_VERSION};
pub use treasury::Treasury;
pub use types::{Account, Coins, Medal, Mute, MuteDuration, UserId};
