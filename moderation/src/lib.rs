//! Guild Treasury Moderation
//!
//! The mute roster and its expiry sweep. A mute is either finite or
//! indefinite; finite mutes are lifted by a periodic sweep that batches
//! all expirations from one pass into a single store write. Mutes and
//! explicit unmutes persist immediately.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications, clippy::all)]

pub mod error;
pub mod roster;
pub mod sweep;

pub use error::{Error, Result};
pub use roster::{MuteReceipt, MuteRoster};
pub use sweep::{spawn_sweeper, MuteEffect, MuteSweeper};
