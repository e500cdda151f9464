//! Guild Treasury Mini-Games
//!
//! Time-bounded games layered on the account ledger: a ticket lottery,
//! a staged horse race, a timed giveaway, and a long-running scored
//! tournament. Each kind runs at most one instance at a time, guarded
//! by the `Option` state inside its engine.
//!
//! Engines are synchronous and operate on `&mut Bank`; the async
//! drivers (`run_race`, `run_giveaway`) own the waiting and funnel
//! every ledger mutation through `Treasury::with_bank`, so no lock is
//! ever held across an await.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications, clippy::all)]

pub mod error;
pub mod giveaway;
pub mod lottery;
pub mod race;
pub mod subscription;
pub mod tournament;

pub use error::{Error, GameKind, Result};
pub use giveaway::{run_giveaway, GiveawayEngine, GiveawayOutcome};
pub use lottery::{DrawOutcome, LotteryEngine};
pub use race::{
    run_race, RaceEngine, RaceOutcome, RaceParams, RegistrationOutcome, TickOutcome,
};
pub use subscription::{subscription, Subscription, SubscriptionSink};
pub use tournament::{EntryOutcome, FinishOutcome, Prize, Tournament, TournamentTracker};

use parking_lot::Mutex;
use treasury_core::Store;

/// All game engines under their locks
///
/// One instance per service; timers and command handlers reacquire the
/// per-engine lock when they fire.
pub struct Games {
    /// Ticket lottery
    pub lottery: Mutex<LotteryEngine>,

    /// Staged horse race
    pub race: Mutex<RaceEngine>,

    /// Timed giveaway
    pub giveaway: Mutex<GiveawayEngine>,

    /// Scored tournament
    pub tournament: Mutex<TournamentTracker>,
}

impl Games {
    /// Create with nothing running
    pub fn new() -> Self {
        Self {
            lottery: Mutex::new(LotteryEngine::new()),
            race: Mutex::new(RaceEngine::new()),
            giveaway: Mutex::new(GiveawayEngine::new()),
            tournament: Mutex::new(TournamentTracker::new()),
        }
    }

    /// Create, restoring the tournament from the store
    ///
    /// The short games never survive a restart; the tournament does.
    pub fn load(store: &Store) -> Result<Self> {
        Ok(Self {
            tournament: Mutex::new(TournamentTracker::load(store)?),
            ..Self::new()
        })
    }
}

impl Default for Games {
    fn default() -> Self {
        Self::new()
    }
}
