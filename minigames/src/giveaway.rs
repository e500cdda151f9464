//! Timed giveaway
//!
//! An admin stakes a prize and opens an entry window. Entering is free
//! for any registered user; when the window elapses one entrant is
//! drawn uniformly and credited the prize.

use crate::error::{Error, GameKind, Result};
use crate::subscription::Subscription;
use parking_lot::Mutex;
use rand::Rng;
use tokio::time::Duration;
use treasury_core::{Bank, Coins, Treasury, UserId};

/// An open giveaway
#[derive(Debug, Clone)]
pub struct Giveaway {
    /// Prize credited to the drawn entrant
    pub prize: Coins,

    /// Length of the entry window
    pub duration: Duration,

    /// Distinct entrants, in entry order
    pub entrants: Vec<UserId>,
}

/// Outcome of closing the entry window
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GiveawayOutcome {
    /// The window closed with no entrants
    NobodyParticipated,

    /// An entrant was drawn and credited
    Winner {
        /// The drawn entrant
        user: UserId,
        /// Prize credited
        amount: Coins,
    },
}

/// Giveaway engine, at most one giveaway at a time
#[derive(Debug, Default)]
pub struct GiveawayEngine {
    active: Option<Giveaway>,
}

impl GiveawayEngine {
    /// Create an engine with no giveaway running
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a giveaway
    pub fn start(&mut self, prize: Coins, duration: Duration) -> Result<()> {
        if self.active.is_some() {
            return Err(Error::AlreadyRunning(GameKind::Giveaway));
        }
        if prize == 0 {
            return Err(Error::InvalidParameters(
                "prize must be positive".to_string(),
            ));
        }
        if duration.is_zero() {
            return Err(Error::InvalidParameters(
                "window must be positive".to_string(),
            ));
        }

        tracing::info!(prize, window_secs = duration.as_secs(), "Giveaway opened");
        self.active = Some(Giveaway {
            prize,
            duration,
            entrants: Vec::new(),
        });
        Ok(())
    }

    /// Enter the open giveaway
    ///
    /// Free, but only registered users are eligible, and each user
    /// enters once.
    pub fn enter(&mut self, bank: &Bank, user: &UserId) -> Result<()> {
        let giveaway = self.active.as_mut().ok_or(Error::NoActiveGiveaway)?;

        if !bank.is_registered(user) {
            return Err(treasury_core::Error::NotRegistered(user.clone()).into());
        }
        if giveaway.entrants.contains(user) {
            return Err(Error::AlreadyParticipated(user.clone()));
        }

        giveaway.entrants.push(user.clone());
        Ok(())
    }

    /// Entry window length of the open giveaway
    pub fn window(&self) -> Result<Duration> {
        let giveaway = self.active.as_ref().ok_or(Error::NoActiveGiveaway)?;
        Ok(giveaway.duration)
    }

    /// Whether a giveaway is open
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Close the window, draw a winner, and end the giveaway
    pub fn close<R: Rng>(&mut self, bank: &mut Bank, rng: &mut R) -> Result<GiveawayOutcome> {
        let giveaway = self.active.take().ok_or(Error::NoActiveGiveaway)?;

        if giveaway.entrants.is_empty() {
            tracing::info!("Giveaway closed with no entrants");
            return Ok(GiveawayOutcome::NobodyParticipated);
        }

        let idx = rng.gen_range(0..giveaway.entrants.len());
        let winner = giveaway.entrants[idx].clone();
        bank.credit(&winner, giveaway.prize)?;

        tracing::info!(winner = %winner, prize = giveaway.prize, entrants = giveaway.entrants.len(), "Giveaway resolved");
        Ok(GiveawayOutcome::Winner {
            user: winner,
            amount: giveaway.prize,
        })
    }
}

/// Drive a started giveaway to its resolution
///
/// Drains the entry window, then draws the winner. Rejected entries
/// (unregistered, duplicate) are logged and skipped.
pub async fn run_giveaway(
    treasury: &Treasury,
    engine: &Mutex<GiveawayEngine>,
    mut entries: Subscription<UserId>,
) -> Result<GiveawayOutcome> {
    while let Some(user) = entries.next().await {
        let entered = treasury.read_bank(|bank| engine.lock().enter(bank, &user));
        if let Err(e) = entered {
            tracing::debug!(user = %user, error = %e, "Giveaway entry rejected");
        }
    }

    let outcome = treasury.with_bank(|bank| engine.lock().close(bank, &mut rand::thread_rng()))?;
    if let GiveawayOutcome::Winner { amount, .. } = &outcome {
        treasury.record_game_payout(*amount);
    }
    Ok(outcome)
}
