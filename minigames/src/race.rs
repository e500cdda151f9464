//! Staged horse race
//!
//! A race runs in two phases. During registration users opt in for
//! free; when the window closes up to `max_participants` of them are
//! charged the entry fee and become horses. The race then advances in
//! ticks: each tick every horse moves one step with probability 0.75,
//! and the first horse (by entry order) to cover the track wins the
//! whole pot.

use crate::error::{Error, GameKind, Result};
use crate::subscription::Subscription;
use parking_lot::Mutex;
use rand::Rng;
use tokio::time::Duration;
use treasury_core::{Bank, Coins, Treasury, UserId};

/// Per-tick chance that a horse advances one step
const ADVANCE_ODDS: f64 = 0.75;

/// Race start parameters
#[derive(Debug, Clone)]
pub struct RaceParams {
    /// Fee charged when registration closes
    pub entry_cost: Coins,

    /// Most horses allowed on the track
    pub max_participants: usize,

    /// Steps a horse must cover to finish
    pub race_length: u32,

    /// Length of the registration window in seconds
    pub registration_secs: u64,
}

impl RaceParams {
    fn validate(&self) -> Result<()> {
        if self.registration_secs < 10 {
            return Err(Error::InvalidParameters(
                "registration window must be at least 10 seconds".to_string(),
            ));
        }
        if self.race_length < 5 {
            return Err(Error::InvalidParameters(
                "race length must be at least 5".to_string(),
            ));
        }
        if self.entry_cost < 10 {
            return Err(Error::InvalidParameters(
                "entry cost must be at least 10".to_string(),
            ));
        }
        if self.max_participants < 2 {
            return Err(Error::InvalidParameters(
                "at least 2 participants must be allowed".to_string(),
            ));
        }
        Ok(())
    }
}

/// One horse on the track
#[derive(Debug, Clone)]
pub struct Horse {
    /// The user who paid the entry fee
    pub owner: UserId,

    /// Steps covered so far
    pub progress: u32,
}

#[derive(Debug)]
enum Phase {
    Registering { opted_in: Vec<UserId> },
    Running { horses: Vec<Horse>, tick: u32 },
}

#[derive(Debug)]
struct Race {
    params: RaceParams,
    phase: Phase,
}

/// Why an opted-in user did not make it onto the track
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No ledger account
    NotRegistered,

    /// Could not cover the entry fee
    NoMoney,
}

/// An opted-in user skipped when registration closed
#[derive(Debug, Clone)]
pub struct EntrySkip {
    /// The skipped user
    pub user: UserId,

    /// Why the entry fee was not charged
    pub reason: SkipReason,
}

/// Result of closing the registration window
#[derive(Debug)]
pub enum RegistrationOutcome {
    /// Fewer than two paid entrants; the race is off
    ///
    /// Entry fees already charged are kept.
    Aborted {
        /// Users whose charge failed
        skipped: Vec<EntrySkip>,
    },

    /// The race is on
    Started {
        /// Paid entrants, in opt-in order
        entrants: Vec<UserId>,
        /// Users whose charge failed
        skipped: Vec<EntrySkip>,
    },
}

/// Result of one simulation tick
#[derive(Debug)]
pub enum TickOutcome {
    /// No horse has finished yet
    Progress,

    /// The race is over
    Finished {
        /// Owner of the first horse over the line
        winner: UserId,
        /// Pot credited to the winner
        amount: Coins,
        /// Tick the race ended on
        tick: u32,
    },
}

/// Final result of a driven race
#[derive(Debug)]
pub enum RaceOutcome {
    /// Not enough paid entrants; fees already charged are kept
    Aborted {
        /// Users whose charge failed
        skipped: Vec<EntrySkip>,
    },

    /// The race ran to completion
    Finished {
        /// Owner of the winning horse
        winner: UserId,
        /// Pot credited to the winner
        amount: Coins,
        /// Tick the race ended on
        tick: u32,
    },
}

/// Race engine, at most one race at a time
#[derive(Debug, Default)]
pub struct RaceEngine {
    active: Option<Race>,
}

impl RaceEngine {
    /// Create an engine with no race running
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a race for registration
    pub fn start(&mut self, params: RaceParams) -> Result<()> {
        if self.active.is_some() {
            return Err(Error::AlreadyRunning(GameKind::Race));
        }
        params.validate()?;

        tracing::info!(
            entry_cost = params.entry_cost,
            race_length = params.race_length,
            max_participants = params.max_participants,
            "Race registration opened"
        );

        self.active = Some(Race {
            params,
            phase: Phase::Registering {
                opted_in: Vec::new(),
            },
        });
        Ok(())
    }

    /// Record an opt-in during the registration window
    ///
    /// Opting in is free; the fee is charged when the window closes.
    pub fn opt_in(&mut self, user: &UserId) -> Result<()> {
        let race = self.active.as_mut().ok_or(Error::NoActiveRace)?;

        match &mut race.phase {
            Phase::Registering { opted_in } => {
                if opted_in.contains(user) {
                    return Err(Error::AlreadyParticipated(user.clone()));
                }
                opted_in.push(user.clone());
                Ok(())
            }
            Phase::Running { .. } => Err(Error::AlreadyRunning(GameKind::Race)),
        }
    }

    /// Close registration and charge the entry fees
    ///
    /// Up to `max_participants` opted-in users are charged in opt-in
    /// order; a failed charge skips that user and the race goes on.
    /// Fewer than two paid entrants aborts the race. Fees already
    /// charged stay charged, and the engine frees the slot either way.
    pub fn close_registration(&mut self, bank: &mut Bank) -> Result<RegistrationOutcome> {
        let race = self.active.as_mut().ok_or(Error::NoActiveRace)?;

        let opted_in = match &race.phase {
            Phase::Registering { opted_in } => opted_in.clone(),
            Phase::Running { .. } => return Err(Error::AlreadyRunning(GameKind::Race)),
        };

        let mut entrants = Vec::new();
        let mut skipped = Vec::new();
        for user in opted_in.into_iter().take(race.params.max_participants) {
            match bank.debit(&user, race.params.entry_cost) {
                Ok(_) => entrants.push(user),
                Err(treasury_core::Error::NotRegistered(_)) => {
                    tracing::warn!(user = %user, "Race entrant has no account, skipping");
                    skipped.push(EntrySkip {
                        user,
                        reason: SkipReason::NotRegistered,
                    });
                }
                Err(treasury_core::Error::InsufficientFunds { .. }) => {
                    tracing::warn!(user = %user, "Race entrant cannot pay the fee, skipping");
                    skipped.push(EntrySkip {
                        user,
                        reason: SkipReason::NoMoney,
                    });
                }
                Err(e) => return Err(e.into()),
            }
        }

        if entrants.len() < 2 {
            tracing::info!(paid = entrants.len(), "Race aborted, not enough entrants");
            self.active = None;
            return Ok(RegistrationOutcome::Aborted { skipped });
        }

        tracing::info!(entrants = entrants.len(), "Race started");
        race.phase = Phase::Running {
            horses: entrants
                .iter()
                .map(|owner| Horse {
                    owner: owner.clone(),
                    progress: 0,
                })
                .collect(),
            tick: 0,
        };

        Ok(RegistrationOutcome::Started { entrants, skipped })
    }

    /// Advance the race one tick
    ///
    /// The winner is the first horse in entry order whose progress
    /// reaches the track length, so a multi-finish tick goes to the
    /// earlier entrant.
    pub fn tick<R: Rng>(&mut self, bank: &mut Bank, rng: &mut R) -> Result<TickOutcome> {
        let race = self.active.as_mut().ok_or(Error::NoActiveRace)?;

        let (length, entry_cost) = (race.params.race_length, race.params.entry_cost);
        let (horses, tick) = match &mut race.phase {
            Phase::Running { horses, tick } => (horses, tick),
            Phase::Registering { .. } => return Err(Error::NoActiveRace),
        };

        *tick += 1;
        for horse in horses.iter_mut() {
            if rng.gen_bool(ADVANCE_ODDS) {
                horse.progress += 1;
            }
        }

        let finisher = horses.iter().find(|h| h.progress >= length);
        let Some(winner) = finisher.map(|h| h.owner.clone()) else {
            return Ok(TickOutcome::Progress);
        };

        let amount = horses.len() as Coins * entry_cost;
        let ended_on = *tick;
        bank.credit(&winner, amount)?;
        self.active = None;

        tracing::info!(winner = %winner, amount, tick = ended_on, "Race finished");
        Ok(TickOutcome::Finished {
            winner,
            amount,
            tick: ended_on,
        })
    }

    /// Current standings, in entry order
    pub fn standings(&self) -> Result<Vec<(UserId, u32)>> {
        let race = self.active.as_ref().ok_or(Error::NoActiveRace)?;
        match &race.phase {
            Phase::Running { horses, .. } => Ok(horses
                .iter()
                .map(|h| (h.owner.clone(), h.progress))
                .collect()),
            Phase::Registering { .. } => Err(Error::NoActiveRace),
        }
    }

    /// Whether a race (either phase) is in progress
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }
}

/// Drive a started race to its end
///
/// Drains the registration window, charges the fees, then advances the
/// race once per `tick_every` until a horse wins. The caller starts the
/// engine and opens the subscription; every ledger mutation goes
/// through [`Treasury::with_bank`] so the lock is never held across an
/// await.
pub async fn run_race(
    treasury: &Treasury,
    engine: &Mutex<RaceEngine>,
    mut registrations: Subscription<UserId>,
    tick_every: Duration,
) -> Result<RaceOutcome> {
    while let Some(user) = registrations.next().await {
        if let Err(e) = engine.lock().opt_in(&user) {
            tracing::debug!(user = %user, error = %e, "Race opt-in rejected");
        }
    }

    match treasury.with_bank(|bank| engine.lock().close_registration(bank))? {
        RegistrationOutcome::Aborted { skipped } => {
            return Ok(RaceOutcome::Aborted { skipped });
        }
        RegistrationOutcome::Started { .. } => {}
    }

    let mut ticks = tokio::time::interval(tick_every);
    ticks.tick().await;
    loop {
        ticks.tick().await;
        let outcome =
            treasury.with_bank(|bank| engine.lock().tick(bank, &mut rand::thread_rng()))?;
        if let TickOutcome::Finished {
            winner,
            amount,
            tick,
        } = outcome
        {
            treasury.record_game_payout(amount);
            return Ok(RaceOutcome::Finished {
                winner,
                amount,
                tick,
            });
        }
    }
}
