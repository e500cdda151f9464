//! Scored tournament
//!
//! A longer-lived competition layered on the ledger: candidates are
//! charged an entry fee up front, earn points over days or weeks, and
//! the sole top scorer takes the prize. A tie at the top pays nobody
//! and leaves the tournament open until the tie is broken.
//!
//! Unlike the short games, tournament state survives a restart: every
//! mutation writes the `tournament` collection through the store.

use crate::error::{Error, GameKind, Result};
use serde::{Deserialize, Serialize};
use treasury_core::{Bank, Coins, Store, UserId};

/// Store collection holding the active tournament
const TOURNAMENT_COLLECTION: &str = "tournament";

/// What the winner receives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Prize {
    /// Coins credited through the ledger
    Coins(Coins),

    /// Something the admins hand over outside the ledger
    Custom(String),
}

/// A scored participant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    /// The paid-up user
    pub user: UserId,

    /// Points earned so far
    pub points: u64,
}

/// An active tournament
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tournament {
    /// Announcement text shown by the platform layer
    pub announcement: String,

    /// Fee each candidate was charged
    pub entry_cost: Coins,

    /// What the winner receives
    pub prize: Prize,

    /// Paid participants, in charge order
    pub participants: Vec<Participant>,
}

/// Per-candidate result of the entry charge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    /// Charged and entered
    Success,

    /// No ledger account
    NotRegistered,

    /// Could not cover the fee
    NoMoney,
}

/// Outcome of attempting to finish the tournament
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishOutcome {
    /// More than one participant at the top score
    ///
    /// Nobody is paid and the tournament stays open; finish again once
    /// the tie is broken.
    Tie {
        /// All participants at the top score
        tied: Vec<UserId>,
        /// The contested score
        points: u64,
    },

    /// A sole top scorer took the prize
    Winner {
        /// The top scorer
        user: UserId,
        /// Their final score
        points: u64,
        /// What they won
        prize: Prize,
    },
}

/// Tournament tracker, at most one tournament at a time
#[derive(Debug, Default)]
pub struct TournamentTracker {
    active: Option<Tournament>,
}

impl TournamentTracker {
    /// Create a tracker with no tournament running
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore the tracker from the store
    ///
    /// A missing collection means no tournament was running.
    pub fn load(store: &Store) -> Result<Self> {
        let active: Option<Tournament> = store.read(TOURNAMENT_COLLECTION)?.flatten();
        if let Some(t) = &active {
            tracing::info!(
                participants = t.participants.len(),
                "Restored active tournament"
            );
        }
        Ok(Self { active })
    }

    fn persist(&self, store: &Store) -> Result<()> {
        store.write(TOURNAMENT_COLLECTION, &self.active)?;
        Ok(())
    }

    /// Start a tournament by charging every candidate
    ///
    /// A candidate whose charge fails is reported and left out; the
    /// tournament runs with whoever paid. Returns the per-candidate
    /// outcomes in candidate order.
    pub fn begin(
        &mut self,
        bank: &mut Bank,
        store: &Store,
        announcement: impl Into<String>,
        entry_cost: Coins,
        prize: Prize,
        candidates: &[UserId],
    ) -> Result<Vec<(UserId, EntryOutcome)>> {
        if self.active.is_some() {
            return Err(Error::AlreadyRunning(GameKind::Tournament));
        }

        let mut outcomes = Vec::with_capacity(candidates.len());
        let mut participants = Vec::new();
        for user in candidates {
            let outcome = match bank.debit(user, entry_cost) {
                Ok(_) => {
                    participants.push(Participant {
                        user: user.clone(),
                        points: 0,
                    });
                    EntryOutcome::Success
                }
                Err(treasury_core::Error::NotRegistered(_)) => EntryOutcome::NotRegistered,
                Err(treasury_core::Error::InsufficientFunds { .. }) => EntryOutcome::NoMoney,
                Err(e) => return Err(e.into()),
            };
            outcomes.push((user.clone(), outcome));
        }

        tracing::info!(
            candidates = candidates.len(),
            entered = participants.len(),
            "Tournament started"
        );

        self.active = Some(Tournament {
            announcement: announcement.into(),
            entry_cost,
            prize,
            participants,
        });
        self.persist(store)?;

        Ok(outcomes)
    }

    /// Add points to a participant, returning their new score
    pub fn add_point(
        &mut self,
        store: &Store,
        user: &UserId,
        qty: u64,
    ) -> Result<u64> {
        let tournament = self.active.as_mut().ok_or(Error::NoActiveTournament)?;

        let participant = tournament
            .participants
            .iter_mut()
            .find(|p| &p.user == user)
            .ok_or_else(|| Error::NotParticipating(user.clone()))?;

        participant.points += qty;
        let points = participant.points;
        self.persist(store)?;

        Ok(points)
    }

    /// The active tournament, if any
    pub fn current(&self) -> Option<&Tournament> {
        self.active.as_ref()
    }

    /// Try to resolve the tournament
    ///
    /// A unique top scorer wins and the tournament closes; a coin prize
    /// is credited through the ledger, a custom prize is only reported.
    /// A tie at the top resolves nothing: no silent default winner.
    pub fn finish(&mut self, bank: &mut Bank, store: &Store) -> Result<FinishOutcome> {
        let tournament = self.active.as_ref().ok_or(Error::NoActiveTournament)?;

        if tournament.participants.is_empty() {
            return Err(Error::NoParticipants);
        }

        let top = tournament
            .participants
            .iter()
            .map(|p| p.points)
            .max()
            .unwrap_or(0);
        let tied: Vec<UserId> = tournament
            .participants
            .iter()
            .filter(|p| p.points == top)
            .map(|p| p.user.clone())
            .collect();

        if tied.len() > 1 {
            tracing::info!(tied = tied.len(), points = top, "Tournament tied, staying open");
            return Ok(FinishOutcome::Tie { tied, points: top });
        }

        let winner = tied[0].clone();
        let prize = tournament.prize.clone();
        if let Prize::Coins(amount) = prize {
            bank.credit(&winner, amount)?;
        }

        self.active = None;
        self.persist(store)?;

        tracing::info!(winner = %winner, points = top, "Tournament finished");
        Ok(FinishOutcome::Winner {
            user: winner,
            points: top,
            prize,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use treasury_core::{Config, EconomyConfig};

    fn test_store() -> (Store, tempfile::TempDir) {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();
        (Store::open(&config).unwrap(), temp_dir)
    }

    fn bank_with(users: &[&str]) -> Bank {
        let mut bank = Bank::new(EconomyConfig::default());
        for user in users {
            bank.register(&UserId::new(*user)).unwrap();
        }
        bank
    }

    fn candidates(names: &[&str]) -> Vec<UserId> {
        names.iter().map(|n| UserId::new(*n)).collect()
    }

    #[test]
    fn test_begin_records_per_candidate_outcomes() {
        let (store, _temp) = test_store();
        let mut bank = bank_with(&["alice", "bob", "poor"]);
        bank.debit(&UserId::new("poor"), 95).unwrap();

        let mut tracker = TournamentTracker::new();
        let outcomes = tracker
            .begin(
                &mut bank,
                &store,
                "spring cup",
                50,
                Prize::Coins(500),
                &candidates(&["alice", "bob", "poor", "ghost"]),
            )
            .unwrap();

        assert_eq!(outcomes[0].1, EntryOutcome::Success);
        assert_eq!(outcomes[1].1, EntryOutcome::Success);
        assert_eq!(outcomes[2].1, EntryOutcome::NoMoney);
        assert_eq!(outcomes[3].1, EntryOutcome::NotRegistered);

        assert_eq!(tracker.current().unwrap().participants.len(), 2);
        assert_eq!(bank.balance(&UserId::new("alice")).unwrap(), 50);
    }

    #[test]
    fn test_points_require_participation() {
        let (store, _temp) = test_store();
        let mut bank = bank_with(&["alice", "bob"]);

        let mut tracker = TournamentTracker::new();
        tracker
            .begin(
                &mut bank,
                &store,
                "cup",
                10,
                Prize::Coins(100),
                &candidates(&["alice", "bob"]),
            )
            .unwrap();

        assert_eq!(
            tracker.add_point(&store, &UserId::new("alice"), 3).unwrap(),
            3
        );
        assert!(matches!(
            tracker.add_point(&store, &UserId::new("ghost"), 1),
            Err(Error::NotParticipating(_))
        ));
    }

    #[test]
    fn test_tie_leaves_tournament_open_then_winner_closes_it() {
        let (store, _temp) = test_store();
        let mut bank = bank_with(&["alice", "bob", "carol"]);

        let mut tracker = TournamentTracker::new();
        tracker
            .begin(
                &mut bank,
                &store,
                "cup",
                10,
                Prize::Coins(100),
                &candidates(&["alice", "bob", "carol"]),
            )
            .unwrap();

        tracker.add_point(&store, &UserId::new("alice"), 5).unwrap();
        tracker.add_point(&store, &UserId::new("bob"), 5).unwrap();
        tracker.add_point(&store, &UserId::new("carol"), 3).unwrap();

        match tracker.finish(&mut bank, &store).unwrap() {
            FinishOutcome::Tie { tied, points } => {
                assert_eq!(points, 5);
                assert_eq!(tied, candidates(&["alice", "bob"]));
            }
            other => panic!("expected a tie, got {:?}", other),
        }
        assert!(tracker.current().is_some());

        tracker.add_point(&store, &UserId::new("alice"), 1).unwrap();
        match tracker.finish(&mut bank, &store).unwrap() {
            FinishOutcome::Winner { user, points, .. } => {
                assert_eq!(user, UserId::new("alice"));
                assert_eq!(points, 6);
            }
            other => panic!("expected a winner, got {:?}", other),
        }

        assert!(tracker.current().is_none());
        // 100 - 10 entry + 100 prize
        assert_eq!(bank.balance(&UserId::new("alice")).unwrap(), 190);
    }

    #[test]
    fn test_custom_prize_skips_ledger() {
        let (store, _temp) = test_store();
        let mut bank = bank_with(&["alice", "bob"]);

        let mut tracker = TournamentTracker::new();
        tracker
            .begin(
                &mut bank,
                &store,
                "cup",
                10,
                Prize::Custom("a steam key".to_string()),
                &candidates(&["alice", "bob"]),
            )
            .unwrap();
        tracker.add_point(&store, &UserId::new("bob"), 2).unwrap();

        let total_before = bank.total_coins();
        match tracker.finish(&mut bank, &store).unwrap() {
            FinishOutcome::Winner { user, prize, .. } => {
                assert_eq!(user, UserId::new("bob"));
                assert_eq!(prize, Prize::Custom("a steam key".to_string()));
            }
            other => panic!("expected a winner, got {:?}", other),
        }
        assert_eq!(bank.total_coins(), total_before);
    }

    #[test]
    fn test_state_survives_reload() {
        let (store, _temp) = test_store();
        let mut bank = bank_with(&["alice", "bob"]);

        let mut tracker = TournamentTracker::new();
        tracker
            .begin(
                &mut bank,
                &store,
                "cup",
                10,
                Prize::Coins(100),
                &candidates(&["alice", "bob"]),
            )
            .unwrap();
        tracker.add_point(&store, &UserId::new("alice"), 4).unwrap();

        let restored = TournamentTracker::load(&store).unwrap();
        let tournament = restored.current().unwrap();
        assert_eq!(tournament.announcement, "cup");
        assert_eq!(tournament.participants[0].points, 4);

        // Finishing clears the stored document too.
        tracker.finish(&mut bank, &store).unwrap();
        let empty = TournamentTracker::load(&store).unwrap();
        assert!(empty.current().is_none());
    }
}
