//! Periodic mute expiry sweep
//!
//! Scans the roster on a fixed cadence, lifts every finite mute that
//! has run out, reverses the platform effect for each, and persists
//! the roster once per pass regardless of how many mutes expired.

use crate::roster::MuteRoster;
use crate::Result;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::time::Duration;
use treasury_core::UserId;

/// Reverses the platform-side mute when a sentence ends
///
/// Implemented by the command layer (role removal, channel overrides).
/// Called synchronously under the roster lock, so implementations must
/// only enqueue work.
pub trait MuteEffect: Send + Sync {
    /// Undo the mute effect for one user
    fn lift(&self, user: &UserId);
}

/// Periodic expiry sweeper
pub struct MuteSweeper {
    roster: Arc<Mutex<MuteRoster>>,
    effect: Arc<dyn MuteEffect>,
    interval: Duration,
}

impl MuteSweeper {
    /// Create a sweeper over a shared roster
    pub fn new(
        roster: Arc<Mutex<MuteRoster>>,
        effect: Arc<dyn MuteEffect>,
        interval: Duration,
    ) -> Self {
        Self {
            roster,
            effect,
            interval,
        }
    }

    /// Run one sweep pass
    ///
    /// Lifts every expired mute and writes the roster once. Returns
    /// the users whose sentence ended this pass.
    pub fn sweep_once(&self, now: DateTime<Utc>) -> Result<Vec<UserId>> {
        let mut roster = self.roster.lock();

        let expired = roster.expired(now);
        if expired.is_empty() {
            return Ok(expired);
        }

        for user in &expired {
            roster.lift(user);
            self.effect.lift(user);
        }
        roster.persist()?;

        tracing::info!(expired = expired.len(), "Mute sweep lifted sentences");
        Ok(expired)
    }

    /// Run the sweep loop until the task is dropped
    ///
    /// Each pass runs on the blocking pool: the store write retries
    /// with a backoff that must not stall the runtime.
    pub async fn run(self) {
        let sweeper = Arc::new(self);
        let mut ticks = tokio::time::interval(sweeper.interval);
        loop {
            ticks.tick().await;
            let pass = sweeper.clone();
            match tokio::task::spawn_blocking(move || pass.sweep_once(Utc::now())).await {
                Ok(Ok(_)) => {}
                // Mutes stay on the roster; next pass retries the write.
                Ok(Err(e)) => tracing::error!(error = %e, "Mute sweep failed"),
                Err(e) => tracing::error!(error = %e, "Mute sweep pass panicked"),
            }
        }
    }
}

/// Spawn the sweep loop as a background task
pub fn spawn_sweeper(
    roster: Arc<Mutex<MuteRoster>>,
    effect: Arc<dyn MuteEffect>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    let sweeper = MuteSweeper::new(roster, effect, interval);
    tokio::spawn(sweeper.run())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use treasury_core::{Config, MuteDuration, Store};

    #[derive(Default)]
    struct RecordingEffect {
        lifted: Mutex<Vec<UserId>>,
    }

    impl MuteEffect for RecordingEffect {
        fn lift(&self, user: &UserId) {
            self.lifted.lock().push(user.clone());
        }
    }

    fn test_parts() -> (Arc<Mutex<MuteRoster>>, Arc<Store>, tempfile::TempDir) {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();
        let store = Arc::new(Store::open(&config).unwrap());
        let roster = Arc::new(Mutex::new(MuteRoster::load(store.clone()).unwrap()));
        (roster, store, temp_dir)
    }

    #[test]
    fn test_sweep_boundary() {
        let (roster, _store, _temp) = test_parts();
        let effect = Arc::new(RecordingEffect::default());
        let sweeper = MuteSweeper::new(roster.clone(), effect.clone(), Duration::from_secs(60));

        let start = Utc::now();
        let duration = ChronoDuration::minutes(10);
        roster
            .lock()
            .mute(
                &UserId::new("alice"),
                MuteDuration::For(duration),
                None,
                start,
            )
            .unwrap();

        // Just before the sentence ends: still muted.
        let before = sweeper
            .sweep_once(start + duration - ChronoDuration::seconds(1))
            .unwrap();
        assert!(before.is_empty());
        assert!(roster.lock().is_muted(&UserId::new("alice")));

        // Just after: lifted, effect reversed.
        let after = sweeper
            .sweep_once(start + duration + ChronoDuration::seconds(1))
            .unwrap();
        assert_eq!(after, vec![UserId::new("alice")]);
        assert!(!roster.lock().is_muted(&UserId::new("alice")));
        assert_eq!(*effect.lifted.lock(), vec![UserId::new("alice")]);
    }

    #[test]
    fn test_indefinite_mute_never_swept() {
        let (roster, _store, _temp) = test_parts();
        let effect = Arc::new(RecordingEffect::default());
        let sweeper = MuteSweeper::new(roster.clone(), effect.clone(), Duration::from_secs(60));

        let start = Utc::now();
        roster
            .lock()
            .mute(&UserId::new("alice"), MuteDuration::Indefinite, None, start)
            .unwrap();

        let swept = sweeper
            .sweep_once(start + ChronoDuration::days(365 * 10))
            .unwrap();
        assert!(swept.is_empty());
        assert!(roster.lock().is_muted(&UserId::new("alice")));
        assert!(effect.lifted.lock().is_empty());
    }

    #[test]
    fn test_sweep_batches_expirations() {
        let (roster, store, _temp) = test_parts();
        let effect = Arc::new(RecordingEffect::default());
        let sweeper = MuteSweeper::new(roster.clone(), effect.clone(), Duration::from_secs(60));

        let start = Utc::now();
        for name in ["a", "b", "c"] {
            roster
                .lock()
                .mute(
                    &UserId::new(name),
                    MuteDuration::For(ChronoDuration::minutes(1)),
                    None,
                    start,
                )
                .unwrap();
        }

        let swept = sweeper
            .sweep_once(start + ChronoDuration::minutes(5))
            .unwrap();
        assert_eq!(swept.len(), 3);
        assert_eq!(effect.lifted.lock().len(), 3);

        let reloaded = MuteRoster::load(store).unwrap();
        assert!(reloaded.active().is_empty());
    }
}
