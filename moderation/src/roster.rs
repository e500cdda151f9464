//! Active mute roster
//!
//! At most one mute per user. Mutes and unmutes persist immediately,
//! independent of the sweep cadence; a muted user staying muted across
//! a restart matters more than write coalescing here.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use treasury_core::{Mute, MuteDuration, Store, UserId};

/// Store collection holding the active mutes
const MUTES_COLLECTION: &str = "mutes";

/// Result of applying a mute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MuteReceipt {
    /// When the mute ends, `None` if indefinite
    pub ends_at: Option<DateTime<Utc>>,

    /// An existing mute for this user was overwritten
    ///
    /// Non-fatal; the command layer turns it into a warning.
    pub replaced_existing: bool,
}

/// The set of active mutes
pub struct MuteRoster {
    mutes: Vec<Mute>,
    store: Arc<Store>,
}

impl MuteRoster {
    /// Load the roster from the store
    ///
    /// A missing collection means nobody is muted.
    pub fn load(store: Arc<Store>) -> Result<Self> {
        let mutes: Vec<Mute> = store.read(MUTES_COLLECTION)?.unwrap_or_default();
        tracing::info!(mutes = mutes.len(), "Mute roster loaded");
        Ok(Self { mutes, store })
    }

    /// Apply a mute, overwriting any existing one for the user
    ///
    /// Persists immediately.
    pub fn mute(
        &mut self,
        user: &UserId,
        duration: MuteDuration,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<MuteReceipt> {
        let replaced_existing = self.remove(user).is_some();
        if replaced_existing {
            tracing::warn!(user = %user, "Overwriting an existing mute");
        }

        let mute = Mute {
            user: user.clone(),
            started_at: now,
            duration,
            reason,
        };
        let ends_at = mute.ends_at();
        self.mutes.push(mute);
        self.persist()?;

        tracing::info!(user = %user, ends_at = ?ends_at, "User muted");
        Ok(MuteReceipt {
            ends_at,
            replaced_existing,
        })
    }

    /// Lift a mute early
    ///
    /// Persists immediately and reports when the mute would have ended
    /// (`None` for indefinite).
    pub fn unmute(&mut self, user: &UserId) -> Result<Option<DateTime<Utc>>> {
        let mute = self
            .remove(user)
            .ok_or_else(|| Error::NotMuted(user.clone()))?;
        self.persist()?;

        tracing::info!(user = %user, "User unmuted");
        Ok(mute.ends_at())
    }

    /// Drop a mute without persisting
    ///
    /// The sweep uses this to batch all expirations from one pass into
    /// a single [`persist`](Self::persist) call.
    pub(crate) fn lift(&mut self, user: &UserId) {
        self.remove(user);
    }

    fn remove(&mut self, user: &UserId) -> Option<Mute> {
        let idx = self.mutes.iter().position(|m| &m.user == user)?;
        Some(self.mutes.remove(idx))
    }

    /// Whether the user is currently muted
    pub fn is_muted(&self, user: &UserId) -> bool {
        self.mutes.iter().any(|m| &m.user == user)
    }

    /// Users whose finite mute has run out at `now`
    pub fn expired(&self, now: DateTime<Utc>) -> Vec<UserId> {
        self.mutes
            .iter()
            .filter(|m| m.expired(now))
            .map(|m| m.user.clone())
            .collect()
    }

    /// All active mutes
    pub fn active(&self) -> &[Mute] {
        &self.mutes
    }

    /// Write the roster to the store
    pub(crate) fn persist(&self) -> Result<()> {
        self.store.write(MUTES_COLLECTION, &self.mutes)?;
        Ok(())
    }
}
