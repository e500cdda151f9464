//! Account ledger
//!
//! The in-memory authoritative table of user accounts. Every balance,
//! medal, and counter mutation passes through here; persistence is
//! decoupled (see [`crate::flush`]).
//!
//! # Invariants
//!
//! - Balances never go negative: `debit` and `transfer` check funds
//!   before mutating and fail without side effects.
//! - Exactly one account per user id.
//! - The message counter stays in `[0, messages_per_reward)`, carrying
//!   the remainder across payouts.
//!
//! All operations are synchronous and take `now` from the caller, so
//! every check-and-mutate is a single non-suspending call even when the
//! decision to make it followed a long external wait.

use crate::{
    config::EconomyConfig,
    error::{Error, Result},
    types::{Account, Coins, Medal, UserId},
};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;

/// Outcome of a weekly claim attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeeklyClaim {
    /// Reward paid out
    Paid(Coins),
    /// Cooldown still running; not an error
    NotYet {
        /// When the next claim is allowed
        next: DateTime<Utc>,
    },
}

/// Outcome of a beg attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BegOutcome {
    /// Somebody felt generous
    Paid(Coins),
    /// The roll failed; counts as an attempt but changes nothing
    Nothing,
}

/// The in-memory account table
///
/// Accounts are kept in registration order; `richest` relies on that
/// order as its deterministic tie-break when balances collide.
pub struct Bank {
    cfg: EconomyConfig,
    accounts: Vec<Account>,
}

impl Bank {
    /// Empty bank
    pub fn new(cfg: EconomyConfig) -> Self {
        Self {
            cfg,
            accounts: Vec::new(),
        }
    }

    /// Bank restored from a snapshot
    pub fn from_accounts(cfg: EconomyConfig, accounts: Vec<Account>) -> Self {
        Self { cfg, accounts }
    }

    fn index_of(&self, id: &UserId) -> Option<usize> {
        self.accounts.iter().position(|a| &a.id == id)
    }

    fn account_mut(&mut self, id: &UserId) -> Result<&mut Account> {
        self.index_of(id)
            .map(move |i| &mut self.accounts[i])
            .ok_or_else(|| Error::NotRegistered(id.clone()))
    }

    /// Create an account with the starting balance
    pub fn register(&mut self, id: &UserId) -> Result<()> {
        if self.index_of(id).is_some() {
            return Err(Error::AlreadyRegistered(id.clone()));
        }

        self.accounts
            .push(Account::new(id.clone(), self.cfg.starting_balance));

        tracing::info!(user = %id, balance = self.cfg.starting_balance, "Account registered");
        Ok(())
    }

    /// Snapshot copy of an account (no aliasing with internal state)
    pub fn account(&self, id: &UserId) -> Result<Account> {
        self.index_of(id)
            .map(|i| self.accounts[i].clone())
            .ok_or_else(|| Error::NotRegistered(id.clone()))
    }

    /// Current balance
    pub fn balance(&self, id: &UserId) -> Result<Coins> {
        Ok(self.account(id)?.balance)
    }

    /// Add coins, returning the new balance
    ///
    /// Never fails for a registered account.
    pub fn credit(&mut self, id: &UserId, amount: Coins) -> Result<Coins> {
        let account = self.account_mut(id)?;
        account.balance = account.balance.saturating_add(amount);
        Ok(account.balance)
    }

    /// Remove coins, returning the new balance
    ///
    /// Fails with `InsufficientFunds` before any mutation.
    pub fn debit(&mut self, id: &UserId, amount: Coins) -> Result<Coins> {
        let account = self.account_mut(id)?;
        if amount > account.balance {
            return Err(Error::InsufficientFunds {
                user: id.clone(),
                needed: amount,
                available: account.balance,
            });
        }

        account.balance -= amount;
        Ok(account.balance)
    }

    /// Move coins between two accounts
    ///
    /// Atomic compound of debit-then-credit: all failure checks run
    /// before either side is touched.
    pub fn transfer(&mut self, from: &UserId, to: &UserId, amount: Coins) -> Result<()> {
        if from == to {
            return Err(Error::InvalidTarget(format!(
                "{} cannot transfer to themselves",
                from
            )));
        }

        let from_idx = self
            .index_of(from)
            .ok_or_else(|| Error::NotRegistered(from.clone()))?;
        let to_idx = self
            .index_of(to)
            .ok_or_else(|| Error::NotRegistered(to.clone()))?;

        if amount > self.accounts[from_idx].balance {
            return Err(Error::InsufficientFunds {
                user: from.clone(),
                needed: amount,
                available: self.accounts[from_idx].balance,
            });
        }

        self.accounts[from_idx].balance -= amount;
        self.accounts[to_idx].balance = self.accounts[to_idx].balance.saturating_add(amount);

        tracing::debug!(from = %from, to = %to, amount, "Transfer");
        Ok(())
    }

    /// Claim the weekly reward
    ///
    /// Pays once per configured interval; the claim timestamp moves only
    /// on payout.
    pub fn claim_weekly(&mut self, id: &UserId, now: DateTime<Utc>) -> Result<WeeklyClaim> {
        let interval = Duration::days(self.cfg.weekly_interval_days);
        let reward = self.cfg.weekly_reward;
        let account = self.account_mut(id)?;

        if let Some(last) = account.last_weekly_claim {
            let next = last + interval;
            if now < next {
                return Ok(WeeklyClaim::NotYet { next });
            }
        }

        account.balance = account.balance.saturating_add(reward);
        account.last_weekly_claim = Some(now);
        Ok(WeeklyClaim::Paid(reward))
    }

    /// Count one message toward the activity reward
    ///
    /// On reaching the threshold the counter resets to the remainder and
    /// the base reward is paid, scaled by the role multiplier the caller
    /// resolved from platform role data. Returns the payout, if any.
    pub fn record_message(&mut self, id: &UserId, multiplier: f64) -> Result<Option<Coins>> {
        let threshold = self.cfg.messages_per_reward;
        let base = self.cfg.message_reward;
        let account = self.account_mut(id)?;

        account.messages += 1;
        if account.messages < threshold {
            return Ok(None);
        }

        account.messages -= threshold;
        let reward = (base as f64 * multiplier.max(0.0)).trunc() as Coins;
        account.balance = account.balance.saturating_add(reward);

        tracing::debug!(user = %id, reward, "Activity reward paid");
        Ok(Some(reward))
    }

    /// Beg for coins
    ///
    /// One attempt per cooldown window; a losing roll is a successful
    /// call with an empty payload and does not start the cooldown.
    pub fn beg<R: Rng>(
        &mut self,
        id: &UserId,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<BegOutcome> {
        let cooldown = Duration::hours(self.cfg.beg_cooldown_hours);
        let odds = self.cfg.beg_win_odds;
        let (min, max) = (self.cfg.beg_reward_min, self.cfg.beg_reward_max);
        let account = self.account_mut(id)?;

        if let Some(last) = account.last_beg {
            let next = last + cooldown;
            if now < next {
                return Err(Error::TooSoon { next });
            }
        }

        if !rng.gen_bool(odds) {
            return Ok(BegOutcome::Nothing);
        }

        let amount = rng.gen_range(min..=max);
        account.balance = account.balance.saturating_add(amount);
        account.last_beg = Some(now);
        Ok(BegOutcome::Paid(amount))
    }

    /// Deduct a moderation penalty, returning the new balance
    ///
    /// Unlike [`debit`](Self::debit), a penalty larger than the balance
    /// empties the account instead of failing; the punished user does
    /// not get to keep their coins by being broke.
    pub fn penalize(&mut self, id: &UserId, amount: Coins) -> Result<Coins> {
        let account = self.account_mut(id)?;
        account.balance = account.balance.saturating_sub(amount);

        tracing::info!(user = %id, amount, balance = account.balance, "Penalty applied");
        Ok(account.balance)
    }

    /// Set the medal bit for a key, returning the new medal set
    pub fn award_medal(&mut self, id: &UserId, key: &str) -> Result<u32> {
        let account = self.account_mut(id)?;
        let medal = Medal::from_key(key).ok_or_else(|| Error::UnknownMedal(key.to_string()))?;
        account.medals |= medal.bit();
        Ok(account.medals)
    }

    /// Clear the medal bit for a key, returning the new medal set
    pub fn revoke_medal(&mut self, id: &UserId, key: &str) -> Result<u32> {
        let account = self.account_mut(id)?;
        let medal = Medal::from_key(key).ok_or_else(|| Error::UnknownMedal(key.to_string()))?;
        account.medals &= !medal.bit();
        Ok(account.medals)
    }

    /// Replace the profile description
    pub fn set_description(&mut self, id: &UserId, text: impl Into<String>) -> Result<()> {
        self.account_mut(id)?.description = text.into();
        Ok(())
    }

    /// Messages remaining until the next activity payout
    pub fn messages_until_reward(&self, id: &UserId) -> Result<u32> {
        let account = self.account(id)?;
        Ok(self.cfg.messages_per_reward - account.messages)
    }

    /// One page of accounts, balance-descending
    ///
    /// Tie-break is registration order: the sort is stable and accounts
    /// are stored in registration order, so equal balances keep it.
    pub fn richest(&self, page: usize, page_size: usize) -> Vec<Account> {
        let mut sorted = self.accounts.clone();
        sorted.sort_by(|a, b| b.balance.cmp(&a.balance));

        sorted
            .into_iter()
            .skip(page * page_size)
            .take(page_size)
            .collect()
    }

    /// Credit `amount` to each listed user, reporting per-user outcomes
    pub fn award_prizes(&mut self, ids: &[UserId], amount: Coins) -> Vec<Result<Coins>> {
        ids.iter().map(|id| self.credit(id, amount)).collect()
    }

    /// Whether the user has an account
    pub fn is_registered(&self, id: &UserId) -> bool {
        self.index_of(id).is_some()
    }

    /// Number of registered accounts
    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Sum of all balances
    pub fn total_coins(&self) -> Coins {
        self.accounts.iter().map(|a| a.balance).sum()
    }

    /// The full account table, in registration order
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }
}
