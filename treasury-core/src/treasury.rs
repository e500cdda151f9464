//! Main treasury orchestration layer
//!
//! This module ties together the bank, snapshot store, and flush actor
//! into a high-level API for command handlers.
//!
//! # Example
//!
//! ```no_run
//! use treasury_core::{Config, Treasury, UserId};
//!
//! #[tokio::main]
//! async fn main() -> treasury_core::Result<()> {
//!     let config = Config::default();
//!     let treasury = Treasury::open(config).await?;
//!
//!     treasury.register(&UserId::new("user-1"))?;
//!     let balance = treasury.balance(&UserId::new("user-1"))?;
//!     println!("balance: {balance}");
//!
//!     treasury.shutdown().await?;
//!     Ok(())
//! }
//! ```

use crate::{
    bank::{Bank, BegOutcome, WeeklyClaim},
    flush::{spawn_flush_actor, FlushHandle},
    metrics::Metrics,
    storage::Store,
    types::{Account, Coins, UserId},
    Config, Result,
};
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::time::Duration;

/// Main treasury interface
///
/// Owns the authoritative in-memory bank and the optional-state game
/// singletons' persistence path. One instance per guild; command
/// handlers get it injected rather than reaching for globals.
pub struct Treasury {
    /// Authoritative account table
    bank: Arc<Mutex<Bank>>,

    /// Snapshot store (shared with moderation and the tournament)
    store: Arc<Store>,

    /// Write-behind persistence handle
    flush: FlushHandle,

    /// Metrics collector
    metrics: Metrics,
}

impl Treasury {
    /// Open the treasury with configuration
    ///
    /// Loads the account table from the store. A corrupt snapshot is a
    /// hard error: starting with an empty ledger would lose balances.
    /// A missing snapshot means a fresh install and starts empty.
    pub async fn open(config: Config) -> Result<Self> {
        let store = Arc::new(Store::open(&config)?);

        let accounts: Vec<Account> = store.read("accounts")?.unwrap_or_default();
        tracing::info!(accounts = accounts.len(), "Account table loaded");

        let metrics = Metrics::default();
        metrics.accounts.set(accounts.len() as i64);

        let bank = Arc::new(Mutex::new(Bank::from_accounts(
            config.economy.clone(),
            accounts,
        )));

        let flush = spawn_flush_actor(
            store.clone(),
            bank.clone(),
            Duration::from_millis(config.flush.debounce_ms),
            metrics.clone(),
        );

        Ok(Self {
            bank,
            store,
            flush,
            metrics,
        })
    }

    /// Create an account
    pub fn register(&self, id: &UserId) -> Result<()> {
        self.bank.lock().register(id)?;
        self.metrics.record_registration();
        self.flush.mark_dirty();
        Ok(())
    }

    /// Current balance
    pub fn balance(&self, id: &UserId) -> Result<Coins> {
        self.bank.lock().balance(id)
    }

    /// Snapshot copy of an account
    pub fn account(&self, id: &UserId) -> Result<Account> {
        self.bank.lock().account(id)
    }

    /// Whether the user has an account
    pub fn is_registered(&self, id: &UserId) -> bool {
        self.bank.lock().is_registered(id)
    }

    /// Add coins to an account
    pub fn credit(&self, id: &UserId, amount: Coins) -> Result<Coins> {
        let balance = self.bank.lock().credit(id, amount)?;
        self.flush.mark_dirty();
        Ok(balance)
    }

    /// Remove coins from an account
    pub fn debit(&self, id: &UserId, amount: Coins) -> Result<Coins> {
        let balance = self.bank.lock().debit(id, amount)?;
        self.flush.mark_dirty();
        Ok(balance)
    }

    /// Move coins between accounts
    pub fn transfer(&self, from: &UserId, to: &UserId, amount: Coins) -> Result<()> {
        self.bank.lock().transfer(from, to, amount)?;
        self.metrics.record_transfer();
        self.flush.mark_dirty();
        Ok(())
    }

    /// Claim the weekly reward
    pub fn claim_weekly(&self, id: &UserId) -> Result<WeeklyClaim> {
        let claim = self.bank.lock().claim_weekly(id, Utc::now())?;
        if matches!(claim, WeeklyClaim::Paid(_)) {
            self.flush.mark_dirty();
        }
        Ok(claim)
    }

    /// Count one message toward the activity reward
    ///
    /// The multiplier comes from the platform role resolver.
    pub fn record_message(&self, id: &UserId, multiplier: f64) -> Result<Option<Coins>> {
        let payout = self.bank.lock().record_message(id, multiplier)?;
        self.flush.mark_dirty();
        Ok(payout)
    }

    /// Beg for coins
    pub fn beg(&self, id: &UserId) -> Result<BegOutcome> {
        let outcome = self
            .bank
            .lock()
            .beg(id, Utc::now(), &mut rand::thread_rng())?;
        if matches!(outcome, BegOutcome::Paid(_)) {
            self.flush.mark_dirty();
        }
        Ok(outcome)
    }

    /// Deduct a moderation penalty, clamping at zero
    pub fn penalize(&self, id: &UserId, amount: Coins) -> Result<Coins> {
        let balance = self.bank.lock().penalize(id, amount)?;
        self.flush.mark_dirty();
        Ok(balance)
    }

    /// Award a medal by key
    pub fn award_medal(&self, id: &UserId, key: &str) -> Result<u32> {
        let bits = self.bank.lock().award_medal(id, key)?;
        self.flush.mark_dirty();
        Ok(bits)
    }

    /// Revoke a medal by key
    pub fn revoke_medal(&self, id: &UserId, key: &str) -> Result<u32> {
        let bits = self.bank.lock().revoke_medal(id, key)?;
        self.flush.mark_dirty();
        Ok(bits)
    }

    /// Replace a profile description
    pub fn set_description(&self, id: &UserId, text: impl Into<String>) -> Result<()> {
        self.bank.lock().set_description(id, text)?;
        self.flush.mark_dirty();
        Ok(())
    }

    /// Messages remaining until the next activity payout
    pub fn messages_until_reward(&self, id: &UserId) -> Result<u32> {
        self.bank.lock().messages_until_reward(id)
    }

    /// One page of accounts, balance-descending
    pub fn richest(&self, page: usize, page_size: usize) -> Vec<Account> {
        self.bank.lock().richest(page, page_size)
    }

    /// Number of registered accounts
    pub fn account_count(&self) -> usize {
        self.bank.lock().account_count()
    }

    /// Run a closure against the bank under the single-writer lock
    ///
    /// Game engines use this so a check-and-mutate is one non-suspending
    /// call; the lock is never held across an await. The ledger is
    /// marked dirty only when the closure succeeds; a rejected operation
    /// mutated nothing and schedules no snapshot.
    pub fn with_bank<T, E>(
        &self,
        f: impl FnOnce(&mut Bank) -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E> {
        let result = {
            let mut bank = self.bank.lock();
            f(&mut bank)
        };
        if result.is_ok() {
            self.flush.mark_dirty();
        }
        result
    }

    /// Run a read-only closure against the bank
    ///
    /// Like [`with_bank`](Self::with_bank) but does not mark the ledger
    /// dirty.
    pub fn read_bank<R>(&self, f: impl FnOnce(&Bank) -> R) -> R {
        let bank = self.bank.lock();
        f(&bank)
    }

    /// Record coins paid out by a game engine
    pub fn record_game_payout(&self, coins: Coins) {
        self.metrics.record_game_payout(coins);
    }

    /// Snapshot store shared with moderation and the tournament tracker
    pub fn store(&self) -> Arc<Store> {
        self.store.clone()
    }

    /// Metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Write the account snapshot immediately
    pub async fn flush_now(&self) -> Result<()> {
        self.flush.flush_now().await
    }

    /// Final flush, then stop the flush actor
    pub async fn shutdown(self) -> Result<()> {
        self.flush.shutdown().await
    }
}
