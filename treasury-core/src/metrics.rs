//! Metrics collection for observability
//!
//! Prometheus metrics for monitoring the treasury.
//!
//! # Metrics
//!
//! - `treasury_registrations_total` - Accounts created
//! - `treasury_transfers_total` - Completed transfers
//! - `treasury_game_payouts_total` - Coins paid out by game engines
//! - `treasury_flushes_total` - Snapshot writes
//! - `treasury_flush_duration_seconds` - Histogram of snapshot write latencies
//! - `treasury_accounts` - Current account count

use prometheus::{Histogram, HistogramOpts, IntCounter, IntGauge, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Accounts created
    pub registrations_total: IntCounter,

    /// Completed transfers
    pub transfers_total: IntCounter,

    /// Coins paid out by game engines
    pub game_payouts_total: IntCounter,

    /// Snapshot writes
    pub flushes_total: IntCounter,

    /// Snapshot write latency
    pub flush_duration: Histogram,

    /// Current account count
    pub accounts: IntGauge,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let registrations_total =
            IntCounter::new("treasury_registrations_total", "Accounts created")?;
        registry.register(Box::new(registrations_total.clone()))?;

        let transfers_total = IntCounter::new("treasury_transfers_total", "Completed transfers")?;
        registry.register(Box::new(transfers_total.clone()))?;

        let game_payouts_total = IntCounter::new(
            "treasury_game_payouts_total",
            "Coins paid out by game engines",
        )?;
        registry.register(Box::new(game_payouts_total.clone()))?;

        let flushes_total = IntCounter::new("treasury_flushes_total", "Snapshot writes")?;
        registry.register(Box::new(flushes_total.clone()))?;

        let flush_duration = Histogram::with_opts(
            HistogramOpts::new(
                "treasury_flush_duration_seconds",
                "Histogram of snapshot write latencies",
            )
            .buckets(vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500]),
        )?;
        registry.register(Box::new(flush_duration.clone()))?;

        let accounts = IntGauge::new("treasury_accounts", "Current account count")?;
        registry.register(Box::new(accounts.clone()))?;

        Ok(Self {
            registrations_total,
            transfers_total,
            game_payouts_total,
            flushes_total,
            flush_duration,
            accounts,
            registry,
        })
    }

    /// Record an account registration
    pub fn record_registration(&self) {
        self.registrations_total.inc();
        self.accounts.inc();
    }

    /// Record a completed transfer
    pub fn record_transfer(&self) {
        self.transfers_total.inc();
    }

    /// Record a game payout
    pub fn record_game_payout(&self, coins: u64) {
        self.game_payouts_total.inc_by(coins);
    }

    /// Record a snapshot write
    pub fn record_flush(&self, duration_seconds: f64) {
        self.flushes_total.inc();
        self.flush_duration.observe(duration_seconds);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert_eq!(metrics.registrations_total.get(), 0);
        assert_eq!(metrics.accounts.get(), 0);
    }

    #[test]
    fn test_record_registration() {
        let metrics = Metrics::new().unwrap();
        metrics.record_registration();
        metrics.record_registration();
        assert_eq!(metrics.registrations_total.get(), 2);
        assert_eq!(metrics.accounts.get(), 2);
    }

    #[test]
    fn test_record_game_payout() {
        let metrics = Metrics::new().unwrap();
        metrics.record_game_payout(30);
        metrics.record_game_payout(120);
        assert_eq!(metrics.game_payouts_total.get(), 150);
    }
}
