//! Property-based tests for ledger invariants
//!
//! These tests use proptest to verify critical invariants:
//! - Coin conservation: transfers never mint or burn coins
//! - No negative balances: debits are checked before they mutate
//! - Rejected operations leave the ledger untouched

use proptest::prelude::*;
use treasury_core::{Bank, EconomyConfig, UserId};

/// Strategy for generating user names
fn user_strategy() -> impl Strategy<Value = UserId> {
    "[a-z]{3,12}".prop_map(UserId::new)
}

/// Strategy for generating coin amounts
fn amount_strategy() -> impl Strategy<Value = u64> {
    0u64..10_000
}

/// A transfer request between two of the registered users
#[derive(Debug, Clone)]
struct TransferOp {
    from: usize,
    to: usize,
    amount: u64,
}

fn transfer_strategy(user_count: usize) -> impl Strategy<Value = TransferOp> {
    (0..user_count, 0..user_count, amount_strategy())
        .prop_map(|(from, to, amount)| TransferOp { from, to, amount })
}

fn bank_with_users(count: usize) -> (Bank, Vec<UserId>) {
    let mut bank = Bank::new(EconomyConfig::default());
    let users: Vec<UserId> = (0..count)
        .map(|i| UserId::new(format!("user-{}", i)))
        .collect();
    for user in &users {
        bank.register(user).unwrap();
    }
    (bank, users)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: every new account starts at the configured balance
    #[test]
    fn prop_registration_grants_starting_balance(user in user_strategy()) {
        let mut bank = Bank::new(EconomyConfig::default());
        bank.register(&user).unwrap();
        prop_assert_eq!(bank.balance(&user).unwrap(), 100);
    }

    /// Property: registering twice fails and changes nothing
    #[test]
    fn prop_double_registration_rejected(user in user_strategy()) {
        let mut bank = Bank::new(EconomyConfig::default());
        bank.register(&user).unwrap();

        prop_assert!(bank.register(&user).is_err());
        prop_assert_eq!(bank.account_count(), 1);
        prop_assert_eq!(bank.balance(&user).unwrap(), 100);
    }

    /// Property: transfers conserve the total coin supply
    #[test]
    fn prop_transfers_conserve_coins(
        ops in prop::collection::vec(transfer_strategy(5), 1..50)
    ) {
        let (mut bank, users) = bank_with_users(5);
        let total_before = bank.total_coins();

        for op in &ops {
            // Self-transfers and overdrafts are rejected; either way the
            // supply must not move.
            let _ = bank.transfer(&users[op.from], &users[op.to], op.amount);
        }

        prop_assert_eq!(bank.total_coins(), total_before);
    }

    /// Property: balances never go negative, a failed debit mutates nothing
    #[test]
    fn prop_debit_never_overdraws(
        credit in amount_strategy(),
        debit in amount_strategy(),
        user in user_strategy(),
    ) {
        let mut bank = Bank::new(EconomyConfig::default());
        bank.register(&user).unwrap();
        bank.credit(&user, credit).unwrap();

        let before = bank.balance(&user).unwrap();
        match bank.debit(&user, debit) {
            Ok(after) => {
                prop_assert_eq!(after, before - debit);
            }
            Err(_) => {
                prop_assert!(debit > before);
                prop_assert_eq!(bank.balance(&user).unwrap(), before);
            }
        }
    }

    /// Property: a rejected transfer leaves both balances untouched
    #[test]
    fn prop_failed_transfer_mutates_nothing(
        amount in 1u64..10_000,
        extra in 1u64..10_000,
    ) {
        let (mut bank, users) = bank_with_users(2);
        let from_before = bank.balance(&users[0]).unwrap();
        let to_before = bank.balance(&users[1]).unwrap();

        // More than the sender holds.
        let result = bank.transfer(&users[0], &users[1], from_before + amount + extra);
        prop_assert!(result.is_err());
        prop_assert_eq!(bank.balance(&users[0]).unwrap(), from_before);
        prop_assert_eq!(bank.balance(&users[1]).unwrap(), to_before);
    }

    /// Property: message counting pays exactly once per full threshold
    #[test]
    fn prop_message_rewards_wrap_counter(messages in 1u32..350) {
        let mut bank = Bank::new(EconomyConfig::default());
        let user = UserId::new("chatter");
        bank.register(&user).unwrap();

        let mut payouts = 0u64;
        for _ in 0..messages {
            if let Some(coins) = bank.record_message(&user, 1.0).unwrap() {
                payouts += 1;
                prop_assert_eq!(coins, 50);
            }
        }

        prop_assert_eq!(payouts, (messages / 100) as u64);
        prop_assert_eq!(
            bank.account(&user).unwrap().messages,
            messages % 100
        );
    }

    /// Property: richest pages are sorted descending and never overlap
    #[test]
    fn prop_richest_pages_sorted(balances in prop::collection::vec(amount_strategy(), 1..30)) {
        let mut bank = Bank::new(EconomyConfig::default());
        for (i, balance) in balances.iter().enumerate() {
            let user = UserId::new(format!("user-{}", i));
            bank.register(&user).unwrap();
            bank.credit(&user, *balance).unwrap();
        }

        let mut seen = Vec::new();
        let mut page = 0;
        loop {
            let entries = bank.richest(page, 10);
            if entries.is_empty() {
                break;
            }
            seen.extend(entries.into_iter().map(|a| a.balance));
            page += 1;
        }

        prop_assert_eq!(seen.len(), balances.len());
        for window in seen.windows(2) {
            prop_assert!(window[0] >= window[1]);
        }
    }
}
