//! Synthetic ledger generation.
//!
//! Produces balanced random books for benchmarks, property checks and the
//! `generate` CLI command.

use crate::core::account::{Account, AccountType};
use crate::core::book::Book;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

/// Configuration for generating a random book.
#[derive(Debug, Clone)]
pub struct BookConfig {
    pub transaction_count: usize,
    /// Largest number of splits per transaction (at least 2).
    pub max_splits: usize,
    pub asset_accounts: usize,
    pub income_accounts: usize,
    pub expense_accounts: usize,
    /// Largest split amount in minor units.
    pub max_amount_units: i64,
    pub seed: Option<u64>,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            transaction_count: 100,
            max_splits: 5,
            asset_accounts: 3,
            income_accounts: 2,
            expense_accounts: 8,
            max_amount_units: 50_000,
            seed: None,
        }
    }
}

const ASSET_TYPES: [AccountType; 4] = [
    AccountType::Cash,
    AccountType::Bank,
    AccountType::Asset,
    AccountType::Liability,
];

/// Generate a random balanced book.
///
/// Every transaction has at least one asset-like split, so it always has a
/// feasible flow assignment. Amounts carry two decimals.
pub fn generate_book(config: &BookConfig) -> Book {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut book = Book::new();

    let mut assets = Vec::new();
    for i in 0..config.asset_accounts.max(1) {
        let id = format!("asset-{:02}", i);
        book.add_account(Account::new(id.as_str(), ASSET_TYPES[i % ASSET_TYPES.len()], format!("Asset {}", i)));
        assets.push(id);
    }
    let mut others = Vec::new();
    for i in 0..config.income_accounts {
        let id = format!("income-{:02}", i);
        book.add_account(Account::new(id.as_str(), AccountType::Income, format!("Income {}", i)));
        others.push(id);
    }
    for i in 0..config.expense_accounts {
        let id = format!("expense-{:02}", i);
        book.add_account(Account::new(id.as_str(), AccountType::Expense, format!("Expense {}", i)));
        others.push(id);
    }

    let max_splits = config.max_splits.max(2);
    let max_units = config.max_amount_units.max(2);
    for t in 0..config.transaction_count {
        let tx = format!("tx-{:05}", t);
        let split_count = rng.gen_range(2..=max_splits);

        // one asset plus a random selection of distinct other accounts
        let mut accounts = vec![assets[rng.gen_range(0..assets.len())].clone()];
        let mut pool: Vec<&String> = assets.iter().chain(others.iter()).filter(|a| **a != accounts[0]).collect();
        pool.shuffle(&mut rng);
        accounts.extend(pool.into_iter().take(split_count - 1).cloned());

        let mut values: Vec<i64> = (1..accounts.len())
            .map(|_| {
                let units = rng.gen_range(1..max_units);
                if rng.gen_bool(0.5) {
                    units
                } else {
                    -units
                }
            })
            .collect();
        // the first (asset) split balances the rest
        values.insert(0, -values.iter().sum::<i64>());

        for (account, units) in accounts.iter().zip(values) {
            book.add_split(tx.as_str(), account.as_str(), Decimal::new(units, 2));
        }
    }

    book
}
