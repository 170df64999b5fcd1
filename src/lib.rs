//! # flow-reconstructor
//!
//! Reconstructs who-paid-whom inside ledger transactions.
//!
//! A transaction only records how much each account changed. For more than
//! two accounts many flow assignments explain the same changes; this crate
//! picks the one with the least total movement that respects which account
//! categories may exchange money.
//!
//! ## Architecture
//!
//! - **core**: Accounts, splits, transactions, links, ledger tables
//! - **graph**: Admissibility matrix and connected components
//! - **solver**: Fast path plus continuous (LP) and exact (MILP) strategies
//! - **reconstruction**: Per-transaction pipeline, link extraction, batches
//! - **simulation**: Synthetic balanced books

pub mod config;
pub mod core;
pub mod graph;
pub mod reconstruction;
pub mod simulation;
pub mod solver;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::config::{ConfigError, ReconstructorConfig, StrategyKind};
    pub use crate::core::account::{Account, AccountId, AccountType, Category};
    pub use crate::core::book::Book;
    pub use crate::core::link::{Link, LinkSet};
    pub use crate::core::transaction::{Split, Transaction, TransactionId, ValidationError};
    pub use crate::reconstruction::{BatchReport, LinkReconstructor, ReconstructionError};
}
