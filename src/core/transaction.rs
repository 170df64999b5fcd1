use crate::core::account::{AccountId, AccountType};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Opaque identifier of a ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    /// Create a new transaction identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the string representation of the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TransactionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TransactionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One account's signed contribution to a transaction.
///
/// Negative values leave the account, positive values enter it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Split {
    pub account: AccountId,
    pub account_type: AccountType,
    pub value: Decimal,
}

impl Split {
    /// Create a new split.
    pub fn new(account: impl Into<AccountId>, account_type: AccountType, value: Decimal) -> Self {
        Self {
            account: account.into(),
            account_type,
            value,
        }
    }
}

/// A participant of the per-transaction flow problem: one account and
/// its net change across all of its splits.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub account: AccountId,
    pub account_type: AccountType,
    pub delta: Decimal,
}

/// Violations of the caller's data contract for a single transaction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("transaction has no splits")]
    Empty,
    #[error("splits do not balance: they sum to {sum} (tolerance {tolerance})")]
    Unbalanced { sum: Decimal, tolerance: Decimal },
    #[error("account {account} is an equity account; equity must be filtered out before reconstruction")]
    EquityAccount { account: AccountId },
    #[error("value {value} of account {account} cannot be expressed in units of 1/{denomination}")]
    NotRepresentable {
        account: AccountId,
        value: Decimal,
        denomination: u32,
    },
}

/// The splits of a single ledger transaction.
///
/// # Examples
///
/// ```
/// use flow_reconstructor::core::account::AccountType;
/// use flow_reconstructor::core::transaction::{Split, Transaction};
/// use rust_decimal_macros::dec;
///
/// let tx = Transaction::new("t1")
///     .with_split(Split::new("checking", AccountType::Bank, dec!(-25.42)))
///     .with_split(Split::new("groceries", AccountType::Expense, dec!(25.42)));
///
/// assert_eq!(tx.len(), 2);
/// assert_eq!(tx.imbalance(), dec!(0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    id: TransactionId,
    splits: Vec<Split>,
}

impl Transaction {
    /// Create an empty transaction.
    pub fn new(id: impl Into<TransactionId>) -> Self {
        Self {
            id: id.into(),
            splits: Vec::new(),
        }
    }

    /// Create a transaction from existing splits.
    pub fn from_splits(id: impl Into<TransactionId>, splits: Vec<Split>) -> Self {
        Self {
            id: id.into(),
            splits,
        }
    }

    /// Append a split, builder style.
    pub fn with_split(mut self, split: Split) -> Self {
        self.splits.push(split);
        self
    }

    /// Append a split.
    pub fn add(&mut self, split: Split) {
        self.splits.push(split);
    }

    pub fn id(&self) -> &TransactionId {
        &self.id
    }

    /// Splits in insertion order.
    pub fn splits(&self) -> &[Split] {
        &self.splits
    }

    pub fn len(&self) -> usize {
        self.splits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.splits.is_empty()
    }

    /// Sum of all split values. Zero for a balanced transaction.
    pub fn imbalance(&self) -> Decimal {
        self.splits.iter().map(|s| s.value).sum()
    }

    /// Check the data contract and collapse the splits into one node per
    /// account, in order of first appearance.
    pub fn nodes(&self, tolerance: Decimal) -> Result<Vec<Node>, ValidationError> {
        if self.splits.is_empty() {
            return Err(ValidationError::Empty);
        }
        if let Some(split) = self
            .splits
            .iter()
            .find(|s| s.account_type == AccountType::Equity)
        {
            return Err(ValidationError::EquityAccount {
                account: split.account.clone(),
            });
        }
        let sum = self.imbalance();
        if sum.abs() > tolerance {
            return Err(ValidationError::Unbalanced { sum, tolerance });
        }

        let mut nodes: Vec<Node> = Vec::with_capacity(self.splits.len());
        let mut index: HashMap<&AccountId, usize> = HashMap::new();
        for split in &self.splits {
            match index.get(&split.account) {
                Some(&i) => nodes[i].delta += split.value,
                None => {
                    index.insert(&split.account, nodes.len());
                    nodes.push(Node {
                        account: split.account.clone(),
                        account_type: split.account_type,
                        delta: split.value,
                    });
                }
            }
        }
        Ok(nodes)
    }
}
