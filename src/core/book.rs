use crate::core::account::{Account, AccountId, AccountType};
use crate::core::transaction::{Split, Transaction, TransactionId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BookError {
    #[error("split {index} of transaction {transaction} references unknown account {account}")]
    UnknownAccount {
        index: usize,
        transaction: TransactionId,
        account: AccountId,
    },
    #[error("duplicate account {0} in account table")]
    DuplicateAccount(AccountId),
    #[error("invalid book JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A split row as exported from the ledger: which transaction, which
/// account, how much.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitRecord {
    pub transaction: TransactionId,
    pub account: AccountId,
    pub value: Decimal,
}

/// Tabular ledger data: an account table and a split table.
///
/// # Examples
///
/// ```
/// use flow_reconstructor::core::book::Book;
///
/// let book = Book::from_json(r#"{
///     "accounts": [
///         { "id": "a300", "type": "BANK", "name": "Checking" },
///         { "id": "a301", "type": "EXPENSE", "name": "Groceries" }
///     ],
///     "splits": [
///         { "transaction": "t1", "account": "a300", "value": "-25.42" },
///         { "transaction": "t1", "account": "a301", "value": "25.42" }
///     ]
/// }"#).unwrap();
///
/// let transactions = book.transactions().unwrap();
/// assert_eq!(transactions.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub accounts: Vec<Account>,
    pub splits: Vec<SplitRecord>,
}

impl Book {
    /// Create an empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a book from JSON.
    pub fn from_json(json: &str) -> Result<Self, BookError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the book as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, BookError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn add_account(&mut self, account: Account) {
        self.accounts.push(account);
    }

    /// Record one split of a transaction.
    pub fn add_split(
        &mut self,
        transaction: impl Into<TransactionId>,
        account: impl Into<AccountId>,
        value: Decimal,
    ) {
        self.splits.push(SplitRecord {
            transaction: transaction.into(),
            account: account.into(),
            value,
        });
    }

    /// Account lookup table keyed by id.
    pub fn account_table(&self) -> Result<HashMap<&AccountId, &Account>, BookError> {
        let mut table = HashMap::with_capacity(self.accounts.len());
        for account in &self.accounts {
            if table.insert(&account.id, account).is_some() {
                return Err(BookError::DuplicateAccount(account.id.clone()));
            }
        }
        Ok(table)
    }

    /// Join splits with their accounts and group them into transactions,
    /// in order of first appearance.
    ///
    /// Transactions touching an equity account are dropped entirely.
    pub fn transactions(&self) -> Result<Vec<Transaction>, BookError> {
        let table = self.account_table()?;

        let mut order: Vec<TransactionId> = Vec::new();
        let mut grouped: HashMap<&TransactionId, Vec<Split>> = HashMap::new();
        let mut with_equity: HashSet<&TransactionId> = HashSet::new();

        for (index, record) in self.splits.iter().enumerate() {
            let account = table
                .get(&record.account)
                .ok_or_else(|| BookError::UnknownAccount {
                    index,
                    transaction: record.transaction.clone(),
                    account: record.account.clone(),
                })?;
            if account.account_type == AccountType::Equity {
                with_equity.insert(&record.transaction);
            }
            let splits = grouped.entry(&record.transaction).or_insert_with(|| {
                order.push(record.transaction.clone());
                Vec::new()
            });
            splits.push(Split::new(
                record.account.clone(),
                account.account_type,
                record.value,
            ));
        }

        if !with_equity.is_empty() {
            log::debug!(
                "dropping {} transaction(s) touching equity accounts",
                with_equity.len()
            );
        }

        let transactions = order
            .into_iter()
            .filter(|id| !with_equity.contains(id))
            .filter_map(|id| {
                let splits = grouped.remove(&id)?;
                Some(Transaction::from_splits(id, splits))
            })
            .collect();
        Ok(transactions)
    }
}
