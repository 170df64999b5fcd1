use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Opaque, stable identifier of a ledger account.
///
/// The core never interprets the identifier; it only compares and
/// echoes it back in the reconstructed links.
///
/// # Examples
///
/// ```
/// use flow_reconstructor::core::account::AccountId;
///
/// let checking = AccountId::new("a300");
/// let groceries = AccountId::new("a301");
/// assert_ne!(checking, groceries);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Create a new account identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the string representation of the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AccountId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Raw account type tag as delivered by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountType {
    Cash,
    Bank,
    Asset,
    Liability,
    Equity,
    Income,
    Expense,
}

#[derive(Debug, Error)]
#[error("unknown account type tag '{0}'")]
pub struct UnknownAccountType(pub String);

impl AccountType {
    pub const ALL: [AccountType; 7] = [
        AccountType::Cash,
        AccountType::Bank,
        AccountType::Asset,
        AccountType::Liability,
        AccountType::Equity,
        AccountType::Income,
        AccountType::Expense,
    ];

    /// Coarse category used for flow admissibility.
    ///
    /// CASH, BANK, ASSET and LIABILITY collapse into [`Category::AssetLike`].
    /// EQUITY has no category: equity accounts are filtered out before
    /// reconstruction and are never classified.
    pub fn category(self) -> Option<Category> {
        match self {
            AccountType::Cash | AccountType::Bank | AccountType::Asset | AccountType::Liability => {
                Some(Category::AssetLike)
            }
            AccountType::Income => Some(Category::Income),
            AccountType::Expense => Some(Category::Expense),
            AccountType::Equity => None,
        }
    }

    /// Returns the upper-case type tag.
    pub fn as_str(self) -> &'static str {
        match self {
            AccountType::Cash => "CASH",
            AccountType::Bank => "BANK",
            AccountType::Asset => "ASSET",
            AccountType::Liability => "LIABILITY",
            AccountType::Equity => "EQUITY",
            AccountType::Income => "INCOME",
            AccountType::Expense => "EXPENSE",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = UnknownAccountType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccountType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownAccountType(s.to_string()))
    }
}

/// Admissibility-relevant grouping of account types.
///
/// The variant order matters: sorted category pairs are compared against
/// the admissible pair table in [`crate::graph::admissibility`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    AssetLike,
    Expense,
    Income,
}

/// A ledger account as supplied by the ledger-data collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    /// Display name; carried along for callers, unused by reconstruction.
    #[serde(default)]
    pub name: String,
}

impl Account {
    /// Create a new account record.
    pub fn new(id: impl Into<AccountId>, account_type: AccountType, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            account_type,
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_like_types_collapse() {
        for t in [
            AccountType::Cash,
            AccountType::Bank,
            AccountType::Asset,
            AccountType::Liability,
        ] {
            assert_eq!(t.category(), Some(Category::AssetLike), "{t}");
        }
    }

    #[test]
    fn test_income_expense_stay_distinct() {
        assert_eq!(AccountType::Income.category(), Some(Category::Income));
        assert_eq!(AccountType::Expense.category(), Some(Category::Expense));
        assert_eq!(AccountType::Equity.category(), None);
    }

    #[test]
    fn test_parse_account_type() {
        assert_eq!("bank".parse::<AccountType>().unwrap(), AccountType::Bank);
        assert_eq!(" EXPENSE ".parse::<AccountType>().unwrap(), AccountType::Expense);
        assert!("STOCK".parse::<AccountType>().is_err());
    }

    #[test]
    fn test_account_type_serde_tags() {
        let json = serde_json::to_string(&AccountType::Liability).unwrap();
        assert_eq!(json, "\"LIABILITY\"");
        let back: AccountType = serde_json::from_str("\"INCOME\"").unwrap();
        assert_eq!(back, AccountType::Income);
    }

    #[test]
    fn test_account_id_display() {
        assert_eq!(format!("{}", AccountId::new("a302")), "a302");
        assert!(AccountId::new("a300") < AccountId::new("a301"));
    }
}
