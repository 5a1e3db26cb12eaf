//! Wallet data models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::auth::UserId;

/// Money amount in rupees, two decimal places
pub type Amount = Decimal;

/// Every stored amount and balance stays below this many rupees
/// (the `NUMERIC(12, 2)` columns).
pub const AMOUNT_LIMIT: i64 = 10_000_000_000;

/// Whether an amount fits the money columns
pub fn within_limit(amount: Amount) -> bool {
    amount < Amount::from(AMOUNT_LIMIT)
}

/// One of the two independent balances every user holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletKind {
    /// Prize money; the only withdrawable wallet
    Winning,
    /// Deposited funds
    Added,
}

impl WalletKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletKind::Winning => "winning",
            WalletKind::Added => "added",
        }
    }
}

impl std::fmt::Display for WalletKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for wallet names other than `winning` / `added`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown wallet: {0}")]
pub struct UnknownWallet(pub String);

impl FromStr for WalletKind {
    type Err = UnknownWallet;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "winning" => Ok(WalletKind::Winning),
            "added" => Ok(WalletKind::Added),
            other => Err(UnknownWallet(other.to_string())),
        }
    }
}

/// Both balances of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Balances {
    pub winning: Amount,
    pub added: Amount,
}

impl Balances {
    pub fn get(&self, wallet: WalletKind) -> Amount {
        match wallet {
            WalletKind::Winning => self.winning,
            WalletKind::Added => self.added,
        }
    }

    pub fn get_mut(&mut self, wallet: WalletKind) -> &mut Amount {
        match wallet {
            WalletKind::Winning => &mut self.winning,
            WalletKind::Added => &mut self.added,
        }
    }
}

/// What caused a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    Deposit,
    Withdrawal,
    EntryFee,
    Prize,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Deposit => "deposit",
            EntryType::Withdrawal => "withdrawal",
            EntryType::EntryFee => "entry_fee",
            EntryType::Prize => "prize",
        }
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(EntryType::Deposit),
            "withdrawal" => Ok(EntryType::Withdrawal),
            "entry_fee" => Ok(EntryType::EntryFee),
            "prize" => Ok(EntryType::Prize),
            other => Err(other.to_string()),
        }
    }
}

/// Ledger entry: one applied wallet mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub user_id: UserId,
    pub wallet: WalletKind,
    /// Signed: positive for credits, negative for debits
    pub amount: Amount,
    pub balance_after: Amount,
    pub entry_type: EntryType,
    pub reference: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A requested wallet mutation. `amount` is the unsigned magnitude; the
/// operation it is passed to decides the direction.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerPosting {
    pub user_id: UserId,
    pub wallet: WalletKind,
    pub amount: Amount,
    pub entry_type: EntryType,
    pub reference: Option<String>,
    pub description: Option<String>,
}

impl LedgerPosting {
    pub fn new(user_id: UserId, wallet: WalletKind, amount: Amount, entry_type: EntryType) -> Self {
        Self {
            user_id,
            wallet,
            amount,
            entry_type,
            reference: None,
            description: None,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Result of a debit-if-sufficient attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebitOutcome {
    Applied { balance_after: Amount },
    Insufficient { available: Amount },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_wallet_kind_parse() {
        assert_eq!("winning".parse::<WalletKind>(), Ok(WalletKind::Winning));
        assert_eq!("added".parse::<WalletKind>(), Ok(WalletKind::Added));
        assert!("bonus".parse::<WalletKind>().is_err());
        assert!("".parse::<WalletKind>().is_err());
    }

    #[test]
    fn test_within_limit() {
        assert!(within_limit(dec!(9999999999.99)));
        assert!(!within_limit(dec!(10000000000)));
        assert!(!within_limit(Amount::MAX));
    }

    #[test]
    fn test_balances_get_mut() {
        let mut balances = Balances {
            winning: dec!(10),
            added: dec!(25.50),
        };
        *balances.get_mut(WalletKind::Added) -= dec!(5.50);
        assert_eq!(balances.get(WalletKind::Added), dec!(20));
        assert_eq!(balances.get(WalletKind::Winning), dec!(10));
    }

    #[test]
    fn test_entry_type_round_trip_names() {
        for entry_type in [
            EntryType::Deposit,
            EntryType::Withdrawal,
            EntryType::EntryFee,
            EntryType::Prize,
        ] {
            assert_eq!(entry_type.as_str().parse::<EntryType>(), Ok(entry_type));
        }
    }
}
