//! Wallet error types.

use thiserror::Error;

use super::models::{Amount, WalletKind};
use crate::auth::UserId;
use crate::db::StoreError;

/// Wallet errors
#[derive(Debug, Error)]
pub enum WalletError {
    /// Store error
    #[error("Store error: {0}")]
    Store(#[source] StoreError),

    /// Credit would push the balance past its limit; nothing changed
    #[error("Wallet balance limit reached for user {0}")]
    BalanceLimit(UserId),

    /// Insufficient balance
    #[error("Insufficient {wallet} balance: available {available}, required {required}")]
    InsufficientBalance {
        wallet: WalletKind,
        available: Amount,
        required: Amount,
    },

    /// Wallet not found
    #[error("Wallet not found for user {0}")]
    WalletNotFound(UserId),

    /// Invalid amount (must be positive and below the column limit)
    #[error("Invalid amount: {0}")]
    InvalidAmount(Amount),
}

impl From<StoreError> for WalletError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::BalanceLimit(user_id) => WalletError::BalanceLimit(user_id),
            other => WalletError::Store(other),
        }
    }
}

impl WalletError {
    /// Get a client-safe error message that doesn't leak sensitive information
    pub fn client_message(&self) -> String {
        match self {
            WalletError::Store(_) => "Internal server error".to_string(),
            WalletError::WalletNotFound(_) => "Wallet not found".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for wallet operations
pub type WalletResult<T> = Result<T, WalletError>;
