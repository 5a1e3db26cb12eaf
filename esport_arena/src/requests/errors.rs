//! Request queue error types.

use thiserror::Error;

use super::models::{AddRequestId, WithdrawRequestId};
use crate::auth::UserId;
use crate::db::StoreError;

/// Request queue errors
#[derive(Debug, Error)]
pub enum RequestError {
    /// Store error
    #[error("Store error: {0}")]
    Store(#[source] StoreError),

    /// Deposit amount zero or negative
    #[error("Amount must be positive.")]
    InvalidAmount,

    /// Amount outside the money column range
    #[error("Amount is too large.")]
    AmountTooLarge,

    /// Approval would push the wallet past its limit; nothing changed
    #[error("Wallet balance limit reached.")]
    BalanceLimit,

    /// Withdraw amount not covered by the winning wallet (or not positive)
    #[error("Winning balance se zyada withdraw nahi kar sakte.")]
    ExceedsWinningBalance,

    #[error("User {0} not found")]
    UserNotFound(UserId),

    #[error("Add-money request {0} not found")]
    AddRequestNotFound(AddRequestId),

    #[error("Withdraw request {0} not found")]
    WithdrawRequestNotFound(WithdrawRequestId),
}

impl From<StoreError> for RequestError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::BalanceLimit(_) => RequestError::BalanceLimit,
            other => RequestError::Store(other),
        }
    }
}

impl RequestError {
    /// Get a client-safe error message that doesn't leak sensitive information
    pub fn client_message(&self) -> String {
        match self {
            RequestError::Store(_) => "Internal server error".to_string(),
            RequestError::AddRequestNotFound(_) | RequestError::WithdrawRequestNotFound(_) => {
                "Request not found.".to_string()
            }
            RequestError::UserNotFound(_) => "User not found.".to_string(),
            _ => self.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RequestError::UserNotFound(_)
                | RequestError::AddRequestNotFound(_)
                | RequestError::WithdrawRequestNotFound(_)
        )
    }
}

/// Result type for request queue operations
pub type RequestResult<T> = Result<T, RequestError>;
