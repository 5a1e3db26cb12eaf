//! Deposit and withdraw request models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::auth::UserId;
use crate::wallet::Amount;

/// Add-money (deposit) request ID type
pub type AddRequestId = i64;

/// Withdraw request ID type
pub type WithdrawRequestId = i64;

/// Deposit request status. Transitions only pending → approved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddRequestStatus {
    Pending,
    Approved,
}

impl AddRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddRequestStatus::Pending => "pending",
            AddRequestStatus::Approved => "approved",
        }
    }
}

impl FromStr for AddRequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AddRequestStatus::Pending),
            "approved" => Ok(AddRequestStatus::Approved),
            other => Err(other.to_string()),
        }
    }
}

/// Withdraw request status. Transitions only pending → paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawStatus {
    Pending,
    Paid,
}

impl WithdrawStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WithdrawStatus::Pending => "pending",
            WithdrawStatus::Paid => "paid",
        }
    }
}

impl FromStr for WithdrawStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(WithdrawStatus::Pending),
            "paid" => Ok(WithdrawStatus::Paid),
            other => Err(other.to_string()),
        }
    }
}

/// Deposit request, reconciled by an admin against the UPI transaction id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddRequest {
    pub id: AddRequestId,
    pub user_id: UserId,
    pub amount: Amount,
    pub upi_id: String,
    pub txn_id: String,
    pub status: AddRequestStatus,
    pub created_at: DateTime<Utc>,
}

/// Withdraw request, paid out from the winning wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawRequest {
    pub id: WithdrawRequestId,
    pub user_id: UserId,
    pub amount: Amount,
    pub upi_id: String,
    pub status: WithdrawStatus,
    pub created_at: DateTime<Utc>,
}

/// Deposit form as submitted by a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositForm {
    pub amount: Amount,
    pub upi_id: String,
    pub txn_id: String,
}

/// Withdraw form as submitted by a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawForm {
    pub amount: Amount,
    pub upi_id: String,
}

/// Every request in the queue, newest first
#[derive(Debug, Clone, Default, Serialize)]
pub struct RequestQueue {
    pub add_requests: Vec<AddRequest>,
    pub withdraw_requests: Vec<WithdrawRequest>,
}

/// Result of approving a deposit request
#[derive(Debug, Clone, PartialEq)]
pub enum ApprovalOutcome {
    /// Status moved to approved and the added wallet was credited
    Approved(AddRequest),
    /// Already approved earlier; nothing changed
    AlreadyApproved(AddRequest),
}

impl ApprovalOutcome {
    pub fn request(&self) -> &AddRequest {
        match self {
            ApprovalOutcome::Approved(r) | ApprovalOutcome::AlreadyApproved(r) => r,
        }
    }
}

/// Result of paying out a withdraw request
#[derive(Debug, Clone, PartialEq)]
pub enum PayoutOutcome {
    /// Status moved to paid and the winning wallet was debited
    Paid(WithdrawRequest),
    /// Already paid earlier; nothing changed
    AlreadyPaid(WithdrawRequest),
    /// Winning balance no longer covers the amount; nothing changed
    InsufficientBalance {
        request: WithdrawRequest,
        available: Amount,
    },
}

impl PayoutOutcome {
    pub fn request(&self) -> &WithdrawRequest {
        match self {
            PayoutOutcome::Paid(r)
            | PayoutOutcome::AlreadyPaid(r)
            | PayoutOutcome::InsufficientBalance { request: r, .. } => r,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_names() {
        assert_eq!("approved".parse(), Ok(AddRequestStatus::Approved));
        assert_eq!("paid".parse(), Ok(WithdrawStatus::Paid));
        assert!("paid".parse::<AddRequestStatus>().is_err());
        assert!("approved".parse::<WithdrawStatus>().is_err());
        assert_eq!(WithdrawStatus::Pending.as_str(), "pending");
    }
}
