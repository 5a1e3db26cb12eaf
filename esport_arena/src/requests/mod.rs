//! Request queue: add-money (deposit) and withdraw requests.
//!
//! Users submit requests; an admin reconciles them against the UPI
//! transaction and approves. Each approval moves the request out of
//! `pending` and performs exactly one ledger mutation, at most once.

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{RequestError, RequestResult};
pub use manager::RequestManager;
pub use models::{
    AddRequest, AddRequestId, AddRequestStatus, ApprovalOutcome, DepositForm, PayoutOutcome,
    RequestQueue, WithdrawForm, WithdrawRequest, WithdrawRequestId, WithdrawStatus,
};
