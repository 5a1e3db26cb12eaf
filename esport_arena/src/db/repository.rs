//! Repository trait definitions for testability and dependency injection.
//!
//! Managers talk to storage only through these traits. [`super::PgStore`]
//! implements them on PostgreSQL and [`super::MemoryStore`] in memory. Every
//! method that changes more than one row is atomic in both implementations.

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::{NewUser, Session, User, UserCredentials, UserId};
use crate::requests::{
    AddRequest, AddRequestId, ApprovalOutcome, DepositForm, PayoutOutcome, WithdrawForm,
    WithdrawRequest, WithdrawRequestId,
};
use crate::tournament::{
    NewTournament, ReservationOutcome, SlotClaim, Tournament, TournamentEdit, TournamentId,
    TournamentJoin,
};
use crate::wallet::{Amount, Balances, DebitOutcome, LedgerEntry, LedgerPosting};

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Unique constraint violated
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A stored value could not be decoded
    #[error("Invalid value {value:?} in column {column}")]
    InvalidValue { column: &'static str, value: String },

    /// A row the operation depends on is missing
    #[error("Missing {0}")]
    Missing(String),

    /// A credit would push the balance past the money column range
    #[error("Balance limit reached for user {0}")]
    BalanceLimit(UserId),
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Result of crediting a prize that also finishes a tournament
#[derive(Debug, Clone, PartialEq)]
pub enum WinnerOutcome {
    Awarded { user: User, balance_after: Amount },
    TournamentNotFound,
    UserNotFound,
}

/// Trait for user repository operations
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user. Fails with [`StoreError::Conflict`] on a duplicate email.
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User>;

    /// Find user and password hash by email
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserCredentials>>;

    /// Find user by ID
    async fn find_by_id(&self, user_id: UserId) -> StoreResult<Option<User>>;

    /// Whether any admin account exists
    async fn admin_exists(&self) -> StoreResult<bool>;
}

/// Trait for session repository operations
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create_session(&self, session: &Session) -> StoreResult<()>;

    async fn find_session(&self, token: &str) -> StoreResult<Option<Session>>;

    /// Returns whether a session was removed
    async fn delete_session(&self, token: &str) -> StoreResult<bool>;
}

/// Trait for ledger repository operations
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Both balances, `None` if the user does not exist
    async fn balances(&self, user_id: UserId) -> StoreResult<Option<Balances>>;

    /// Credit and record an entry. Returns the new balance, `None` if the user does not exist.
    async fn credit(&self, posting: &LedgerPosting) -> StoreResult<Option<Amount>>;

    /// Debit and record an entry only when the balance covers the amount.
    /// `None` if the user does not exist.
    async fn debit_if_sufficient(&self, posting: &LedgerPosting)
    -> StoreResult<Option<DebitOutcome>>;

    /// Ledger history, newest first
    async fn entries(&self, user_id: UserId, limit: i64) -> StoreResult<Vec<LedgerEntry>>;
}

/// Trait for deposit/withdraw request operations
#[async_trait]
pub trait RequestRepository: Send + Sync {
    async fn insert_add_request(&self, user_id: UserId, form: &DepositForm)
    -> StoreResult<AddRequest>;

    async fn insert_withdraw_request(
        &self,
        user_id: UserId,
        form: &WithdrawForm,
    ) -> StoreResult<WithdrawRequest>;

    /// Deposit requests, newest first; all users when `user_id` is `None`
    async fn add_requests(&self, user_id: Option<UserId>) -> StoreResult<Vec<AddRequest>>;

    /// Withdraw requests, newest first; all users when `user_id` is `None`
    async fn withdraw_requests(&self, user_id: Option<UserId>)
    -> StoreResult<Vec<WithdrawRequest>>;

    /// Approve a deposit and credit the added wallet, at most once.
    /// `None` if the request does not exist.
    async fn approve_add_request(&self, id: AddRequestId) -> StoreResult<Option<ApprovalOutcome>>;

    /// Pay a withdraw request from the winning wallet, at most once and only
    /// while the balance covers it. `None` if the request does not exist.
    async fn pay_withdraw_request(
        &self,
        id: WithdrawRequestId,
    ) -> StoreResult<Option<PayoutOutcome>>;
}

/// Trait for tournament catalog operations
#[async_trait]
pub trait TournamentRepository: Send + Sync {
    async fn insert_tournament(&self, new_tournament: &NewTournament) -> StoreResult<Tournament>;

    /// `None` if the tournament does not exist
    async fn update_tournament(
        &self,
        id: TournamentId,
        edit: &TournamentEdit,
    ) -> StoreResult<Option<Tournament>>;

    async fn find_tournament(&self, id: TournamentId) -> StoreResult<Option<Tournament>>;

    /// All tournaments, newest first
    async fn list_tournaments(&self) -> StoreResult<Vec<Tournament>>;

    /// Joins of a tournament ordered by slot
    async fn joins_for_tournament(&self, id: TournamentId) -> StoreResult<Vec<TournamentJoin>>;

    async fn joined_tournament_ids(&self, user_id: UserId) -> StoreResult<Vec<TournamentId>>;

    async fn has_joined(&self, id: TournamentId, user_id: UserId) -> StoreResult<bool>;

    /// Check every join precondition and, if they pass, debit the wallet and
    /// insert the join as one atomic step.
    async fn reserve_slot(&self, claim: &SlotClaim) -> StoreResult<ReservationOutcome>;

    /// Delete the joins and then the tournament. Returns whether it existed.
    async fn delete_tournament(&self, id: TournamentId) -> StoreResult<bool>;

    /// Credit the winning wallet and set the tournament to finished, atomically.
    async fn award_winner(
        &self,
        id: TournamentId,
        posting: &LedgerPosting,
    ) -> StoreResult<WinnerOutcome>;
}

/// Liveness check for the health endpoint
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn ping(&self) -> StoreResult<()>;
}
