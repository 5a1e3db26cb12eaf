//! In-memory implementation of the repository traits.
//!
//! All state sits behind one async mutex; each trait method holds it for its
//! whole body, which makes every method atomic. Used by tests and local demos.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::repository::{
    HealthCheck, LedgerRepository, RequestRepository, SessionRepository, StoreError, StoreResult,
    TournamentRepository, UserRepository, WinnerOutcome,
};
use crate::auth::{NewUser, Session, User, UserCredentials, UserId};
use crate::requests::{
    AddRequest, AddRequestId, AddRequestStatus, ApprovalOutcome, DepositForm, PayoutOutcome,
    WithdrawForm, WithdrawRequest, WithdrawRequestId, WithdrawStatus,
};
use crate::tournament::{
    JoinError, JoinSnapshot, NewTournament, ReservationOutcome, SlotClaim, Tournament,
    TournamentEdit, TournamentId, TournamentJoin, TournamentStatus, check_join,
};
use crate::wallet::{
    Amount, Balances, DebitOutcome, EntryType, LedgerEntry, LedgerPosting, WalletKind,
    within_limit,
};

#[derive(Default)]
struct State {
    users: Vec<UserCredentials>,
    sessions: HashMap<String, Session>,
    add_requests: Vec<AddRequest>,
    withdraw_requests: Vec<WithdrawRequest>,
    tournaments: Vec<Tournament>,
    joins: Vec<TournamentJoin>,
    ledger: Vec<LedgerEntry>,
    next_id: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn user_mut(&mut self, user_id: UserId) -> Option<&mut User> {
        self.users
            .iter_mut()
            .map(|c| &mut c.user)
            .find(|u| u.id == user_id)
    }

    fn filled_slots(&self, id: TournamentId) -> i64 {
        self.joins.iter().filter(|j| j.tournament_id == id).count() as i64
    }

    /// Tournament with its derived filled count
    fn tournament(&self, id: TournamentId) -> Option<Tournament> {
        self.tournaments.iter().find(|t| t.id == id).map(|t| Tournament {
            filled_slots: self.filled_slots(id),
            ..t.clone()
        })
    }

    fn credit(&mut self, posting: &LedgerPosting) -> StoreResult<Option<Amount>> {
        let Some(user) = self.user_mut(posting.user_id) else {
            return Ok(None);
        };
        let balance = match posting.wallet {
            WalletKind::Winning => &mut user.winning_balance,
            WalletKind::Added => &mut user.added_balance,
        };
        let balance_after = balance
            .checked_add(posting.amount)
            .filter(|sum| within_limit(*sum))
            .ok_or(StoreError::BalanceLimit(posting.user_id))?;
        *balance = balance_after;
        self.record(posting, posting.amount, balance_after);
        Ok(Some(balance_after))
    }

    fn debit(&mut self, posting: &LedgerPosting) -> Option<DebitOutcome> {
        let user = self.user_mut(posting.user_id)?;
        let balance = match posting.wallet {
            WalletKind::Winning => &mut user.winning_balance,
            WalletKind::Added => &mut user.added_balance,
        };
        if *balance < posting.amount {
            return Some(DebitOutcome::Insufficient {
                available: *balance,
            });
        }
        *balance -= posting.amount;
        let balance_after = *balance;
        self.record(posting, -posting.amount, balance_after);
        Some(DebitOutcome::Applied { balance_after })
    }

    fn record(&mut self, posting: &LedgerPosting, signed_amount: Amount, balance_after: Amount) {
        let id = self.next_id();
        self.ledger.push(LedgerEntry {
            id,
            user_id: posting.user_id,
            wallet: posting.wallet,
            amount: signed_amount,
            balance_after,
            entry_type: posting.entry_type,
            reference: posting.reference.clone(),
            description: posting.description.clone(),
            created_at: Utc::now(),
        });
    }
}

/// Repository implementation holding everything in process memory
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Newest first: `created_at` descending, ties broken by id descending
fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (chrono::DateTime<Utc>, i64)) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let mut state = self.state.lock().await;
        if state.users.iter().any(|c| c.user.email == new_user.email) {
            return Err(StoreError::Conflict(format!("email {}", new_user.email)));
        }

        let user = User {
            id: state.next_id(),
            email: new_user.email,
            player_id: new_user.player_id,
            winning_balance: Amount::ZERO,
            added_balance: Amount::ZERO,
            is_admin: new_user.is_admin,
            created_at: Utc::now(),
        };
        state.users.push(UserCredentials {
            user: user.clone(),
            password_hash: new_user.password_hash,
        });
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserCredentials>> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|c| c.user.email == email).cloned())
    }

    async fn find_by_id(&self, user_id: UserId) -> StoreResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .iter()
            .find(|c| c.user.id == user_id)
            .map(|c| c.user.clone()))
    }

    async fn admin_exists(&self) -> StoreResult<bool> {
        let state = self.state.lock().await;
        Ok(state.users.iter().any(|c| c.user.is_admin))
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn create_session(&self, session: &Session) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        if state.sessions.contains_key(&session.token) {
            return Err(StoreError::Conflict("session token".to_string()));
        }
        state
            .sessions
            .insert(session.token.clone(), session.clone());
        Ok(())
    }

    async fn find_session(&self, token: &str) -> StoreResult<Option<Session>> {
        let state = self.state.lock().await;
        Ok(state.sessions.get(token).cloned())
    }

    async fn delete_session(&self, token: &str) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        Ok(state.sessions.remove(token).is_some())
    }
}

#[async_trait]
impl LedgerRepository for MemoryStore {
    async fn balances(&self, user_id: UserId) -> StoreResult<Option<Balances>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .iter()
            .find(|c| c.user.id == user_id)
            .map(|c| c.user.balances()))
    }

    async fn credit(&self, posting: &LedgerPosting) -> StoreResult<Option<Amount>> {
        let mut state = self.state.lock().await;
        state.credit(posting)
    }

    async fn debit_if_sufficient(
        &self,
        posting: &LedgerPosting,
    ) -> StoreResult<Option<DebitOutcome>> {
        let mut state = self.state.lock().await;
        Ok(state.debit(posting))
    }

    async fn entries(&self, user_id: UserId, limit: i64) -> StoreResult<Vec<LedgerEntry>> {
        let state = self.state.lock().await;
        let mut entries: Vec<LedgerEntry> = state
            .ledger
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut entries, |e| (e.created_at, e.id));
        entries.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(entries)
    }
}

#[async_trait]
impl RequestRepository for MemoryStore {
    async fn insert_add_request(
        &self,
        user_id: UserId,
        form: &DepositForm,
    ) -> StoreResult<AddRequest> {
        let mut state = self.state.lock().await;
        let request = AddRequest {
            id: state.next_id(),
            user_id,
            amount: form.amount,
            upi_id: form.upi_id.clone(),
            txn_id: form.txn_id.clone(),
            status: AddRequestStatus::Pending,
            created_at: Utc::now(),
        };
        state.add_requests.push(request.clone());
        Ok(request)
    }

    async fn insert_withdraw_request(
        &self,
        user_id: UserId,
        form: &WithdrawForm,
    ) -> StoreResult<WithdrawRequest> {
        let mut state = self.state.lock().await;
        let request = WithdrawRequest {
            id: state.next_id(),
            user_id,
            amount: form.amount,
            upi_id: form.upi_id.clone(),
            status: WithdrawStatus::Pending,
            created_at: Utc::now(),
        };
        state.withdraw_requests.push(request.clone());
        Ok(request)
    }

    async fn add_requests(&self, user_id: Option<UserId>) -> StoreResult<Vec<AddRequest>> {
        let state = self.state.lock().await;
        let mut requests: Vec<AddRequest> = state
            .add_requests
            .iter()
            .filter(|r| user_id.is_none_or(|id| r.user_id == id))
            .cloned()
            .collect();
        newest_first(&mut requests, |r| (r.created_at, r.id));
        Ok(requests)
    }

    async fn withdraw_requests(
        &self,
        user_id: Option<UserId>,
    ) -> StoreResult<Vec<WithdrawRequest>> {
        let state = self.state.lock().await;
        let mut requests: Vec<WithdrawRequest> = state
            .withdraw_requests
            .iter()
            .filter(|r| user_id.is_none_or(|id| r.user_id == id))
            .cloned()
            .collect();
        newest_first(&mut requests, |r| (r.created_at, r.id));
        Ok(requests)
    }

    async fn approve_add_request(&self, id: AddRequestId) -> StoreResult<Option<ApprovalOutcome>> {
        let mut state = self.state.lock().await;
        let Some(request) = state.add_requests.iter().find(|r| r.id == id).cloned() else {
            return Ok(None);
        };
        if request.status == AddRequestStatus::Approved {
            return Ok(Some(ApprovalOutcome::AlreadyApproved(request)));
        }

        let posting = LedgerPosting::new(
            request.user_id,
            WalletKind::Added,
            request.amount,
            EntryType::Deposit,
        )
        .with_reference(format!("add_request:{id}"))
        .with_description(format!("UPI txn {}", request.txn_id));
        if state.credit(&posting)?.is_none() {
            return Err(StoreError::Missing(format!("user {}", request.user_id)));
        }

        let mut approved = request;
        approved.status = AddRequestStatus::Approved;
        if let Some(stored) = state.add_requests.iter_mut().find(|r| r.id == id) {
            stored.status = AddRequestStatus::Approved;
        }
        Ok(Some(ApprovalOutcome::Approved(approved)))
    }

    async fn pay_withdraw_request(
        &self,
        id: WithdrawRequestId,
    ) -> StoreResult<Option<PayoutOutcome>> {
        let mut state = self.state.lock().await;
        let Some(request) = state.withdraw_requests.iter().find(|r| r.id == id).cloned() else {
            return Ok(None);
        };
        if request.status == WithdrawStatus::Paid {
            return Ok(Some(PayoutOutcome::AlreadyPaid(request)));
        }

        let posting = LedgerPosting::new(
            request.user_id,
            WalletKind::Winning,
            request.amount,
            EntryType::Withdrawal,
        )
        .with_reference(format!("withdraw_request:{id}"))
        .with_description(format!("UPI payout to {}", request.upi_id));
        match state.debit(&posting) {
            Some(DebitOutcome::Applied { .. }) => {}
            Some(DebitOutcome::Insufficient { available }) => {
                return Ok(Some(PayoutOutcome::InsufficientBalance { request, available }));
            }
            None => return Err(StoreError::Missing(format!("user {}", request.user_id))),
        }

        let mut paid = request;
        paid.status = WithdrawStatus::Paid;
        if let Some(stored) = state.withdraw_requests.iter_mut().find(|r| r.id == id) {
            stored.status = WithdrawStatus::Paid;
        }
        Ok(Some(PayoutOutcome::Paid(paid)))
    }
}

#[async_trait]
impl TournamentRepository for MemoryStore {
    async fn insert_tournament(&self, new_tournament: &NewTournament) -> StoreResult<Tournament> {
        let mut state = self.state.lock().await;
        let tournament = Tournament {
            id: state.next_id(),
            name: new_tournament.name.clone(),
            game: new_tournament.game.clone(),
            mode: new_tournament.mode.clone(),
            entry_fee: new_tournament.entry_fee,
            prize_pool: new_tournament.prize_pool,
            max_slots: new_tournament.max_slots,
            filled_slots: 0,
            status: TournamentStatus::Upcoming,
            start_time: new_tournament.start_time,
            created_at: Utc::now(),
            winner_note: None,
            room_id: None,
            room_pass: None,
            admin_note: None,
            is_grand: new_tournament.is_grand,
        };
        state.tournaments.push(tournament.clone());
        Ok(tournament)
    }

    async fn update_tournament(
        &self,
        id: TournamentId,
        edit: &TournamentEdit,
    ) -> StoreResult<Option<Tournament>> {
        let mut state = self.state.lock().await;
        let Some(tournament) = state.tournaments.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        tournament.winner_note = edit.winner_note.clone();
        tournament.room_id = edit.room_id.clone();
        tournament.room_pass = edit.room_pass.clone();
        tournament.admin_note = edit.admin_note.clone();
        tournament.is_grand = edit.is_grand;
        if let Some(status) = edit.status {
            tournament.status = status;
        }
        Ok(state.tournament(id))
    }

    async fn find_tournament(&self, id: TournamentId) -> StoreResult<Option<Tournament>> {
        let state = self.state.lock().await;
        Ok(state.tournament(id))
    }

    async fn list_tournaments(&self) -> StoreResult<Vec<Tournament>> {
        let state = self.state.lock().await;
        let mut tournaments: Vec<Tournament> = state
            .tournaments
            .iter()
            .filter_map(|t| state.tournament(t.id))
            .collect();
        newest_first(&mut tournaments, |t| (t.created_at, t.id));
        Ok(tournaments)
    }

    async fn joins_for_tournament(&self, id: TournamentId) -> StoreResult<Vec<TournamentJoin>> {
        let state = self.state.lock().await;
        let mut joins: Vec<TournamentJoin> = state
            .joins
            .iter()
            .filter(|j| j.tournament_id == id)
            .cloned()
            .collect();
        joins.sort_by_key(|j| j.slot);
        Ok(joins)
    }

    async fn joined_tournament_ids(&self, user_id: UserId) -> StoreResult<Vec<TournamentId>> {
        let state = self.state.lock().await;
        Ok(state
            .joins
            .iter()
            .filter(|j| j.user_id == user_id)
            .map(|j| j.tournament_id)
            .collect())
    }

    async fn has_joined(&self, id: TournamentId, user_id: UserId) -> StoreResult<bool> {
        let state = self.state.lock().await;
        Ok(state
            .joins
            .iter()
            .any(|j| j.tournament_id == id && j.user_id == user_id))
    }

    async fn reserve_slot(&self, claim: &SlotClaim) -> StoreResult<ReservationOutcome> {
        let mut state = self.state.lock().await;

        let Some(tournament) = state.tournament(claim.tournament_id) else {
            return Ok(ReservationOutcome::Rejected(JoinError::TournamentNotFound(
                claim.tournament_id,
            )));
        };
        let balances = state
            .users
            .iter()
            .find(|c| c.user.id == claim.user_id)
            .map(|c| c.user.balances())
            .ok_or_else(|| StoreError::Missing(format!("user {}", claim.user_id)))?;

        let snapshot = JoinSnapshot {
            tournament: &tournament,
            already_joined: state
                .joins
                .iter()
                .any(|j| j.tournament_id == tournament.id && j.user_id == claim.user_id),
            slot_taken: state
                .joins
                .iter()
                .any(|j| j.tournament_id == tournament.id && j.slot == claim.request.slot),
            balances,
        };
        let plan = match check_join(&snapshot, &claim.request) {
            Ok(plan) => plan,
            Err(rejection) => return Ok(ReservationOutcome::Rejected(rejection)),
        };

        if plan.fee > Amount::ZERO {
            let posting =
                LedgerPosting::new(claim.user_id, plan.wallet, plan.fee, EntryType::EntryFee)
                    .with_reference(format!("tournament:{}", tournament.id))
                    .with_description(format!("Entry fee for {}", tournament.name));
            match state.debit(&posting) {
                Some(DebitOutcome::Applied { .. }) => {}
                Some(DebitOutcome::Insufficient { available }) => {
                    return Ok(ReservationOutcome::Rejected(JoinError::InsufficientBalance {
                        wallet: plan.wallet,
                        available,
                        required: plan.fee,
                    }));
                }
                None => return Err(StoreError::Missing(format!("user {}", claim.user_id))),
            }
        }

        let join = TournamentJoin {
            id: state.next_id(),
            tournament_id: tournament.id,
            user_id: claim.user_id,
            in_game_name: claim.request.in_game_name.trim().to_string(),
            in_game_uid: claim.request.in_game_uid.trim().to_string(),
            slot: claim.request.slot,
            created_at: Utc::now(),
        };
        state.joins.push(join.clone());
        Ok(ReservationOutcome::Reserved(join))
    }

    async fn delete_tournament(&self, id: TournamentId) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.tournaments.len();
        state.tournaments.retain(|t| t.id != id);
        if state.tournaments.len() == before {
            return Ok(false);
        }
        state.joins.retain(|j| j.tournament_id != id);
        Ok(true)
    }

    async fn award_winner(
        &self,
        id: TournamentId,
        posting: &LedgerPosting,
    ) -> StoreResult<WinnerOutcome> {
        let mut state = self.state.lock().await;
        if !state.tournaments.iter().any(|t| t.id == id) {
            return Ok(WinnerOutcome::TournamentNotFound);
        }
        let Some(balance_after) = state.credit(posting)? else {
            return Ok(WinnerOutcome::UserNotFound);
        };
        if let Some(tournament) = state.tournaments.iter_mut().find(|t| t.id == id) {
            tournament.status = TournamentStatus::Finished;
        }

        let user = state
            .users
            .iter()
            .find(|c| c.user.id == posting.user_id)
            .map(|c| c.user.clone())
            .ok_or_else(|| StoreError::Missing(format!("user {}", posting.user_id)))?;
        Ok(WinnerOutcome::Awarded {
            user,
            balance_after,
        })
    }
}

#[async_trait]
impl HealthCheck for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
