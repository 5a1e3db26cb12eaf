//! PostgreSQL implementation of the repository traits.
//!
//! Multi-row mutations run in one transaction. Reservations lock the
//! tournament row and then the user row with `FOR UPDATE`, so concurrent
//! joins on the same tournament or wallet serialize.

use async_trait::async_trait;
use log::{debug, warn};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};
use std::str::FromStr;

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
};

const USER_COLUMNS: &str =
    "id, email, player_id, winning_balance, added_balance, is_admin, created_at";

const TOURNAMENT_COLUMNS: &str = "t.id, t.name, t.game, t.mode, t.entry_fee, t.prize_pool, \
     t.max_slots, t.status, t.start_time, t.created_at, t.winner_note, t.room_id, t.room_pass, \
     t.admin_note, t.is_grand, \
     (SELECT COUNT(*) FROM tournament_joins j WHERE j.tournament_id = t.id) AS filled_slots";

const JOIN_COLUMNS: &str = "id, tournament_id, user_id, in_game_name, in_game_uid, slot, created_at";

const LEDGER_COLUMNS: &str =
    "id, user_id, wallet, amount, balance_after, entry_type, reference, description, created_at";

const SLOT_CONSTRAINT: &str = "tournament_joins_slot_key";
const USER_JOIN_CONSTRAINT: &str = "tournament_joins_user_key";
const EMAIL_CONSTRAINT: &str = "users_email_key";

/// Repository implementation over a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn balance_column(wallet: WalletKind) -> &'static str {
    match wallet {
        WalletKind::Winning => "winning_balance",
        WalletKind::Added => "added_balance",
    }
}

/// Name of the violated unique constraint, if `err` is a unique violation
fn unique_violation(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            Some(db.constraint().unwrap_or_default().to_string())
        }
        _ => None,
    }
}

/// SQLSTATE 22003: the value does not fit the `NUMERIC` column
fn numeric_overflow(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("22003"))
}

fn parse_column<T: FromStr>(row: &PgRow, column: &'static str) -> StoreResult<T> {
    let raw: String = row.try_get(column)?;
    match raw.parse() {
        Ok(value) => Ok(value),
        Err(_) => Err(StoreError::InvalidValue { column, value: raw }),
    }
}

fn user_from_row(row: &PgRow) -> StoreResult<User> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        player_id: row.try_get("player_id")?,
        winning_balance: row.try_get("winning_balance")?,
        added_balance: row.try_get("added_balance")?,
        is_admin: row.try_get("is_admin")?,
        created_at: row.try_get("created_at")?,
    })
}

fn session_from_row(row: &PgRow) -> StoreResult<Session> {
    Ok(Session {
        token: row.try_get("token")?,
        user_id: row.try_get("user_id")?,
        created_at: row.try_get("created_at")?,
        expires_at: row.try_get("expires_at")?,
    })
}

fn ledger_entry_from_row(row: &PgRow) -> StoreResult<LedgerEntry> {
    Ok(LedgerEntry {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        wallet: parse_column(row, "wallet")?,
        amount: row.try_get("amount")?,
        balance_after: row.try_get("balance_after")?,
        entry_type: parse_column(row, "entry_type")?,
        reference: row.try_get("reference")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
    })
}

fn add_request_from_row(row: &PgRow) -> StoreResult<AddRequest> {
    Ok(AddRequest {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        amount: row.try_get("amount")?,
        upi_id: row.try_get("upi_id")?,
        txn_id: row.try_get("txn_id")?,
        status: parse_column(row, "status")?,
        created_at: row.try_get("created_at")?,
    })
}

fn withdraw_request_from_row(row: &PgRow) -> StoreResult<WithdrawRequest> {
    Ok(WithdrawRequest {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        amount: row.try_get("amount")?,
        upi_id: row.try_get("upi_id")?,
        status: parse_column(row, "status")?,
        created_at: row.try_get("created_at")?,
    })
}

fn tournament_from_row(row: &PgRow) -> StoreResult<Tournament> {
    Ok(Tournament {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        game: row.try_get("game")?,
        mode: row.try_get("mode")?,
        entry_fee: row.try_get("entry_fee")?,
        prize_pool: row.try_get("prize_pool")?,
        max_slots: row.try_get("max_slots")?,
        filled_slots: row.try_get("filled_slots")?,
        status: parse_column(row, "status")?,
        start_time: row.try_get("start_time")?,
        created_at: row.try_get("created_at")?,
        winner_note: row.try_get("winner_note")?,
        room_id: row.try_get("room_id")?,
        room_pass: row.try_get("room_pass")?,
        admin_note: row.try_get("admin_note")?,
        is_grand: row.try_get("is_grand")?,
    })
}

fn join_from_row(row: &PgRow) -> StoreResult<TournamentJoin> {
    Ok(TournamentJoin {
        id: row.try_get("id")?,
        tournament_id: row.try_get("tournament_id")?,
        user_id: row.try_get("user_id")?,
        in_game_name: row.try_get("in_game_name")?,
        in_game_uid: row.try_get("in_game_uid")?,
        slot: row.try_get("slot")?,
        created_at: row.try_get("created_at")?,
    })
}

async fn record_entry(
    conn: &mut PgConnection,
    posting: &LedgerPosting,
    signed_amount: Amount,
    balance_after: Amount,
) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO ledger_entries
             (user_id, wallet, amount, balance_after, entry_type, reference, description)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(posting.user_id)
    .bind(posting.wallet.as_str())
    .bind(signed_amount)
    .bind(balance_after)
    .bind(posting.entry_type.as_str())
    .bind(posting.reference.as_deref())
    .bind(posting.description.as_deref())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Credit inside an open transaction. `None` if the user does not exist.
async fn credit_in(conn: &mut PgConnection, posting: &LedgerPosting) -> StoreResult<Option<Amount>> {
    let column = balance_column(posting.wallet);
    let sql = format!(
        "UPDATE users SET {column} = {column} + $1 WHERE id = $2 RETURNING {column} AS balance"
    );
    let result = sqlx::query(&sql)
        .bind(posting.amount)
        .bind(posting.user_id)
        .fetch_optional(&mut *conn)
        .await;

    let row = match result {
        Ok(row) => row,
        Err(err) if numeric_overflow(&err) => {
            return Err(StoreError::BalanceLimit(posting.user_id));
        }
        Err(err) => return Err(err.into()),
    };
    let Some(row) = row else {
        return Ok(None);
    };
    let balance_after: Amount = row.try_get("balance")?;
    record_entry(conn, posting, posting.amount, balance_after).await?;
    Ok(Some(balance_after))
}

/// Conditional debit inside an open transaction. `None` if the user does not exist.
async fn debit_in(
    conn: &mut PgConnection,
    posting: &LedgerPosting,
) -> StoreResult<Option<DebitOutcome>> {
    let column = balance_column(posting.wallet);
    let sql = format!(
        "UPDATE users SET {column} = {column} - $1
         WHERE id = $2 AND {column} >= $1
         RETURNING {column} AS balance"
    );
    let row = sqlx::query(&sql)
        .bind(posting.amount)
        .bind(posting.user_id)
        .fetch_optional(&mut *conn)
        .await?;

    if let Some(row) = row {
        let balance_after: Amount = row.try_get("balance")?;
        record_entry(conn, posting, -posting.amount, balance_after).await?;
        return Ok(Some(DebitOutcome::Applied { balance_after }));
    }

    let sql = format!("SELECT {column} AS balance FROM users WHERE id = $1");
    let row = sqlx::query(&sql)
        .bind(posting.user_id)
        .fetch_optional(&mut *conn)
        .await?;
    match row {
        Some(row) => Ok(Some(DebitOutcome::Insufficient {
            available: row.try_get("balance")?,
        })),
        None => Ok(None),
    }
}

async fn fetch_tournament(
    conn: &mut PgConnection,
    id: TournamentId,
) -> StoreResult<Option<Tournament>> {
    let sql = format!("SELECT {TOURNAMENT_COLUMNS} FROM tournaments t WHERE t.id = $1");
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    row.as_ref().map(tournament_from_row).transpose()
}

/// Lock a tournament row for the rest of the transaction. Returns whether it exists.
async fn lock_tournament(conn: &mut PgConnection, id: TournamentId) -> StoreResult<bool> {
    let row = sqlx::query("SELECT id FROM tournaments WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.is_some())
}

#[async_trait]
impl UserRepository for PgStore {
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let sql = format!(
            "INSERT INTO users (email, password_hash, player_id, is_admin)
             VALUES ($1, $2, $3, $4)
             RETURNING {USER_COLUMNS}"
        );
        let result = sqlx::query(&sql)
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .bind(new_user.player_id.as_deref())
            .bind(new_user.is_admin)
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(row) => user_from_row(&row),
            Err(err) if unique_violation(&err).as_deref() == Some(EMAIL_CONSTRAINT) => {
                Err(StoreError::Conflict(format!("email {}", new_user.email)))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserCredentials>> {
        let sql = format!("SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1");
        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(UserCredentials {
                user: user_from_row(&row)?,
                password_hash: row.try_get("password_hash")?,
            })),
            None => Ok(None),
        }
    }

    async fn find_by_id(&self, user_id: UserId) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn admin_exists(&self) -> StoreResult<bool> {
        let row = sqlx::query("SELECT EXISTS (SELECT 1 FROM users WHERE is_admin) AS found")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("found")?)
    }
}

#[async_trait]
impl SessionRepository for PgStore {
    async fn create_session(&self, session: &Session) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(&session.token)
        .bind(session.user_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_session(&self, token: &str) -> StoreResult<Option<Session>> {
        let row = sqlx::query(
            "SELECT token, user_id, created_at, expires_at FROM sessions WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(session_from_row).transpose()
    }

    async fn delete_session(&self, token: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl LedgerRepository for PgStore {
    async fn balances(&self, user_id: UserId) -> StoreResult<Option<Balances>> {
        let row = sqlx::query("SELECT winning_balance, added_balance FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(Balances {
                winning: row.try_get("winning_balance")?,
                added: row.try_get("added_balance")?,
            })),
            None => Ok(None),
        }
    }

    async fn credit(&self, posting: &LedgerPosting) -> StoreResult<Option<Amount>> {
        let mut tx = self.pool.begin().await?;
        let balance = credit_in(&mut tx, posting).await?;
        if balance.is_some() {
            tx.commit().await?;
        }
        Ok(balance)
    }

    async fn debit_if_sufficient(
        &self,
        posting: &LedgerPosting,
    ) -> StoreResult<Option<DebitOutcome>> {
        let mut tx = self.pool.begin().await?;
        let outcome = debit_in(&mut tx, posting).await?;
        if matches!(outcome, Some(DebitOutcome::Applied { .. })) {
            tx.commit().await?;
        }
        Ok(outcome)
    }

    async fn entries(&self, user_id: UserId, limit: i64) -> StoreResult<Vec<LedgerEntry>> {
        let sql = format!(
            "SELECT {LEDGER_COLUMNS} FROM ledger_entries
             WHERE user_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2"
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(ledger_entry_from_row).collect()
    }
}

#[async_trait]
impl RequestRepository for PgStore {
    async fn insert_add_request(
        &self,
        user_id: UserId,
        form: &DepositForm,
    ) -> StoreResult<AddRequest> {
        let row = sqlx::query(
            "INSERT INTO add_requests (user_id, amount, upi_id, txn_id)
             VALUES ($1, $2, $3, $4)
             RETURNING id, user_id, amount, upi_id, txn_id, status, created_at",
        )
        .bind(user_id)
        .bind(form.amount)
        .bind(&form.upi_id)
        .bind(&form.txn_id)
        .fetch_one(&self.pool)
        .await?;
        add_request_from_row(&row)
    }

    async fn insert_withdraw_request(
        &self,
        user_id: UserId,
        form: &WithdrawForm,
    ) -> StoreResult<WithdrawRequest> {
        let row = sqlx::query(
            "INSERT INTO withdraw_requests (user_id, amount, upi_id)
             VALUES ($1, $2, $3)
             RETURNING id, user_id, amount, upi_id, status, created_at",
        )
        .bind(user_id)
        .bind(form.amount)
        .bind(&form.upi_id)
        .fetch_one(&self.pool)
        .await?;
        withdraw_request_from_row(&row)
    }

    async fn add_requests(&self, user_id: Option<UserId>) -> StoreResult<Vec<AddRequest>> {
        let rows = sqlx::query(
            "SELECT id, user_id, amount, upi_id, txn_id, status, created_at
             FROM add_requests
             WHERE $1::BIGINT IS NULL OR user_id = $1
             ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(add_request_from_row).collect()
    }

    async fn withdraw_requests(
        &self,
        user_id: Option<UserId>,
    ) -> StoreResult<Vec<WithdrawRequest>> {
        let rows = sqlx::query(
            "SELECT id, user_id, amount, upi_id, status, created_at
             FROM withdraw_requests
             WHERE $1::BIGINT IS NULL OR user_id = $1
             ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(withdraw_request_from_row).collect()
    }

    async fn approve_add_request(&self, id: AddRequestId) -> StoreResult<Option<ApprovalOutcome>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "SELECT id, user_id, amount, upi_id, txn_id, status, created_at
             FROM add_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let mut request = add_request_from_row(&row)?;

        if request.status == AddRequestStatus::Approved {
            return Ok(Some(ApprovalOutcome::AlreadyApproved(request)));
        }

        sqlx::query("UPDATE add_requests SET status = $1 WHERE id = $2")
            .bind(AddRequestStatus::Approved.as_str())
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let posting = LedgerPosting::new(
            request.user_id,
            WalletKind::Added,
            request.amount,
            EntryType::Deposit,
        )
        .with_reference(format!("add_request:{id}"))
        .with_description(format!("UPI txn {}", request.txn_id));

        if credit_in(&mut tx, &posting).await?.is_none() {
            return Err(StoreError::Missing(format!("user {}", request.user_id)));
        }

        tx.commit().await?;
        request.status = AddRequestStatus::Approved;
        debug!("Add request {} approved", id);
        Ok(Some(ApprovalOutcome::Approved(request)))
    }

    async fn pay_withdraw_request(
        &self,
        id: WithdrawRequestId,
    ) -> StoreResult<Option<PayoutOutcome>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "SELECT id, user_id, amount, upi_id, status, created_at
             FROM withdraw_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let mut request = withdraw_request_from_row(&row)?;

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

        match debit_in(&mut tx, &posting).await? {
            Some(DebitOutcome::Applied { .. }) => {}
            Some(DebitOutcome::Insufficient { available }) => {
                return Ok(Some(PayoutOutcome::InsufficientBalance { request, available }));
            }
            None => return Err(StoreError::Missing(format!("user {}", request.user_id))),
        }

        sqlx::query("UPDATE withdraw_requests SET status = $1 WHERE id = $2")
            .bind(WithdrawStatus::Paid.as_str())
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        request.status = WithdrawStatus::Paid;
        debug!("Withdraw request {} paid", id);
        Ok(Some(PayoutOutcome::Paid(request)))
    }
}

#[async_trait]
impl TournamentRepository for PgStore {
    async fn insert_tournament(&self, new_tournament: &NewTournament) -> StoreResult<Tournament> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(
            "INSERT INTO tournaments
                 (name, game, mode, entry_fee, prize_pool, max_slots, status, start_time, is_grand)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING id",
        )
        .bind(&new_tournament.name)
        .bind(&new_tournament.game)
        .bind(&new_tournament.mode)
        .bind(new_tournament.entry_fee)
        .bind(new_tournament.prize_pool)
        .bind(new_tournament.max_slots)
        .bind(TournamentStatus::Upcoming.as_str())
        .bind(new_tournament.start_time)
        .bind(new_tournament.is_grand)
        .fetch_one(&mut *tx)
        .await?;
        let id: TournamentId = row.try_get("id")?;

        let tournament = fetch_tournament(&mut tx, id)
            .await?
            .ok_or_else(|| StoreError::Missing(format!("tournament {id}")))?;
        tx.commit().await?;
        Ok(tournament)
    }

    async fn update_tournament(
        &self,
        id: TournamentId,
        edit: &TournamentEdit,
    ) -> StoreResult<Option<Tournament>> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "UPDATE tournaments
             SET winner_note = $1, room_id = $2, room_pass = $3, admin_note = $4,
                 is_grand = $5, status = COALESCE($6, status)
             WHERE id = $7",
        )
        .bind(edit.winner_note.as_deref())
        .bind(edit.room_id.as_deref())
        .bind(edit.room_pass.as_deref())
        .bind(edit.admin_note.as_deref())
        .bind(edit.is_grand)
        .bind(edit.status.map(|s| s.as_str()))
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        let tournament = fetch_tournament(&mut tx, id).await?;
        tx.commit().await?;
        Ok(tournament)
    }

    async fn find_tournament(&self, id: TournamentId) -> StoreResult<Option<Tournament>> {
        let mut conn = self.pool.acquire().await?;
        fetch_tournament(&mut conn, id).await
    }

    async fn list_tournaments(&self) -> StoreResult<Vec<Tournament>> {
        let sql = format!(
            "SELECT {TOURNAMENT_COLUMNS} FROM tournaments t ORDER BY t.created_at DESC, t.id DESC"
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(tournament_from_row).collect()
    }

    async fn joins_for_tournament(&self, id: TournamentId) -> StoreResult<Vec<TournamentJoin>> {
        let sql = format!(
            "SELECT {JOIN_COLUMNS} FROM tournament_joins WHERE tournament_id = $1 ORDER BY slot"
        );
        let rows = sqlx::query(&sql).bind(id).fetch_all(&self.pool).await?;
        rows.iter().map(join_from_row).collect()
    }

    async fn joined_tournament_ids(&self, user_id: UserId) -> StoreResult<Vec<TournamentId>> {
        let rows = sqlx::query("SELECT tournament_id FROM tournament_joins WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| row.try_get("tournament_id").map_err(StoreError::from))
            .collect()
    }

    async fn has_joined(&self, id: TournamentId, user_id: UserId) -> StoreResult<bool> {
        let row = sqlx::query(
            "SELECT EXISTS (
                 SELECT 1 FROM tournament_joins WHERE tournament_id = $1 AND user_id = $2
             ) AS found",
        )
        .bind(id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("found")?)
    }

    async fn reserve_slot(&self, claim: &SlotClaim) -> StoreResult<ReservationOutcome> {
        let mut tx = self.pool.begin().await?;

        if !lock_tournament(&mut tx, claim.tournament_id).await? {
            return Ok(ReservationOutcome::Rejected(JoinError::TournamentNotFound(
                claim.tournament_id,
            )));
        }
        let tournament = fetch_tournament(&mut tx, claim.tournament_id)
            .await?
            .ok_or_else(|| StoreError::Missing(format!("tournament {}", claim.tournament_id)))?;

        let row = sqlx::query(
            "SELECT winning_balance, added_balance FROM users WHERE id = $1 FOR UPDATE",
        )
        .bind(claim.user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::Missing(format!("user {}", claim.user_id)))?;
        let balances = Balances {
            winning: row.try_get("winning_balance")?,
            added: row.try_get("added_balance")?,
        };

        let row = sqlx::query(
            "SELECT
                 EXISTS (SELECT 1 FROM tournament_joins WHERE tournament_id = $1 AND user_id = $2)
                     AS already_joined,
                 EXISTS (SELECT 1 FROM tournament_joins WHERE tournament_id = $1 AND slot = $3)
                     AS slot_taken",
        )
        .bind(claim.tournament_id)
        .bind(claim.user_id)
        .bind(claim.request.slot)
        .fetch_one(&mut *tx)
        .await?;

        let snapshot = JoinSnapshot {
            tournament: &tournament,
            already_joined: row.try_get("already_joined")?,
            slot_taken: row.try_get("slot_taken")?,
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

            match debit_in(&mut tx, &posting).await? {
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

        let sql = format!(
            "INSERT INTO tournament_joins (tournament_id, user_id, in_game_name, in_game_uid, slot)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {JOIN_COLUMNS}"
        );
        let inserted = sqlx::query(&sql)
            .bind(claim.tournament_id)
            .bind(claim.user_id)
            .bind(claim.request.in_game_name.trim())
            .bind(claim.request.in_game_uid.trim())
            .bind(claim.request.slot)
            .fetch_one(&mut *tx)
            .await;

        let row = match inserted {
            Ok(row) => row,
            Err(err) => {
                let rejection = match unique_violation(&err).as_deref() {
                    Some(SLOT_CONSTRAINT) => JoinError::SlotTaken(claim.request.slot),
                    Some(USER_JOIN_CONSTRAINT) => JoinError::AlreadyJoined,
                    _ => return Err(err.into()),
                };
                warn!(
                    "Join of user {} to tournament {} lost a race: {}",
                    claim.user_id, claim.tournament_id, rejection
                );
                return Ok(ReservationOutcome::Rejected(rejection));
            }
        };
        let join = join_from_row(&row)?;

        tx.commit().await?;
        Ok(ReservationOutcome::Reserved(join))
    }

    async fn delete_tournament(&self, id: TournamentId) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM tournament_joins WHERE tournament_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM tournaments WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }
        tx.commit().await?;
        Ok(true)
    }

    async fn award_winner(
        &self,
        id: TournamentId,
        posting: &LedgerPosting,
    ) -> StoreResult<WinnerOutcome> {
        let mut tx = self.pool.begin().await?;

        if !lock_tournament(&mut tx, id).await? {
            return Ok(WinnerOutcome::TournamentNotFound);
        }
        let Some(balance_after) = credit_in(&mut tx, posting).await? else {
            return Ok(WinnerOutcome::UserNotFound);
        };

        sqlx::query("UPDATE tournaments SET status = $1 WHERE id = $2")
            .bind(TournamentStatus::Finished.as_str())
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(posting.user_id)
            .fetch_one(&mut *tx)
            .await?;
        let user = user_from_row(&row)?;

        tx.commit().await?;
        Ok(WinnerOutcome::Awarded {
            user,
            balance_after,
        })
    }
}

#[async_trait]
impl HealthCheck for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
