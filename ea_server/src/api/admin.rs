//! Admin handlers: request approvals, tournament management and prizes.
//!
//! Every handler takes an [`AdminIdentity`]; non-admins never reach the body.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use esport_arena::{
    auth::UserId,
    requests::{AddRequestId, ApprovalOutcome, PayoutOutcome, RequestQueue, WithdrawRequestId},
    tournament::{NewTournament, TournamentId, TournamentUpdate},
    wallet::Amount,
};
use serde::Deserialize;

use super::{
    AppState,
    flash::{ApiError, Flash},
    middleware::AdminIdentity,
};
use crate::metrics;

#[derive(Debug, Deserialize)]
pub struct PrizePayload {
    pub user_id: UserId,
    pub amount: Amount,
}

#[derive(Debug, Deserialize)]
pub struct WinnerPayload {
    pub user_id: UserId,
    pub prize: Amount,
}

/// Every deposit and withdraw request, newest first
pub async fn panel(
    State(state): State<AppState>,
    AdminIdentity(admin): AdminIdentity,
) -> Result<Json<RequestQueue>, ApiError> {
    state
        .requests
        .all_requests(&admin)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_request(e, "/admin"))
}

/// Approve a deposit; approving twice credits once
pub async fn approve_add(
    State(state): State<AppState>,
    AdminIdentity(admin): AdminIdentity,
    Path(id): Path<AddRequestId>,
) -> Result<Flash, ApiError> {
    let outcome = state
        .requests
        .approve_add(&admin, id)
        .await
        .map_err(|e| ApiError::from_request(e, "/admin"))?;

    let (label, message) = match outcome {
        ApprovalOutcome::Approved(_) => ("approved", "Add-money request approved."),
        ApprovalOutcome::AlreadyApproved(_) => ("already_approved", "Request already approved."),
    };
    metrics::request_approvals_total("add", label);
    Ok(Flash::new(message, "/admin"))
}

/// Pay a withdraw request if the winning balance still covers it
pub async fn approve_withdraw(
    State(state): State<AppState>,
    AdminIdentity(admin): AdminIdentity,
    Path(id): Path<WithdrawRequestId>,
) -> Result<Flash, ApiError> {
    let outcome = state
        .requests
        .approve_withdraw(&admin, id)
        .await
        .map_err(|e| ApiError::from_request(e, "/admin"))?;

    let (label, message) = match outcome {
        PayoutOutcome::Paid(_) => ("paid", "Withdraw request paid."),
        PayoutOutcome::AlreadyPaid(_) => ("already_paid", "Request already paid."),
        PayoutOutcome::InsufficientBalance { .. } => (
            "insufficient_balance",
            "Winning balance kam hai, request pending hai.",
        ),
    };
    metrics::request_approvals_total("withdraw", label);
    Ok(Flash::new(message, "/admin"))
}

pub async fn create_tournament(
    State(state): State<AppState>,
    AdminIdentity(admin): AdminIdentity,
    form: Result<Json<NewTournament>, JsonRejection>,
) -> Result<Flash, ApiError> {
    let Json(form) = form.map_err(|e| ApiError::from_form(e, "/admin/tournaments/new"))?;
    state
        .tournaments
        .create(&admin, form)
        .await
        .map_err(|e| ApiError::from_tournament(e, "/admin/tournaments/new"))?;

    Ok(Flash::new("Tournament created.", "/tournaments"))
}

/// Update notes, room credentials, the grand flag and the status
pub async fn edit_tournament(
    State(state): State<AppState>,
    AdminIdentity(admin): AdminIdentity,
    Path(id): Path<TournamentId>,
    update: Result<Json<TournamentUpdate>, JsonRejection>,
) -> Result<Flash, ApiError> {
    let Json(update) = update.map_err(|e| ApiError::from_form(e, "/tournaments"))?;
    state
        .tournaments
        .edit(&admin, id, update)
        .await
        .map_err(|e| ApiError::from_tournament(e, "/tournaments"))?;

    Ok(Flash::new("Tournament info updated.", "/tournaments"))
}

pub async fn delete_tournament(
    State(state): State<AppState>,
    AdminIdentity(admin): AdminIdentity,
    Path(id): Path<TournamentId>,
) -> Result<Flash, ApiError> {
    state
        .tournaments
        .delete(&admin, id)
        .await
        .map_err(|e| ApiError::from_tournament(e, "/tournaments"))?;

    Ok(Flash::new("Tournament deleted.", "/tournaments"))
}

/// Credit a prize without finishing the tournament
pub async fn give_prize(
    State(state): State<AppState>,
    AdminIdentity(admin): AdminIdentity,
    Path(id): Path<TournamentId>,
    payload: Result<Json<PrizePayload>, JsonRejection>,
) -> Result<Flash, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::from_form(e, "/tournaments"))?;
    let award = state
        .tournaments
        .give_prize(&admin, id, payload.user_id, payload.amount)
        .await
        .map_err(|e| ApiError::from_tournament(e, "/tournaments"))?;

    metrics::prizes_awarded_total();
    Ok(Flash::new(
        format!(
            "₹{} prize user {} ko add ho gaya.",
            award.amount, award.user.email
        ),
        "/tournaments",
    ))
}

/// Credit the prize and mark the tournament finished
pub async fn set_winner(
    State(state): State<AppState>,
    AdminIdentity(admin): AdminIdentity,
    Path(id): Path<TournamentId>,
    payload: Result<Json<WinnerPayload>, JsonRejection>,
) -> Result<Flash, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::from_form(e, "/tournaments"))?;
    state
        .tournaments
        .set_winner(&admin, id, payload.user_id, payload.prize)
        .await
        .map_err(|e| ApiError::from_tournament(e, "/tournaments"))?;

    metrics::prizes_awarded_total();
    Ok(Flash::new(
        "Winner set ho gaya, prize add ho gaya.",
        "/tournaments",
    ))
}
