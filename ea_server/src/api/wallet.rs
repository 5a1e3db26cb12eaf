//! Dashboard, ledger history and deposit/withdraw submission.

use axum::{
    Extension, Json,
    extract::{Query, State, rejection::JsonRejection},
};
use esport_arena::{
    Identity,
    auth::User,
    requests::{AddRequest, DepositForm, RequestQueue, WithdrawForm, WithdrawRequest},
    wallet::{DEFAULT_ENTRY_LIMIT, LedgerEntry},
};
use serde::{Deserialize, Serialize};

use super::{
    AppState,
    flash::{ApiError, Flash},
};

#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardResponse {
    /// Includes both wallet balances
    pub user: User,
    pub add_requests: Vec<AddRequest>,
    pub withdraw_requests: Vec<WithdrawRequest>,
}

#[derive(Debug, Deserialize)]
pub struct EntriesQuery {
    pub limit: Option<i64>,
}

/// The caller's balances and their own requests, newest first
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let user = state
        .auth
        .current_user(&identity)
        .await
        .map_err(|e| ApiError::from_auth(e, "/login"))?;

    let RequestQueue {
        add_requests,
        withdraw_requests,
    } = state
        .requests
        .user_requests(&identity)
        .await
        .map_err(|e| ApiError::from_request(e, "/dashboard"))?;

    Ok(Json(DashboardResponse {
        user,
        add_requests,
        withdraw_requests,
    }))
}

/// Ledger history of the caller, newest first
pub async fn entries(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<EntriesQuery>,
) -> Result<Json<Vec<LedgerEntry>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_ENTRY_LIMIT);
    let entries = state
        .wallet
        .entries(identity.user_id(), limit)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to load ledger entries");
            ApiError::Internal
        })?;

    Ok(Json(entries))
}

/// Submit an add-money request for admin approval
pub async fn add_money(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    form: Result<Json<DepositForm>, JsonRejection>,
) -> Result<Flash, ApiError> {
    let Json(form) = form.map_err(|e| ApiError::from_form(e, "/dashboard"))?;
    state
        .requests
        .submit_deposit(&identity, form)
        .await
        .map_err(|e| ApiError::from_request(e, "/dashboard"))?;

    Ok(Flash::new(
        "Add-money request submitted. Pehle UPI se payment karo, phir admin approve karega.",
        "/dashboard",
    ))
}

/// Submit a withdraw request against the winning wallet
pub async fn withdraw(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    form: Result<Json<WithdrawForm>, JsonRejection>,
) -> Result<Flash, ApiError> {
    let Json(form) = form.map_err(|e| ApiError::from_form(e, "/dashboard"))?;
    state
        .requests
        .submit_withdraw(&identity, form)
        .await
        .map_err(|e| ApiError::from_request(e, "/dashboard"))?;

    Ok(Flash::new(
        "Withdraw request submitted. Admin approve karega.",
        "/dashboard",
    ))
}
