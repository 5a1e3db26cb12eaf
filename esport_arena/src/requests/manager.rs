//! Request manager: submission and admin approval of deposits and withdrawals.

use log::{info, warn};
use std::sync::Arc;

use super::{
    errors::{RequestError, RequestResult},
    models::{
        AddRequest, AddRequestId, ApprovalOutcome, DepositForm, PayoutOutcome, RequestQueue,
        WithdrawForm, WithdrawRequest, WithdrawRequestId,
    },
};
use crate::auth::{Admin, Identity};
use crate::db::{ArenaStore, LedgerRepository, RequestRepository};
use crate::wallet::{Amount, within_limit};

/// Request queue manager
#[derive(Clone)]
pub struct RequestManager {
    store: Arc<dyn ArenaStore>,
}

impl RequestManager {
    pub fn new(store: Arc<dyn ArenaStore>) -> Self {
        Self { store }
    }

    /// Submit an add-money request. Nothing is credited until an admin approves it.
    ///
    /// # Errors
    ///
    /// * `RequestError::InvalidAmount` - Amount zero or negative
    /// * `RequestError::AmountTooLarge` - Amount at or above [`crate::wallet::AMOUNT_LIMIT`]
    pub async fn submit_deposit(
        &self,
        identity: &Identity,
        form: DepositForm,
    ) -> RequestResult<AddRequest> {
        let amount = form.amount.round_dp(2);
        if amount <= Amount::ZERO {
            return Err(RequestError::InvalidAmount);
        }
        if !within_limit(amount) {
            return Err(RequestError::AmountTooLarge);
        }

        let form = DepositForm {
            amount,
            upi_id: form.upi_id.trim().to_string(),
            txn_id: form.txn_id.trim().to_string(),
        };
        let request = self
            .store
            .insert_add_request(identity.user_id(), &form)
            .await?;

        info!(
            "Add request {} submitted by user {} for {}",
            request.id, request.user_id, request.amount
        );
        Ok(request)
    }

    /// Submit a withdraw request against the winning wallet.
    ///
    /// The balance is checked now and again at approval time; nothing is
    /// debited until then.
    ///
    /// # Errors
    ///
    /// * `RequestError::ExceedsWinningBalance` - Amount not positive or above the winning balance
    pub async fn submit_withdraw(
        &self,
        identity: &Identity,
        form: WithdrawForm,
    ) -> RequestResult<WithdrawRequest> {
        let user_id = identity.user_id();
        let balances = self
            .store
            .balances(user_id)
            .await?
            .ok_or(RequestError::UserNotFound(user_id))?;

        let amount = form.amount.round_dp(2);
        if amount <= Amount::ZERO || amount > balances.winning || !within_limit(amount) {
            warn!(
                "Withdraw of {} by user {} rejected (winning balance {})",
                amount, user_id, balances.winning
            );
            return Err(RequestError::ExceedsWinningBalance);
        }

        let form = WithdrawForm {
            amount,
            upi_id: form.upi_id.trim().to_string(),
        };
        let request = self.store.insert_withdraw_request(user_id, &form).await?;

        info!(
            "Withdraw request {} submitted by user {} for {}",
            request.id, request.user_id, request.amount
        );
        Ok(request)
    }

    /// The caller's own requests, newest first
    pub async fn user_requests(&self, identity: &Identity) -> RequestResult<RequestQueue> {
        let user_id = Some(identity.user_id());
        Ok(RequestQueue {
            add_requests: self.store.add_requests(user_id).await?,
            withdraw_requests: self.store.withdraw_requests(user_id).await?,
        })
    }

    /// Every request from every user, newest first
    pub async fn all_requests(&self, _admin: &Admin) -> RequestResult<RequestQueue> {
        Ok(RequestQueue {
            add_requests: self.store.add_requests(None).await?,
            withdraw_requests: self.store.withdraw_requests(None).await?,
        })
    }

    /// Approve an add-money request and credit the added wallet. Approving an
    /// already approved request changes nothing.
    pub async fn approve_add(
        &self,
        admin: &Admin,
        id: AddRequestId,
    ) -> RequestResult<ApprovalOutcome> {
        let outcome = self
            .store
            .approve_add_request(id)
            .await?
            .ok_or(RequestError::AddRequestNotFound(id))?;

        match &outcome {
            ApprovalOutcome::Approved(request) => info!(
                "Admin {} approved add request {}: +{} added for user {}",
                admin.user_id(),
                id,
                request.amount,
                request.user_id
            ),
            ApprovalOutcome::AlreadyApproved(_) => {
                info!("Add request {} was already approved", id)
            }
        }
        Ok(outcome)
    }

    /// Pay a withdraw request from the winning wallet. Nothing changes when
    /// it was already paid or the balance no longer covers it.
    pub async fn approve_withdraw(
        &self,
        admin: &Admin,
        id: WithdrawRequestId,
    ) -> RequestResult<PayoutOutcome> {
        let outcome = self
            .store
            .pay_withdraw_request(id)
            .await?
            .ok_or(RequestError::WithdrawRequestNotFound(id))?;

        match &outcome {
            PayoutOutcome::Paid(request) => info!(
                "Admin {} paid withdraw request {}: -{} winning for user {}",
                admin.user_id(),
                id,
                request.amount,
                request.user_id
            ),
            PayoutOutcome::AlreadyPaid(_) => info!("Withdraw request {} was already paid", id),
            PayoutOutcome::InsufficientBalance { request, available } => warn!(
                "Withdraw request {} left pending: user {} has {} winning, needs {}",
                id, request.user_id, available, request.amount
            ),
        }
        Ok(outcome)
    }
}
