//! Wallet manager: the account ledger primitives.

use log::info;
use std::sync::Arc;

use super::{
    errors::{WalletError, WalletResult},
    models::{Amount, Balances, DebitOutcome, LedgerEntry, LedgerPosting, within_limit},
};
use crate::auth::UserId;
use crate::db::{ArenaStore, LedgerRepository};

/// Default page size for ledger history
pub const DEFAULT_ENTRY_LIMIT: i64 = 50;

/// Wallet manager
#[derive(Clone)]
pub struct WalletManager {
    store: Arc<dyn ArenaStore>,
}

impl WalletManager {
    /// Create a new wallet manager
    pub fn new(store: Arc<dyn ArenaStore>) -> Self {
        Self { store }
    }

    /// Get both balances for a user
    ///
    /// # Errors
    ///
    /// * `WalletError::WalletNotFound` - No such user
    pub async fn balances(&self, user_id: UserId) -> WalletResult<Balances> {
        self.store
            .balances(user_id)
            .await?
            .ok_or(WalletError::WalletNotFound(user_id))
    }

    /// Credit a wallet and record the ledger entry
    ///
    /// # Returns
    ///
    /// * `WalletResult<Amount>` - Balance of the credited wallet afterwards
    pub async fn credit(&self, posting: LedgerPosting) -> WalletResult<Amount> {
        if posting.amount <= Amount::ZERO || !within_limit(posting.amount) {
            return Err(WalletError::InvalidAmount(posting.amount));
        }

        let balance_after = self
            .store
            .credit(&posting)
            .await?
            .ok_or(WalletError::WalletNotFound(posting.user_id))?;

        info!(
            "Credited {} to {} wallet of user {} ({})",
            posting.amount, posting.wallet, posting.user_id, posting.entry_type
        );
        Ok(balance_after)
    }

    /// Debit a wallet only if it covers the amount
    ///
    /// # Errors
    ///
    /// * `WalletError::InsufficientBalance` - Wallet balance below amount; nothing changed
    pub async fn debit_if_sufficient(&self, posting: LedgerPosting) -> WalletResult<Amount> {
        if posting.amount <= Amount::ZERO || !within_limit(posting.amount) {
            return Err(WalletError::InvalidAmount(posting.amount));
        }

        match self
            .store
            .debit_if_sufficient(&posting)
            .await?
            .ok_or(WalletError::WalletNotFound(posting.user_id))?
        {
            DebitOutcome::Applied { balance_after } => {
                info!(
                    "Debited {} from {} wallet of user {} ({})",
                    posting.amount, posting.wallet, posting.user_id, posting.entry_type
                );
                Ok(balance_after)
            }
            DebitOutcome::Insufficient { available } => Err(WalletError::InsufficientBalance {
                wallet: posting.wallet,
                available,
                required: posting.amount,
            }),
        }
    }

    /// Most recent ledger entries for a user, newest first
    pub async fn entries(&self, user_id: UserId, limit: i64) -> WalletResult<Vec<LedgerEntry>> {
        Ok(self.store.entries(user_id, limit.clamp(1, 500)).await?)
    }
}
