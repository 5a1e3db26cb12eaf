//! Tournament manager: catalog, slot reservation and prizes.

use log::{info, warn};
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;

use super::models::{
    JoinForm, JoinRequest, NewTournament, PrizeAward, Tournament, TournamentDetail,
    TournamentEdit, TournamentId, TournamentJoin, TournamentListing, TournamentUpdate,
};
use super::reservation::{JoinError, ReservationOutcome, SlotClaim, check_entry};
use crate::auth::{Admin, Identity, UserId};
use crate::db::{
    ArenaStore, LedgerRepository, StoreError, TournamentRepository, UserRepository, WinnerOutcome,
};
use crate::wallet::{Amount, EntryType, LedgerPosting, WalletKind, within_limit};

/// Tournament errors
#[derive(Debug, Error)]
pub enum TournamentError {
    /// Store error
    #[error("Store error: {0}")]
    Store(#[source] StoreError),

    #[error("Tournament not found.")]
    NotFound(TournamentId),

    #[error("User not found.")]
    UserNotFound(UserId),

    /// Join refused
    #[error(transparent)]
    Join(#[from] JoinError),

    /// Invalid creation form
    #[error("{0}")]
    InvalidTournament(String),

    /// Prize amount zero or negative
    #[error("Amount must be positive.")]
    InvalidAmount,

    /// Prize amount outside the money column range
    #[error("Amount is too large.")]
    AmountTooLarge,

    /// Prize would push the winning wallet past its limit; nothing changed
    #[error("Wallet balance limit reached.")]
    BalanceLimit,
}

impl From<StoreError> for TournamentError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::BalanceLimit(_) => TournamentError::BalanceLimit,
            other => TournamentError::Store(other),
        }
    }
}

impl TournamentError {
    /// Get a client-safe error message that doesn't leak sensitive information
    pub fn client_message(&self) -> String {
        match self {
            TournamentError::Store(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            TournamentError::NotFound(_)
                | TournamentError::UserNotFound(_)
                | TournamentError::Join(JoinError::TournamentNotFound(_))
        )
    }
}

/// Result type for tournament operations
pub type TournamentResult<T> = Result<T, TournamentError>;

/// Tournament manager
#[derive(Clone)]
pub struct TournamentManager {
    store: Arc<dyn ArenaStore>,
}

impl TournamentManager {
    /// Create a new tournament manager
    pub fn new(store: Arc<dyn ArenaStore>) -> Self {
        Self { store }
    }

    /// Every tournament, newest first, with the ids the caller has joined
    pub async fn list(&self, identity: &Identity) -> TournamentResult<TournamentListing> {
        let joined_ids: BTreeSet<TournamentId> = self
            .store
            .joined_tournament_ids(identity.user_id())
            .await?
            .into_iter()
            .collect();

        let tournaments = self
            .store
            .list_tournaments()
            .await?
            .into_iter()
            .map(|t| {
                if identity.is_admin() || joined_ids.contains(&t.id) {
                    t
                } else {
                    t.without_room_credentials()
                }
            })
            .collect();

        Ok(TournamentListing {
            tournaments,
            joined_ids,
        })
    }

    /// A tournament with its players ordered by slot. Room credentials are
    /// only included for admins and joined players.
    pub async fn detail(
        &self,
        identity: &Identity,
        id: TournamentId,
    ) -> TournamentResult<TournamentDetail> {
        let tournament = self.find(id).await?;
        let joins = self.store.joins_for_tournament(id).await?;

        let can_see_room =
            identity.is_admin() || joins.iter().any(|j| j.user_id == identity.user_id());
        let tournament = if can_see_room {
            tournament
        } else {
            tournament.without_room_credentials()
        };

        Ok(TournamentDetail { tournament, joins })
    }

    /// Data for the join form: the tournament and its taken slots. Refused
    /// when the tournament is full, closed, or already joined.
    pub async fn join_form(
        &self,
        identity: &Identity,
        id: TournamentId,
    ) -> TournamentResult<JoinForm> {
        let tournament = self.find(id).await?;
        let already_joined = self.store.has_joined(id, identity.user_id()).await?;
        check_entry(&tournament, already_joined)?;

        let taken_slots = self
            .store
            .joins_for_tournament(id)
            .await?
            .into_iter()
            .map(|j| j.slot)
            .collect();

        Ok(JoinForm {
            tournament: tournament.without_room_credentials(),
            taken_slots,
        })
    }

    /// Reserve a slot and pay the entry fee from the chosen wallet, atomically.
    ///
    /// # Errors
    ///
    /// * `TournamentError::Join` - One of the join checks failed; nothing changed
    pub async fn join(
        &self,
        identity: &Identity,
        id: TournamentId,
        request: JoinRequest,
    ) -> TournamentResult<TournamentJoin> {
        let claim = SlotClaim {
            tournament_id: id,
            user_id: identity.user_id(),
            request,
        };

        match self.store.reserve_slot(&claim).await? {
            ReservationOutcome::Reserved(join) => {
                info!(
                    "User {} joined tournament {} in slot {}",
                    join.user_id, join.tournament_id, join.slot
                );
                Ok(join)
            }
            ReservationOutcome::Rejected(rejection) => {
                warn!(
                    "Join of user {} to tournament {} rejected: {}",
                    claim.user_id,
                    id,
                    rejection.kind()
                );
                Err(rejection.into())
            }
        }
    }

    /// Create a tournament in the upcoming state
    pub async fn create(
        &self,
        admin: &Admin,
        form: NewTournament,
    ) -> TournamentResult<Tournament> {
        let form = validate_new_tournament(form)?;
        let tournament = self.store.insert_tournament(&form).await?;
        info!(
            "Admin {} created tournament {} ({})",
            admin.user_id(),
            tournament.id,
            tournament.name
        );
        Ok(tournament)
    }

    /// Update notes, room credentials, the grand flag and optionally the status
    pub async fn edit(
        &self,
        admin: &Admin,
        id: TournamentId,
        update: TournamentUpdate,
    ) -> TournamentResult<Tournament> {
        let edit = TournamentEdit::from(update);
        let tournament = self
            .store
            .update_tournament(id, &edit)
            .await?
            .ok_or(TournamentError::NotFound(id))?;
        info!(
            "Admin {} edited tournament {} (status {})",
            admin.user_id(),
            id,
            tournament.status
        );
        Ok(tournament)
    }

    /// Delete a tournament and all of its joins
    pub async fn delete(&self, admin: &Admin, id: TournamentId) -> TournamentResult<()> {
        if !self.store.delete_tournament(id).await? {
            return Err(TournamentError::NotFound(id));
        }
        info!("Admin {} deleted tournament {}", admin.user_id(), id);
        Ok(())
    }

    /// Credit a prize to a user's winning wallet. The tournament is left as is.
    pub async fn give_prize(
        &self,
        admin: &Admin,
        id: TournamentId,
        user_id: UserId,
        amount: Amount,
    ) -> TournamentResult<PrizeAward> {
        let amount = positive_amount(amount)?;
        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(TournamentError::UserNotFound(user_id))?;

        let winning_balance = self
            .store
            .credit(&prize_posting(id, user_id, amount))
            .await?
            .ok_or(TournamentError::UserNotFound(user_id))?;

        info!(
            "Admin {} gave prize {} to user {} for tournament {}",
            admin.user_id(),
            amount,
            user_id,
            id
        );
        Ok(PrizeAward {
            user,
            amount,
            winning_balance,
        })
    }

    /// Credit the prize and mark the tournament finished, atomically
    pub async fn set_winner(
        &self,
        admin: &Admin,
        id: TournamentId,
        user_id: UserId,
        prize: Amount,
    ) -> TournamentResult<PrizeAward> {
        let amount = positive_amount(prize)?;

        match self
            .store
            .award_winner(id, &prize_posting(id, user_id, amount))
            .await?
        {
            WinnerOutcome::Awarded {
                user,
                balance_after,
            } => {
                info!(
                    "Admin {} set user {} as winner of tournament {} with prize {}",
                    admin.user_id(),
                    user_id,
                    id,
                    amount
                );
                Ok(PrizeAward {
                    user,
                    amount,
                    winning_balance: balance_after,
                })
            }
            WinnerOutcome::TournamentNotFound => Err(TournamentError::NotFound(id)),
            WinnerOutcome::UserNotFound => Err(TournamentError::UserNotFound(user_id)),
        }
    }

    async fn find(&self, id: TournamentId) -> TournamentResult<Tournament> {
        self.store
            .find_tournament(id)
            .await?
            .ok_or(TournamentError::NotFound(id))
    }
}

fn positive_amount(amount: Amount) -> TournamentResult<Amount> {
    let amount = amount.round_dp(2);
    if amount <= Amount::ZERO {
        return Err(TournamentError::InvalidAmount);
    }
    if !within_limit(amount) {
        return Err(TournamentError::AmountTooLarge);
    }
    Ok(amount)
}

fn prize_posting(id: TournamentId, user_id: UserId, amount: Amount) -> LedgerPosting {
    LedgerPosting::new(user_id, WalletKind::Winning, amount, EntryType::Prize)
        .with_reference(format!("tournament:{id}"))
        .with_description("Tournament prize")
}

fn validate_new_tournament(form: NewTournament) -> TournamentResult<NewTournament> {
    let name = form.name.trim().to_string();
    if name.is_empty() {
        return Err(TournamentError::InvalidTournament(
            "Tournament name is required.".to_string(),
        ));
    }
    if form.max_slots < 1 {
        return Err(TournamentError::InvalidTournament(
            "Max slots must be at least 1.".to_string(),
        ));
    }
    let entry_fee = form.entry_fee.round_dp(2);
    let prize_pool = form.prize_pool.round_dp(2);
    if entry_fee < Amount::ZERO || prize_pool < Amount::ZERO {
        return Err(TournamentError::InvalidTournament(
            "Entry fee and prize pool cannot be negative.".to_string(),
        ));
    }
    if !within_limit(entry_fee) || !within_limit(prize_pool) {
        return Err(TournamentError::InvalidTournament(
            "Entry fee and prize pool are too large.".to_string(),
        ));
    }

    Ok(NewTournament {
        name,
        game: form.game.trim().to_string(),
        mode: form.mode.trim().to_string(),
        entry_fee,
        prize_pool,
        ..form
    })
}
