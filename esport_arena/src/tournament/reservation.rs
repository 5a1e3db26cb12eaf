//! Slot reservation checks.
//!
//! The checks are pure so that every store runs the same ordered sequence
//! inside its own atomic section (a transaction holding row locks for
//! PostgreSQL, the state mutex for the in-memory store).

use serde::Serialize;
use thiserror::Error;

use super::models::{JoinRequest, Tournament, TournamentId, TournamentJoin};
use crate::auth::UserId;
use crate::wallet::{Amount, Balances, WalletKind};

/// Why a join attempt was refused. Nothing is mutated for any of these.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum JoinError {
    #[error("Tournament not found.")]
    TournamentNotFound(TournamentId),

    #[error("Tournament full ya closed hai.")]
    FullOrClosed,

    #[error("Aap pehle hi is tournament me joined ho.")]
    AlreadyJoined,

    #[error("Invalid slot number.")]
    InvalidSlot(i32),

    #[error("Ye slot already taken hai.")]
    SlotTaken(i32),

    #[error("Please wallet select karo.")]
    NoWalletSelected,

    #[error("{} wallet me itna balance nahi hai.", wallet_label(.wallet))]
    InsufficientBalance {
        wallet: WalletKind,
        available: Amount,
        required: Amount,
    },
}

fn wallet_label(wallet: &WalletKind) -> &'static str {
    match wallet {
        WalletKind::Winning => "Winning",
        WalletKind::Added => "Added",
    }
}

impl JoinError {
    /// Whether the player should be sent back to the join form rather than
    /// the tournament list.
    pub fn returns_to_form(&self) -> bool {
        !matches!(
            self,
            JoinError::TournamentNotFound(_) | JoinError::FullOrClosed | JoinError::AlreadyJoined
        )
    }

    /// Short label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            JoinError::TournamentNotFound(_) => "not_found",
            JoinError::FullOrClosed => "full_or_closed",
            JoinError::AlreadyJoined => "already_joined",
            JoinError::InvalidSlot(_) => "invalid_slot",
            JoinError::SlotTaken(_) => "slot_taken",
            JoinError::NoWalletSelected => "no_wallet",
            JoinError::InsufficientBalance { .. } => "insufficient_balance",
        }
    }
}

/// A join attempt handed to the store
#[derive(Debug, Clone)]
pub struct SlotClaim {
    pub tournament_id: TournamentId,
    pub user_id: UserId,
    pub request: JoinRequest,
}

/// State read inside the atomic section
#[derive(Debug, Clone, Copy)]
pub struct JoinSnapshot<'a> {
    pub tournament: &'a Tournament,
    pub already_joined: bool,
    pub slot_taken: bool,
    pub balances: Balances,
}

/// What a passing join will debit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinPlan {
    pub wallet: WalletKind,
    pub fee: Amount,
}

/// Result of a store-level reservation
#[derive(Debug, Clone, PartialEq)]
pub enum ReservationOutcome {
    Reserved(TournamentJoin),
    Rejected(JoinError),
}

/// Checks shared by the join form and the join itself: open for entries and
/// not joined yet.
pub fn check_entry(tournament: &Tournament, already_joined: bool) -> Result<(), JoinError> {
    if !tournament.accepts_joins() {
        return Err(JoinError::FullOrClosed);
    }
    if already_joined {
        return Err(JoinError::AlreadyJoined);
    }
    Ok(())
}

/// Run every join precondition in order.
pub fn check_join(snapshot: &JoinSnapshot<'_>, request: &JoinRequest) -> Result<JoinPlan, JoinError> {
    check_entry(snapshot.tournament, snapshot.already_joined)?;

    if !snapshot.tournament.slot_in_range(request.slot) {
        return Err(JoinError::InvalidSlot(request.slot));
    }

    if snapshot.slot_taken {
        return Err(JoinError::SlotTaken(request.slot));
    }

    let wallet: WalletKind = request
        .wallet
        .trim()
        .parse()
        .map_err(|_| JoinError::NoWalletSelected)?;

    let fee = snapshot.tournament.entry_fee;
    let available = snapshot.balances.get(wallet);
    if available < fee {
        return Err(JoinError::InsufficientBalance {
            wallet,
            available,
            required: fee,
        });
    }

    Ok(JoinPlan { wallet, fee })
}
