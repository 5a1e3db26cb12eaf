//! Tournament data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

use crate::auth::{User, UserId};
use crate::wallet::Amount;

/// Tournament ID type
pub type TournamentId = i64;

/// Tournament lifecycle status. Admins may set any value at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TournamentStatus {
    Upcoming,
    Live,
    Finished,
}

impl TournamentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TournamentStatus::Upcoming => "upcoming",
            TournamentStatus::Live => "live",
            TournamentStatus::Finished => "finished",
        }
    }

    /// Whether joins are accepted in this status
    pub fn is_open(&self) -> bool {
        matches!(self, TournamentStatus::Upcoming | TournamentStatus::Live)
    }
}

impl std::fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TournamentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upcoming" => Ok(TournamentStatus::Upcoming),
            "live" => Ok(TournamentStatus::Live),
            "finished" => Ok(TournamentStatus::Finished),
            other => Err(other.to_string()),
        }
    }
}

/// Tournament
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub game: String,
    pub mode: String,
    pub entry_fee: Amount,
    /// Informational only; prizes are credited independently
    pub prize_pool: Amount,
    pub max_slots: i32,
    /// Number of join rows, computed on read
    pub filled_slots: i64,
    pub status: TournamentStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub winner_note: Option<String>,
    pub room_id: Option<String>,
    pub room_pass: Option<String>,
    pub admin_note: Option<String>,
    pub is_grand: bool,
}

impl Tournament {
    pub fn is_full(&self) -> bool {
        self.filled_slots >= i64::from(self.max_slots)
    }

    /// Not full, and upcoming or live
    pub fn accepts_joins(&self) -> bool {
        !self.is_full() && self.status.is_open()
    }

    pub fn slot_in_range(&self, slot: i32) -> bool {
        (1..=self.max_slots).contains(&slot)
    }

    /// Copy with the room id and password removed
    pub fn without_room_credentials(mut self) -> Self {
        self.room_id = None;
        self.room_pass = None;
        self
    }
}

/// Tournament creation form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTournament {
    pub name: String,
    pub game: String,
    pub mode: String,
    pub entry_fee: Amount,
    pub prize_pool: Amount,
    pub max_slots: i32,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_grand: bool,
}

/// Tournament edit form as submitted. Blank text fields clear the value and an
/// unrecognised status leaves the status untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TournamentUpdate {
    #[serde(default)]
    pub winner_note: Option<String>,
    #[serde(default)]
    pub room_id: Option<String>,
    #[serde(default)]
    pub room_pass: Option<String>,
    #[serde(default)]
    pub admin_note: Option<String>,
    #[serde(default)]
    pub is_grand: bool,
    #[serde(default)]
    pub status: Option<String>,
}

/// Normalised edit applied by the store
#[derive(Debug, Clone, PartialEq)]
pub struct TournamentEdit {
    pub winner_note: Option<String>,
    pub room_id: Option<String>,
    pub room_pass: Option<String>,
    pub admin_note: Option<String>,
    pub is_grand: bool,
    pub status: Option<TournamentStatus>,
}

impl From<TournamentUpdate> for TournamentEdit {
    fn from(update: TournamentUpdate) -> Self {
        fn blank_to_none(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Self {
            winner_note: blank_to_none(update.winner_note),
            room_id: blank_to_none(update.room_id),
            room_pass: blank_to_none(update.room_pass),
            admin_note: blank_to_none(update.admin_note),
            is_grand: update.is_grand,
            status: update.status.and_then(|s| s.trim().parse().ok()),
        }
    }
}

/// A claimed slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentJoin {
    pub id: i64,
    pub tournament_id: TournamentId,
    pub user_id: UserId,
    pub in_game_name: String,
    pub in_game_uid: String,
    pub slot: i32,
    pub created_at: DateTime<Utc>,
}

/// Join form as submitted by a player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRequest {
    pub in_game_name: String,
    pub in_game_uid: String,
    pub slot: i32,
    /// `winning` or `added`; anything else is rejected
    #[serde(default)]
    pub wallet: String,
}

/// Tournament list with the caller's joined tournaments
#[derive(Debug, Clone, Serialize)]
pub struct TournamentListing {
    pub tournaments: Vec<Tournament>,
    pub joined_ids: BTreeSet<TournamentId>,
}

/// Tournament with its players ordered by slot
#[derive(Debug, Clone, Serialize)]
pub struct TournamentDetail {
    pub tournament: Tournament,
    pub joins: Vec<TournamentJoin>,
}

/// Data needed to render the join form
#[derive(Debug, Clone, Serialize)]
pub struct JoinForm {
    pub tournament: Tournament,
    pub taken_slots: Vec<i32>,
}

/// A credited prize
#[derive(Debug, Clone, Serialize)]
pub struct PrizeAward {
    pub user: User,
    pub amount: Amount,
    pub winning_balance: Amount,
}
