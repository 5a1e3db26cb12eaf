//! Tournament module: catalog, slot reservation and prize distribution.
//!
//! This module provides:
//! - Tournament creation, editing and deletion (admin)
//! - Listing and detail views with room credentials limited to joined players
//! - Slot reservation that pays the entry fee from the chosen wallet
//! - Prize credits, optionally finishing the tournament
//!
//! ## Example
//!
//! ```no_run
//! use esport_arena::db::{ArenaStore, MemoryStore};
//! use esport_arena::tournament::{JoinRequest, TournamentManager};
//! use esport_arena::Identity;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store: Arc<dyn ArenaStore> = Arc::new(MemoryStore::new());
//!     let tournaments = TournamentManager::new(store);
//!     let player = Identity::new(2, false);
//!
//!     let join = tournaments
//!         .join(
//!             &player,
//!             1,
//!             JoinRequest {
//!                 in_game_name: "ShadowX".to_string(),
//!                 in_game_uid: "551902".to_string(),
//!                 slot: 7,
//!                 wallet: "added".to_string(),
//!             },
//!         )
//!         .await?;
//!     println!("Reserved slot {}", join.slot);
//!     Ok(())
//! }
//! ```

pub mod manager;
pub mod models;
pub mod reservation;

pub use manager::{TournamentError, TournamentManager, TournamentResult};
pub use models::{
    JoinForm, JoinRequest, NewTournament, PrizeAward, Tournament, TournamentDetail,
    TournamentEdit, TournamentId, TournamentJoin, TournamentListing, TournamentStatus,
    TournamentUpdate,
};
pub use reservation::{
    JoinError, JoinPlan, JoinSnapshot, ReservationOutcome, SlotClaim, check_entry, check_join,
};
