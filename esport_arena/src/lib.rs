//! # Esport Arena
//!
//! Core library for a gaming-tournament entry and wallet platform. Players keep
//! two wallets ("winning" and "added"), top them up through manually approved
//! deposit requests, withdraw prize money through approved withdraw requests,
//! and pay tournament entry fees by reserving numbered slots.
//!
//! ## Core Modules
//!
//! - [`auth`]: signup, login, session tokens and the [`auth::Identity`] capability
//! - [`wallet`]: the two-wallet account ledger (credit, debit-if-sufficient, history)
//! - [`requests`]: the deposit/withdraw request queue and its admin approvals
//! - [`tournament`]: tournament catalog, slot reservation and prize distribution
//! - [`db`]: repository traits plus PostgreSQL and in-memory stores
//!
//! ## Example
//!
//! ```
//! use esport_arena::db::{ArenaStore, MemoryStore};
//! use esport_arena::tournament::TournamentManager;
//! use std::sync::Arc;
//!
//! let store: Arc<dyn ArenaStore> = Arc::new(MemoryStore::new());
//! let tournaments = TournamentManager::new(store);
//! # let _ = tournaments;
//! ```

/// Authentication, sessions and caller identity.
pub mod auth;

/// Persistence layer.
pub mod db;

/// Deposit and withdraw request queue.
pub mod requests;

/// Tournament catalog and slot reservation.
pub mod tournament;

/// Two-wallet account ledger.
pub mod wallet;

pub use auth::{Admin, Identity};
pub use wallet::{Amount, WalletKind};
