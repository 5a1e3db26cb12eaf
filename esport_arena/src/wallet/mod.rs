//! Wallet module: the two-wallet account ledger.
//!
//! Every user holds a `winning` balance (prize money, withdrawable) and an
//! `added` balance (deposited funds). This module provides:
//! - Balance lookups
//! - Credit and debit-if-sufficient primitives
//! - An append-only ledger entry per applied mutation
//!
//! ## Example
//!
//! ```no_run
//! use esport_arena::db::{ArenaStore, MemoryStore};
//! use esport_arena::wallet::{EntryType, LedgerPosting, WalletKind, WalletManager};
//! use rust_decimal::Decimal;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store: Arc<dyn ArenaStore> = Arc::new(MemoryStore::new());
//!     let wallet = WalletManager::new(store);
//!
//!     let posting = LedgerPosting::new(1, WalletKind::Winning, Decimal::new(25000, 2), EntryType::Prize);
//!     let balance = wallet.credit(posting).await?;
//!     println!("Winning balance: {balance}");
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{WalletError, WalletResult};
pub use manager::{DEFAULT_ENTRY_LIMIT, WalletManager};
pub use models::{
    AMOUNT_LIMIT, Amount, Balances, DebitOutcome, EntryType, LedgerEntry, LedgerPosting,
    UnknownWallet, WalletKind, within_limit,
};
