//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use esport_arena::auth::{AuthManager, NewUser, User};
use esport_arena::db::{ArenaStore, MemoryStore, UserRepository};
use esport_arena::requests::RequestManager;
use esport_arena::tournament::{JoinRequest, NewTournament, Tournament, TournamentManager};
use esport_arena::wallet::{Amount, EntryType, LedgerPosting, WalletKind, WalletManager};
use esport_arena::{Admin, Identity};
use std::sync::Arc;

pub struct Arena {
    pub store: Arc<dyn ArenaStore>,
    pub auth: AuthManager,
    pub wallet: WalletManager,
    pub requests: RequestManager,
    pub tournaments: TournamentManager,
}

impl Arena {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub fn with_store(store: Arc<dyn ArenaStore>) -> Self {
        Self {
            auth: AuthManager::new(
                store.clone(),
                "test_pepper_0123456789".to_string(),
                "test_jwt_secret_0123456789abcdef0123".to_string(),
            ),
            wallet: WalletManager::new(store.clone()),
            requests: RequestManager::new(store.clone()),
            tournaments: TournamentManager::new(store.clone()),
            store,
        }
    }

    /// Insert a player directly, skipping password hashing
    pub async fn player(&self, email: &str) -> (User, Identity) {
        let user = self
            .store
            .create_user(NewUser {
                email: email.to_string(),
                password_hash: "unused".to_string(),
                player_id: None,
                is_admin: false,
            })
            .await
            .unwrap();
        let identity = Identity::new(user.id, false);
        (user, identity)
    }

    pub async fn admin(&self) -> Admin {
        self.admin_with_email("admin@arena.in").await
    }

    pub async fn admin_with_email(&self, email: &str) -> Admin {
        let user = self
            .store
            .create_user(NewUser {
                email: email.to_string(),
                password_hash: "unused".to_string(),
                player_id: None,
                is_admin: true,
            })
            .await
            .unwrap();
        Identity::new(user.id, true).require_admin().unwrap()
    }

    pub async fn fund(&self, identity: &Identity, wallet: WalletKind, amount: Amount) {
        let entry_type = match wallet {
            WalletKind::Winning => EntryType::Prize,
            WalletKind::Added => EntryType::Deposit,
        };
        self.wallet
            .credit(LedgerPosting::new(identity.user_id(), wallet, amount, entry_type))
            .await
            .unwrap();
    }

    pub async fn tournament(&self, admin: &Admin, max_slots: i32, entry_fee: Amount) -> Tournament {
        self.tournaments
            .create(
                admin,
                NewTournament {
                    name: "Sunday Scrims".to_string(),
                    game: "Free Fire".to_string(),
                    mode: "squad".to_string(),
                    entry_fee,
                    prize_pool: Amount::from(500),
                    max_slots,
                    start_time: None,
                    is_grand: false,
                },
            )
            .await
            .unwrap()
    }
}

pub fn join_request(slot: i32, wallet: &str) -> JoinRequest {
    JoinRequest {
        in_game_name: "ShadowX".to_string(),
        in_game_uid: "551902".to_string(),
        slot,
        wallet: wallet.to_string(),
    }
}
