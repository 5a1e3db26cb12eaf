//! Authentication module providing signup, login, and session management.
//!
//! This module implements:
//! - Argon2id password hashing with server-side pepper
//! - JWT access tokens
//! - Rotating refresh tokens stored as sessions
//! - The [`Identity`] / [`Admin`] capabilities consumed by every core operation
//!
//! ## Example
//!
//! ```no_run
//! use esport_arena::auth::{AuthManager, SignupRequest};
//! use esport_arena::db::{ArenaStore, MemoryStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store: Arc<dyn ArenaStore> = Arc::new(MemoryStore::new());
//!     let auth = AuthManager::new(store, "secret_pepper".to_string(), "jwt_secret".to_string());
//!
//!     let user = auth
//!         .signup(SignupRequest {
//!             email: "player@example.com".to_string(),
//!             password: "SecurePass123".to_string(),
//!             player_id: Some("5123409876".to_string()),
//!         })
//!         .await?;
//!     println!("Registered user: {}", user.email);
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod identity;
pub mod manager;
pub mod models;

pub use errors::{AuthError, AuthResult};
pub use identity::{Admin, AdminOnly, Identity};
pub use manager::{AuthManager, normalize_email};
pub use models::{
    AccessTokenClaims, LoginRequest, NewUser, Session, SessionTokens, SignupRequest, User,
    UserCredentials, UserId,
};
