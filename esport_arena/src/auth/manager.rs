//! Authentication manager implementation.

use super::{
    errors::{AuthError, AuthResult},
    identity::Identity,
    models::{
        AccessTokenClaims, LoginRequest, NewUser, Session, SessionTokens, SignupRequest, User,
    },
};
use crate::db::{ArenaStore, SessionRepository, StoreError, UserRepository};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use log::{info, warn};
use std::sync::Arc;
use uuid::Uuid;

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 8;

/// Authentication manager
#[derive(Clone)]
pub struct AuthManager {
    store: Arc<dyn ArenaStore>,
    pepper: String,
    jwt_secret: String,
    access_token_duration: Duration,
    session_duration: Duration,
}

impl AuthManager {
    /// Create a new authentication manager
    ///
    /// # Arguments
    ///
    /// * `store` - Repository backing users and sessions
    /// * `pepper` - Server-side pepper for password hashing
    /// * `jwt_secret` - Secret key for JWT signing
    pub fn new(store: Arc<dyn ArenaStore>, pepper: String, jwt_secret: String) -> Self {
        Self {
            store,
            pepper,
            jwt_secret,
            access_token_duration: Duration::minutes(15),
            session_duration: Duration::days(7300),
        }
    }

    /// Override the access token and session lifetimes
    pub fn with_durations(mut self, access_token: Duration, session: Duration) -> Self {
        self.access_token_duration = access_token;
        self.session_duration = session;
        self
    }

    /// Register a new player account
    ///
    /// # Errors
    ///
    /// * `AuthError::InvalidEmail` - Email blank or without `@`
    /// * `AuthError::WeakPassword` - Password shorter than [`MIN_PASSWORD_LEN`]
    /// * `AuthError::EmailTaken` - Email already exists
    pub async fn signup(&self, request: SignupRequest) -> AuthResult<User> {
        let email = validate_email(&request.email)?;
        validate_password(&request.password)?;

        let player_id = request
            .player_id
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());

        let user = self.create_account(email, &request.password, player_id, false).await?;
        info!("User {} signed up as {}", user.id, user.email);
        Ok(user)
    }

    /// Login with email and password
    ///
    /// # Returns
    ///
    /// * `AuthResult<(User, SessionTokens)>` - User and fresh session tokens
    ///
    /// # Errors
    ///
    /// * `AuthError::InvalidCredentials` - Unknown email or wrong password
    pub async fn login(&self, request: LoginRequest) -> AuthResult<(User, SessionTokens)> {
        let email = normalize_email(&request.email);
        let Some(credentials) = self.store.find_by_email(email).await? else {
            warn!("Login attempt for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.verify_password(&request.password, &credentials.password_hash) {
            warn!("Failed login for user {}", credentials.user.id);
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.create_session(&credentials.user).await?;
        info!("User {} logged in", credentials.user.id);
        Ok((credentials.user, tokens))
    }

    /// Exchange a refresh token for new tokens. The old refresh token is
    /// deleted (rotation).
    ///
    /// # Errors
    ///
    /// * `AuthError::InvalidRefreshToken` - Refresh token not found
    /// * `AuthError::SessionExpired` - Refresh token expired
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<SessionTokens> {
        let session = self
            .store
            .find_session(refresh_token)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        self.store.delete_session(refresh_token).await?;
        if session.expires_at < Utc::now() {
            return Err(AuthError::SessionExpired);
        }

        let user = self
            .store
            .find_by_id(session.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        self.create_session(&user).await
    }

    /// Logout by deleting the refresh-token session
    pub async fn logout(&self, refresh_token: &str) -> AuthResult<()> {
        if self.store.delete_session(refresh_token).await? {
            info!("Session closed");
        }
        Ok(())
    }

    /// Verify an access token
    pub fn verify_access_token(&self, token: &str) -> AuthResult<AccessTokenClaims> {
        let token_data = decode::<AccessTokenClaims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )?;

        Ok(token_data.claims)
    }

    /// Resolve an access token into the caller's identity
    pub fn identify(&self, token: &str) -> AuthResult<Identity> {
        let claims = self.verify_access_token(token)?;
        Ok(Identity::from(&claims))
    }

    /// Load the user behind an identity
    pub async fn current_user(&self, identity: &Identity) -> AuthResult<User> {
        self.store
            .find_by_id(identity.user_id())
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Create the bootstrap admin unless an admin already exists.
    ///
    /// # Returns
    ///
    /// * `AuthResult<Option<User>>` - The created admin, `None` if one existed
    pub async fn ensure_admin(&self, email: &str, password: &str) -> AuthResult<Option<User>> {
        if self.store.admin_exists().await? {
            return Ok(None);
        }
        let email = validate_email(email)?;
        validate_password(password)?;

        let admin = self.create_account(email, password, None, true).await?;
        info!("Bootstrap admin {} created", admin.email);
        Ok(Some(admin))
    }

    async fn create_account(
        &self,
        email: String,
        password: &str,
        player_id: Option<String>,
        is_admin: bool,
    ) -> AuthResult<User> {
        if self.store.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = self.hash_password(password)?;
        let new_user = NewUser {
            email,
            password_hash,
            player_id,
            is_admin,
        };

        match self.store.create_user(new_user).await {
            Ok(user) => Ok(user),
            Err(StoreError::Conflict(_)) => Err(AuthError::EmailTaken),
            Err(err) => Err(err.into()),
        }
    }

    async fn create_session(&self, user: &User) -> AuthResult<SessionTokens> {
        let access_token = self.generate_access_token(user)?;
        let refresh_token = Uuid::new_v4().to_string();

        let now = Utc::now();
        self.store
            .create_session(&Session {
                token: refresh_token.clone(),
                user_id: user.id,
                created_at: now,
                expires_at: now + self.session_duration,
            })
            .await?;

        Ok(SessionTokens {
            access_token,
            refresh_token,
        })
    }

    /// Hash password with Argon2id + pepper
    fn hash_password(&self, password: &str) -> AuthResult<String> {
        let peppered = format!("{}{}", password, self.pepper);
        let salt = SaltString::generate(&mut OsRng);

        Ok(Argon2::default()
            .hash_password(peppered.as_bytes(), &salt)
            .map_err(|_| AuthError::HashingFailed)?
            .to_string())
    }

    fn verify_password(&self, password: &str, hash: &str) -> bool {
        let peppered = format!("{}{}", password, self.pepper);
        PasswordHash::new(hash).is_ok_and(|parsed| {
            Argon2::default()
                .verify_password(peppered.as_bytes(), &parsed)
                .is_ok()
        })
    }

    fn generate_access_token(&self, user: &User) -> AuthResult<String> {
        let now = Utc::now();
        let claims = AccessTokenClaims {
            sub: user.id,
            email: user.email.clone(),
            is_admin: user.is_admin,
            exp: (now + self.access_token_duration).timestamp(),
            iat: now.timestamp(),
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?)
    }
}

/// Canonical form of an email address, used as the account key.
///
/// Surrounding whitespace is dropped; case is kept, so `A@x.in` and
/// `a@x.in` are different accounts.
pub fn normalize_email(email: &str) -> &str {
    email.trim()
}

fn validate_email(email: &str) -> AuthResult<String> {
    let email = normalize_email(email);
    if email.is_empty() || !email.contains('@') {
        return Err(AuthError::InvalidEmail(
            "Please enter a valid email address".to_string(),
        ));
    }
    Ok(email.to_string())
}

fn validate_password(password: &str) -> AuthResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}
