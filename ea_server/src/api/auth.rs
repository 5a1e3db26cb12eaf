//! Authentication API handlers.
//!
//! - Signup with email, password and optional player id
//! - Login with email/password, throttled per email
//! - Token refresh with refresh-token rotation
//! - Logout to delete the session
//!
//! # Examples
//!
//! Sign up:
//! ```bash
//! curl -X POST http://localhost:8080/api/v1/auth/signup \
//!   -H "Content-Type: application/json" \
//!   -d '{"email": "player@example.com", "password": "Pass1234", "player_id": "5123409876"}'
//! ```
//!
//! Login:
//! ```bash
//! curl -X POST http://localhost:8080/api/v1/auth/login \
//!   -H "Content-Type: application/json" \
//!   -d '{"email": "player@example.com", "password": "Pass1234"}'
//! ```

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
};
use esport_arena::{
    Identity,
    auth::{AuthError, LoginRequest, SignupRequest},
};
use serde::{Deserialize, Serialize};

use super::{
    AppState,
    flash::{ApiError, Flash},
};
use crate::{logging::log_security_event, metrics};

#[derive(Debug, Deserialize)]
pub struct RefreshPayload {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: i64,
    pub email: String,
    pub is_admin: bool,
    pub redirect: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// Register a new player account.
///
/// # Response
///
/// `303` to `/login` with "Account created! Please login.", or `303` back to
/// `/signup` when the email is taken or the input is invalid.
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<Flash, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::from_form(e, "/signup"))?;
    state
        .auth
        .signup(payload)
        .await
        .map_err(|e| ApiError::from_auth(e, "/signup"))?;

    Ok(Flash::new("Account created! Please login.", "/login"))
}

/// Authenticate and return session tokens.
///
/// # Response
///
/// `200 OK` with tokens on success. Wrong credentials answer `303` back to
/// `/login` with "Invalid email or password."; too many attempts for one
/// email answer `429`.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::from_form(e, "/login"))?;
    if let Err(wait) = state.login_limiter.check(&payload.email) {
        metrics::rate_limit_hits_total("login");
        log_security_event("login_throttled", None, "Too many login attempts for one email");
        return Err(ApiError::TooManyRequests {
            retry_after_secs: wait.as_secs().max(1),
        });
    }

    let email = payload.email.clone();
    match state.auth.login(payload).await {
        Ok((user, tokens)) => {
            metrics::login_attempts_total(true);
            state.login_limiter.reset(&email);
            Ok(Json(AuthResponse {
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
                user_id: user.id,
                email: user.email,
                is_admin: user.is_admin,
                redirect: "/dashboard".to_string(),
            }))
        }
        Err(err @ AuthError::InvalidCredentials) => {
            metrics::login_attempts_total(false);
            log_security_event("failed_login", None, "Invalid email or password");
            Err(ApiError::from_auth(err, "/login"))
        }
        Err(err) => Err(ApiError::from_auth(err, "/login")),
    }
}

/// Exchange a refresh token for a new token pair. The old token stops working.
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshPayload>,
) -> Result<Json<TokenResponse>, ApiError> {
    let tokens = state
        .auth
        .refresh(&payload.refresh_token)
        .await
        .map_err(|e| ApiError::from_auth(e, "/login"))?;

    Ok(Json(TokenResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
    }))
}

/// Delete the session behind a refresh token
pub async fn logout(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<RefreshPayload>,
) -> Result<Flash, ApiError> {
    state
        .auth
        .logout(&payload.refresh_token)
        .await
        .map_err(|e| ApiError::from_auth(e, "/"))?;

    tracing::info!(user_id = identity.user_id(), "User logged out");
    Ok(Flash::new("Logged out.", "/"))
}
