//! Authentication middleware and the admin extractor.
//!
//! [`auth_middleware`] resolves the `Authorization: Bearer <token>` header into
//! an [`Identity`] and stores it in the request extensions. Handlers take it
//! with `Extension<Identity>`, or take [`AdminIdentity`] on admin routes.
//!
//! # Usage
//!
//! ```rust,no_run
//! use axum::{Extension, Router, middleware, routing::get};
//! use esport_arena::Identity;
//! # use ea_server::api::middleware::auth_middleware;
//! # use ea_server::api::AppState;
//! # let state: AppState = unimplemented!();
//!
//! async fn whoami(Extension(identity): Extension<Identity>) -> String {
//!     format!("Authenticated as user {}", identity.user_id())
//! }
//!
//! let protected: Router<AppState> = Router::new()
//!     .route("/whoami", get(whoami))
//!     .layer(middleware::from_fn_with_state(state, auth_middleware));
//! # let _ = protected;
//! ```

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use esport_arena::{Admin, Identity};

use super::{AppState, flash::ApiError};
use crate::logging::log_security_event;

/// Authentication middleware that validates JWT tokens and injects the identity.
///
/// - **Success**: Token valid → `Identity` in request extensions → next handler
/// - **Missing header or bad format**: `401 Unauthorized`
/// - **Invalid/expired token**: `401 Unauthorized`
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    match state.auth.identify(token) {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            Ok(next.run(request).await)
        }
        Err(_) => Err(StatusCode::UNAUTHORIZED),
    }
}

/// Extractor for admin-only routes.
///
/// Runs [`Identity::require_admin`]. Non-admins are sent to `/tournaments`
/// from tournament routes and to `/dashboard` from everything else.
#[derive(Debug, Clone, Copy)]
pub struct AdminIdentity(pub Admin);

impl<S> FromRequestParts<S> for AdminIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = parts
            .extensions
            .get::<Identity>()
            .copied()
            .ok_or_else(|| ApiError::Unauthorized("Please login.".to_string()))?;

        match identity.require_admin() {
            Ok(admin) => Ok(AdminIdentity(admin)),
            Err(denied) => {
                let path = parts.uri.path();
                log_security_event(
                    "admin_only",
                    Some(identity.user_id()),
                    &format!("{} {}", parts.method, path),
                );
                Err(ApiError::redirect(denied.to_string(), denial_redirect(path)))
            }
        }
    }
}

fn denial_redirect(path: &str) -> &'static str {
    if path.contains("/admin/tournaments/") {
        "/tournaments"
    } else {
        "/dashboard"
    }
}
