//! Response types shared by every handler.
//!
//! Mutations answer `303 See Other` with a [`Flash`]: the user-facing message
//! plus the page the client should go to next. Failures that do not belong
//! to a form flow map to plain status codes through [`ApiError`].

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use esport_arena::{
    auth::AuthError, requests::RequestError, tournament::TournamentError,
};
use serde::{Deserialize, Serialize};

/// Message for form bodies that cannot be read
pub const INVALID_FORM: &str = "Please fill all fields correctly.";

/// Flash message with its redirect target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub message: String,
    pub redirect: String,
}

impl Flash {
    pub fn new(message: impl Into<String>, redirect: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            redirect: redirect.into(),
        }
    }
}

impl IntoResponse for Flash {
    fn into_response(self) -> Response {
        (
            StatusCode::SEE_OTHER,
            [(header::LOCATION, self.redirect.clone())],
            Json(self),
        )
            .into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Handler error
#[derive(Debug)]
pub enum ApiError {
    /// Validation failure sent back to a retry point
    Redirect(Flash),
    /// Missing, invalid or expired credentials
    Unauthorized(String),
    NotFound(String),
    TooManyRequests { retry_after_secs: u64 },
    /// Store fault; details are logged, never returned
    Internal,
}

impl ApiError {
    pub fn redirect(message: impl Into<String>, redirect: impl Into<String>) -> Self {
        ApiError::Redirect(Flash::new(message, redirect))
    }

    /// Map an unreadable form body (missing field, wrong type, bad JSON)
    /// back to `redirect`
    pub fn from_form(rejection: JsonRejection, redirect: &str) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Form rejected");
        Self::redirect(INVALID_FORM, redirect)
    }

    fn internal(err: &dyn std::error::Error) -> Self {
        tracing::error!(error = %err, "Request failed");
        ApiError::Internal
    }

    /// Map an auth failure; user errors go back to `redirect`
    pub fn from_auth(err: AuthError, redirect: &str) -> Self {
        match err {
            AuthError::Store(_) | AuthError::HashingFailed => Self::internal(&err),
            AuthError::JwtError(_)
            | AuthError::SessionExpired
            | AuthError::InvalidRefreshToken
            | AuthError::UserNotFound => ApiError::Unauthorized(err.client_message()),
            _ => Self::redirect(err.client_message(), redirect),
        }
    }

    /// Map a request queue failure; user errors go back to `redirect`
    pub fn from_request(err: RequestError, redirect: &str) -> Self {
        match err {
            RequestError::Store(_) => Self::internal(&err),
            ref e if e.is_not_found() => ApiError::NotFound(e.client_message()),
            _ => Self::redirect(err.client_message(), redirect),
        }
    }

    /// Map a tournament failure; user errors go back to `redirect`
    pub fn from_tournament(err: TournamentError, redirect: &str) -> Self {
        match err {
            TournamentError::Store(_) => Self::internal(&err),
            ref e if e.is_not_found() => ApiError::NotFound(e.client_message()),
            _ => Self::redirect(err.client_message(), redirect),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::Redirect(flash) => return flash.into_response(),
            ApiError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::TooManyRequests { retry_after_secs } => {
                return (
                    StatusCode::TOO_MANY_REQUESTS,
                    [(header::RETRY_AFTER, retry_after_secs.to_string())],
                    Json(ErrorResponse {
                        error: "Too many attempts. Try again later.".to_string(),
                    }),
                )
                    .into_response();
            }
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}
