//! HTTP API for the esport arena server.
//!
//! JSON over HTTP. Reads answer `200` with JSON; form-style mutations answer
//! `303 See Other` with a `Location` header and a `{"message", "redirect"}`
//! body (see [`flash::Flash`]).
//!
//! # Modules
//!
//! - [`auth`]: signup, login, token refresh, logout
//! - [`wallet`]: dashboard, ledger history, add-money and withdraw requests
//! - [`tournaments`]: list, detail, join form and slot reservation
//! - [`admin`]: request approvals, tournament management and prizes
//! - [`middleware`]: bearer-token authentication and the admin extractor
//!
//! # Endpoints Overview
//!
//! ```text
//! GET  /health                                      - Health check (public)
//! POST /api/v1/auth/signup                          - Create account (public)
//! POST /api/v1/auth/login                           - Login (public)
//! POST /api/v1/auth/refresh                         - Rotate refresh token (public)
//! POST /api/v1/auth/logout                          - Delete session
//! GET  /api/v1/dashboard                            - Balances and own requests
//! GET  /api/v1/wallet/entries?limit=N               - Ledger history
//! POST /api/v1/add-money                            - Submit deposit request
//! POST /api/v1/withdraw                             - Submit withdraw request
//! GET  /api/v1/tournaments                          - List tournaments
//! GET  /api/v1/tournaments/{id}                     - Tournament with players
//! GET  /api/v1/tournaments/{id}/join                - Join form
//! POST /api/v1/tournaments/{id}/join                - Reserve a slot
//! GET  /api/v1/admin                                - All requests (admin)
//! POST /api/v1/admin/approve-add/{id}               - Approve deposit (admin)
//! POST /api/v1/admin/approve-withdraw/{id}          - Pay withdrawal (admin)
//! POST /api/v1/admin/tournaments                    - Create tournament (admin)
//! POST /api/v1/admin/tournaments/{id}/edit          - Edit tournament (admin)
//! POST /api/v1/admin/tournaments/{id}/delete        - Delete tournament (admin)
//! POST /api/v1/admin/tournaments/{id}/give-prize    - Credit a prize (admin)
//! POST /api/v1/admin/tournaments/{id}/set-winner    - Prize and finish (admin)
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use ea_server::api::{AppState, create_router, rate_limiter::LoginRateLimiter};
//! use esport_arena::auth::AuthManager;
//! use esport_arena::db::{ArenaStore, MemoryStore};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store: Arc<dyn ArenaStore> = Arc::new(MemoryStore::new());
//! let auth = AuthManager::new(store.clone(), "pepper".into(), "jwt_secret".into());
//! let state = AppState::new(store, auth, LoginRateLimiter::new(5, Duration::from_secs(60)));
//!
//! let app = create_router(state);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod admin;
pub mod auth;
pub mod flash;
pub mod middleware;
pub mod rate_limiter;
pub mod request_id;
pub mod tournaments;
pub mod wallet;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use esport_arena::{
    auth::AuthManager,
    db::{ArenaStore, HealthCheck},
    requests::RequestManager,
    tournament::TournamentManager,
    wallet::WalletManager,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use rate_limiter::LoginRateLimiter;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request; every field is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthManager>,
    pub wallet: Arc<WalletManager>,
    pub requests: Arc<RequestManager>,
    pub tournaments: Arc<TournamentManager>,
    pub store: Arc<dyn ArenaStore>,
    pub login_limiter: Arc<LoginRateLimiter>,
}

impl AppState {
    /// Build the managers over one store
    pub fn new(
        store: Arc<dyn ArenaStore>,
        auth: AuthManager,
        login_limiter: LoginRateLimiter,
    ) -> Self {
        Self {
            auth: Arc::new(auth),
            wallet: Arc::new(WalletManager::new(store.clone())),
            requests: Arc::new(RequestManager::new(store.clone())),
            tournaments: Arc::new(TournamentManager::new(store.clone())),
            store,
            login_limiter: Arc::new(login_limiter),
        }
    }
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    let v1_routes = create_v1_router(state.clone());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", v1_routes)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn create_v1_router(state: AppState) -> Router<AppState> {
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh));

    let player_routes = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/dashboard", get(wallet::dashboard))
        .route("/wallet/entries", get(wallet::entries))
        .route("/add-money", post(wallet::add_money))
        .route("/withdraw", post(wallet::withdraw))
        .route("/tournaments", get(tournaments::list))
        .route("/tournaments/{id}", get(tournaments::detail))
        .route(
            "/tournaments/{id}/join",
            get(tournaments::join_form).post(tournaments::join),
        );

    let admin_routes = Router::new()
        .route("/admin", get(admin::panel))
        .route("/admin/approve-add/{id}", post(admin::approve_add))
        .route("/admin/approve-withdraw/{id}", post(admin::approve_withdraw))
        .route("/admin/tournaments", post(admin::create_tournament))
        .route("/admin/tournaments/{id}/edit", post(admin::edit_tournament))
        .route("/admin/tournaments/{id}/delete", post(admin::delete_tournament))
        .route("/admin/tournaments/{id}/give-prize", post(admin::give_prize))
        .route("/admin/tournaments/{id}/set-winner", post(admin::set_winner));

    let protected_routes = player_routes
        .merge(admin_routes)
        .layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth_middleware,
        ));

    Router::new().merge(public_routes).merge(protected_routes)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the store answers, `503 Service Unavailable` otherwise.
///
/// ```bash
/// curl http://localhost:8080/health
/// # {"status":"healthy","database":true,"version":"1.0.0","timestamp":"2026-10-16T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_healthy = match state.store.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            false
        }
    };

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if db_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
