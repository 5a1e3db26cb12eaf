//! HTTP-level tests against the in-memory store.

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use ea_server::api::{AppState, create_router, flash::INVALID_FORM, rate_limiter::LoginRateLimiter};
use esport_arena::auth::AuthManager;
use esport_arena::db::{ArenaStore, MemoryStore};
use esport_arena::wallet::{EntryType, LedgerPosting, WalletKind};
use http_body_util::BodyExt;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt; // For `oneshot` method

const PASSWORD: &str = "SecurePass123";

struct TestApp {
    router: axum::Router,
    state: AppState,
}

struct Reply {
    status: StatusCode,
    location: Option<String>,
    body: Value,
}

/// Helper to create test server with managers
async fn create_test_app() -> TestApp {
    let store: Arc<dyn ArenaStore> = Arc::new(MemoryStore::new());
    let auth = AuthManager::new(
        store.clone(),
        "test_pepper_for_testing_only".to_string(),
        "test_secret_key_for_testing_only_0123456789".to_string(),
    );
    auth.ensure_admin("admin@arena.in", PASSWORD).await.unwrap();

    let state = AppState::new(store, auth, LoginRateLimiter::new(3, Duration::from_secs(60)));
    TestApp {
        router: create_router(state.clone()),
        state,
    }
}

impl TestApp {
    async fn send(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Reply {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        Reply {
            status,
            location,
            body,
        }
    }

    async fn login(&self, email: &str) -> (String, i64) {
        let reply = self
            .send(
                "POST",
                "/api/v1/auth/login",
                None,
                Some(json!({"email": email, "password": PASSWORD})),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK, "login failed: {:?}", reply.body);
        (
            reply.body["access_token"].as_str().unwrap().to_string(),
            reply.body["user_id"].as_i64().unwrap(),
        )
    }

    async fn player(&self, email: &str) -> (String, i64) {
        let reply = self
            .send(
                "POST",
                "/api/v1/auth/signup",
                None,
                Some(json!({"email": email, "password": PASSWORD})),
            )
            .await;
        assert_eq!(reply.status, StatusCode::SEE_OTHER);
        self.login(email).await
    }

    async fn create_tournament(&self, admin: &str, max_slots: i32, entry_fee: &str) -> i64 {
        let reply = self
            .send(
                "POST",
                "/api/v1/admin/tournaments",
                Some(admin),
                Some(json!({
                    "name": "Sunday Scrims",
                    "game": "Free Fire",
                    "mode": "squad",
                    "entry_fee": entry_fee,
                    "prize_pool": "500",
                    "max_slots": max_slots,
                })),
            )
            .await;
        assert_eq!(reply.body["message"], "Tournament created.");
        let listing = self.send("GET", "/api/v1/tournaments", Some(admin), None).await;
        listing.body["tournaments"][0]["id"].as_i64().unwrap()
    }
}

#[tokio::test]
async fn test_health_check_endpoint() {
    let app = create_test_app().await;

    let reply = app.send("GET", "/health", None, None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["status"], "healthy");
    assert_eq!(reply.body["database"], true);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = create_test_app().await;

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "trace-42")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.headers().get("x-request-id").unwrap(), "trace-42");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = create_test_app().await;

    let reply = app.send("GET", "/api/v1/dashboard", None, None).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    let reply = app.send("GET", "/api/v1/tournaments", Some("not-a-jwt"), None).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signup_duplicate_redirects_back() {
    let app = create_test_app().await;
    app.player("a@arena.in").await;

    let reply = app
        .send(
            "POST",
            "/api/v1/auth/signup",
            None,
            Some(json!({"email": "a@arena.in", "password": PASSWORD})),
        )
        .await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.location.as_deref(), Some("/signup"));
    assert_eq!(reply.body["message"], "Email already exists.");
}

#[tokio::test]
async fn test_failed_logins_are_throttled() {
    let app = create_test_app().await;
    app.player("a@arena.in").await;

    for _ in 0..2 {
        let reply = app
            .send(
                "POST",
                "/api/v1/auth/login",
                None,
                Some(json!({"email": "a@arena.in", "password": "WrongPass123"})),
            )
            .await;
        assert_eq!(reply.status, StatusCode::SEE_OTHER);
        assert_eq!(reply.location.as_deref(), Some("/login"));
        assert_eq!(reply.body["message"], "Invalid email or password.");
    }

    // The successful login inside `player` reset the counter, so this is the third attempt.
    let reply = app
        .send(
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({"email": "a@arena.in", "password": "WrongPass123"})),
        )
        .await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);

    let reply = app
        .send(
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({"email": "a@arena.in", "password": PASSWORD})),
        )
        .await;
    assert_eq!(reply.status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_deposit_flow_through_admin_panel() {
    let app = create_test_app().await;
    let (player, _) = app.player("a@arena.in").await;
    let (admin, _) = app.login("admin@arena.in").await;

    let reply = app
        .send(
            "POST",
            "/api/v1/add-money",
            Some(&player),
            Some(json!({"amount": "200", "upi_id": "a@upi", "txn_id": "T1"})),
        )
        .await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.location.as_deref(), Some("/dashboard"));
    assert_eq!(
        reply.body["message"],
        "Add-money request submitted. Pehle UPI se payment karo, phir admin approve karega."
    );

    let panel = app.send("GET", "/api/v1/admin", Some(&admin), None).await;
    assert_eq!(panel.status, StatusCode::OK);
    let request_id = panel.body["add_requests"][0]["id"].as_i64().unwrap();

    let uri = format!("/api/v1/admin/approve-add/{request_id}");
    let reply = app.send("POST", &uri, Some(&admin), None).await;
    assert_eq!(reply.location.as_deref(), Some("/admin"));
    let reply = app.send("POST", &uri, Some(&admin), None).await;
    assert_eq!(reply.body["message"], "Request already approved.");

    let dashboard = app.send("GET", "/api/v1/dashboard", Some(&player), None).await;
    assert_eq!(dashboard.status, StatusCode::OK);
    assert_eq!(dashboard.body["user"]["added_balance"], "200");
    assert_eq!(dashboard.body["add_requests"][0]["status"], "approved");

    let entries = app
        .send("GET", "/api/v1/wallet/entries?limit=5", Some(&player), None)
        .await;
    assert_eq!(entries.body.as_array().unwrap().len(), 1);
    assert_eq!(entries.body[0]["entry_type"], "deposit");
}

#[tokio::test]
async fn test_withdraw_above_balance_redirects_to_dashboard() {
    let app = create_test_app().await;
    let (player, _) = app.player("a@arena.in").await;

    let reply = app
        .send(
            "POST",
            "/api/v1/withdraw",
            Some(&player),
            Some(json!({"amount": "500", "upi_id": "a@upi"})),
        )
        .await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.location.as_deref(), Some("/dashboard"));
    assert_eq!(
        reply.body["message"],
        "Winning balance se zyada withdraw nahi kar sakte."
    );
}

#[tokio::test]
async fn test_admin_routes_reject_players() {
    let app = create_test_app().await;
    let (player, _) = app.player("a@arena.in").await;

    let reply = app.send("GET", "/api/v1/admin", Some(&player), None).await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.location.as_deref(), Some("/dashboard"));
    assert_eq!(reply.body["message"], "Admin only.");

    let reply = app
        .send("POST", "/api/v1/admin/tournaments/1/delete", Some(&player), None)
        .await;
    assert_eq!(reply.location.as_deref(), Some("/tournaments"));
    assert_eq!(reply.body["message"], "Admin only.");
}

#[tokio::test]
async fn test_join_flow_and_rejections() {
    let app = create_test_app().await;
    let (admin, _) = app.login("admin@arena.in").await;
    let (a, a_id) = app.player("a@arena.in").await;
    let (b, b_id) = app.player("b@arena.in").await;
    for user_id in [a_id, b_id] {
        app.state
            .wallet
            .credit(LedgerPosting::new(user_id, WalletKind::Added, dec!(100), EntryType::Deposit))
            .await
            .unwrap();
    }

    let id = app.create_tournament(&admin, 2, "50").await;
    let join_uri = format!("/api/v1/tournaments/{id}/join");
    let form = json!({"in_game_name": "ShadowX", "in_game_uid": "551902", "slot": 1, "wallet": "added"});

    let reply = app.send("POST", &join_uri, Some(&a), Some(form.clone())).await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.location.as_deref(), Some("/tournaments"));
    assert_eq!(reply.body["message"], "Tournament join ho gaya. Best of luck!");

    let reply = app.send("POST", &join_uri, Some(&b), Some(form.clone())).await;
    assert_eq!(reply.location.as_deref(), Some(format!("/tournaments/{id}/join").as_str()));
    assert_eq!(reply.body["message"], "Ye slot already taken hai.");

    let reply = app.send("POST", &join_uri, Some(&a), Some(form)).await;
    assert_eq!(reply.location.as_deref(), Some("/tournaments"));
    assert_eq!(reply.body["message"], "Aap pehle hi is tournament me joined ho.");

    let join_form = app.send("GET", &join_uri, Some(&b), None).await;
    assert_eq!(join_form.status, StatusCode::OK);
    assert_eq!(join_form.body["taken_slots"], json!([1]));

    let detail = app
        .send("GET", &format!("/api/v1/tournaments/{id}"), Some(&b), None)
        .await;
    assert_eq!(detail.body["tournament"]["filled_slots"], 1);
    assert_eq!(detail.body["joins"][0]["in_game_name"], "ShadowX");

    let missing = app
        .send("POST", "/api/v1/tournaments/999/join", Some(&b), Some(json!({
            "in_game_name": "X", "in_game_uid": "1", "slot": 1, "wallet": "added"
        })))
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_incomplete_forms_redirect_to_retry_point() {
    let app = create_test_app().await;
    let (admin, _) = app.login("admin@arena.in").await;
    let (player, player_id) = app.player("a@arena.in").await;
    let id = app.create_tournament(&admin, 4, "0").await;

    let reply = app
        .send(
            "POST",
            &format!("/api/v1/tournaments/{id}/join"),
            Some(&player),
            Some(json!({"in_game_name": "ShadowX", "in_game_uid": "551902", "wallet": "added"})),
        )
        .await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.location.as_deref(), Some(format!("/tournaments/{id}/join").as_str()));
    assert_eq!(reply.body["message"], INVALID_FORM);

    let reply = app
        .send("POST", "/api/v1/add-money", Some(&player), Some(json!({"upi_id": "a@upi", "txn_id": "T1"})))
        .await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.location.as_deref(), Some("/dashboard"));
    assert_eq!(reply.body["message"], INVALID_FORM);

    let reply = app
        .send("POST", "/api/v1/auth/signup", None, Some(json!({"email": "b@arena.in"})))
        .await;
    assert_eq!(reply.location.as_deref(), Some("/signup"));

    let reply = app
        .send(
            "POST",
            &format!("/api/v1/admin/tournaments/{id}/give-prize"),
            Some(&admin),
            Some(json!({"user_id": player_id, "amount": "lots"})),
        )
        .await;
    assert_eq!(reply.location.as_deref(), Some("/tournaments"));
    assert_eq!(reply.body["message"], INVALID_FORM);

    let reply = app
        .send(
            "POST",
            &format!("/api/v1/admin/tournaments/{id}/give-prize"),
            Some(&admin),
            Some(json!({"user_id": player_id, "amount": "10000000000"})),
        )
        .await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.body["message"], "Amount is too large.");

    let dashboard = app.send("GET", "/api/v1/dashboard", Some(&player), None).await;
    assert!(dashboard.body["add_requests"].as_array().unwrap().is_empty());
    let join_form = app
        .send("GET", &format!("/api/v1/tournaments/{id}/join"), Some(&player), None)
        .await;
    assert_eq!(join_form.body["taken_slots"], json!([]));
}

#[tokio::test]
async fn test_prize_and_winner() {
    let app = create_test_app().await;
    let (admin, _) = app.login("admin@arena.in").await;
    let (player, player_id) = app.player("a@arena.in").await;
    let id = app.create_tournament(&admin, 4, "0").await;

    let reply = app
        .send(
            "POST",
            &format!("/api/v1/admin/tournaments/{id}/give-prize"),
            Some(&admin),
            Some(json!({"user_id": player_id, "amount": "150"})),
        )
        .await;
    assert_eq!(reply.body["message"], "₹150 prize user a@arena.in ko add ho gaya.");

    let reply = app
        .send(
            "POST",
            &format!("/api/v1/admin/tournaments/{id}/set-winner"),
            Some(&admin),
            Some(json!({"user_id": player_id, "prize": "250"})),
        )
        .await;
    assert_eq!(reply.body["message"], "Winner set ho gaya, prize add ho gaya.");

    let dashboard = app.send("GET", "/api/v1/dashboard", Some(&player), None).await;
    assert_eq!(dashboard.body["user"]["winning_balance"], "400");

    let detail = app
        .send("GET", &format!("/api/v1/tournaments/{id}"), Some(&player), None)
        .await;
    assert_eq!(detail.body["tournament"]["status"], "finished");

    let reply = app
        .send(
            "POST",
            &format!("/api/v1/admin/tournaments/{id}/give-prize"),
            Some(&admin),
            Some(json!({"user_id": 999, "amount": "10"})),
        )
        .await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_edit_and_delete_tournament() {
    let app = create_test_app().await;
    let (admin, _) = app.login("admin@arena.in").await;
    let id = app.create_tournament(&admin, 4, "10").await;

    let reply = app
        .send(
            "POST",
            &format!("/api/v1/admin/tournaments/{id}/edit"),
            Some(&admin),
            Some(json!({"room_id": "7781", "room_pass": "pw", "status": "live", "is_grand": true})),
        )
        .await;
    assert_eq!(reply.body["message"], "Tournament info updated.");

    let detail = app
        .send("GET", &format!("/api/v1/tournaments/{id}"), Some(&admin), None)
        .await;
    assert_eq!(detail.body["tournament"]["status"], "live");
    assert_eq!(detail.body["tournament"]["room_id"], "7781");

    let reply = app
        .send(
            "POST",
            &format!("/api/v1/admin/tournaments/{id}/delete"),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(reply.body["message"], "Tournament deleted.");

    let detail = app
        .send("GET", &format!("/api/v1/tournaments/{id}"), Some(&admin), None)
        .await;
    assert_eq!(detail.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_refresh_and_logout() {
    let app = create_test_app().await;
    app.player("a@arena.in").await;
    let reply = app
        .send(
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({"email": "a@arena.in", "password": PASSWORD})),
        )
        .await;
    let access = reply.body["access_token"].as_str().unwrap().to_string();
    let refresh = reply.body["refresh_token"].as_str().unwrap().to_string();

    let rotated = app
        .send("POST", "/api/v1/auth/refresh", None, Some(json!({"refresh_token": refresh})))
        .await;
    assert_eq!(rotated.status, StatusCode::OK);
    let new_refresh = rotated.body["refresh_token"].as_str().unwrap().to_string();

    let stale = app
        .send("POST", "/api/v1/auth/refresh", None, Some(json!({"refresh_token": refresh})))
        .await;
    assert_eq!(stale.status, StatusCode::UNAUTHORIZED);

    let reply = app
        .send(
            "POST",
            "/api/v1/auth/logout",
            Some(&access),
            Some(json!({"refresh_token": new_refresh})),
        )
        .await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);

    let revoked = app
        .send("POST", "/api/v1/auth/refresh", None, Some(json!({"refresh_token": new_refresh})))
        .await;
    assert_eq!(revoked.status, StatusCode::UNAUTHORIZED);
}
