//! Esport arena HTTP server.
//!
//! Connects to PostgreSQL, applies migrations, optionally creates the
//! bootstrap admin and serves the JSON API until Ctrl+C.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Error;
use ea_server::{
    api::{self, rate_limiter::LoginRateLimiter},
    config::{CliOverrides, ServerConfig},
    logging, metrics,
};
use esport_arena::{
    auth::AuthManager,
    db::{ArenaStore, Database, PgStore},
};
use pico_args::Arguments;
use tracing::{info, warn};

const HELP: &str = "\
Run the esport arena tournament and wallet server

USAGE:
  ea_server [OPTIONS]

OPTIONS:
  --bind          IP:PORT  Server socket bind address     [default: env SERVER_BIND or 127.0.0.1:8080]
  --db-url        URL      Database connection string     [default: env DATABASE_URL]
  --metrics-bind  IP:PORT  Prometheus exporter address    [default: env METRICS_BIND, disabled if unset]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  JWT_SECRET               JWT signing secret (required, at least 32 chars)
  PASSWORD_PEPPER          Password hashing pepper (required, at least 16 chars)
  ADMIN_EMAIL              Bootstrap admin email
  ADMIN_PASSWORD           Bootstrap admin password
  RUST_LOG                 Log filter (default: info,sqlx=warn,hyper=warn)
  (See .env.example for all configuration options)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }

    let overrides = CliOverrides {
        bind: pargs.opt_value_from_str("--bind")?,
        database_url: pargs.opt_value_from_str("--db-url")?,
        metrics_bind: pargs.opt_value_from_str("--metrics-bind")?,
    };

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        anyhow::bail!("Unknown arguments: {:?}", remaining);
    }

    let config = ServerConfig::from_env(overrides)?;
    config.validate()?;

    logging::init();
    info!("Starting esport arena server at {}", config.bind);

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(|e| anyhow::anyhow!(e))?;
        info!("Prometheus metrics exposed at http://{}/metrics", addr);
    }

    let db = Database::new(&config.database)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;
    db.migrate()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to apply migrations: {}", e))?;
    info!("Database connected and migrated");

    let store: Arc<dyn ArenaStore> = Arc::new(PgStore::new(db.pool().clone()));

    let auth = AuthManager::new(
        store.clone(),
        config.security.password_pepper.clone(),
        config.security.jwt_secret.clone(),
    )
    .with_durations(
        chrono::Duration::minutes(config.security.access_token_minutes),
        chrono::Duration::days(config.security.session_lifetime_days),
    );

    match &config.bootstrap_admin {
        Some(admin) => match auth.ensure_admin(&admin.email, &admin.password).await {
            Ok(Some(user)) => info!("Created bootstrap admin {}", user.email),
            Ok(None) => info!("Admin account already present"),
            Err(e) => warn!("Bootstrap admin not created: {}", e),
        },
        None => info!("ADMIN_EMAIL/ADMIN_PASSWORD not set; skipping bootstrap admin"),
    }

    let login_limiter = LoginRateLimiter::new(
        config.login_limit.max_attempts,
        Duration::from_secs(config.login_limit.window_secs),
    );
    let app = api::create_router(api::AppState::new(store, auth, login_limiter));

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");
    db.close().await;

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
