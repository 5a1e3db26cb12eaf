//! Database module: PostgreSQL connection pooling plus the repository layer.
//!
//! Managers hold an `Arc<dyn ArenaStore>`. Production wires in [`PgStore`]
//! over the pool created by [`Database`]; tests use [`MemoryStore`].

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

pub mod config;
pub mod memory;
pub mod postgres;
pub mod repository;

pub use config::DatabaseConfig;
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use repository::{
    HealthCheck, LedgerRepository, RequestRepository, SessionRepository, StoreError, StoreResult,
    TournamentRepository, UserRepository, WinnerOutcome,
};

/// Every repository the application needs, behind one trait object.
pub trait ArenaStore:
    UserRepository
    + SessionRepository
    + LedgerRepository
    + RequestRepository
    + TournamentRepository
    + HealthCheck
{
}

impl<T> ArenaStore for T where
    T: UserRepository
        + SessionRepository
        + LedgerRepository
        + RequestRepository
        + TournamentRepository
        + HealthCheck
{
}

/// Database connection pool wrapper
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use esport_arena::db::{Database, DatabaseConfig};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), sqlx::Error> {
    ///     let config = DatabaseConfig::from_env();
    ///     let db = Database::new(&config).await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Apply the bundled schema migrations
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Close the database connection pool
    pub async fn close(self) {
        self.pool.close().await;
    }
}
