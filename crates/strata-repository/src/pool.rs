//! Database connection pool management.

use async_trait::async_trait;
use shaku::Component;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{ConnectOptions, Sqlite, Transaction};
use std::str::FromStr;
use std::sync::Arc;
use strata_config::DatabaseConfig;
use strata_core::{Interface, StrataError, StrataResult};
use tracing::{info, warn};

/// Interface for database pool operations.
#[async_trait]
pub trait DatabasePoolInterface: Interface + Send + Sync {
    /// Returns a reference to the underlying SQLite pool.
    fn inner(&self) -> &SqlitePool;

    /// Starts a write transaction with `BEGIN IMMEDIATE`.
    ///
    /// Taking the write lock up front means two read-then-write transactions
    /// queue on the busy timeout instead of deadlocking on lock upgrade.
    async fn begin_write(&self) -> StrataResult<Transaction<'static, Sqlite>>;

    /// Checks if the database connection is healthy.
    async fn health_check(&self) -> StrataResult<()>;

    /// Applies pending migrations from `migrations/`.
    async fn run_migrations(&self) -> StrataResult<()>;

    async fn close(&self);
}

/// Database pool wrapper.
#[derive(Component, Clone)]
#[shaku(interface = DatabasePoolInterface)]
pub struct DatabasePool {
    pool: SqlitePool,
}

impl DatabasePool {
    /// Opens a pool from configuration.
    ///
    /// In-memory databases live only as long as their connection, so they get
    /// a single connection that is never recycled. File databases run in WAL
    /// mode so readers do not block the single writer.
    pub async fn new(config: &DatabaseConfig) -> StrataResult<Self> {
        info!("Connecting to SQLite database...");

        let in_memory = is_in_memory(&config.url);
        let mut options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| StrataError::Configuration(format!("Invalid database URL: {e}")))?
            .create_if_missing(true)
            .busy_timeout(config.busy_timeout());
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }
        if !config.log_queries {
            options = options.disable_statement_logging();
        }

        let mut pool_options = SqlitePoolOptions::new().acquire_timeout(config.connect_timeout());
        pool_options = if in_memory {
            pool_options
                .min_connections(1)
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options
                .min_connections(config.min_connections)
                .max_connections(config.max_connections)
                .idle_timeout(Some(config.idle_timeout()))
        };

        let pool = pool_options.connect_with(options).await.map_err(|e| {
            warn!("Failed to connect to database: {}", e);
            StrataError::Database(format!("Failed to connect: {e}"))
        })?;

        info!(in_memory, "SQLite connection pool established");
        Ok(Self { pool })
    }

    /// Wraps an existing pool.
    #[must_use]
    pub fn with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Component parameters for registering a pool in a shaku module.
    #[must_use]
    pub fn parameters(pool: SqlitePool) -> DatabasePoolParameters {
        DatabasePoolParameters { pool }
    }
}

#[async_trait]
impl DatabasePoolInterface for DatabasePool {
    fn inner(&self) -> &SqlitePool {
        &self.pool
    }

    async fn begin_write(&self) -> StrataResult<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    async fn health_check(&self) -> StrataResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StrataError::Database(format!("Health check failed: {e}")))?;
        Ok(())
    }

    async fn run_migrations(&self) -> StrataResult<()> {
        info!("Running database migrations...");
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StrataError::Database(format!("Migration failed: {e}")))?;
        info!("Database migrations completed");
        Ok(())
    }

    async fn close(&self) {
        info!("Closing database connection pool...");
        self.pool.close().await;
        info!("Database connection pool closed");
    }
}

impl std::ops::Deref for DatabasePool {
    type Target = SqlitePool;

    fn deref(&self) -> &Self::Target {
        &self.pool
    }
}

impl std::fmt::Debug for DatabasePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabasePool")
            .field("size", &self.pool.size())
            .field("num_idle", &self.pool.num_idle())
            .finish()
    }
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Opens a shared pool and applies migrations when configured to.
pub async fn create_pool(config: &DatabaseConfig) -> StrataResult<Arc<DatabasePool>> {
    let pool = DatabasePool::new(config).await?;
    if config.run_migrations {
        pool.run_migrations().await?;
    }
    Ok(Arc::new(pool))
}
