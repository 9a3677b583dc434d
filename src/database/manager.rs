use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePool, SqlitePoolOptions};
use sqlx::Sqlite;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::DatabaseConfig;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Errors from DatabaseManager and the repositories built on top of it
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Invalid database URL: {0}")]
    InvalidDatabaseUrl(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DatabaseError::UniqueViolation(db_err.message().to_string())
            }
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                DatabaseError::ForeignKeyViolation(db_err.message().to_string())
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                DatabaseError::ConnectionError("connection pool unavailable".to_string())
            }
            // SQLITE_BUSY after the busy timeout ran out
            sqlx::Error::Database(db_err) if matches!(db_err.code().as_deref(), Some("5") | Some("517")) => {
                DatabaseError::ConnectionError(db_err.message().to_string())
            }
            other => DatabaseError::Sqlx(other),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DatabaseError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DatabaseError::MigrationError(err.to_string())
    }
}

/// Owns the connection pool. Cloning is cheap and shares the pool.
#[derive(Clone, Debug)]
pub struct DatabaseManager {
    pool: SqlitePool,
}

impl DatabaseManager {
    /// Open the pool described by `config` and apply pending migrations.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|_| DatabaseError::InvalidDatabaseUrl(config.url.clone()))?
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(config.connection_timeout));

        let mut pool_options = SqlitePoolOptions::new()
            .acquire_timeout(Duration::from_secs(config.connection_timeout));

        // Every connection to ":memory:" is its own database, so keep exactly one alive forever.
        if Self::is_memory_url(&config.url) {
            pool_options = pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        } else {
            pool_options = pool_options.max_connections(config.max_connections);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        let manager = Self { pool };
        manager.migrate().await?;

        info!("Connected to database: {}", Self::redact(&config.url));
        Ok(manager)
    }

    /// Fresh, migrated in-memory database
    pub async fn connect_in_memory() -> Result<Self, DatabaseError> {
        Self::connect(&DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            connection_timeout: 5,
        })
        .await
    }

    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        MIGRATOR.run(&self.pool).await?;
        Ok(())
    }

    /// Start a write transaction with `BEGIN IMMEDIATE`, so the write lock is
    /// taken (waiting up to the busy timeout) before anything is read.
    /// Dropping it without `commit` rolls it back.
    pub async fn begin_write(&self) -> Result<WriteTransaction, DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;
        Ok(WriteTransaction { conn: Some(conn) })
    }

    /// Check out a single connection for read-only work.
    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>, DatabaseError> {
        Ok(self.pool.acquire().await?)
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }

    fn is_memory_url(url: &str) -> bool {
        url.contains(":memory:") || url.contains("mode=memory")
    }

    /// Strip query parameters before logging a URL
    fn redact(url: &str) -> &str {
        url.split('?').next().unwrap_or(url)
    }
}

/// A pooled connection inside `BEGIN IMMEDIATE`.
pub struct WriteTransaction {
    conn: Option<PoolConnection<Sqlite>>,
}

impl WriteTransaction {
    /// The connection the transaction runs on.
    pub fn conn(&mut self) -> Result<&mut SqliteConnection, DatabaseError> {
        self.conn
            .as_deref_mut()
            .ok_or_else(|| DatabaseError::ConnectionError("transaction already finished".to_string()))
    }

    pub async fn commit(mut self) -> Result<(), DatabaseError> {
        let Some(mut conn) = self.conn.take() else {
            return Ok(());
        };

        if let Err(e) = sqlx::query("COMMIT").execute(&mut *conn).await {
            rollback(conn).await;
            return Err(e.into());
        }
        Ok(())
    }
}

impl Drop for WriteTransaction {
    fn drop(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };

        // The connection goes back to the pool only once the rollback has run
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(rollback(conn));
            }
            Err(_) => drop(conn.detach()),
        }
    }
}

async fn rollback(mut conn: PoolConnection<Sqlite>) {
    if let Err(e) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
        warn!("Rollback failed, discarding connection: {}", e);
        drop(conn.detach());
    }
}
