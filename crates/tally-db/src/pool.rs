//! # Database Handle
//!
//! Opens the SQLite store behind the ledger and hands out repositories.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DbConfig ──► Database::new ──► migrate ──► Database { pool, locks }    │
//! │                                                  │                      │
//! │                          ┌───────────────────────┴───────────┐          │
//! │                          ▼                                   ▼          │
//! │                  db.credits()                          db.sales()       │
//! │          (pool + per-customer locks)                    (pool)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! File stores run in WAL mode so balance listings never wait on a payment
//! that is being written.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::locks::KeyedLocks;
use crate::migrations;
use crate::repository::credit::CreditRepository;
use crate::repository::sale::SaleRepository;

/// Where the ledger lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storage {
    File(PathBuf),
    /// Private to the pool; gone when the pool closes.
    Memory,
}

impl Storage {
    /// `":memory:"` selects [`Storage::Memory`], anything else is a file path.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if path.as_os_str() == ":memory:" {
            Storage::Memory
        } else {
            Storage::File(path.to_path_buf())
        }
    }

    fn describe(&self) -> String {
        match self {
            Storage::File(path) => path.display().to_string(),
            Storage::Memory => ":memory:".to_string(),
        }
    }
}

/// Pool settings for [`Database::new`].
///
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/tally/tally.db").max_connections(8);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub storage: Storage,
    pub max_connections: u32,
    /// How long a writer waits on SQLite's lock before giving up.
    pub busy_timeout: Duration,
    pub acquire_timeout: Duration,
    pub migrate: bool,
}

impl DbConfig {
    pub fn new(path: impl AsRef<Path>) -> Self {
        DbConfig {
            storage: Storage::from_path(path),
            max_connections: 5,
            busy_timeout: Duration::from_secs(5),
            acquire_timeout: Duration::from_secs(30),
            migrate: true,
        }
    }

    /// A throwaway store for tests.
    pub fn in_memory() -> Self {
        DbConfig {
            storage: Storage::Memory,
            // each :memory: connection would otherwise see its own empty database
            max_connections: 1,
            busy_timeout: Duration::from_secs(5),
            acquire_timeout: Duration::from_secs(5),
            migrate: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = match self.storage {
            Storage::Memory => 1,
            Storage::File(_) => max.max(1),
        };
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn migrate(mut self, migrate: bool) -> Self {
        self.migrate = migrate;
        self
    }

    fn connect_options(&self) -> SqliteConnectOptions {
        let options = match &self.storage {
            Storage::File(path) => SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal),
            Storage::Memory => SqliteConnectOptions::new().in_memory(true),
        };

        options
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(self.busy_timeout)
            // off by default in SQLite
            .foreign_keys(true)
    }
}

/// Shared handle to the ledger store. Clones share the pool and the
/// payment locks, so one handle per process is enough.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    locks: Arc<KeyedLocks>,
}

impl Database {
    /// Opens the pool and, unless disabled, applies pending migrations.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        let location = config.storage.describe();
        info!(storage = %location, "Opening ledger database");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(config.connect_options())
            .await
            .map_err(|e| DbError::ConnectionFailed(format!("{}: {}", location, e)))?;

        debug!(max_connections = config.max_connections, "Pool ready");

        let db = Database {
            pool,
            locks: Arc::new(KeyedLocks::new()),
        };

        if config.migrate {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await?;
        info!("Schema up to date");
        Ok(())
    }

    /// Raw pool access. Payments written through it skip the customer locks.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn credits(&self) -> CreditRepository {
        CreditRepository::new(self.pool.clone(), self.locks.clone())
    }

    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone())
    }

    pub async fn close(&self) {
        info!("Closing ledger database");
        self.pool.close().await;
    }

    /// `true` when a trivial query round-trips.
    pub async fn health_check(&self) -> bool {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_is_migrated() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert!(db.health_check().await);
        let (total, applied) = migrations::migration_status(db.pool()).await.unwrap();
        assert!(total > 0);
        assert_eq!(total, applied);
    }

    #[test]
    fn test_storage_from_path() {
        assert_eq!(Storage::from_path(":memory:"), Storage::Memory);
        assert_eq!(
            Storage::from_path("./tally.db"),
            Storage::File(PathBuf::from("./tally.db"))
        );
    }

    #[test]
    fn test_memory_store_keeps_one_connection() {
        let config = DbConfig::new(":memory:").max_connections(10);
        assert_eq!(config.max_connections, 1);

        let config = DbConfig::new("/tmp/tally-test.db")
            .max_connections(10)
            .migrate(false);
        assert_eq!(config.max_connections, 10);
        assert!(!config.migrate);
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let path = std::env::temp_dir().join(format!("tally-{}.db", uuid::Uuid::new_v4()));

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        assert!(db.health_check().await);
        db.close().await;

        let reopened = Database::new(DbConfig::new(&path)).await.unwrap();
        let (total, applied) = migrations::migration_status(reopened.pool()).await.unwrap();
        assert_eq!(total, applied);
        reopened.close().await;

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_closed_pool_is_unhealthy() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.close().await;
        assert!(!db.health_check().await);
    }
}
