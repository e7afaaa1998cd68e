//! Database connection manager backed by an r2d2 pool of SQLite connections.

use std::path::{Path, PathBuf};
use std::time::Duration;

use bergerie_domain::{BergerieError, DatabaseConfig, Result};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use tokio::task::JoinError;
use tracing::info;

use crate::errors::InfraError;

const SCHEMA_VERSION: i32 = 1;
const SCHEMA_SQL: &str = include_str!("schema.sql");
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared pool type used by the repositories.
pub type DbPool = Pool<SqliteConnectionManager>;
/// Connection checked out of a [`DbPool`].
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Database manager that owns the connection pool.
pub struct DbManager {
    pool: DbPool,
    path: PathBuf,
}

impl DbManager {
    /// Open (or create) the database at `db_path` with up to `pool_size`
    /// connections.
    pub fn new<P: AsRef<Path>>(db_path: P, pool_size: u32) -> Result<Self> {
        let path = db_path.as_ref().to_path_buf();

        let manager = SqliteConnectionManager::file(&path).with_init(|conn| {
            conn.busy_timeout(BUSY_TIMEOUT)?;
            conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON;")
        });

        let pool = Pool::builder()
            .max_size(pool_size.max(1))
            .connection_timeout(CONNECTION_TIMEOUT)
            .build(manager)
            .map_err(InfraError::from)?;

        info!(
            db_path = %path.display(),
            max_connections = pool.max_size(),
            "sqlite pool initialised"
        );

        Ok(Self { pool, path })
    }

    /// Open the database described by the `database` config section.
    pub fn from_config(config: &DatabaseConfig) -> Result<Self> {
        Self::new(&config.path, config.pool_size)
    }

    /// Clone of the pool handle for repositories.
    pub fn pool(&self) -> DbPool {
        self.pool.clone()
    }

    /// Acquire a connection from the pool.
    pub fn get_connection(&self) -> Result<DbConnection> {
        checkout(&self.pool)
    }

    /// Ensure the full schema exists on the current database.
    pub fn run_migrations(&self) -> Result<()> {
        let conn = self.get_connection()?;
        conn.execute_batch(SCHEMA_SQL).map_err(InfraError::from)?;
        conn.execute(
            "INSERT OR IGNORE INTO schema_version (version, applied_at)
             VALUES (?1, CAST(strftime('%s','now') AS INTEGER))",
            params![SCHEMA_VERSION],
        )
        .map_err(InfraError::from)?;
        Ok(())
    }

    /// Return the configured database path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Verify the database answers a trivial query.
    pub fn health_check(&self) -> Result<()> {
        let conn = self.get_connection()?;
        let one: i32 =
            conn.query_row("SELECT 1", [], |row| row.get(0)).map_err(InfraError::from)?;
        if one != 1 {
            return Err(BergerieError::Database("health check returned unexpected value".into()));
        }
        Ok(())
    }
}

/// Check a connection out of `pool` with domain error semantics.
///
/// Blocks for up to the pool's connection timeout; async callers run it
/// inside `spawn_blocking`.
pub fn checkout(pool: &DbPool) -> Result<DbConnection> {
    Ok(pool.get().map_err(InfraError::from)?)
}

/// Map a failed blocking repository task onto the domain error.
pub(crate) fn map_join_error(repository: &str, err: JoinError) -> BergerieError {
    if err.is_cancelled() {
        BergerieError::Internal(format!("blocking {repository} task cancelled"))
    } else {
        BergerieError::Internal(format!("blocking {repository} task failed: {err}"))
    }
}
