//! SQLite connection pool for the cache database

use crate::Result;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;
use std::time::Duration;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// How long a writer waits on a locked database, and a caller on the pool
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Entries can always be recomputed, so commits skip fsync
const CACHE_PRAGMAS: &str = "
    PRAGMA journal_mode = WAL;
    PRAGMA synchronous = OFF;
    PRAGMA cache_size = -8000;
    PRAGMA temp_store = MEMORY;
";

/// Pool over a cache database file
pub fn init_pool(path: &Path) -> Result<DbPool> {
    let manager = SqliteConnectionManager::file(path).with_init(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(CACHE_PRAGMAS)
    });

    let pool = Pool::builder()
        .max_size(4)
        .min_idle(Some(1))
        .connection_timeout(BUSY_TIMEOUT)
        .build(manager)?;
    Ok(pool)
}

/// Single-connection pool over a private in-memory database
///
/// Every connection of `SqliteConnectionManager::memory()` sees its own
/// database, so the pool never opens a second one.
pub fn init_memory_pool() -> Result<DbPool> {
    let pool = Pool::builder()
        .max_size(1)
        .connection_timeout(BUSY_TIMEOUT)
        .build(SqliteConnectionManager::memory())?;
    Ok(pool)
}
