//! Folderwork Cache Layer
//!
//! Key/value cache addressed by `resource type/logical path` keys, with the two
//! structural operations folder mutations need:
//! - delete every entry at or below a key prefix
//! - move every entry at or below a prefix to a new prefix
//!
//! Provides an in-memory store and a SQLite store (r2d2 pooled).

mod memory;
mod sqlite;
mod schema;
mod pool;

pub use memory::MemoryCache;
pub use sqlite::SqliteCache;
pub use pool::{init_memory_pool, init_pool, DbConn, DbPool};
pub use schema::migrate;

use thiserror::Error;

/// Cache errors
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CacheError>;

/// Cache contract used by the working-folder layer
///
/// Prefixes are path prefixes: `Images/pics` covers `Images/pics` and
/// `Images/pics/...` but never `Images/pics2`.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Returns whether an entry was removed
    fn delete(&self, key: &str) -> Result<bool>;

    /// Remove every entry at or below `prefix`, returning how many were removed
    fn delete_by_prefix(&self, prefix: &str) -> Result<usize>;

    /// Re-key every entry at or below `old` to live below `new`
    ///
    /// Entries already stored below `new` are dropped first. Returns the number
    /// of migrated entries.
    fn change_prefix(&self, old: &str, new: &str) -> Result<usize>;
}

/// Canonical form of a key or prefix: no leading or trailing separators
pub fn clean_key(key: &str) -> &str {
    key.trim_matches('/')
}

/// Whether `key` lies at or below `prefix`
pub fn is_under_prefix(key: &str, prefix: &str) -> bool {
    let prefix = clean_key(prefix);
    if prefix.is_empty() {
        return true;
    }
    key == prefix || key.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_is_path_aware() {
        assert!(is_under_prefix("Images/pics", "Images/pics"));
        assert!(is_under_prefix("Images/pics/a.png", "Images/pics/"));
        assert!(!is_under_prefix("Images/pics2/a.png", "Images/pics"));
        assert!(!is_under_prefix("Files/pics", "Images/pics"));
        assert!(is_under_prefix("anything", ""));
    }

    #[test]
    fn test_clean_key() {
        assert_eq!(clean_key("/Images/pics/"), "Images/pics");
        assert_eq!(clean_key("Images"), "Images");
    }
}
