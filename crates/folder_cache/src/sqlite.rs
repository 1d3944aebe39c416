//! SQLite-backed cache

use crate::{clean_key, init_memory_pool, init_pool, migrate, CacheStore, DbConn, DbPool, Result};
use rusqlite::{params, OptionalExtension};
use std::path::Path;

/// Rows at `?1` or below it (`?2` is `?1` followed by a separator)
const UNDER_PREFIX: &str = "(key = ?1 OR substr(key, 1, length(?2)) = ?2)";

/// Persistent cache shared by every request of a connector
pub struct SqliteCache {
    pool: DbPool,
}

impl SqliteCache {
    /// Open or create the cache database and bring its schema up to date
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let pool = init_pool(path)?;
        migrate(&pool)?;

        tracing::info!("Cache database opened at {:?}", path);
        Ok(Self { pool })
    }

    /// Cache that lives only as long as this value
    pub fn in_memory() -> Result<Self> {
        let pool = init_memory_pool()?;
        migrate(&pool)?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }
}

impl CacheStore for SqliteCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let conn = self.conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM cache_entries WHERE key = ?1",
                [clean_key(key)],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO cache_entries (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = strftime('%s', 'now')
            "#,
            params![clean_key(key), value],
        )?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool> {
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM cache_entries WHERE key = ?1", [clean_key(key)])?;
        Ok(removed > 0)
    }

    fn delete_by_prefix(&self, prefix: &str) -> Result<usize> {
        let prefix = clean_key(prefix);
        let conn = self.conn()?;

        let removed = if prefix.is_empty() {
            conn.execute("DELETE FROM cache_entries", [])?
        } else {
            conn.execute(
                &format!("DELETE FROM cache_entries WHERE {}", UNDER_PREFIX),
                params![prefix, format!("{}/", prefix)],
            )?
        };

        tracing::debug!("Cache: removed {} entries under {}", removed, prefix);
        Ok(removed)
    }

    fn change_prefix(&self, old: &str, new: &str) -> Result<usize> {
        let (old, new) = (clean_key(old), clean_key(new));
        if old == new || old.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            &format!("DELETE FROM cache_entries WHERE {}", UNDER_PREFIX),
            params![new, format!("{}/", new)],
        )?;

        let moved = tx.execute(
            &format!(
                "UPDATE cache_entries SET key = ?3 || substr(key, length(?1) + 1) WHERE {}",
                UNDER_PREFIX
            ),
            params![old, format!("{}/", old), new],
        )?;

        tx.commit()?;

        tracing::debug!("Cache: moved {} entries {} -> {}", moved, old, new);
        Ok(moved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_cache() -> (TempDir, SqliteCache) {
        let temp_dir = TempDir::new().unwrap();
        let cache = SqliteCache::open(&temp_dir.path().join("cache").join("cache.db")).unwrap();
        (temp_dir, cache)
    }

    #[test]
    fn test_in_memory_cache() {
        let cache = SqliteCache::in_memory().unwrap();
        cache.set("Images/pics/a.png", b"1").unwrap();
        cache.set("Images/pics/b.png", b"2").unwrap();

        assert_eq!(cache.change_prefix("Images/pics", "Images/photos").unwrap(), 2);
        assert_eq!(cache.get("Images/photos/a.png").unwrap(), Some(b"1".to_vec()));
        assert_eq!(cache.delete_by_prefix("Images/photos").unwrap(), 2);
    }

    #[test]
    fn test_cache_operations() {
        let (_temp, cache) = open_cache();

        cache.set("Files/a.txt", &[1, 2, 3]).unwrap();
        assert_eq!(cache.get("Files/a.txt").unwrap(), Some(vec![1, 2, 3]));

        cache.set("Files/a.txt", &[4]).unwrap();
        assert_eq!(cache.get("/Files/a.txt/").unwrap(), Some(vec![4]));

        assert!(cache.delete("Files/a.txt").unwrap());
        assert!(cache.get("Files/a.txt").unwrap().is_none());
    }

    #[test]
    fn test_prefix_operations() {
        let (_temp, cache) = open_cache();
        for key in ["Images/pics", "Images/pics/a.png", "Images/pics/sub/b.png", "Images/pics2/c.png"] {
            cache.set(key, key.as_bytes()).unwrap();
        }
        cache.set("Images/photos/stale", b"old").unwrap();

        assert_eq!(cache.change_prefix("Images/pics", "Images/photos").unwrap(), 3);
        assert!(cache.get("Images/pics/a.png").unwrap().is_none());
        assert!(cache.get("Images/photos/stale").unwrap().is_none());
        assert_eq!(
            cache.get("Images/photos/sub/b.png").unwrap(),
            Some(b"Images/pics/sub/b.png".to_vec())
        );
        assert!(cache.get("Images/pics2/c.png").unwrap().is_some());

        assert_eq!(cache.delete_by_prefix("Images/photos").unwrap(), 3);
        assert!(cache.get("Images/photos").unwrap().is_none());
        assert!(cache.get("Images/pics2/c.png").unwrap().is_some());
    }
}
