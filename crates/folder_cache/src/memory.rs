//! In-memory cache backed by an ordered map

use crate::{clean_key, is_under_prefix, CacheStore, Result};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Ordered in-memory cache; prefix operations are range scans
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn keys_under(entries: &BTreeMap<String, Vec<u8>>, prefix: &str) -> Vec<String> {
        entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .filter(|(key, _)| is_under_prefix(key, prefix))
            .map(|(key, _)| key.clone())
            .collect()
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.read().get(clean_key(key)).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.entries
            .write()
            .insert(clean_key(key).to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.entries.write().remove(clean_key(key)).is_some())
    }

    fn delete_by_prefix(&self, prefix: &str) -> Result<usize> {
        let prefix = clean_key(prefix);
        let mut entries = self.entries.write();

        let doomed = Self::keys_under(&entries, prefix);
        for key in &doomed {
            entries.remove(key);
        }

        tracing::debug!("Cache: removed {} entries under {}", doomed.len(), prefix);
        Ok(doomed.len())
    }

    fn change_prefix(&self, old: &str, new: &str) -> Result<usize> {
        let (old, new) = (clean_key(old), clean_key(new));
        if old == new {
            return Ok(0);
        }

        let mut entries = self.entries.write();

        for stale in Self::keys_under(&entries, new) {
            entries.remove(&stale);
        }

        let moved = Self::keys_under(&entries, old);
        for key in &moved {
            if let Some(value) = entries.remove(key) {
                entries.insert(format!("{}{}", new, &key[old.len()..]), value);
            }
        }

        tracing::debug!("Cache: moved {} entries {} -> {}", moved.len(), old, new);
        Ok(moved.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> MemoryCache {
        let cache = MemoryCache::new();
        for key in ["Images/pics", "Images/pics/a.png", "Images/pics/sub/b.png", "Images/pics2/c.png", "Files/pics/d"] {
            cache.set(key, key.as_bytes()).unwrap();
        }
        cache
    }

    #[test]
    fn test_basic_operations() {
        let cache = MemoryCache::new();
        cache.set("/Files/a.txt", b"1").unwrap();
        assert_eq!(cache.get("Files/a.txt").unwrap(), Some(b"1".to_vec()));
        assert!(cache.delete("Files/a.txt").unwrap());
        assert!(!cache.delete("Files/a.txt").unwrap());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_delete_by_prefix() {
        let cache = seeded();
        assert_eq!(cache.delete_by_prefix("Images/pics").unwrap(), 3);
        assert!(cache.get("Images/pics/a.png").unwrap().is_none());
        assert!(cache.get("Images/pics2/c.png").unwrap().is_some());
        assert!(cache.get("Files/pics/d").unwrap().is_some());
    }

    #[test]
    fn test_change_prefix_migrates_entries() {
        let cache = seeded();
        cache.set("Images/photos/stale", b"old").unwrap();

        assert_eq!(cache.change_prefix("Images/pics", "Images/photos").unwrap(), 3);

        assert!(cache.get("Images/pics").unwrap().is_none());
        assert!(cache.get("Images/pics/a.png").unwrap().is_none());
        assert_eq!(
            cache.get("Images/photos/sub/b.png").unwrap(),
            Some(b"Images/pics/sub/b.png".to_vec())
        );
        assert!(cache.get("Images/photos/stale").unwrap().is_none());
        assert!(cache.get("Images/pics2/c.png").unwrap().is_some());
        assert_eq!(cache.len(), 5);
    }
}
