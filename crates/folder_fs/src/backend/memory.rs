//! In-memory backend
//!
//! Keeps a flat map of directories and files keyed by their cleaned physical
//! path. Behaves like the local backend, so it can stand in for an object store.

use super::{physical_segments, DirectoryEntry, FileEntry, ResourceScope, StorageBackend};
use crate::{FsError, HiddenPolicy, LogicalPath, Result};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{Cursor, Read};

#[derive(Default)]
struct Tree {
    /// Directory keys; the backend root is the empty key and always exists
    dirs: BTreeSet<String>,
    files: BTreeMap<String, Vec<u8>>,
}

impl Tree {
    fn is_dir(&self, key: &str) -> bool {
        key.is_empty() || self.dirs.contains(key)
    }

    fn exists(&self, key: &str) -> bool {
        self.is_dir(key) || self.files.contains_key(key)
    }

    fn parent_exists(&self, key: &str) -> bool {
        self.is_dir(parent_key(key))
    }
}

/// Thread-safe in-memory storage
pub struct MemoryBackend {
    tree: RwLock<Tree>,
    base_url: Option<String>,
    hidden: HiddenPolicy,
}

impl MemoryBackend {
    pub fn new(hidden: HiddenPolicy) -> Self {
        Self {
            tree: RwLock::new(Tree::default()),
            base_url: None,
            hidden,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    fn store_file(&self, path: &str, data: Vec<u8>, overwrite: bool) -> bool {
        let Some(key) = clean_key(path) else {
            return false;
        };

        let mut tree = self.tree.write();
        if key.is_empty() || tree.is_dir(&key) || !tree.parent_exists(&key) {
            return false;
        }
        if !overwrite && tree.files.contains_key(&key) {
            return false;
        }

        tree.files.insert(key, data);
        true
    }

    fn folder_key(&self, scope: ResourceScope<'_>, folder: &LogicalPath) -> Result<String> {
        let physical = scope.physical_path(folder);
        let key = clean_key(&physical).ok_or_else(|| FsError::AccessDenied(physical.clone()))?;
        if !self.tree.read().is_dir(&key) {
            return Err(FsError::NotFound(folder.to_string()));
        }
        Ok(key)
    }
}

impl StorageBackend for MemoryBackend {
    fn has_directory(&self, path: &str) -> bool {
        clean_key(path).is_some_and(|key| self.tree.read().is_dir(&key))
    }

    fn create_dir(&self, path: &str) -> bool {
        let Some(key) = clean_key(path) else {
            return false;
        };

        let mut tree = self.tree.write();
        let mut current = String::new();
        for segment in key.split('/').filter(|s| !s.is_empty()) {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(segment);
            if tree.files.contains_key(&current) {
                return false;
            }
            tree.dirs.insert(current.clone());
        }
        true
    }

    fn rename(&self, from: &str, to: &str) -> bool {
        let (Some(from), Some(to)) = (clean_key(from), clean_key(to)) else {
            return false;
        };

        let mut tree = self.tree.write();
        if from.is_empty() || !tree.exists(&from) || tree.exists(&to) || !tree.parent_exists(&to) {
            return false;
        }

        if let Some(data) = tree.files.remove(&from) {
            tree.files.insert(to, data);
            return true;
        }

        let moved_dirs: Vec<String> = tree
            .dirs
            .iter()
            .filter(|key| is_within(key, &from))
            .cloned()
            .collect();
        for key in moved_dirs {
            tree.dirs.remove(&key);
            tree.dirs.insert(rebase(&key, &from, &to));
        }

        let moved_files: Vec<String> = tree
            .files
            .keys()
            .filter(|key| is_within(key, &from))
            .cloned()
            .collect();
        for key in moved_files {
            if let Some(data) = tree.files.remove(&key) {
                tree.files.insert(rebase(&key, &from, &to), data);
            }
        }

        true
    }

    fn delete_dir(&self, path: &str) -> bool {
        let Some(key) = clean_key(path) else {
            return false;
        };

        let mut tree = self.tree.write();
        if key.is_empty() || !tree.dirs.contains(&key) {
            return false;
        }

        tree.dirs.retain(|k| !is_within(k, &key));
        tree.files.retain(|k, _| !is_within(k, &key));
        true
    }

    fn has(&self, path: &str) -> bool {
        clean_key(path).is_some_and(|key| self.tree.read().exists(&key))
    }

    fn write(&self, path: &str, data: &[u8]) -> bool {
        self.store_file(path, data.to_vec(), true)
    }

    fn write_stream(&self, path: &str, reader: &mut dyn Read) -> bool {
        let mut data = Vec::new();
        if reader.read_to_end(&mut data).is_err() {
            return false;
        }
        self.store_file(path, data, false)
    }

    fn put_stream(&self, path: &str, reader: &mut dyn Read) -> bool {
        let mut data = Vec::new();
        if reader.read_to_end(&mut data).is_err() {
            return false;
        }
        self.store_file(path, data, true)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        let key = clean_key(path).ok_or_else(|| FsError::AccessDenied(path.to_string()))?;
        self.tree
            .read()
            .files
            .get(&key)
            .cloned()
            .ok_or_else(|| FsError::NotFound(path.to_string()))
    }

    fn read_stream(&self, path: &str) -> Result<Box<dyn Read + Send>> {
        Ok(Box::new(Cursor::new(self.read(path)?)))
    }

    fn directories(&self, scope: ResourceScope<'_>, folder: &LogicalPath) -> Result<Vec<DirectoryEntry>> {
        let key = self.folder_key(scope, folder)?;
        let tree = self.tree.read();

        let entries = tree
            .dirs
            .iter()
            .filter(|dir| parent_key(dir) == key && !dir.is_empty())
            .filter_map(|dir| {
                let name = leaf(dir);
                if self.hidden.is_hidden_folder(name) {
                    return None;
                }
                let has_children = tree
                    .dirs
                    .iter()
                    .any(|child| parent_key(child) == dir.as_str() && !self.hidden.is_hidden_folder(leaf(child)));
                Some(DirectoryEntry {
                    name: name.to_string(),
                    has_children,
                })
            })
            .collect();

        Ok(entries)
    }

    fn files(&self, scope: ResourceScope<'_>, folder: &LogicalPath) -> Result<Vec<FileEntry>> {
        let key = self.folder_key(scope, folder)?;
        let tree = self.tree.read();

        let entries = tree
            .files
            .iter()
            .filter(|(file, _)| parent_key(file) == key && !self.hidden.is_hidden_file(leaf(file)))
            .map(|(file, data)| FileEntry {
                name: leaf(file).to_string(),
                size: data.len() as u64,
                modified: None,
            })
            .collect();

        Ok(entries)
    }

    fn hidden_policy(&self) -> &HiddenPolicy {
        &self.hidden
    }

    fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }
}

fn clean_key(path: &str) -> Option<String> {
    physical_segments(path).map(|segments| segments.join("/"))
}

fn parent_key(key: &str) -> &str {
    key.rfind('/').map(|idx| &key[..idx]).unwrap_or("")
}

fn leaf(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

fn is_within(key: &str, dir: &str) -> bool {
    key == dir || key.strip_prefix(dir).is_some_and(|rest| rest.starts_with('/'))
}

fn rebase(key: &str, from: &str, to: &str) -> String {
    format!("{}{}", to, &key[from.len()..])
}
