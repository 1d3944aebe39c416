//! Local disk backend

use super::{physical_segments, DirectoryEntry, FileEntry, ResourceScope, StorageBackend};
use crate::{FsError, HiddenPolicy, LogicalPath, Result};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Backend storing files below a root directory on the local file system
pub struct LocalBackend {
    root: PathBuf,
    base_url: Option<String>,
    hidden: HiddenPolicy,
}

impl LocalBackend {
    pub fn new<P: Into<PathBuf>>(root: P, hidden: HiddenPolicy) -> Self {
        Self {
            root: root.into(),
            base_url: None,
            hidden,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a physical path below the root, `None` if it tries to leave it
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let segments = physical_segments(path)?;
        let mut resolved = self.root.clone();
        resolved.extend(segments);
        Some(resolved)
    }

    fn resolve_or_err(&self, path: &str) -> Result<PathBuf> {
        self.resolve(path)
            .ok_or_else(|| FsError::AccessDenied(path.to_string()))
    }

    fn log_failure(op: &str, path: &str, err: &io::Error) -> bool {
        tracing::warn!("{} failed for {}: {}", op, path, err);
        false
    }

    fn stream_into(&self, path: &str, reader: &mut dyn Read, create_new: bool) -> bool {
        let Some(target) = self.resolve(path) else {
            return false;
        };

        let file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .create_new(create_new)
            .truncate(true)
            .open(&target);

        match file.and_then(|mut file| io::copy(reader, &mut file)) {
            Ok(bytes) => {
                tracing::debug!("Streamed {} bytes into {}", bytes, target.display());
                true
            }
            Err(e) => Self::log_failure("stream write", path, &e),
        }
    }

    fn list(&self, scope: ResourceScope<'_>, folder: &LogicalPath) -> Result<Vec<fs::DirEntry>> {
        let dir = self.resolve_or_err(&scope.physical_path(folder))?;
        if !dir.is_dir() {
            return Err(FsError::NotFound(folder.to_string()));
        }

        fs::read_dir(&dir)?
            .map(|entry| entry.map_err(FsError::from))
            .collect()
    }

    fn has_visible_subfolder(&self, dir: &Path) -> bool {
        fs::read_dir(dir)
            .map(|entries| {
                entries.flatten().any(|entry| {
                    entry.path().is_dir()
                        && !self.hidden.is_hidden_folder(&entry.file_name().to_string_lossy())
                })
            })
            .unwrap_or(false)
    }
}

impl StorageBackend for LocalBackend {
    fn has_directory(&self, path: &str) -> bool {
        self.resolve(path).is_some_and(|p| p.is_dir())
    }

    fn create_dir(&self, path: &str) -> bool {
        let Some(target) = self.resolve(path) else {
            return false;
        };

        match fs::create_dir_all(&target) {
            Ok(()) => {
                tracing::info!("Created directory: {}", target.display());
                true
            }
            Err(e) => Self::log_failure("create_dir", path, &e),
        }
    }

    fn rename(&self, from: &str, to: &str) -> bool {
        let (Some(source), Some(target)) = (self.resolve(from), self.resolve(to)) else {
            return false;
        };

        if !source.exists() || target.exists() {
            return false;
        }

        match fs::rename(&source, &target) {
            Ok(()) => {
                tracing::info!("Renamed: {} -> {}", source.display(), target.display());
                true
            }
            Err(e) => Self::log_failure("rename", from, &e),
        }
    }

    fn delete_dir(&self, path: &str) -> bool {
        let Some(target) = self.resolve(path) else {
            return false;
        };

        if !target.is_dir() {
            return false;
        }

        match fs::remove_dir_all(&target) {
            Ok(()) => {
                tracing::info!("Deleted directory: {}", target.display());
                true
            }
            Err(e) => Self::log_failure("delete_dir", path, &e),
        }
    }

    fn has(&self, path: &str) -> bool {
        self.resolve(path).is_some_and(|p| p.exists())
    }

    fn write(&self, path: &str, data: &[u8]) -> bool {
        let Some(target) = self.resolve(path) else {
            return false;
        };

        match fs::write(&target, data) {
            Ok(()) => true,
            Err(e) => Self::log_failure("write", path, &e),
        }
    }

    fn write_stream(&self, path: &str, reader: &mut dyn Read) -> bool {
        self.stream_into(path, reader, true)
    }

    fn put_stream(&self, path: &str, reader: &mut dyn Read) -> bool {
        self.stream_into(path, reader, false)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        let target = self.resolve_or_err(path)?;
        if !target.is_file() {
            return Err(FsError::NotFound(path.to_string()));
        }
        Ok(fs::read(&target)?)
    }

    fn read_stream(&self, path: &str) -> Result<Box<dyn Read + Send>> {
        let target = self.resolve_or_err(path)?;
        if !target.is_file() {
            return Err(FsError::NotFound(path.to_string()));
        }
        Ok(Box::new(fs::File::open(&target)?))
    }

    fn directories(&self, scope: ResourceScope<'_>, folder: &LogicalPath) -> Result<Vec<DirectoryEntry>> {
        let mut entries: Vec<DirectoryEntry> = self
            .list(scope, folder)?
            .into_iter()
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().to_string();
                if self.hidden.is_hidden_folder(&name) {
                    return None;
                }
                Some(DirectoryEntry {
                    has_children: self.has_visible_subfolder(&entry.path()),
                    name,
                })
            })
            .collect();

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn files(&self, scope: ResourceScope<'_>, folder: &LogicalPath) -> Result<Vec<FileEntry>> {
        let mut entries = Vec::new();

        for entry in self.list(scope, folder)? {
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().to_string();
            if self.hidden.is_hidden_file(&name) {
                continue;
            }

            let modified = metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| d.as_secs() as i64);

            entries.push(FileEntry {
                name,
                size: metadata.len(),
                modified,
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn hidden_policy(&self) -> &HiddenPolicy {
        &self.hidden
    }

    fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn backend() -> (TempDir, LocalBackend) {
        let temp_dir = TempDir::new().unwrap();
        let backend = LocalBackend::new(temp_dir.path(), HiddenPolicy::default());
        (temp_dir, backend)
    }

    #[test]
    fn test_create_and_rename_dir() {
        let (_temp, backend) = backend();

        assert!(backend.create_dir("files/docs"));
        assert!(backend.has_directory("files/docs"));

        assert!(backend.create_dir("files/other"));
        assert!(!backend.rename("files/docs", "files/other"));
        assert!(backend.rename("files/docs", "files/reports"));
        assert!(!backend.has("files/docs"));
        assert!(backend.has_directory("files/reports"));
    }

    #[test]
    fn test_write_read_delete() {
        let (_temp, backend) = backend();
        assert!(backend.create_dir("files"));

        assert!(backend.write("files/a.txt", b"hello"));
        assert_eq!(backend.read("files/a.txt").unwrap(), b"hello");

        let mut stream = backend.read_stream("files/a.txt").unwrap();
        let mut content = String::new();
        stream.read_to_string(&mut content).unwrap();
        assert_eq!(content, "hello");

        assert!(matches!(backend.read("files/missing.txt"), Err(FsError::NotFound(_))));

        assert!(backend.delete_dir("files"));
        assert!(!backend.has("files/a.txt"));
        assert!(!backend.delete_dir("files"));
    }

    #[test]
    fn test_write_stream_vs_put_stream() {
        let (_temp, backend) = backend();
        assert!(backend.create_dir("files"));

        assert!(backend.write_stream("files/b.txt", &mut &b"first"[..]));
        assert!(!backend.write_stream("files/b.txt", &mut &b"second"[..]));
        assert_eq!(backend.read("files/b.txt").unwrap(), b"first");

        assert!(backend.put_stream("files/b.txt", &mut &b"third"[..]));
        assert_eq!(backend.read("files/b.txt").unwrap(), b"third");
    }

    #[test]
    fn test_traversal_is_refused() {
        let (_temp, backend) = backend();
        assert!(!backend.write("../escape.txt", b"x"));
        assert!(!backend.create_dir("a/../../b"));
        assert!(matches!(backend.read("../etc/passwd"), Err(FsError::AccessDenied(_))));
    }

    #[test]
    fn test_listings_skip_hidden() {
        let (_temp, backend) = backend();
        assert!(backend.create_dir("files/pics/2024"));
        assert!(backend.create_dir("files/.git"));
        assert!(backend.create_dir("files/empty"));
        assert!(backend.write("files/a.txt", b"abc"));
        assert!(backend.write("files/.env", b"secret"));

        let scope = ResourceScope { name: "Files", directory: "files" };
        let dirs = backend.directories(scope, &LogicalPath::root()).unwrap();
        assert_eq!(
            dirs,
            vec![
                DirectoryEntry { name: "empty".into(), has_children: false },
                DirectoryEntry { name: "pics".into(), has_children: true },
            ]
        );

        let files = backend.files(scope, &LogicalPath::root()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "a.txt");
        assert_eq!(files[0].size, 3);
        assert!(files[0].modified.is_some());
    }
}
