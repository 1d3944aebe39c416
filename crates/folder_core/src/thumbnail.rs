//! Derived artifacts: on-disk thumbnail store
//!
//! Thumbnails live under `<root>/<resource type>/<folder>/<file>__<w>x<h>`,
//! so everything derived from a folder subtree sits in a single directory tree
//! and can be dropped at once when the folder is renamed or deleted.

use crate::ResourceType;
use folder_fs::{FsError, LogicalPath, Result};
use std::path::{Path, PathBuf};

/// Store of artifacts derived from files
pub trait ThumbnailRepository: Send + Sync {
    /// Remove every artifact derived from files at or below `folder`
    fn delete_thumbnails(&self, resource_type: &ResourceType, folder: &LogicalPath) -> Result<()>;
}

/// Thumbnail size presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThumbnailSize {
    Small,  // 128x128
    Medium, // 256x256
    Large,  // 512x512
}

impl ThumbnailSize {
    pub fn to_dimensions(self) -> (u32, u32) {
        match self {
            ThumbnailSize::Small => (128, 128),
            ThumbnailSize::Medium => (256, 256),
            ThumbnailSize::Large => (512, 512),
        }
    }
}

/// Disk-backed thumbnail store
pub struct ThumbnailStore {
    root: PathBuf,
}

impl ThumbnailStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn folder_dir(&self, resource_type: &str, folder: &LogicalPath) -> PathBuf {
        let mut dir = self.root.join(resource_type);
        for segment in folder.as_str().split('/').filter(|s| !s.is_empty()) {
            dir.push(segment);
        }
        dir
    }

    pub fn thumbnail_path(
        &self,
        resource_type: &str,
        folder: &LogicalPath,
        file_name: &str,
        size: ThumbnailSize,
    ) -> Result<PathBuf> {
        if file_name.is_empty() || file_name.contains(['/', '\\']) || file_name.contains("..") {
            return Err(FsError::InvalidPath(file_name.to_string()));
        }

        let (w, h) = size.to_dimensions();
        Ok(self
            .folder_dir(resource_type, folder)
            .join(format!("{}__{}x{}", file_name, w, h)))
    }

    pub fn put(
        &self,
        resource_type: &str,
        folder: &LogicalPath,
        file_name: &str,
        size: ThumbnailSize,
        data: &[u8],
    ) -> Result<PathBuf> {
        let path = self.thumbnail_path(resource_type, folder, file_name, size)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, data)?;

        tracing::debug!("Thumbnail stored: {:?}", path);
        Ok(path)
    }

    pub fn get(
        &self,
        resource_type: &str,
        folder: &LogicalPath,
        file_name: &str,
        size: ThumbnailSize,
    ) -> Result<Option<Vec<u8>>> {
        let path = self.thumbnail_path(resource_type, folder, file_name, size)?;
        match std::fs::read(&path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl ThumbnailRepository for ThumbnailStore {
    fn delete_thumbnails(&self, resource_type: &ResourceType, folder: &LogicalPath) -> Result<()> {
        let dir = self.folder_dir(resource_type.name(), folder);
        if !dir.exists() {
            return Ok(());
        }

        std::fs::remove_dir_all(&dir)?;
        tracing::info!("Deleted thumbnails: {:?}", dir);
        Ok(())
    }
}
