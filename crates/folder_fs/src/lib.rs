//! Folderwork File System Abstraction Layer
//!
//! Provides the path and storage primitives the working-folder layer is built on:
//! - LogicalPath: normalized client-facing paths and physical path combination
//! - Name validation for files and folders
//! - StorageBackend: the contract every storage provider implements
//! - Local disk and in-memory backends
//! - Hidden-name policy shared by the backends

mod path;
mod name;
mod hidden;
mod backend;

pub use path::{LogicalPath, normalize, combine, is_valid, encode_url_parts, join_url};
pub use name::{NameValidator, is_valid_name, DEFAULT_UNSAFE_FOLDER_CHARS, DEFAULT_UNSAFE_FILE_CHARS};
pub use hidden::HiddenPolicy;
pub use backend::{StorageBackend, ResourceScope, DirectoryEntry, FileEntry, LocalBackend, MemoryBackend};

use thiserror::Error;

/// File system errors
#[derive(Error, Debug)]
pub enum FsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, FsError>;
