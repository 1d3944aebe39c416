//! Working-folder error types

use folder_fs::FsError;
use thiserror::Error;

/// Connector error numbers reported to clients
pub mod code {
    pub const INVALID_TYPE: u32 = 12;
    pub const INVALID_NAME: u32 = 102;
    pub const ACCESS_DENIED: u32 = 104;
    pub const INVALID_REQUEST: u32 = 109;
    pub const UNKNOWN: u32 = 110;
    pub const ALREADY_EXIST: u32 = 115;
    pub const FOLDER_NOT_FOUND: u32 = 116;
    pub const FILE_NOT_FOUND: u32 = 117;
}

/// Main error type of the working-folder layer
#[derive(Error, Debug)]
pub enum FolderError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Unknown resource type: {0}")]
    UnknownResourceType(String),

    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Hidden path used: {0}")]
    HiddenPathRejected(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Fs(FsError),
}

impl FolderError {
    /// Errors that deny access to an existing location
    pub fn is_access_denied(&self) -> bool {
        matches!(
            self,
            FolderError::AccessDenied(_)
                | FolderError::HiddenPathRejected(_)
                | FolderError::Fs(FsError::AccessDenied(_))
        )
    }

    /// Client-facing error number
    pub fn code(&self) -> u32 {
        match self {
            FolderError::InvalidPath(_) | FolderError::InvalidName(_) => code::INVALID_NAME,
            FolderError::UnknownResourceType(_) => code::INVALID_TYPE,
            FolderError::FolderNotFound(_) => code::FOLDER_NOT_FOUND,
            FolderError::AlreadyExists(_) => code::ALREADY_EXIST,
            FolderError::AccessDenied(_) | FolderError::HiddenPathRejected(_) => code::ACCESS_DENIED,
            FolderError::InvalidRequest(_) => code::INVALID_REQUEST,
            FolderError::Config(_) => code::UNKNOWN,
            FolderError::Fs(FsError::NotFound(_)) => code::FILE_NOT_FOUND,
            FolderError::Fs(FsError::AccessDenied(_)) => code::ACCESS_DENIED,
            FolderError::Fs(_) => code::UNKNOWN,
        }
    }
}

impl From<FsError> for FolderError {
    fn from(e: FsError) -> Self {
        match e {
            FsError::InvalidPath(p) => FolderError::InvalidPath(p),
            FsError::Pattern(e) => FolderError::Config(e.to_string()),
            other => FolderError::Fs(other),
        }
    }
}

impl From<folder_cache::CacheError> for FolderError {
    fn from(e: folder_cache::CacheError) -> Self {
        FolderError::Config(format!("cache: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_conversion() {
        let err: FolderError = FsError::InvalidPath("/../x".into()).into();
        assert!(matches!(err, FolderError::InvalidPath(_)));

        let err: FolderError = FsError::NotFound("a.txt".into()).into();
        assert!(matches!(err, FolderError::Fs(FsError::NotFound(_))));
        assert_eq!(err.code(), code::FILE_NOT_FOUND);
    }

    #[test]
    fn test_access_denied_class() {
        assert!(FolderError::HiddenPathRejected("/.git".into()).is_access_denied());
        assert!(FolderError::AccessDenied("x".into()).is_access_denied());
        assert!(!FolderError::FolderNotFound("/x".into()).is_access_denied());
        assert_eq!(FolderError::HiddenPathRejected("/.git".into()).code(), code::ACCESS_DENIED);
    }
}
