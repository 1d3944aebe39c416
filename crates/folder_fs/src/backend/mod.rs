//! Storage backend contract and the bundled implementations
//!
//! Backends address everything by physical path: a slash separated string
//! relative to the backend root, usually `combine(resource type directory,
//! logical path, name)`. Mutators report failure with `false` only; richer error
//! detail stays inside the backend and its logs.

mod local;
mod memory;

pub use local::LocalBackend;
pub use memory::MemoryBackend;

use crate::{combine, encode_url_parts, join_url, HiddenPolicy, LogicalPath, Result};
use serde::Serialize;
use std::io::Read;

/// The resource type a listing is performed for
#[derive(Debug, Clone, Copy)]
pub struct ResourceScope<'a> {
    pub name: &'a str,
    /// Backend-relative directory of the resource type root
    pub directory: &'a str,
}

impl ResourceScope<'_> {
    /// Physical path of a logical folder inside this resource type
    pub fn physical_path(&self, folder: &LogicalPath) -> String {
        combine(&[self.directory, folder.as_str()])
    }
}

/// Sub-folder listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    pub name: String,
    pub has_children: bool,
}

/// File listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub name: String,
    pub size: u64,
    /// Last modified timestamp (Unix epoch seconds)
    pub modified: Option<i64>,
}

/// Storage provider behind one or more resource types
pub trait StorageBackend: Send + Sync {
    fn has_directory(&self, path: &str) -> bool;

    /// Create a directory, including missing parents
    fn create_dir(&self, path: &str) -> bool;

    /// Rename a file or directory; fails when `to` exists
    fn rename(&self, from: &str, to: &str) -> bool;

    /// Delete a directory recursively
    fn delete_dir(&self, path: &str) -> bool;

    /// Whether any file or directory exists at `path`
    fn has(&self, path: &str) -> bool;

    /// Create or overwrite a file from memory
    fn write(&self, path: &str, data: &[u8]) -> bool;

    /// Create a file from a stream; fails when it already exists
    fn write_stream(&self, path: &str, reader: &mut dyn Read) -> bool;

    /// Create or overwrite a file from a stream
    fn put_stream(&self, path: &str, reader: &mut dyn Read) -> bool;

    fn read(&self, path: &str) -> Result<Vec<u8>>;

    fn read_stream(&self, path: &str) -> Result<Box<dyn Read + Send>>;

    /// Visible sub-folders of a logical folder
    fn directories(&self, scope: ResourceScope<'_>, folder: &LogicalPath) -> Result<Vec<DirectoryEntry>>;

    /// Visible files of a logical folder
    fn files(&self, scope: ResourceScope<'_>, folder: &LogicalPath) -> Result<Vec<FileEntry>>;

    fn hidden_policy(&self) -> &HiddenPolicy;

    /// Public URL prefix, if files are directly reachable
    fn base_url(&self) -> Option<&str>;

    fn is_hidden_path(&self, path: &str) -> bool {
        self.hidden_policy().is_hidden_path(path)
    }

    fn is_hidden_folder(&self, name: &str) -> bool {
        self.hidden_policy().is_hidden_folder(name)
    }

    fn is_hidden_file(&self, name: &str) -> bool {
        self.hidden_policy().is_hidden_file(name)
    }

    fn file_url(&self, path: &str) -> Option<String> {
        self.base_url()
            .map(|base| join_url(base, &encode_url_parts(path)))
    }
}

/// Split a physical path into clean segments, refusing traversal
pub(crate) fn physical_segments(path: &str) -> Option<Vec<&str>> {
    let mut segments = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => return None,
            _ => segments.push(segment),
        }
    }
    Some(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_physical_segments() {
        assert_eq!(physical_segments("/a//b/./c").unwrap(), vec!["a", "b", "c"]);
        assert!(physical_segments("a/../b").is_none());
        assert!(physical_segments("").unwrap().is_empty());
    }

    #[test]
    fn test_scope_physical_path() {
        let scope = ResourceScope { name: "Images", directory: "userfiles/Images" };
        let folder = crate::normalize("/pics").unwrap();
        assert_eq!(scope.physical_path(&folder), "userfiles/Images/pics");
        assert_eq!(scope.physical_path(&LogicalPath::root()), "userfiles/Images");
    }

    #[test]
    fn test_default_file_url() {
        let backend = MemoryBackend::new(HiddenPolicy::none()).with_base_url("http://cdn.test/files/");
        assert_eq!(
            backend.file_url("Images/My Pics/a b.png").as_deref(),
            Some("http://cdn.test/files/Images/My%20Pics/a%20b.png")
        );

        let no_url = MemoryBackend::new(HiddenPolicy::none());
        assert!(no_url.file_url("x").is_none());
    }
}
