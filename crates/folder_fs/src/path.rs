//! LogicalPath - client-facing folder paths and physical path combination
//!
//! A logical path is what the client sees: always absolute (`/` is the root of a
//! resource type), slash separated, without `.` or `..` segments. Physical paths
//! are plain backend-relative strings produced by [`combine`].

use crate::{FsError, Result};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Serialize, Serializer};
use std::fmt;

/// Everything except the RFC 3986 unreserved set gets escaped
const URL_PART: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Characters never allowed inside a logical path segment
const FORBIDDEN_SEGMENT_CHARS: &[char] = &['\\', ':', '*', '?', '"', '<', '>', '|'];

/// A normalized, validated client path relative to a resource type root
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LogicalPath(String);

impl LogicalPath {
    /// The resource type root (`/`)
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Parse and normalize a raw client string
    pub fn parse(raw: &str) -> Result<Self> {
        normalize(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Parent folder, `None` for the root
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }

        match self.0.rfind('/') {
            Some(0) | None => Some(Self::root()),
            Some(idx) => Some(Self(self.0[..idx].to_string())),
        }
    }

    /// Last segment, `None` for the root
    pub fn name(&self) -> Option<&str> {
        if self.is_root() {
            None
        } else {
            self.0.rsplit('/').next()
        }
    }

    /// Append a single child segment
    pub fn child(&self, name: &str) -> Result<Self> {
        normalize(&combine(&[self.as_str(), name]))
    }

    /// Sibling with the same parent and a different last segment
    pub fn sibling(&self, name: &str) -> Result<Self> {
        let parent = self.parent().unwrap_or_else(Self::root);
        parent.child(name)
    }
}

impl fmt::Display for LogicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LogicalPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for LogicalPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Normalize a raw client folder string into a [`LogicalPath`]
///
/// Whitespace is trimmed, repeated separators collapse, `.` segments are dropped
/// and `..` segments are resolved lexically. Climbing above the root fails.
pub fn normalize(raw: &str) -> Result<LogicalPath> {
    let trimmed = raw.trim();
    let mut segments: Vec<&str> = Vec::new();

    for segment in trimmed.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(FsError::InvalidPath(format!(
                        "path escapes resource type root: {}",
                        raw
                    )));
                }
            }
            _ => {
                if !is_valid_segment(segment) {
                    return Err(FsError::InvalidPath(raw.to_string()));
                }
                segments.push(segment);
            }
        }
    }

    if segments.is_empty() {
        return Ok(LogicalPath::root());
    }

    Ok(LogicalPath(format!("/{}", segments.join("/"))))
}

/// Strict check that `path` is already a normalized logical path
pub fn is_valid(path: &str) -> bool {
    if path == "/" {
        return true;
    }

    match path.strip_prefix('/') {
        Some(rest) => rest
            .split('/')
            .all(|segment| !matches!(segment, "" | "." | "..") && is_valid_segment(segment)),
        None => false,
    }
}

/// Join path segments with single separators
///
/// A leading `/` on the first non-empty segment is kept, trailing separators are
/// dropped. Segments are never interpreted, so no `..` is ever introduced.
pub fn combine<S: AsRef<str>>(segments: &[S]) -> String {
    let mut parts: Vec<&str> = Vec::new();
    let mut absolute = None;

    for segment in segments {
        let segment = segment.as_ref();
        if absolute.is_none() && !segment.is_empty() {
            absolute = Some(segment.starts_with('/'));
        }
        parts.extend(segment.split('/').filter(|part| !part.is_empty()));
    }

    let joined = parts.join("/");
    if absolute == Some(true) {
        format!("/{}", joined)
    } else {
        joined
    }
}

/// Append a path to a URL prefix without touching the scheme separator
pub fn join_url(base: &str, path: &str) -> String {
    let path = path.trim_start_matches('/');
    if base.is_empty() {
        return format!("/{}", path);
    }
    format!("{}/{}", base.trim_end_matches('/'), path)
}

/// Percent-encode every segment of a slash separated path, keeping the slashes
pub fn encode_url_parts(path: &str) -> String {
    path.split('/')
        .map(|part| utf8_percent_encode(part, URL_PART).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Segments may not start or end with whitespace
fn is_valid_segment(segment: &str) -> bool {
    segment.trim() == segment
        && !segment
            .chars()
            .any(|c| c.is_control() || FORBIDDEN_SEGMENT_CHARS.contains(&c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_and_resolves() {
        assert_eq!(normalize("//sub/../pics/").unwrap().as_str(), "/pics");
        assert_eq!(normalize("  /a//b/./c/ ").unwrap().as_str(), "/a/b/c");
        assert_eq!(normalize("docs").unwrap().as_str(), "/docs");
    }

    #[test]
    fn test_normalize_empty_is_root() {
        assert!(normalize("").unwrap().is_root());
        assert!(normalize("   ").unwrap().is_root());
        assert!(normalize("///").unwrap().is_root());
        assert!(normalize("/a/..").unwrap().is_root());
    }

    #[test]
    fn test_normalize_rejects_escape() {
        assert!(matches!(normalize("/../etc"), Err(FsError::InvalidPath(_))));
        assert!(matches!(normalize("a/../../b"), Err(FsError::InvalidPath(_))));
    }

    #[test]
    fn test_normalize_rejects_forbidden_characters() {
        assert!(normalize("/a\\b").is_err());
        assert!(normalize("/a:b").is_err());
        assert!(normalize("/a\u{0007}b").is_err());
        assert!(normalize("/what?").is_err());
    }

    #[test]
    fn test_normalize_never_leaves_traversal() {
        for raw in ["/a/../b", "x/y/../../z", "/a/b/..", "..a/b", "/a/..b"] {
            let path = normalize(raw).unwrap();
            assert!(!path.as_str().split('/').any(|s| s == ".."), "{}", raw);
        }
    }

    #[test]
    fn test_normalize_idempotent_and_valid() {
        for raw in ["", "/", "//sub/../pics/", " a/b ", "/x/./y//", "/.hidden/f", "/a b/c"] {
            let once = normalize(raw).unwrap();
            let twice = normalize(once.as_str()).unwrap();
            assert_eq!(once, twice);
            assert!(is_valid(once.as_str()), "{}", once);
        }

        for raw in ["/a /", "/ /", "x/y /", "/ a/b", "/a/\tb"] {
            assert!(matches!(normalize(raw), Err(FsError::InvalidPath(_))), "{:?}", raw);
        }
    }

    #[test]
    fn test_is_valid() {
        assert!(is_valid("/"));
        assert!(is_valid("/pics/2024"));
        assert!(!is_valid(""));
        assert!(!is_valid("pics"));
        assert!(!is_valid("/pics/"));
        assert!(!is_valid("//pics"));
        assert!(!is_valid("/a/../b"));
        assert!(!is_valid("/a/./b"));
        assert!(!is_valid("/a "));
        assert!(!is_valid("/ /b"));
        assert!(is_valid("/a b"));
    }

    #[test]
    fn test_combine() {
        assert_eq!(combine(&["userfiles/Images", "/pics"]), "userfiles/Images/pics");
        assert_eq!(combine(&["userfiles/Images/", "/"]), "userfiles/Images");
        assert_eq!(combine(&["/base//", "//a", "b/"]), "/base/a/b");
        assert_eq!(combine(&["", "/docs", "a.txt"]), "/docs/a.txt");
        assert_eq!(combine::<&str>(&[]), "");
    }

    #[test]
    fn test_combine_idempotent_on_separators() {
        let once = combine(&["a", "b"]);
        assert_eq!(combine(&["a/", "/b"]), once);
        assert_eq!(combine(&["a///", "///b"]), once);
        assert_eq!(combine(&[once.as_str()]), once);
    }

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("http://cdn.test/files/", "/a/b.png"), "http://cdn.test/files/a/b.png");
        assert_eq!(join_url("/userfiles", "Images"), "/userfiles/Images");
        assert_eq!(join_url("", "x"), "/x");
    }

    #[test]
    fn test_encode_url_parts() {
        assert_eq!(encode_url_parts("userfiles/My Pics/a&b"), "userfiles/My%20Pics/a%26b");
        assert_eq!(encode_url_parts("/x/ż"), "/x/%C5%BC");
    }

    #[test]
    fn test_parent_name_sibling() {
        let path = normalize("/docs/reports").unwrap();
        assert_eq!(path.name(), Some("reports"));
        assert_eq!(path.parent().unwrap().as_str(), "/docs");
        assert_eq!(path.sibling("archive").unwrap().as_str(), "/docs/archive");

        let top = normalize("/docs").unwrap();
        assert!(top.parent().unwrap().is_root());
        assert_eq!(top.sibling("misc").unwrap().as_str(), "/misc");

        assert!(LogicalPath::root().parent().is_none());
        assert!(LogicalPath::root().name().is_none());
    }
}
