//! Hidden file and folder patterns

use crate::Result;
use regex::Regex;

/// Default hidden folder patterns
const DEFAULT_HIDDEN_FOLDERS: &[&str] = &[".*", "CVS", "__thumbs"];

/// Default hidden file patterns
const DEFAULT_HIDDEN_FILES: &[&str] = &[".*"];

/// Names a backend never exposes and never lets clients address
///
/// Patterns are shell-like: `*` matches any run of characters, `?` a single one.
#[derive(Debug, Clone)]
pub struct HiddenPolicy {
    folders: Vec<Regex>,
    files: Vec<Regex>,
}

impl HiddenPolicy {
    pub fn new<S: AsRef<str>>(folders: &[S], files: &[S]) -> Result<Self> {
        Ok(Self {
            folders: compile_patterns(folders)?,
            files: compile_patterns(files)?,
        })
    }

    /// Policy that hides nothing
    pub fn none() -> Self {
        Self {
            folders: Vec::new(),
            files: Vec::new(),
        }
    }

    pub fn is_hidden_folder(&self, name: &str) -> bool {
        self.folders.iter().any(|re| re.is_match(name))
    }

    pub fn is_hidden_file(&self, name: &str) -> bool {
        self.files.iter().any(|re| re.is_match(name))
    }

    /// A path is hidden when any of its folder segments is hidden
    pub fn is_hidden_path(&self, path: &str) -> bool {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .any(|segment| self.is_hidden_folder(segment))
    }
}

impl Default for HiddenPolicy {
    fn default() -> Self {
        // Built-in patterns are plain literals and wildcards and always compile
        Self::new(DEFAULT_HIDDEN_FOLDERS, DEFAULT_HIDDEN_FILES).unwrap_or_else(|_| Self::none())
    }
}

fn compile_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| {
            let escaped = regex::escape(pattern.as_ref())
                .replace(r"\*", ".*")
                .replace(r"\?", ".");
            Ok(Regex::new(&format!("^{}$", escaped))?)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_patterns() {
        let policy = HiddenPolicy::default();
        assert!(policy.is_hidden_folder(".git"));
        assert!(policy.is_hidden_folder("CVS"));
        assert!(policy.is_hidden_folder("__thumbs"));
        assert!(!policy.is_hidden_folder("pics"));
        assert!(policy.is_hidden_file(".htaccess"));
        assert!(!policy.is_hidden_file("a.txt"));
    }

    #[test]
    fn test_hidden_path() {
        let policy = HiddenPolicy::default();
        assert!(policy.is_hidden_path("/pics/.cache/x"));
        assert!(policy.is_hidden_path("/CVS"));
        assert!(!policy.is_hidden_path("/pics/2024"));
        assert!(!policy.is_hidden_path("/"));
    }

    #[test]
    fn test_wildcards_are_anchored() {
        let policy = HiddenPolicy::new(&["tmp?", "*.bak"], &["*~"]).unwrap();
        assert!(policy.is_hidden_folder("tmp1"));
        assert!(!policy.is_hidden_folder("tmp12"));
        assert!(policy.is_hidden_folder("old.bak"));
        assert!(!policy.is_hidden_folder("old.bak.d"));
        assert!(policy.is_hidden_file("notes~"));
    }

    #[test]
    fn test_none_hides_nothing() {
        let policy = HiddenPolicy::none();
        assert!(!policy.is_hidden_folder(".git"));
        assert!(!policy.is_hidden_path("/.git"));
    }
}
