//! File and folder name validation

use serde::{Deserialize, Serialize};

/// Characters forbidden in every file and folder name
const FORBIDDEN_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Folder characters rejected when unsafe characters are disallowed
pub const DEFAULT_UNSAFE_FOLDER_CHARS: &[char] = &['.'];

/// File characters rejected when unsafe characters are disallowed
pub const DEFAULT_UNSAFE_FILE_CHARS: &[char] = &[';'];

/// Check a single name (no separators) against the syntactic rules
///
/// Rejects empty names, `.` and `..`, names ending with a dot, names containing
/// `..`, separators, control characters and the forbidden set. With
/// `disallow_unsafe` set, any character of `unsafe_chars` is rejected as well.
pub fn is_valid_name(name: &str, disallow_unsafe: bool, unsafe_chars: &[char]) -> bool {
    if name.is_empty() || name.ends_with('.') || name.contains("..") {
        return false;
    }

    for c in name.chars() {
        if FORBIDDEN_CHARS.contains(&c) || c.is_control() {
            return false;
        }
        if disallow_unsafe && unsafe_chars.contains(&c) {
            return false;
        }
    }

    true
}

/// Name rules for one connector, with separate unsafe sets for folders and files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NameValidator {
    pub unsafe_folder_chars: Vec<char>,
    pub unsafe_file_chars: Vec<char>,
}

impl Default for NameValidator {
    fn default() -> Self {
        Self {
            unsafe_folder_chars: DEFAULT_UNSAFE_FOLDER_CHARS.to_vec(),
            unsafe_file_chars: DEFAULT_UNSAFE_FILE_CHARS.to_vec(),
        }
    }
}

impl NameValidator {
    pub fn is_valid_folder_name(&self, name: &str, disallow_unsafe: bool) -> bool {
        is_valid_name(name, disallow_unsafe, &self.unsafe_folder_chars)
    }

    /// File names must also contain something besides whitespace
    pub fn is_valid_file_name(&self, name: &str, disallow_unsafe: bool) -> bool {
        !name.trim().is_empty() && is_valid_name(name, disallow_unsafe, &self.unsafe_file_chars)
    }
}
