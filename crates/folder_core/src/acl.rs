//! Access control: permission bits and the rule-list engine

use folder_fs::LogicalPath;
use serde::{Deserialize, Serialize};

/// Computes the permission mask of a folder
pub trait AccessControl: Send + Sync {
    fn computed_mask(&self, resource_type: &str, folder: &LogicalPath) -> u32;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    FolderView,
    FolderCreate,
    FolderRename,
    FolderDelete,
    FileView,
    FileCreate,
    FileRename,
    FileDelete,
    ImageResize,
    ImageResizeCustom,
}

impl Permission {
    pub const ALL: [Permission; 10] = [
        Permission::FolderView,
        Permission::FolderCreate,
        Permission::FolderRename,
        Permission::FolderDelete,
        Permission::FileView,
        Permission::FileCreate,
        Permission::FileRename,
        Permission::FileDelete,
        Permission::ImageResize,
        Permission::ImageResizeCustom,
    ];

    pub const fn bit(self) -> u32 {
        match self {
            Permission::FolderView => 1,
            Permission::FolderCreate => 2,
            Permission::FolderRename => 4,
            Permission::FolderDelete => 8,
            Permission::FileView => 16,
            Permission::FileCreate => 32,
            Permission::FileRename => 64,
            Permission::FileDelete => 128,
            Permission::ImageResize => 256,
            Permission::ImageResizeCustom => 512,
        }
    }

    pub fn mask(permissions: &[Permission]) -> u32 {
        permissions.iter().fold(0, |mask, p| mask | p.bit())
    }

    pub fn is_set(self, mask: u32) -> bool {
        mask & self.bit() != 0
    }
}

/// One ACL entry; `resource_type = "*"` applies to every resource type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AclRule {
    pub resource_type: String,
    pub folder: String,
    pub allow: Vec<Permission>,
    pub deny: Vec<Permission>,
}

impl Default for AclRule {
    fn default() -> Self {
        Self {
            resource_type: "*".to_string(),
            folder: "/".to_string(),
            allow: Vec::new(),
            deny: Vec::new(),
        }
    }
}

impl AclRule {
    pub fn allow_everything() -> Self {
        Self {
            allow: Permission::ALL.to_vec(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
struct CompiledRule {
    resource_type: String,
    folder: LogicalPath,
    allow: u32,
    deny: u32,
}

/// Rule-list ACL
///
/// The mask of a folder is built by walking from `/` down to the folder. At
/// every level the `*` rules apply first, then the rules of the resource type;
/// each one does `mask = (mask | allow) & !deny`.
#[derive(Debug, Clone, Default)]
pub struct Acl {
    rules: Vec<CompiledRule>,
}

impl Acl {
    pub fn new(rules: &[AclRule]) -> Self {
        let rules = rules
            .iter()
            .filter_map(|rule| match folder_fs::normalize(&rule.folder) {
                Ok(folder) => Some(CompiledRule {
                    resource_type: rule.resource_type.clone(),
                    folder,
                    allow: Permission::mask(&rule.allow),
                    deny: Permission::mask(&rule.deny),
                }),
                Err(e) => {
                    tracing::warn!("Ignoring ACL rule for {:?}: {}", rule.folder, e);
                    None
                }
            })
            .collect();

        Self { rules }
    }

    pub fn allow_all() -> Self {
        Self::new(&[AclRule::allow_everything()])
    }

    pub fn is_allowed(&self, resource_type: &str, folder: &LogicalPath, permission: Permission) -> bool {
        permission.is_set(self.computed_mask(resource_type, folder))
    }

    fn apply_level(&self, mask: u32, resource_type: &str, level: &LogicalPath) -> u32 {
        let wildcard = self
            .rules
            .iter()
            .filter(|r| r.resource_type == "*" && &r.folder == level);
        let specific = self
            .rules
            .iter()
            .filter(|r| r.resource_type == resource_type && &r.folder == level);

        wildcard
            .chain(specific)
            .fold(mask, |mask, rule| (mask | rule.allow) & !rule.deny)
    }
}

impl AccessControl for Acl {
    fn computed_mask(&self, resource_type: &str, folder: &LogicalPath) -> u32 {
        let mut levels = vec![folder.clone()];
        let mut current = folder.clone();
        while let Some(parent) = current.parent() {
            levels.push(parent.clone());
            current = parent;
        }

        levels
            .iter()
            .rev()
            .fold(0, |mask, level| self.apply_level(mask, resource_type, level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(raw: &str) -> LogicalPath {
        folder_fs::normalize(raw).unwrap()
    }

    #[test]
    fn test_permission_bits() {
        let all = Permission::mask(&Permission::ALL);
        assert_eq!(all, 1023);
        assert_eq!(Permission::mask(&[Permission::FolderView, Permission::FileView]), 17);
        assert!(Permission::FolderDelete.is_set(8));
        assert!(!Permission::FolderDelete.is_set(7));
    }

    #[test]
    fn test_inherited_mask() {
        let acl = Acl::new(&[
            AclRule {
                allow: vec![Permission::FolderView, Permission::FolderCreate, Permission::FileView],
                ..AclRule::default()
            },
            AclRule {
                folder: "/private".into(),
                deny: vec![Permission::FolderCreate],
                ..AclRule::default()
            },
            AclRule {
                resource_type: "Images".into(),
                folder: "/private".into(),
                allow: vec![Permission::FolderCreate],
                ..AclRule::default()
            },
        ]);

        assert_eq!(acl.computed_mask("Files", &path("/")), 19);
        assert_eq!(acl.computed_mask("Files", &path("/private/sub")), 17);
        assert_eq!(acl.computed_mask("Images", &path("/private/sub")), 19);
        assert!(!acl.is_allowed("Files", &path("/private"), Permission::FolderCreate));
    }

    #[test]
    fn test_no_rules_no_access() {
        let acl = Acl::default();
        assert_eq!(acl.computed_mask("Files", &path("/a")), 0);
        assert_eq!(Acl::allow_all().computed_mask("Files", &path("/a/b")), 1023);
    }

    #[test]
    fn test_invalid_rule_folder_is_skipped() {
        let acl = Acl::new(&[
            AclRule {
                folder: "/../x".into(),
                allow: vec![Permission::FolderView],
                ..AclRule::default()
            },
        ]);
        assert_eq!(acl.computed_mask("Files", &LogicalPath::root()), 0);
    }
}
