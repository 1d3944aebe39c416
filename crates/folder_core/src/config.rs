//! Connector configuration

use crate::acl::AclRule;
use directories::ProjectDirs;
use folder_fs::NameValidator;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main connector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FolderConfig {
    pub general: GeneralConfig,
    pub hidden: HiddenConfig,
    pub names: NameValidator,
    pub backends: Vec<BackendConfig>,
    pub resource_types: Vec<ResourceTypeConfig>,
    pub acl: Vec<AclRule>,
    pub cache: CacheConfig,
}

impl Default for FolderConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            hidden: HiddenConfig::default(),
            names: NameValidator::default(),
            backends: vec![BackendConfig::default()],
            resource_types: vec![
                ResourceTypeConfig::new("Files", "files"),
                ResourceTypeConfig::new("Images", "images"),
            ],
            acl: vec![AclRule::allow_everything()],
            cache: CacheConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Also reject the configurable unsafe characters in new names
    pub disallow_unsafe_characters: bool,
    /// Connector-private data: thumbnails, cache database
    pub private_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            disallow_unsafe_characters: false,
            private_dir: PathBuf::from("./.folderwork"),
        }
    }
}

impl GeneralConfig {
    pub fn thumbnails_dir(&self) -> PathBuf {
        self.private_dir.join("thumbs")
    }
}

/// Glob patterns of names the backends never expose
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HiddenConfig {
    pub folders: Vec<String>,
    pub files: Vec<String>,
}

impl Default for HiddenConfig {
    fn default() -> Self {
        Self {
            folders: vec![".*".into(), "CVS".into(), "__thumbs".into()],
            files: vec![".*".into()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendAdapter {
    #[serde(rename = "local")]
    Local,
    #[serde(rename = "memory")]
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub name: String,
    pub adapter: BackendAdapter,
    /// Root directory of a local backend
    pub root: PathBuf,
    pub base_url: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            adapter: BackendAdapter::Local,
            root: PathBuf::from("./userfiles"),
            base_url: Some("/userfiles/".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceTypeConfig {
    pub name: String,
    /// Backend-relative directory; empty means the backend root
    pub directory: String,
    pub backend: String,
}

impl ResourceTypeConfig {
    pub fn new(name: &str, directory: &str) -> Self {
        Self {
            name: name.to_string(),
            directory: directory.to_string(),
            backend: "default".to_string(),
        }
    }
}

impl Default for ResourceTypeConfig {
    fn default() -> Self {
        Self::new("Files", "files")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheAdapter {
    #[serde(rename = "memory")]
    Memory,
    #[serde(rename = "sqlite")]
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub adapter: CacheAdapter,
    /// Database file; defaults to `<private_dir>/cache/cache.db`
    pub path: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            adapter: CacheAdapter::Sqlite,
            path: None,
        }
    }
}

impl FolderConfig {
    /// Load configuration from the platform config file
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("Using default configuration");
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        tracing::info!("Configuration loaded from {:?}", path);
        Ok(config)
    }

    /// Save configuration to the platform config file
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        tracing::info!("Configuration saved to {:?}", path);
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("com", "Folderwork", "Folderwork")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("./config.toml"))
    }

    pub fn cache_path(&self) -> PathBuf {
        self.cache
            .path
            .clone()
            .unwrap_or_else(|| self.general.private_dir.join("cache").join("cache.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acl::Permission;
    use tempfile::TempDir;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: FolderConfig = toml::from_str(
            r#"
            [general]
            disallow_unsafe_characters = true

            [[backends]]
            name = "cdn"
            adapter = "memory"
            base_url = "https://cdn.example.com/files/"

            [[resource_types]]
            name = "Images"
            directory = "userfiles/Images"
            backend = "cdn"

            [[acl]]
            resource_type = "*"
            folder = "/"
            allow = ["folder_view", "file_view"]
            "#,
        )
        .unwrap();

        assert!(config.general.disallow_unsafe_characters);
        assert_eq!(config.general.private_dir, PathBuf::from("./.folderwork"));
        assert_eq!(config.backends[0].adapter, BackendAdapter::Memory);
        assert_eq!(config.resource_types.len(), 1);
        assert_eq!(config.resource_types[0].backend, "cdn");
        assert_eq!(config.acl[0].allow, vec![Permission::FolderView, Permission::FileView]);
        assert!(config.acl[0].deny.is_empty());
        assert_eq!(config.hidden.folders, HiddenConfig::default().folders);
        assert_eq!(config.names, NameValidator::default());
    }

    #[test]
    fn test_save_and_load_from() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("conf").join("config.toml");

        let mut config = FolderConfig::default();
        config.cache.adapter = CacheAdapter::Memory;
        config.save_to(&path).unwrap();

        let loaded = FolderConfig::load_from(&path).unwrap();
        assert_eq!(loaded.cache.adapter, CacheAdapter::Memory);
        assert_eq!(loaded.resource_types.len(), 2);
        assert_eq!(loaded.backends[0].name, "default");
    }

    #[test]
    fn test_cache_path_default() {
        let config = FolderConfig::default();
        assert_eq!(
            config.cache_path(),
            PathBuf::from("./.folderwork").join("cache").join("cache.db")
        );
    }
}
