//! Connector-wide services shared by every request

use crate::acl::{AccessControl, Acl};
use crate::config::{CacheAdapter, FolderConfig};
use crate::thumbnail::{ThumbnailRepository, ThumbnailStore};
use crate::{FolderError, ResourceTypeRegistry};
use folder_cache::{CacheStore, MemoryCache, SqliteCache};
use folder_fs::NameValidator;
use std::sync::Arc;

/// Long-lived collaborators of the working-folder layer
pub struct FolderServices {
    /// Resource types and their backends
    pub registry: ResourceTypeRegistry,

    /// Permission masks
    pub acl: Arc<dyn AccessControl>,

    /// Derived artifacts (thumbnails)
    pub thumbnails: Arc<dyn ThumbnailRepository>,

    /// Key/value cache addressed by `resource type/logical path`
    pub cache: Arc<dyn CacheStore>,

    /// Name rules
    pub names: NameValidator,

    pub disallow_unsafe_characters: bool,
}

impl FolderServices {
    pub fn new(
        registry: ResourceTypeRegistry,
        acl: Arc<dyn AccessControl>,
        thumbnails: Arc<dyn ThumbnailRepository>,
        cache: Arc<dyn CacheStore>,
    ) -> Self {
        Self {
            registry,
            acl,
            thumbnails,
            cache,
            names: NameValidator::default(),
            disallow_unsafe_characters: false,
        }
    }

    pub fn with_names(mut self, names: NameValidator, disallow_unsafe_characters: bool) -> Self {
        self.names = names;
        self.disallow_unsafe_characters = disallow_unsafe_characters;
        self
    }

    /// Build the service graph described by `config`
    pub fn from_config(config: &FolderConfig) -> Result<Self, FolderError> {
        let registry = ResourceTypeRegistry::from_config(config)?;
        let acl = Arc::new(Acl::new(&config.acl));
        let thumbnails = Arc::new(ThumbnailStore::new(config.general.thumbnails_dir()));

        let cache: Arc<dyn CacheStore> = match config.cache.adapter {
            CacheAdapter::Memory => Arc::new(MemoryCache::new()),
            CacheAdapter::Sqlite => Arc::new(SqliteCache::open(&config.cache_path())?),
        };

        Ok(Self::new(registry, acl, thumbnails, cache)
            .with_names(config.names.clone(), config.general.disallow_unsafe_characters))
    }

    pub fn is_valid_folder_name(&self, name: &str) -> bool {
        self.names
            .is_valid_folder_name(name, self.disallow_unsafe_characters)
    }

    pub fn is_valid_file_name(&self, name: &str) -> bool {
        self.names.is_valid_file_name(name, self.disallow_unsafe_characters)
    }
}
