//! Resource types: named roots mapped onto a storage backend

use crate::config::{BackendAdapter, FolderConfig};
use crate::FolderError;
use folder_fs::{HiddenPolicy, LocalBackend, MemoryBackend, ResourceScope, StorageBackend};
use std::collections::HashMap;
use std::sync::Arc;

/// A client-visible namespace (`Files`, `Images`, ...)
pub struct ResourceType {
    name: String,
    directory: String,
    backend: Arc<dyn StorageBackend>,
}

impl ResourceType {
    pub fn new(name: &str, directory: &str, backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            name: name.to_string(),
            directory: directory.to_string(),
            backend,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Backend-relative root directory
    pub fn directory(&self) -> &str {
        &self.directory
    }

    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    pub fn scope(&self) -> ResourceScope<'_> {
        ResourceScope {
            name: &self.name,
            directory: &self.directory,
        }
    }
}

impl std::fmt::Debug for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceType")
            .field("name", &self.name)
            .field("directory", &self.directory)
            .finish_non_exhaustive()
    }
}

/// Resource types of one connector, in configuration order
#[derive(Default)]
pub struct ResourceTypeRegistry {
    types: Vec<Arc<ResourceType>>,
}

impl ResourceTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource type; a later registration with the same name wins
    pub fn register(&mut self, resource_type: ResourceType) {
        self.types.retain(|t| t.name() != resource_type.name());
        self.types.push(Arc::new(resource_type));
    }

    pub fn with(mut self, resource_type: ResourceType) -> Self {
        self.register(resource_type);
        self
    }

    pub fn get(&self, name: &str) -> Result<Arc<ResourceType>, FolderError> {
        self.types
            .iter()
            .find(|t| t.name() == name)
            .cloned()
            .ok_or_else(|| FolderError::UnknownResourceType(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(|t| t.name())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Build every configured backend and bind the resource types to them
    pub fn from_config(config: &FolderConfig) -> Result<Self, FolderError> {
        let mut backends: HashMap<&str, Arc<dyn StorageBackend>> = HashMap::new();

        for backend in &config.backends {
            let hidden = HiddenPolicy::new(&config.hidden.folders, &config.hidden.files)?;
            let built: Arc<dyn StorageBackend> = match backend.adapter {
                BackendAdapter::Local => {
                    let mut local = LocalBackend::new(&backend.root, hidden);
                    if let Some(url) = &backend.base_url {
                        local = local.with_base_url(url);
                    }
                    Arc::new(local)
                }
                BackendAdapter::Memory => {
                    let mut memory = MemoryBackend::new(hidden);
                    if let Some(url) = &backend.base_url {
                        memory = memory.with_base_url(url);
                    }
                    Arc::new(memory)
                }
            };

            tracing::debug!("Backend {} ({:?}) ready", backend.name, backend.adapter);
            backends.insert(backend.name.as_str(), built);
        }

        let mut registry = Self::new();
        for rt in &config.resource_types {
            let backend = backends.get(rt.backend.as_str()).ok_or_else(|| {
                FolderError::Config(format!(
                    "resource type {} uses unknown backend {}",
                    rt.name, rt.backend
                ))
            })?;
            registry.register(ResourceType::new(&rt.name, &rt.directory, Arc::clone(backend)));
        }

        tracing::info!("Registered {} resource types", registry.len());
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackendConfig, ResourceTypeConfig};

    #[test]
    fn test_lookup() {
        let backend: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new(HiddenPolicy::none()));
        let registry = ResourceTypeRegistry::new()
            .with(ResourceType::new("Files", "files", Arc::clone(&backend)))
            .with(ResourceType::new("Images", "images", backend));

        assert_eq!(registry.get("Images").unwrap().directory(), "images");
        assert!(matches!(
            registry.get("Video"),
            Err(FolderError::UnknownResourceType(name)) if name == "Video"
        ));
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["Files", "Images"]);
    }

    #[test]
    fn test_from_config_shares_backends() {
        let mut config = FolderConfig::default();
        config.backends = vec![BackendConfig {
            name: "mem".into(),
            adapter: BackendAdapter::Memory,
            base_url: Some("http://cdn.test/".into()),
            ..BackendConfig::default()
        }];
        config.resource_types = vec![
            ResourceTypeConfig { backend: "mem".into(), ..ResourceTypeConfig::new("Files", "files") },
            ResourceTypeConfig { backend: "mem".into(), ..ResourceTypeConfig::new("Images", "images") },
        ];

        let registry = ResourceTypeRegistry::from_config(&config).unwrap();
        let files = registry.get("Files").unwrap();
        let images = registry.get("Images").unwrap();
        assert!(Arc::ptr_eq(files.backend(), images.backend()));
        assert_eq!(files.backend().base_url(), Some("http://cdn.test/"));
        assert!(files.backend().is_hidden_folder(".git"));
    }

    #[test]
    fn test_from_config_unknown_backend() {
        let mut config = FolderConfig::default();
        config.resource_types = vec![ResourceTypeConfig {
            backend: "s3".into(),
            ..ResourceTypeConfig::default()
        }];
        assert!(matches!(
            ResourceTypeRegistry::from_config(&config),
            Err(FolderError::Config(_))
        ));
    }
}
