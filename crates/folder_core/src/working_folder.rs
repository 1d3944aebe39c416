//! WorkingFolder - the folder a request operates on
//!
//! Binds a resource type and a client folder path to the backend behind that
//! resource type. All folder-level commands go through here so that path
//! resolution, name checks, hidden-path rejection, observers, thumbnails and
//! cache stay consistent with each other.

use crate::events::{FolderEventKind, NotificationBus, Propagation, SubscriptionId};
use crate::{FolderError, FolderServices, ResourceType, Response};
use folder_fs::{combine, encode_url_parts, join_url, DirectoryEntry, FileEntry, LogicalPath, StorageBackend};
use serde_json::{json, Value};
use std::cell::{Cell, OnceCell};
use std::io::Read;
use std::rc::Rc;
use std::sync::Arc;

pub type Result<T> = std::result::Result<T, FolderError>;

/// Outcome of [`WorkingFolder::create_dir`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateDirOutcome {
    /// Name of the created folder, after observer overrides
    pub name: String,
    /// An observer took over and no backend call was made
    pub handled_by_observer: bool,
}

/// Outcome of [`WorkingFolder::rename`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameOutcome {
    pub new_name: String,
    pub new_path: LogicalPath,
    pub handled_by_observer: bool,
}

/// Request-scoped view of one folder
pub struct WorkingFolder {
    services: Arc<FolderServices>,
    bus: Rc<NotificationBus>,
    resource_type: Arc<ResourceType>,
    client_current_folder: LogicalPath,
    /// Physical path: `combine(directory, client_current_folder)`
    path: String,
    acl_mask: OnceCell<u32>,
    response_subscription: Cell<Option<SubscriptionId>>,
}

impl WorkingFolder {
    /// Resolve `current_folder` inside `resource_type` and validate it
    pub fn open(
        services: Arc<FolderServices>,
        bus: Rc<NotificationBus>,
        resource_type: &str,
        current_folder: &str,
    ) -> Result<Rc<Self>> {
        let resource_type = services.registry.get(resource_type)?;
        let client_current_folder = folder_fs::normalize(current_folder)?;
        let path = combine(&[resource_type.directory(), client_current_folder.as_str()]);
        let backend = resource_type.backend();

        tracing::debug!(
            "Working folder {}:{} -> {:?}",
            resource_type.name(),
            client_current_folder,
            path
        );

        if backend.is_hidden_path(client_current_folder.as_str()) {
            return Err(FolderError::HiddenPathRejected(client_current_folder.to_string()));
        }

        // A resource type without its own directory shares the backend root
        if !resource_type.directory().is_empty() && !backend.has_directory(&path) {
            if !client_current_folder.is_root() {
                return Err(FolderError::FolderNotFound(client_current_folder.to_string()));
            }

            backend.create_dir(resource_type.directory());
            if !backend.has_directory(resource_type.directory()) {
                return Err(FolderError::AccessDenied(format!(
                    "cannot create resource type directory {:?}",
                    resource_type.directory()
                )));
            }
            tracing::info!("Created resource type directory: {}", resource_type.directory());
        }

        let folder = Rc::new(Self {
            services,
            bus: Rc::clone(&bus),
            resource_type,
            client_current_folder,
            path,
            acl_mask: OnceCell::new(),
            response_subscription: Cell::new(None),
        });

        let weak = Rc::downgrade(&folder);
        let id = bus.subscribe_response(move |response| {
            if let Some(folder) = weak.upgrade() {
                folder.add_current_folder_info(response);
            }
            Propagation::Continue
        });
        folder.response_subscription.set(Some(id));

        Ok(folder)
    }

    pub fn resource_type(&self) -> &Arc<ResourceType> {
        &self.resource_type
    }

    pub fn resource_type_name(&self) -> &str {
        self.resource_type.name()
    }

    pub fn client_current_folder(&self) -> &LogicalPath {
        &self.client_current_folder
    }

    /// Physical path of this folder on the backend
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        self.resource_type.backend()
    }

    pub fn services(&self) -> &Arc<FolderServices> {
        &self.services
    }

    /// Permission mask of this folder, computed on first use
    pub fn acl_mask(&self) -> u32 {
        *self.acl_mask.get_or_init(|| {
            self.services
                .acl
                .computed_mask(self.resource_type.name(), &self.client_current_folder)
        })
    }

    pub fn list_directories(&self) -> Result<Vec<DirectoryEntry>> {
        Ok(self
            .backend()
            .directories(self.resource_type.scope(), &self.client_current_folder)?)
    }

    pub fn list_files(&self) -> Result<Vec<FileEntry>> {
        Ok(self
            .backend()
            .files(self.resource_type.scope(), &self.client_current_folder)?)
    }

    /// Public URL of a file in this folder, if the backend serves files directly
    pub fn file_url(&self, file_name: &str) -> Option<String> {
        self.backend().file_url(&self.file_path(file_name))
    }

    /// Public URL of this folder
    pub fn url(&self) -> Option<String> {
        self.backend()
            .base_url()
            .map(|base| join_url(base, &encode_url_parts(&self.path)))
    }

    fn file_path(&self, file_name: &str) -> String {
        combine(&[self.path.as_str(), file_name])
    }

    fn sibling_path(&self, name: &str) -> String {
        let parent = self
            .client_current_folder
            .parent()
            .unwrap_or_else(LogicalPath::root);
        combine(&[self.resource_type.directory(), parent.as_str(), name])
    }

    fn cache_key(&self, folder: &LogicalPath) -> String {
        combine(&[self.resource_type.name(), folder.as_str()])
    }

    fn check_folder_name(&self, name: &str) -> Result<()> {
        if !self.services.is_valid_folder_name(name) || self.backend().is_hidden_folder(name) {
            return Err(FolderError::InvalidName(name.to_string()));
        }
        Ok(())
    }

    /// Create a sub-folder
    pub fn create_dir(&self, dirname: &str) -> Result<CreateDirOutcome> {
        self.check_folder_name(dirname)?;

        if self.backend().has_directory(&self.file_path(dirname)) {
            return Err(FolderError::AlreadyExists(dirname.to_string()));
        }

        let dispatch = self
            .bus
            .dispatch_folder(FolderEventKind::CreateFolder, self, dirname);

        if dispatch.stopped {
            return Ok(CreateDirOutcome {
                name: dispatch.name,
                handled_by_observer: true,
            });
        }

        let name = dispatch.name;
        let dir_path = self.file_path(&name);
        if name != dirname {
            self.check_folder_name(&name)?;
            if self.backend().has_directory(&dir_path) {
                return Err(FolderError::AlreadyExists(name));
            }
        }

        if !self.backend().create_dir(&dir_path) {
            return Err(FolderError::AccessDenied(format!("cannot create folder {}", name)));
        }

        tracing::info!("Created directory: {}", dir_path);
        Ok(CreateDirOutcome {
            name,
            handled_by_observer: false,
        })
    }

    /// Create or overwrite a file in this folder
    pub fn write(&self, file_name: &str, data: &[u8]) -> bool {
        self.backend().write(&self.file_path(file_name), data)
    }

    /// Create a file from a stream; fails when the file exists
    pub fn write_stream(&self, file_name: &str, reader: &mut dyn Read) -> bool {
        self.backend().write_stream(&self.file_path(file_name), reader)
    }

    /// Create or overwrite a file from a stream
    pub fn put_stream(&self, file_name: &str, reader: &mut dyn Read) -> bool {
        self.backend().put_stream(&self.file_path(file_name), reader)
    }

    pub fn read(&self, file_name: &str) -> Result<Vec<u8>> {
        Ok(self.backend().read(&self.file_path(file_name))?)
    }

    pub fn read_stream(&self, file_name: &str) -> Result<Box<dyn Read + Send>> {
        Ok(self.backend().read_stream(&self.file_path(file_name))?)
    }

    /// Whether a visible, validly named file exists in this folder
    pub fn contains_file(&self, file_name: &str) -> bool {
        if !self.services.is_valid_file_name(file_name) || self.backend().is_hidden_file(file_name) {
            return false;
        }
        self.backend().has(&self.file_path(file_name))
    }

    fn delete_thumbnails(&self, folder: &LogicalPath) {
        if let Err(e) = self
            .services
            .thumbnails
            .delete_thumbnails(&self.resource_type, folder)
        {
            tracing::warn!("Failed to delete thumbnails of {}: {}", folder, e);
        }
    }

    /// Delete this folder with everything below it
    pub fn delete(&self) -> Result<bool> {
        if self.client_current_folder.is_root() {
            return Err(FolderError::InvalidRequest(
                "cannot delete the resource type root".to_string(),
            ));
        }

        self.delete_thumbnails(&self.client_current_folder);

        let key = self.cache_key(&self.client_current_folder);
        if let Err(e) = self.services.cache.delete_by_prefix(&key) {
            tracing::warn!("Failed to clear cache under {}: {}", key, e);
        }

        let deleted = self.backend().delete_dir(&self.path);
        if deleted {
            tracing::info!("Deleted directory: {}", self.path);
        }
        Ok(deleted)
    }

    /// Rename this folder within its parent
    pub fn rename(&self, new_name: &str) -> Result<RenameOutcome> {
        if self.client_current_folder.is_root() {
            return Err(FolderError::InvalidRequest(
                "cannot rename the resource type root".to_string(),
            ));
        }

        self.check_folder_name(new_name)?;

        if self.backend().has(&self.sibling_path(new_name)) {
            return Err(FolderError::AlreadyExists(new_name.to_string()));
        }

        let dispatch = self
            .bus
            .dispatch_folder(FolderEventKind::RenameFolder, self, new_name);
        let name = dispatch.name;

        if name != new_name && !dispatch.stopped {
            self.check_folder_name(&name)?;
            if self.backend().has(&self.sibling_path(&name)) {
                return Err(FolderError::AlreadyExists(name));
            }
        }

        // A stopped rename belongs to the observer, whatever name it settled on
        if dispatch.stopped {
            let new_path = self
                .client_current_folder
                .sibling(&name)
                .unwrap_or_else(|_| self.client_current_folder.clone());
            return Ok(RenameOutcome {
                new_name: name,
                new_path,
                handled_by_observer: true,
            });
        }

        let new_path = self
            .client_current_folder
            .sibling(&name)
            .map_err(|_| FolderError::InvalidName(name.clone()))?;

        let new_backend_path = self.sibling_path(&name);
        if !self.backend().rename(&self.path, &new_backend_path) {
            return Err(FolderError::AccessDenied(format!(
                "cannot rename {} to {}",
                self.client_current_folder, name
            )));
        }
        tracing::info!("Renamed directory: {} -> {}", self.path, new_backend_path);

        self.delete_thumbnails(&self.client_current_folder);

        let (old_key, new_key) = (
            self.cache_key(&self.client_current_folder),
            self.cache_key(&new_path),
        );
        if let Err(e) = self.services.cache.change_prefix(&old_key, &new_key) {
            tracing::warn!("Failed to move cache entries {} -> {}: {}", old_key, new_key, e);
        }

        Ok(RenameOutcome {
            new_name: name,
            new_path,
            handled_by_observer: false,
        })
    }

    /// Merge `resourceType` and `currentFolder` into a JSON response
    pub fn add_current_folder_info(&self, response: &mut Response) {
        let Some(map) = response.as_json_mut() else {
            return;
        };

        let mut current_folder = json!({
            "path": self.client_current_folder.as_str(),
            "acl": self.acl_mask(),
        });
        if let (Some(url), Some(obj)) = (self.url(), current_folder.as_object_mut()) {
            obj.insert("url".to_string(), Value::String(url));
        }

        map.insert(
            "resourceType".to_string(),
            Value::String(self.resource_type.name().to_string()),
        );
        map.insert("currentFolder".to_string(), current_folder);
    }

    /// Stop decorating this request's response with folder info
    pub fn omit_response_info(&self) {
        if let Some(id) = self.response_subscription.take() {
            self.bus.unsubscribe(id);
        }
    }
}

impl Drop for WorkingFolder {
    fn drop(&mut self) {
        self.omit_response_info();
    }
}

impl std::fmt::Debug for WorkingFolder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkingFolder")
            .field("resource_type", &self.resource_type.name())
            .field("client_current_folder", &self.client_current_folder)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
