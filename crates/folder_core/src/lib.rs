//! Folderwork Core
//!
//! This crate contains:
//! - Connector configuration
//! - Error types and client error payloads
//! - Resource types and their registry
//! - Access control
//! - Thumbnail store
//! - Request-scoped notification bus
//! - WorkingFolder, the folder a request operates on

pub mod config;
pub mod error;
pub mod resource_type;
pub mod acl;
pub mod thumbnail;
pub mod events;
pub mod response;
pub mod services;
pub mod working_folder;

pub use config::{
    FolderConfig, GeneralConfig, HiddenConfig, BackendConfig, BackendAdapter,
    ResourceTypeConfig, CacheConfig, CacheAdapter,
};
pub use error::FolderError;
pub use resource_type::{ResourceType, ResourceTypeRegistry};
pub use acl::{AccessControl, Acl, AclRule, Permission};
pub use thumbnail::{ThumbnailRepository, ThumbnailSize, ThumbnailStore};
pub use events::{
    Dispatch, FolderEvent, FolderEventKind, NotificationBus, Propagation, SubscriptionId, Verdict,
};
pub use response::Response;
pub use services::FolderServices;
pub use working_folder::{CreateDirOutcome, RenameOutcome, WorkingFolder};
