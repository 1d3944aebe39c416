//! Command execution: one request against one working folder

use crate::Command;
use folder_core::{FolderError, FolderServices, NotificationBus, Permission, Response, WorkingFolder};
use folder_fs::FsError;
use serde_json::json;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

/// Request parameters shared by every command
#[derive(Debug, Clone)]
pub struct Request {
    pub resource_type: String,
    pub folder: String,
    pub omit_folder_info: bool,
}

#[derive(Debug)]
pub struct Outcome {
    pub response: Response,
    pub success: bool,
}

impl Outcome {
    fn failed(err: FolderError) -> Self {
        tracing::warn!("Request failed: {}", err);
        Self {
            response: err.to_response(),
            success: false,
        }
    }
}

/// Run `command` in a fresh request scope
pub fn execute(services: Arc<FolderServices>, request: &Request, command: &Command) -> Outcome {
    let bus = Rc::new(NotificationBus::new());

    let folder = match WorkingFolder::open(services, Rc::clone(&bus), &request.resource_type, &request.folder) {
        Ok(folder) => folder,
        Err(e) => return Outcome::failed(e),
    };

    if request.omit_folder_info {
        folder.omit_response_info();
    }

    let mut response = match run_command(&folder, command) {
        Ok(response) => response,
        Err(e) => return Outcome::failed(e),
    };

    bus.dispatch_response(&mut response);
    Outcome {
        response,
        success: true,
    }
}

fn require(folder: &WorkingFolder, permission: Permission) -> Result<(), FolderError> {
    if permission.is_set(folder.acl_mask()) {
        Ok(())
    } else {
        Err(FolderError::AccessDenied(format!(
            "{:?} not allowed in {}",
            permission,
            folder.client_current_folder()
        )))
    }
}

fn open_source(source: Option<&Path>) -> Result<Box<dyn Read>, FolderError> {
    match source {
        Some(path) => Ok(Box::new(File::open(path).map_err(FsError::from)?)),
        None => Ok(Box::new(std::io::stdin())),
    }
}

fn run_command(folder: &WorkingFolder, command: &Command) -> Result<Response, FolderError> {
    match command {
        Command::List => {
            require(folder, Permission::FolderView)?;
            let folders = folder.list_directories()?;
            let files = if Permission::FileView.is_set(folder.acl_mask()) {
                folder.list_files()?
            } else {
                Vec::new()
            };
            Ok(Response::json(json!({ "folders": folders, "files": files })))
        }

        Command::Mkdir { name } => {
            require(folder, Permission::FolderCreate)?;
            let outcome = folder.create_dir(name)?;
            Ok(Response::json(json!({
                "newFolder": outcome.name,
                "created": 1,
                "handledByObserver": outcome.handled_by_observer,
            })))
        }

        Command::Rename { new_name } => {
            require(folder, Permission::FolderRename)?;
            let outcome = folder.rename(new_name)?;
            Ok(Response::json(json!({
                "newName": outcome.new_name,
                "newPath": outcome.new_path,
                "renamed": 1,
            })))
        }

        Command::Delete => {
            require(folder, Permission::FolderDelete)?;
            let deleted = folder.delete()?;
            Ok(Response::json(json!({ "deleted": u8::from(deleted) })))
        }

        Command::Write { name, source } | Command::Put { name, source } => {
            require(folder, Permission::FileCreate)?;
            if !folder.services().is_valid_file_name(name) || folder.backend().is_hidden_file(name) {
                return Err(FolderError::InvalidName(name.clone()));
            }

            let mut reader = open_source(source.as_deref())?;
            let stored = match command {
                Command::Write { .. } => folder.write_stream(name, &mut reader),
                _ => folder.put_stream(name, &mut reader),
            };

            if !stored {
                return Err(FolderError::AccessDenied(format!("cannot write {}", name)));
            }
            Ok(Response::json(json!({ "fileName": name, "uploaded": 1 })))
        }

        Command::Cat { name } => {
            require(folder, Permission::FileView)?;
            if !folder.contains_file(name) {
                return Err(FsError::NotFound(name.clone()).into());
            }
            Ok(Response::Binary(folder.read(name)?))
        }

        Command::Exists { name } => {
            require(folder, Permission::FileView)?;
            Ok(Response::json(json!({
                "fileName": name,
                "exists": folder.contains_file(name),
            })))
        }

        Command::Url { name } => {
            require(folder, Permission::FileView)?;
            let url = match name {
                Some(name) => folder.file_url(name),
                None => folder.url(),
            };
            Ok(Response::json(json!({ "url": url })))
        }
    }
}
