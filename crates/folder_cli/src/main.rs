//! folderctl - run one working-folder command against a configured connector
//!
//! Every invocation is one request: the resource type and folder are resolved,
//! the command runs, and the JSON response is printed on stdout.

mod commands;

use clap::{Parser, Subcommand};
use folder_core::{FolderConfig, FolderServices, Response};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

/// Manage folders and files of a Folderwork connector.
#[derive(Parser, Debug)]
#[command(name = "folderctl", version)]
struct Cli {
    /// Configuration file (defaults to the platform config location)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Resource type the folder belongs to
    #[arg(short = 't', long = "type", global = true, default_value = "Files")]
    resource_type: String,

    /// Current folder, relative to the resource type root
    #[arg(short, long, global = true, default_value = "/")]
    folder: String,

    /// Leave `resourceType` and `currentFolder` out of the response
    #[arg(long, global = true)]
    omit_folder_info: bool,

    /// Log to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List sub-folders and files of the current folder
    #[command(visible_alias = "ls")]
    List,

    /// Create a sub-folder
    Mkdir { name: String },

    /// Rename the current folder
    Rename { new_name: String },

    /// Delete the current folder with everything below it
    Delete,

    /// Create a new file; fails when it already exists
    Write {
        name: String,
        /// Read content from this file instead of stdin
        #[arg(short, long)]
        source: Option<PathBuf>,
    },

    /// Create or overwrite a file
    Put {
        name: String,
        #[arg(short, long)]
        source: Option<PathBuf>,
    },

    /// Print a file
    Cat { name: String },

    /// Report whether a file exists
    Exists { name: String },

    /// Public URL of the current folder, or of a file in it
    Url { name: Option<String> },
}

impl Cli {
    fn request(&self) -> commands::Request {
        commands::Request {
            resource_type: self.resource_type.clone(),
            folder: self.folder.clone(),
            omit_folder_info: self.omit_folder_info,
        }
    }

    fn log_options(&self) -> folder_log::LogOptions {
        folder_log::LogOptions {
            console: self.verbose,
            default_filter: if self.verbose { "debug" } else { "info" }.to_string(),
            ..Default::default()
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logging failures must not block the command itself
    let _log_guard = match folder_log::init(cli.log_options()) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            None
        }
    };

    if let Err(e) = folder_log::cleanup_old_logs(&folder_log::log_dir(), 7) {
        tracing::warn!("Failed to cleanup old logs: {}", e);
    }

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("{:?}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<bool> {
    let config = match &cli.config {
        Some(path) => FolderConfig::load_from(path)?,
        None => FolderConfig::load()?,
    };
    let services = Arc::new(FolderServices::from_config(&config)?);

    tracing::debug!("{} {}:{} {:?}", env!("CARGO_PKG_NAME"), cli.resource_type, cli.folder, cli.command);
    let outcome = commands::execute(services, &cli.request(), &cli.command);

    print_response(&outcome.response)?;
    Ok(outcome.success)
}

fn print_response(response: &Response) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    match response {
        Response::Json(map) => {
            serde_json::to_writer_pretty(&mut stdout, map)?;
            writeln!(stdout)?;
        }
        Response::Binary(data) => stdout.write_all(data)?,
    }
    stdout.flush()?;
    Ok(())
}
