//! Folderwork Logging & Observability Module
//!
//! Provides structured logging, panic handling, crash reports, and deadlock detection.

mod panic_hook;
mod logging;

pub use panic_hook::init_panic_hook;
pub use logging::{init_logging, cleanup_old_logs, LogGuard, LogOptions};

use std::path::PathBuf;
use directories::ProjectDirs;

/// Get the default log directory
pub fn log_dir() -> PathBuf {
    ProjectDirs::from("com", "Folderwork", "Folderwork")
        .map(|dirs| dirs.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"))
}

/// Initialize all observability features
///
/// The returned guard flushes the log file when dropped; keep it alive for the
/// lifetime of the process.
pub fn init(options: LogOptions) -> anyhow::Result<LogGuard> {
    let guard = init_logging(&options)?;
    init_panic_hook();

    #[cfg(debug_assertions)]
    init_deadlock_detector();

    Ok(guard)
}

/// Poll parking_lot for deadlocks among the shared backend and cache locks
#[cfg(debug_assertions)]
fn init_deadlock_detector() {
    use std::thread;
    use std::time::Duration;

    let spawned = thread::Builder::new()
        .name("deadlock-detector".into())
        .spawn(|| loop {
            thread::sleep(Duration::from_secs(10));
            for (i, threads) in parking_lot::deadlock::check_deadlock().iter().enumerate() {
                tracing::error!("Deadlock #{} involves {} threads", i, threads.len());
                for t in threads {
                    tracing::error!("Thread Id {:#?}\n{:#?}", t.thread_id(), t.backtrace());
                }
            }
        });

    if let Err(e) = spawned {
        tracing::warn!("Deadlock detector not started: {}", e);
    }
}
