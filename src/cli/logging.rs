//! Tracing setup. Logs go to a file so they never draw over the TUI.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Keep the returned guard alive until exit
/// or buffered lines are lost.
pub fn init_logging(log_file: &Path) -> Option<WorkerGuard> {
    let dir = log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = log_file.file_name()?;

    if let Err(e) = std::fs::create_dir_all(dir) {
        eprintln!("Failed to create log directory {}: {}", dir.display(), e);
        return None;
    }

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .compact(),
        )
        .try_init()
        .ok()?;

    Some(guard)
}
