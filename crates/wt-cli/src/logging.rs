//! Tracing subscriber setup.
//!
//! Filter directives come from `WT_LOG` (for example `WT_LOG=wt_story=debug`)
//! and default to `warn`.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "WT_LOG";

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Log to stderr. Used by every line-mode command.
pub fn init_stderr() {
    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Log to a file while the UI owns the terminal. Without a file, logs are dropped.
///
/// The returned guard must live until shutdown so buffered lines are written.
pub fn init_file(path: Option<&Path>) -> Result<Option<WorkerGuard>, String> {
    let Some(path) = path else {
        return Ok(None);
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| format!("invalid log file: {}", path.display()))?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(Some(guard))
}
