//! Console logging plus optional rotating JSON log files.
//!
//! # Configuration
//!
//! - `MOH_FILE_LOGGING`: "true" or "1" turns on file output
//! - `MOH_LOG_DIR`: log directory (defaults to `{asset_dir}/logs`)
//! - `MOH_LOG_MAX_FILES`: number of daily files to keep (default: 7)
//!
//! File lines are JSON objects:
//! ```json
//! {"timestamp":"2026-03-02T10:30:00Z","level":"INFO","target":"server","fields":{"message":"..."}}
//! ```

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};
use utils::assets::log_dir;

const LOG_FILE_PREFIX: &str = "mirror-of-heart.log";
const DEFAULT_MAX_FILES: usize = 7;

#[derive(Debug, Clone)]
pub struct FileLoggingConfig {
    pub enabled: bool,
    pub log_dir: PathBuf,
    /// Number of daily log files to retain.
    pub max_files: usize,
}

impl Default for FileLoggingConfig {
    fn default() -> Self {
        let enabled = std::env::var("MOH_FILE_LOGGING")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let log_dir = std::env::var("MOH_LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| log_dir());

        let max_files = std::env::var("MOH_LOG_MAX_FILES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_FILES);

        Self {
            enabled,
            log_dir,
            max_files,
        }
    }
}

/// Filter directive: `warn` for dependencies, `log_level` for our crates.
fn filter_directive(log_level: &str) -> String {
    format!(
        "warn,server={level},services={level},db={level},utils={level},tower_http={level}",
        level = log_level
    )
}

fn build_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_new(filter_directive(log_level)).unwrap_or_else(|e| {
        eprintln!("Invalid log level {log_level:?} ({e}), falling back to info");
        EnvFilter::new(filter_directive("info"))
    })
}

/// Install the global subscriber.
///
/// Hold the returned guard until shutdown so buffered file output is
/// flushed. `None` means console-only logging.
pub fn init_logging(log_level: &str) -> Option<WorkerGuard> {
    let config = FileLoggingConfig::default();
    let console_layer = tracing_subscriber::fmt::layer().with_filter(build_filter(log_level));

    if !config.enabled {
        tracing_subscriber::registry().with(console_layer).init();
        return None;
    }

    if let Err(e) = std::fs::create_dir_all(&config.log_dir) {
        eprintln!("Failed to create log directory {:?}: {}", config.log_dir, e);
        tracing_subscriber::registry().with(console_layer).init();
        return None;
    }

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(build_filter(log_level));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    tracing::info!(
        log_dir = ?config.log_dir,
        max_files = config.max_files,
        "File logging enabled"
    );

    let log_dir = config.log_dir.clone();
    let max_files = config.max_files;
    std::thread::spawn(move || {
        cleanup_old_logs(&log_dir, max_files);
    });

    Some(guard)
}

/// Keep only the newest `max_files` rotated log files.
fn cleanup_old_logs(log_dir: &Path, max_files: usize) {
    let Ok(entries) = std::fs::read_dir(log_dir) else {
        return;
    };

    let mut log_files: Vec<_> = entries
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_name()
                .to_str()
                .is_some_and(|n| n.starts_with(LOG_FILE_PREFIX))
        })
        .filter_map(|e| {
            e.metadata()
                .ok()
                .and_then(|m| m.modified().ok())
                .map(|t| (e.path(), t))
        })
        .collect();

    log_files.sort_by(|a, b| b.1.cmp(&a.1));

    for (path, _) in log_files.into_iter().skip(max_files) {
        if let Err(e) = std::fs::remove_file(&path) {
            tracing::warn!("Failed to remove old log file {:?}: {}", path, e);
        } else {
            tracing::debug!("Removed old log file: {:?}", path);
        }
    }
}
