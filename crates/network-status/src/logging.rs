//! Logging setup.
//!
//! The terminal UI owns the screen, so tracing output must not go to stderr
//! while it runs. In TUI mode logs are written to a file if one was given and
//! dropped otherwise; quiet mode logs to stderr.
//!
//! File output goes through a background writer thread. Keep the returned
//! [`WorkerGuard`] alive until exit or buffered records are lost.

use crate::error::{Result, StatusError};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

/// Where log records go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Compact, colored output on stderr
    Stderr,
    /// Plain-text output appended to a file
    File(PathBuf),
    /// No subscriber installed
    Disabled,
}

/// Build the filter from `RUST_LOG` if set, else from `default_level`.
pub fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Non-blocking writer appending to `path`, never rotated.
pub fn file_writer(path: &Path) -> Result<(NonBlocking, WorkerGuard)> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            StatusError::InvalidConfig(format!("log file {} has no file name", path.display()))
        })?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)?;

    Ok(tracing_appender::non_blocking(appender))
}

/// Install the global tracing subscriber. Call once, early in `main`.
pub fn init(default_level: &str, target: LogTarget) -> Result<Option<WorkerGuard>> {
    match target {
        LogTarget::Stderr => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter(default_level))
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact()
                .init();
            Ok(None)
        }
        LogTarget::File(path) => {
            let (writer, guard) = file_writer(&path)?;
            tracing_subscriber::fmt()
                .with_env_filter(env_filter(default_level))
                .with_ansi(false)
                .with_writer(writer)
                .init();
            Ok(Some(guard))
        }
        LogTarget::Disabled => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_file_writer_appends_to_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("network-status.log");

        let (mut writer, guard) = file_writer(&path).unwrap();
        writer.write_all(b"first record\n").unwrap();
        drop(writer);
        // Dropping the guard flushes the background writer
        drop(guard);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "first record\n");
    }

    #[test]
    fn test_file_writer_rejects_path_without_file_name() {
        let err = file_writer(Path::new("/")).unwrap_err();
        assert!(matches!(err, StatusError::InvalidConfig(_)));
    }
}
