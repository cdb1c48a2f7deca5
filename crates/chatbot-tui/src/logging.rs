//! Diagnostic logging to a file; the terminal itself belongs to the UI.

use std::path::{Path, PathBuf};
use anyhow::{Context, Result, anyhow};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_NAME: &str = "ai-chatbot.log";

/// Where the log goes when `--log-file` isn't given.
pub fn default_log_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("ai-chatbot")
        .join(LOG_FILE_NAME)
}

/// Split a log path into the directory to create and the file name to write.
fn split_log_path(path: &Path) -> Result<(PathBuf, PathBuf)> {
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("Log path has no file name: {}", path.display()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, PathBuf::from(file_name)))
}

/// Install the global subscriber. `RUST_LOG` overrides the `info` default.
/// Keep the returned guard alive until exit so buffered lines are flushed.
pub fn init(log_file: Option<&Path>) -> Result<WorkerGuard> {
    let path = log_file.map(Path::to_path_buf).unwrap_or_else(default_log_path);
    let (dir, file_name) = split_log_path(&path)?;

    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Could not create log directory {}", dir.display()))?;

    let appender = tracing_appender::rolling::never(&dir, &file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false).with_target(true))
        .try_init()
        .context("Logging was already initialized")?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_log_path_bare_file_name() {
        let (dir, file) = split_log_path(Path::new("chat.log")).unwrap();
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(file, PathBuf::from("chat.log"));
    }

    #[test]
    fn test_split_log_path_nested() {
        let (dir, file) = split_log_path(Path::new("/var/log/chat/out.log")).unwrap();
        assert_eq!(dir, PathBuf::from("/var/log/chat"));
        assert_eq!(file, PathBuf::from("out.log"));
    }

    #[test]
    fn test_split_log_path_rejects_root() {
        assert!(split_log_path(Path::new("/")).is_err());
    }

    #[test]
    fn test_default_log_path_file_name() {
        assert!(default_log_path().ends_with("ai-chatbot/ai-chatbot.log"));
    }
}
