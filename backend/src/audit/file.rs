use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Local};

/// Severity written into each log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Info => write!(f, "INFO"),
            Level::Warning => write!(f, "WARNING"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Log sink lock poisoned")]
    Poisoned,
}

/// Append-only text log of inbound requests and rejected credentials.
///
/// One line per event, `[<timestamp>] <LEVEL> - <message>`. Writes never fail
/// the caller: errors are reported through `tracing` and dropped.
pub struct RequestLog {
    file: Mutex<File>,
    path: PathBuf,
}

impl RequestLog {
    /// Open (or create) the log file in append mode.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref();

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        tracing::info!("Request log initialized at {}", path.display());

        Ok(Self {
            file: Mutex::new(file),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    pub fn warning(&self, message: &str) {
        self.log(Level::Warning, message);
    }

    /// Append one line; failures are logged and swallowed.
    pub fn log(&self, level: Level, message: &str) {
        if let Err(e) = self.try_log(level, message) {
            tracing::warn!("Failed to write request log {}: {}", self.path.display(), e);
        }
    }

    fn try_log(&self, level: Level, message: &str) -> Result<(), AuditError> {
        let line = format_line(Local::now(), level, message);
        let mut file = self.file.lock().map_err(|_| AuditError::Poisoned)?;
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}

/// Render a single newline-terminated log line.
pub fn format_line(timestamp: DateTime<Local>, level: Level, message: &str) -> String {
    format!(
        "[{}] {} - {}\n",
        timestamp.format("%Y-%m-%d %H:%M:%S,%3f"),
        level,
        message
    )
}
