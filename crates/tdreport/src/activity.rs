//! Daily activity log.
//!
//! Every save attempt appends one line to a per-day text file:
//!
//! ```text
//! [2024-01-01T08:15:30.123Z] [LOG] Report saved: 2024-01-01_Alice.json
//! ```
//!
//! Writing to this log never fails the caller; errors are reported through
//! `tracing` at debug level and otherwise dropped.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{Error, Result};

/// File name prefix for daily log files.
const LOG_FILE_PREFIX: &str = "form-server";

/// Severity of an activity log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A successful operation.
    Log,
    /// A failed operation.
    Error,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Log => write!(f, "LOG"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// Append-only log of save attempts, rotated by UTC calendar date.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    dir: PathBuf,
}

impl ActivityLog {
    /// Create a log writing into `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory holding the daily files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the log directory if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub async fn init(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| Error::DirectoryCreate {
                path: self.dir.clone(),
                source,
            })
    }

    /// Path of the log file for `date`.
    #[must_use]
    pub fn file_path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("{LOG_FILE_PREFIX}_{}.log", date.format("%Y-%m-%d")))
    }

    /// Render a single log line, including the trailing newline.
    #[must_use]
    pub fn format_line(at: DateTime<Utc>, kind: EntryKind, message: &str) -> String {
        format!(
            "[{}] [{kind}] {message}\n",
            at.to_rfc3339_opts(SecondsFormat::Millis, true)
        )
    }

    /// Append an entry stamped with the current time.
    pub async fn append(&self, kind: EntryKind, message: &str) {
        self.append_at(Utc::now(), kind, message).await;
    }

    /// Append an entry stamped with `at`. Errors are swallowed.
    pub async fn append_at(&self, at: DateTime<Utc>, kind: EntryKind, message: &str) {
        let path = self.file_path_for(at.date_naive());
        let line = Self::format_line(at, kind, message);
        if let Err(err) = Self::write_line(&path, &line).await {
            debug!("Dropped activity log entry for {}: {err}", path.display());
        }
    }

    async fn write_line(path: &Path, line: &str) -> std::io::Result<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }
}
