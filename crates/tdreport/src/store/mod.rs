//! Report storage for tdreport.
//!
//! Reports live as pretty-printed JSON files in one flat directory, named
//! `<YYYY-MM-DD>_<director>.json`. There is no index and no locking: a save
//! that derives an existing name replaces that file, and the last write wins.

mod repository;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::activity::{ActivityLog, EntryKind};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::record::{
    validate_download_name, ReportRecord, SavedReport, StoredReport, REPORT_EXTENSION,
};

pub use repository::ReportRepository;

/// Filesystem-backed report store.
#[derive(Debug, Clone)]
pub struct ReportStore {
    /// Directory holding the report files.
    dir: PathBuf,
    /// Daily log of save attempts.
    activity: ActivityLog,
    /// Skip malformed files when listing.
    skip_invalid: bool,
}

impl ReportStore {
    /// Create a store rooted at `dir`.
    ///
    /// The directory is not created until the first save. Relative paths are
    /// resolved against the current working directory.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, activity: ActivityLog) -> Self {
        Self {
            dir: absolutize(dir.into()),
            activity,
            skip_invalid: false,
        }
    }

    /// Create a store from the `[storage]` configuration section.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.storage.reports_dir,
            ActivityLog::new(&config.storage.logs_dir),
        )
        .with_skip_invalid(config.storage.skip_invalid_reports)
    }

    /// Choose whether listing skips malformed files instead of failing.
    #[must_use]
    pub fn with_skip_invalid(mut self, skip_invalid: bool) -> Self {
        self.skip_invalid = skip_invalid;
        self
    }

    /// The reports directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The activity log this store writes to.
    #[must_use]
    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    /// Save a record, stamping it with today's UTC date.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created, the director name
    /// is unusable as a file name, or the write fails.
    pub async fn save(&self, record: &ReportRecord) -> Result<SavedReport> {
        self.save_at(record, Utc::now()).await
    }

    /// Save a record as if submitted at `now`.
    ///
    /// # Errors
    ///
    /// See [`ReportStore::save`].
    pub async fn save_at(&self, record: &ReportRecord, now: DateTime<Utc>) -> Result<SavedReport> {
        match self.write_report(record, now).await {
            Ok(saved) => {
                info!("Report saved: {}", saved.filename);
                self.activity
                    .append_at(now, EntryKind::Log, &format!("Report saved: {}", saved.filename))
                    .await;
                Ok(saved)
            }
            Err(err) => {
                error!("Failed to save report: {err}");
                self.activity
                    .append_at(now, EntryKind::Error, &format!("Error: {err}"))
                    .await;
                Err(err)
            }
        }
    }

    async fn write_report(&self, record: &ReportRecord, now: DateTime<Utc>) -> Result<SavedReport> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| Error::DirectoryCreate {
                path: self.dir.clone(),
                source,
            })?;

        let filename = record.file_name_for(now.date_naive())?;
        let path = self.dir.join(&filename);
        let content = record.to_pretty_json()?;

        tokio::fs::write(&path, content)
            .await
            .map_err(|source| Error::ReportWrite {
                path: path.clone(),
                source,
            })?;

        debug!("Wrote {} fields to {}", record.len(), path.display());
        Ok(SavedReport { filename, path })
    }

    /// Read and parse every `.json` file in the reports directory.
    ///
    /// Results are ordered by file name. A missing directory yields an empty
    /// list. A malformed file fails the whole call unless the store was built
    /// with [`ReportStore::with_skip_invalid`].
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or a file cannot be read, or if a
    /// file is not valid JSON.
    pub async fn list_all(&self) -> Result<Vec<StoredReport>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("Reports directory {} does not exist", self.dir.display());
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(Error::ReportRead {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|source| Error::ReportRead {
                path: self.dir.clone(),
                source,
            })?
        {
            if let Some(name) = entry.file_name().to_str() {
                if name.ends_with(REPORT_EXTENSION) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();

        let mut reports = Vec::with_capacity(names.len());
        for filename in names {
            let path = self.dir.join(&filename);
            let content = tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| Error::ReportRead {
                    path: path.clone(),
                    source,
                })?;

            match serde_json::from_str(&content) {
                Ok(data) => reports.push(StoredReport { filename, data }),
                Err(source) if self.skip_invalid => {
                    warn!("Skipping malformed report {}: {source}", path.display());
                }
                Err(source) => return Err(Error::ReportParse { path, source }),
            }
        }

        Ok(reports)
    }

    /// Read the raw contents of a stored report.
    ///
    /// The name is validated before any filesystem access.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFilename`] for a rejected name, or a read error
    /// (including "not found") from the filesystem.
    pub async fn read_report(&self, filename: &str) -> Result<Vec<u8>> {
        validate_download_name(filename)?;

        let path = self.dir.join(filename);
        tokio::fs::read(&path)
            .await
            .map_err(|source| Error::ReportRead { path, source })
    }
}

#[async_trait::async_trait]
impl ReportRepository for ReportStore {
    async fn save(&self, record: &ReportRecord) -> Result<SavedReport> {
        ReportStore::save(self, record).await
    }

    async fn list_all(&self) -> Result<Vec<StoredReport>> {
        ReportStore::list_all(self).await
    }

    async fn read_report(&self, filename: &str) -> Result<Vec<u8>> {
        ReportStore::read_report(self, filename).await
    }
}

fn absolutize(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path,
    }
}
