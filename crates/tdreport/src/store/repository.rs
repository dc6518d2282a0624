//! Storage abstraction used by the HTTP surface.

use crate::error::Result;
use crate::record::{ReportRecord, SavedReport, StoredReport};

/// Persistence operations for submitted reports.
///
/// [`super::ReportStore`] is the filesystem implementation. Handlers only see
/// this trait, so tests can swap in an implementation that fails on demand.
#[async_trait::async_trait]
pub trait ReportRepository: Send + Sync + std::fmt::Debug {
    /// Persist a record and report where it went.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    async fn save(&self, record: &ReportRecord) -> Result<SavedReport>;

    /// Read back every stored report.
    ///
    /// # Errors
    ///
    /// Returns an error if the reports cannot be read or parsed.
    async fn list_all(&self) -> Result<Vec<StoredReport>>;

    /// Fetch the raw bytes of one stored report.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is rejected or the file cannot be read.
    async fn read_report(&self, filename: &str) -> Result<Vec<u8>>;
}
