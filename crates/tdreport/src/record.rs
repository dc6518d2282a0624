//! Report record types.
//!
//! A report is a flat, schemaless mapping of form field names to values.
//! Field order is kept as submitted so stored files read like the form.

use std::path::PathBuf;

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Field used to derive the report file name.
pub const DIRECTOR_FIELD: &str = "technicalDirector";

/// Label used in the file name when no director is given.
pub const FALLBACK_LABEL: &str = "laporan";

/// Extension of every stored report.
pub const REPORT_EXTENSION: &str = ".json";

/// A submitted shift report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportRecord(IndexMap<String, String>);

impl ReportRecord {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, returning the previous value if there was one.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(field.into(), value.into())
    }

    /// Get a field value.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over fields in submission order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The technical director's name, if present and non-empty.
    #[must_use]
    pub fn technical_director(&self) -> Option<&str> {
        self.get(DIRECTOR_FIELD).filter(|name| !name.is_empty())
    }

    /// Derive the file name this record is stored under on `date`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFilename`] if the director name would escape
    /// the reports directory, or if the resulting name could not be
    /// downloaded again (a name ending in `.` yields `..json`).
    pub fn file_name_for(&self, date: NaiveDate) -> Result<String> {
        let label = self.technical_director().unwrap_or(FALLBACK_LABEL);
        let name = format!("{}_{label}{REPORT_EXTENSION}", date.format("%Y-%m-%d"));

        if label.contains(|c| matches!(c, '/' | '\\' | '\0')) {
            return Err(Error::invalid_filename(name));
        }
        validate_download_name(&name)?;
        Ok(name)
    }

    /// Serialize as two-space indented JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl<K, V> FromIterator<(K, V)> for ReportRecord
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Where a report was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedReport {
    /// Generated file name.
    pub filename: String,
    /// Absolute path of the written file.
    pub path: PathBuf,
}

/// A report read back from the reports directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReport {
    /// File name within the reports directory.
    pub filename: String,
    /// Parsed file contents.
    pub data: serde_json::Value,
}

impl StoredReport {
    /// The director recorded in the stored data, if any.
    #[must_use]
    pub fn technical_director(&self) -> Option<&str> {
        self.data
            .get(DIRECTOR_FIELD)
            .and_then(serde_json::Value::as_str)
            .filter(|name| !name.is_empty())
    }

    /// Number of top-level fields in the stored data.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.data.as_object().map_or(0, serde_json::Map::len)
    }
}

/// Check a caller-supplied report name before it touches the filesystem.
///
/// # Errors
///
/// Returns [`Error::InvalidFilename`] unless the name ends in `.json` and
/// contains no `..`.
pub fn validate_download_name(name: &str) -> Result<()> {
    if !name.ends_with(REPORT_EXTENSION) || name.contains("..") {
        return Err(Error::invalid_filename(name));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_file_name_with_director() {
        let record: ReportRecord = [("technicalDirector", "Alice"), ("shift", "pagi")]
            .into_iter()
            .collect();
        assert_eq!(
            record.file_name_for(date(2024, 1, 1)).unwrap(),
            "2024-01-01_Alice.json"
        );
    }

    #[test]
    fn test_file_name_without_director() {
        let record: ReportRecord = [("shift", "malam")].into_iter().collect();
        assert_eq!(
            record.file_name_for(date(2024, 3, 9)).unwrap(),
            "2024-03-09_laporan.json"
        );
    }

    #[test]
    fn test_file_name_empty_director_falls_back() {
        let record: ReportRecord = [("technicalDirector", "")].into_iter().collect();
        assert!(record.technical_director().is_none());
        assert_eq!(
            record.file_name_for(date(2024, 1, 1)).unwrap(),
            "2024-01-01_laporan.json"
        );
    }

    #[test]
    fn test_file_name_keeps_spaces_and_unicode() {
        let record: ReportRecord = [("technicalDirector", "Budi Santoso")].into_iter().collect();
        assert_eq!(
            record.file_name_for(date(2024, 12, 31)).unwrap(),
            "2024-12-31_Budi Santoso.json"
        );
    }

    #[test]
    fn test_file_name_rejects_path_separators() {
        for name in ["../../etc/cron", "a/b", "a\\b", "x..y"] {
            let record: ReportRecord = [("technicalDirector", name)].into_iter().collect();
            let err = record.file_name_for(date(2024, 1, 1)).unwrap_err();
            assert!(err.is_client_error(), "{name} should be rejected");
        }
    }

    #[test]
    fn test_file_name_is_always_downloadable() {
        let record: ReportRecord = [("technicalDirector", "Budi S.")].into_iter().collect();
        let err = record.file_name_for(date(2024, 1, 1)).unwrap_err();
        assert!(err.is_client_error());

        let record: ReportRecord = [("technicalDirector", "S. Budi")].into_iter().collect();
        let name = record.file_name_for(date(2024, 1, 1)).unwrap();
        assert!(validate_download_name(&name).is_ok());
    }

    #[test]
    fn test_pretty_json_preserves_field_order() {
        let record: ReportRecord = [("zeta", "1"), ("alpha", "2"), ("technicalDirector", "Alice")]
            .into_iter()
            .collect();
        let json = record.to_pretty_json().unwrap();
        assert_eq!(
            json,
            "{\n  \"zeta\": \"1\",\n  \"alpha\": \"2\",\n  \"technicalDirector\": \"Alice\"\n}"
        );
    }

    #[test]
    fn test_empty_record_serializes_as_empty_object() {
        assert_eq!(ReportRecord::new().to_pretty_json().unwrap(), "{}");
    }

    #[test]
    fn test_deserialize_rejects_non_string_values() {
        let result: std::result::Result<ReportRecord, _> =
            serde_json::from_str(r#"{"count": 3}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_insert_and_get() {
        let mut record = ReportRecord::new();
        assert!(record.is_empty());
        assert!(record.insert("lokasi", "Studio 1").is_none());
        assert_eq!(record.insert("lokasi", "Studio 2").as_deref(), Some("Studio 1"));
        assert_eq!(record.get("lokasi"), Some("Studio 2"));
        assert_eq!(record.len(), 1);
        assert_eq!(record.iter().collect::<Vec<_>>(), vec![("lokasi", "Studio 2")]);
    }

    #[test]
    fn test_validate_download_name() {
        assert!(validate_download_name("2024-01-01_Alice.json").is_ok());
        assert!(validate_download_name("../../etc/passwd.json").is_err());
        assert!(validate_download_name("a..b.json").is_err());
        assert!(validate_download_name("report.txt").is_err());
        assert!(validate_download_name("report.json.bak").is_err());
    }

    #[test]
    fn test_stored_report_accessors() {
        let report = StoredReport {
            filename: "2024-01-01_Alice.json".to_string(),
            data: serde_json::json!({"technicalDirector": "Alice", "shift": "pagi"}),
        };
        assert_eq!(report.technical_director(), Some("Alice"));
        assert_eq!(report.field_count(), 2);

        let odd = StoredReport {
            filename: "odd.json".to_string(),
            data: serde_json::json!([1, 2, 3]),
        };
        assert!(odd.technical_director().is_none());
        assert_eq!(odd.field_count(), 0);
    }
}
