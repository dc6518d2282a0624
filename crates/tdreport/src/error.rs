//! Error types for tdreport.
//!
//! This module defines all error types used throughout the tdreport crate.
//! Errors fall into two groups: client errors (bad payloads, unsafe file
//! names) that map to a 4xx response, and storage or configuration errors
//! that map to a 5xx response.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for tdreport operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Client Errors ===
    /// The submission did not carry a `formData` mapping.
    #[error("form data is empty")]
    MissingFormData,

    /// The request body could not be decoded.
    #[error("invalid request body: {0}")]
    InvalidPayload(String),

    /// A report file name failed validation.
    #[error("invalid filename: {name}")]
    InvalidFilename {
        /// The rejected name.
        name: String,
    },

    // === Storage Errors ===
    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a report file.
    #[error("failed to write report {path}: {source}")]
    ReportWrite {
        /// Path of the report file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to read a report file or the reports directory.
    #[error("failed to read {path}: {source}")]
    ReportRead {
        /// Path that couldn't be read.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A stored report is not valid JSON.
    #[error("malformed report {path}: {source}")]
    ReportParse {
        /// Path of the malformed report.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: serde_json::Error,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Server Errors ===
    /// Failed to bind the listening socket.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The address that was requested.
        addr: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for tdreport operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create an invalid filename error.
    #[must_use]
    pub fn invalid_filename(name: impl Into<String>) -> Self {
        Self::InvalidFilename { name: name.into() }
    }

    /// Create an invalid payload error.
    #[must_use]
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::InvalidPayload(message.into())
    }

    /// Check if this error was caused by the caller's input.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingFormData | Self::InvalidPayload(_) | Self::InvalidFilename { .. }
        )
    }

    /// Check if this error wraps a "not found" I/O error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::ReportRead { source, .. }
            | Self::ReportWrite { source, .. }
            | Self::DirectoryCreate { source, .. }
            | Self::Io(source) => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
