//! JSON response shapes shared by the API handlers.

use std::path::PathBuf;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use crate::error::Error;
use crate::record::{SavedReport, StoredReport};

/// Body of a successful save.
#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub success: bool,
    pub message: &'static str,
    pub filename: String,
    pub path: PathBuf,
}

impl From<SavedReport> for SaveResponse {
    fn from(saved: SavedReport) -> Self {
        Self {
            success: true,
            message: "Report saved successfully",
            filename: saved.filename,
            path: saved.path,
        }
    }
}

/// Body of a report listing.
#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub success: bool,
    pub count: usize,
    pub laporan: Vec<StoredReport>,
}

impl From<Vec<StoredReport>> for ListResponse {
    fn from(laporan: Vec<StoredReport>) -> Self {
        Self {
            success: true,
            count: laporan.len(),
            laporan,
        }
    }
}

/// Failure reply: `{"success": false, "message": ...}` with a status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Not found")
    }

    /// Map a crate error. Client errors become 400 with the error text;
    /// everything else becomes 500 prefixed with `context`.
    #[must_use]
    pub fn from_error(context: &str, err: &Error) -> Self {
        if err.is_client_error() {
            Self::new(StatusCode::BAD_REQUEST, capitalize(&err.to_string()))
        } else {
            Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("{context}: {err}"),
            )
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let status = match rejection.status() {
            StatusCode::UNPROCESSABLE_ENTITY => StatusCode::BAD_REQUEST,
            other => other,
        };
        Self::new(
            status,
            capitalize(&Error::invalid_payload(rejection.body_text()).to_string()),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({"success": false, "message": self.message}));
        (self.status, body).into_response()
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
