use std::path::{Component, Path, PathBuf};

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path as UrlPath, State};
use axum::http::{header, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::{debug, error};

use super::response::{ApiError, ListResponse, SaveResponse};
use super::AppState;
use crate::error::Error;
use crate::record::ReportRecord;

/// Body of `POST /api/simpan-laporan`.
#[derive(Debug, Deserialize)]
pub(crate) struct SaveRequest {
    #[serde(rename = "formData", default)]
    form_data: Option<ReportRecord>,
}

pub(crate) async fn index_handler(State(state): State<AppState>) -> Response {
    serve_public_file(&state.public_dir, Path::new("index.html")).await
}

pub(crate) async fn save_report_handler(
    State(state): State<AppState>,
    payload: Result<Json<SaveRequest>, JsonRejection>,
) -> Result<Json<SaveResponse>, ApiError> {
    let Json(request) = payload.map_err(ApiError::from)?;
    let record = request
        .form_data
        .ok_or_else(|| ApiError::from_error("Failed to save report", &Error::MissingFormData))?;

    let saved = state
        .reports
        .save(&record)
        .await
        .map_err(|err| ApiError::from_error("Failed to save report", &err))?;

    Ok(Json(saved.into()))
}

pub(crate) async fn list_reports_handler(
    State(state): State<AppState>,
) -> Result<Json<ListResponse>, ApiError> {
    match state.reports.list_all().await {
        Ok(reports) => Ok(Json(reports.into())),
        Err(err) => {
            error!("Failed to load reports: {err}");
            Err(ApiError::from_error("Failed to load reports", &err))
        }
    }
}

pub(crate) async fn download_report_handler(
    State(state): State<AppState>,
    UrlPath(filename): UrlPath<String>,
) -> Result<Response, ApiError> {
    let bytes = match state.reports.read_report(&filename).await {
        Ok(bytes) => bytes,
        Err(Error::InvalidFilename { .. }) => {
            return Err(ApiError::new(StatusCode::BAD_REQUEST, "Invalid filename"))
        }
        Err(err) => {
            error!("Failed to download {filename}: {err}");
            return Err(ApiError::from_error("Failed to download", &err));
        }
    };

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        filename.replace('"', "")
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/json")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// Serve anything else from the public directory.
pub(crate) async fn static_asset_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return ApiError::not_found().into_response();
    }
    match safe_relative_path(uri.path()) {
        Some(relative) => serve_public_file(&state.public_dir, &relative).await,
        None => ApiError::not_found().into_response(),
    }
}

async fn serve_public_file(public_dir: &Path, relative: &Path) -> Response {
    let path = public_dir.join(relative);
    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let content_type = HeaderValue::from_static(content_type_for(&path));
            ([(header::CONTENT_TYPE, content_type)], bytes).into_response()
        }
        Err(err) => {
            debug!("No static asset at {}: {err}", path.display());
            ApiError::not_found().into_response()
        }
    }
}

/// Turn a request path into a relative path made only of normal components.
fn safe_relative_path(request_path: &str) -> Option<PathBuf> {
    let trimmed = request_path.trim_start_matches('/');
    if trimmed.is_empty() || trimmed.contains('\\') {
        return None;
    }

    let mut relative = PathBuf::new();
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            _ => return None,
        }
    }
    Some(relative)
}

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
