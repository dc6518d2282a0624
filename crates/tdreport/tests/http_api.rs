use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tdreport::{
    build_router, ActivityLog, AppState, Error, ReportRecord, ReportRepository, ReportStore,
    SavedReport, StoredReport,
};
use tempfile::{tempdir, TempDir};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

struct Reply {
    status: u16,
    headers: String,
    body: String,
}

impl Reply {
    fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("json body")
    }
}

#[derive(Debug)]
struct BrokenRepository;

fn disk_failure() -> Error {
    Error::Io(std::io::Error::new(
        std::io::ErrorKind::PermissionDenied,
        "disk unavailable",
    ))
}

#[async_trait::async_trait]
impl ReportRepository for BrokenRepository {
    async fn save(&self, _record: &ReportRecord) -> tdreport::Result<SavedReport> {
        Err(disk_failure())
    }

    async fn list_all(&self) -> tdreport::Result<Vec<StoredReport>> {
        Err(disk_failure())
    }

    async fn read_report(&self, _filename: &str) -> tdreport::Result<Vec<u8>> {
        Err(disk_failure())
    }
}

fn temp_store(tmp: &TempDir) -> ReportStore {
    ReportStore::new(
        tmp.path().join("reports"),
        ActivityLog::new(tmp.path().join("logs")),
    )
}

async fn spawn_app(state: AppState) -> SocketAddr {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve app");
    });
    addr
}

async fn send(addr: SocketAddr, method: &str, path: &str, body: Option<&str>) -> Reply {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let body = body.unwrap_or("");
    let request = format!(
        "{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    );
    stream
        .write_all(request.as_bytes())
        .await
        .expect("write request");

    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");

    let (head, body) = response.split_once("\r\n\r\n").expect("response head");
    let (status_line, headers) = head.split_once("\r\n").unwrap_or((head, ""));
    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .expect("status code");
    Reply {
        status,
        headers: headers.to_ascii_lowercase(),
        body: body.to_string(),
    }
}

#[tokio::test]
async fn save_list_and_download_round_trip() {
    let tmp = tempdir().expect("tempdir");
    let store = temp_store(&tmp);
    let reports_dir = store.dir().to_path_buf();
    let addr = spawn_app(AppState::new(Arc::new(store), tmp.path().join("public"))).await;

    let saved = send(
        addr,
        "POST",
        "/api/simpan-laporan",
        Some(r#"{"formData":{"technicalDirector":"Alice","shift":"pagi","catatan":"aman"}}"#),
    )
    .await;
    assert_eq!(saved.status, 200, "{}", saved.body);
    let saved = saved.json();
    assert_eq!(saved["success"], true);
    let filename = saved["filename"].as_str().expect("filename").to_string();
    assert!(filename.ends_with("_Alice.json"));
    assert_eq!(
        Path::new(saved["path"].as_str().expect("path")),
        reports_dir.join(&filename)
    );

    let listed = send(addr, "GET", "/api/laporan", None).await;
    assert_eq!(listed.status, 200);
    let listed = listed.json();
    assert_eq!(listed["success"], true);
    assert_eq!(listed["count"], 1);
    assert_eq!(listed["laporan"][0]["filename"], filename.as_str());
    assert_eq!(
        listed["laporan"][0]["data"],
        serde_json::json!({"technicalDirector": "Alice", "shift": "pagi", "catatan": "aman"})
    );

    let downloaded = send(
        addr,
        "GET",
        &format!("/api/laporan/download/{filename}"),
        None,
    )
    .await;
    assert_eq!(downloaded.status, 200);
    assert!(downloaded.headers.contains("content-type: application/json"));
    assert!(downloaded.headers.contains("content-disposition: attachment"));
    assert_eq!(
        downloaded.body,
        "{\n  \"technicalDirector\": \"Alice\",\n  \"shift\": \"pagi\",\n  \"catatan\": \"aman\"\n}"
    );
}

#[tokio::test]
async fn save_without_form_data_is_rejected() {
    let tmp = tempdir().expect("tempdir");
    let addr = spawn_app(AppState::new(Arc::new(temp_store(&tmp)), tmp.path())).await;

    for body in [r#"{}"#, r#"{"formData":null}"#] {
        let reply = send(addr, "POST", "/api/simpan-laporan", Some(body)).await;
        assert_eq!(reply.status, 400, "{body}");
        let json = reply.json();
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Form data is empty");
    }
    assert!(!tmp.path().join("reports").exists());
}

#[tokio::test]
async fn save_with_malformed_body_is_rejected() {
    let tmp = tempdir().expect("tempdir");
    let addr = spawn_app(AppState::new(Arc::new(temp_store(&tmp)), tmp.path())).await;

    let reply = send(addr, "POST", "/api/simpan-laporan", Some("{\"formData\":")).await;
    assert_eq!(reply.status, 400);
    assert_eq!(reply.json()["success"], false);

    let reply = send(addr, "POST", "/api/simpan-laporan", Some(r#"{"formData":"x"}"#)).await;
    assert_eq!(reply.status, 400);
}

#[tokio::test]
async fn save_with_traversing_director_is_rejected() {
    let tmp = tempdir().expect("tempdir");
    let addr = spawn_app(AppState::new(Arc::new(temp_store(&tmp)), tmp.path())).await;

    let reply = send(
        addr,
        "POST",
        "/api/simpan-laporan",
        Some(r#"{"formData":{"technicalDirector":"../../tmp/evil"}}"#),
    )
    .await;
    assert_eq!(reply.status, 400);
    assert!(reply.json()["message"]
        .as_str()
        .expect("message")
        .starts_with("Invalid filename"));
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let tmp = tempdir().expect("tempdir");
    let mut state = AppState::new(Arc::new(temp_store(&tmp)), tmp.path());
    state.max_body_bytes = 64;
    let addr = spawn_app(state).await;

    let body = format!(r#"{{"formData":{{"catatan":"{}"}}}}"#, "x".repeat(256));
    let reply = send(addr, "POST", "/api/simpan-laporan", Some(&body)).await;
    assert_eq!(reply.status, 413);
    assert_eq!(reply.json()["success"], false);
}

#[tokio::test]
async fn listing_without_directory_is_empty() {
    let tmp = tempdir().expect("tempdir");
    let addr = spawn_app(AppState::new(Arc::new(temp_store(&tmp)), tmp.path())).await;

    let reply = send(addr, "GET", "/api/laporan", None).await;
    assert_eq!(reply.status, 200);
    assert_eq!(
        reply.json(),
        serde_json::json!({"success": true, "count": 0, "laporan": []})
    );
}

#[tokio::test]
async fn listing_fails_on_malformed_report() {
    let tmp = tempdir().expect("tempdir");
    let store = temp_store(&tmp);
    std::fs::create_dir_all(store.dir()).expect("reports dir");
    std::fs::write(store.dir().join("2024-01-01_Alice.json"), "{}").expect("good file");
    std::fs::write(store.dir().join("2024-01-02_Bob.json"), "{\"shift\":").expect("bad file");
    let addr = spawn_app(AppState::new(Arc::new(store), tmp.path())).await;

    let reply = send(addr, "GET", "/api/laporan", None).await;
    assert_eq!(reply.status, 500);
    let json = reply.json();
    assert_eq!(json["success"], false);
    assert!(json["message"]
        .as_str()
        .expect("message")
        .starts_with("Failed to load reports:"));
}

#[tokio::test]
async fn download_rejects_unsafe_names() {
    let tmp = tempdir().expect("tempdir");
    std::fs::write(tmp.path().join("secret.json"), "{}").expect("secret");
    let addr = spawn_app(AppState::new(Arc::new(temp_store(&tmp)), tmp.path())).await;

    for path in [
        "/api/laporan/download/..%2F..%2Fetc%2Fpasswd.json",
        "/api/laporan/download/..%2Fsecret.json",
        "/api/laporan/download/a..b.json",
        "/api/laporan/download/notes.txt",
    ] {
        let reply = send(addr, "GET", path, None).await;
        assert_eq!(reply.status, 400, "{path}");
        assert_eq!(
            reply.json(),
            serde_json::json!({"success": false, "message": "Invalid filename"})
        );
    }
}

#[tokio::test]
async fn download_missing_report_is_server_error() {
    let tmp = tempdir().expect("tempdir");
    let addr = spawn_app(AppState::new(Arc::new(temp_store(&tmp)), tmp.path())).await;

    let reply = send(addr, "GET", "/api/laporan/download/2024-01-01_Nobody.json", None).await;
    assert_eq!(reply.status, 500);
    assert!(reply.json()["message"]
        .as_str()
        .expect("message")
        .starts_with("Failed to download:"));
}

#[tokio::test]
async fn storage_failures_map_to_server_errors() {
    let tmp = tempdir().expect("tempdir");
    let addr = spawn_app(AppState::new(Arc::new(BrokenRepository), tmp.path())).await;

    let reply = send(
        addr,
        "POST",
        "/api/simpan-laporan",
        Some(r#"{"formData":{"technicalDirector":"Alice"}}"#),
    )
    .await;
    assert_eq!(reply.status, 500);
    assert_eq!(
        reply.json()["message"],
        "Failed to save report: I/O error: disk unavailable"
    );

    let reply = send(addr, "GET", "/api/laporan", None).await;
    assert_eq!(reply.status, 500);
    assert_eq!(
        reply.json()["message"],
        "Failed to load reports: I/O error: disk unavailable"
    );

    let reply = send(addr, "GET", "/api/laporan/download/x.json", None).await;
    assert_eq!(reply.status, 500);
}

#[tokio::test]
async fn serves_static_form_assets() {
    let tmp = tempdir().expect("tempdir");
    let public = tmp.path().join("public");
    std::fs::create_dir_all(&public).expect("public dir");
    std::fs::write(public.join("index.html"), "<form id=\"tdForm\"></form>").expect("index");
    std::fs::write(public.join("script.js"), "console.log('ok');").expect("script");
    let addr = spawn_app(AppState::new(Arc::new(temp_store(&tmp)), &public)).await;

    let reply = send(addr, "GET", "/", None).await;
    assert_eq!(reply.status, 200);
    assert!(reply.headers.contains("content-type: text/html"));
    assert_eq!(reply.body, "<form id=\"tdForm\"></form>");

    let reply = send(addr, "GET", "/script.js", None).await;
    assert_eq!(reply.status, 200);
    assert!(reply.headers.contains("content-type: text/javascript"));

    let reply = send(addr, "GET", "/missing.css", None).await;
    assert_eq!(reply.status, 404);
    assert_eq!(reply.json()["success"], false);
}
