//! HTTP routes driven through the router with an in-memory database.

#[path = "../common/mod.rs"]
mod common;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};
use tower::util::ServiceExt;

use common::{orchestrator, MockDatabase};
use flatbridge::web::{router, AppState};

const BOUNDARY: &str = "----FlatbridgeBoundary7MA4YWxkTrZu0gW";

struct TestApp {
    app: Router,
    db: MockDatabase,
    holding: TempDir,
    uploads: TempDir,
}

fn test_app(db: MockDatabase) -> TestApp {
    let holding = tempdir().unwrap();
    let uploads = tempdir().unwrap();
    let state = Arc::new(AppState {
        orchestrator: orchestrator(&db, holding.path()),
        upload_dir: uploads.path().to_path_buf(),
        default_delimiter: ",".to_string(),
    });
    TestApp {
        app: router(state, 16, true),
        db,
        holding,
        uploads,
    }
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_request(uri: &str, file: Option<&str>, fields: &[(&str, &str)]) -> Request<Body> {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    if let Some(content) = file {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"data.csv\"\r\nContent-Type: text/csv\r\n\r\n{content}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn is_empty_dir(path: &Path) -> bool {
    fs::read_dir(path).unwrap().next().is_none()
}

fn config_json() -> Value {
    json!({"host": "localhost", "port": "8123", "database": "db", "username": "", "token": ""})
}

#[tokio::test]
async fn test_health() {
    let t = test_app(MockDatabase::new());
    let (status, body) = send(
        &t.app,
        Request::builder()
            .uri("/api/health")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_connect_lists_tables() {
    let t = test_app(MockDatabase::new().with_table("orders", &[("id", "UInt64")]));
    let (status, body) = send(&t.app, json_request("/api/clickhouse/connect", config_json())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Connected to ClickHouse successfully");
    assert_eq!(body["tables"], json!(["orders"]));
}

#[tokio::test]
async fn test_connect_without_database_is_bad_request() {
    let t = test_app(MockDatabase::new());
    let (status, body) = send(
        &t.app,
        json_request("/api/clickhouse/connect", json!({"host": "localhost"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Error connecting to ClickHouse");
    assert!(body["error"].as_str().unwrap().contains("database"));
}

#[tokio::test]
async fn test_columns() {
    let t = test_app(MockDatabase::new().with_table("orders", &[("id", "UInt64")]));
    let (status, body) = send(
        &t.app,
        json_request(
            "/api/clickhouse/columns",
            json!({"config": config_json(), "tables": ["orders"]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["schema"],
        json!([{"table": "orders", "name": "id", "type": "UInt64"}])
    );
}

#[tokio::test]
async fn test_preview_missing_join_is_bad_request() {
    let t = test_app(MockDatabase::new());
    let (status, body) = send(
        &t.app,
        json_request(
            "/api/clickhouse/export/preview",
            json!({
                "config": config_json(),
                "tables": ["orders", "customers"],
                "columns": [{"table": "orders", "column": "id"}]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Preview failed");
    assert!(t.db.queries().is_empty());
}

#[tokio::test]
async fn test_preview() {
    let t = test_app(MockDatabase::new().with_rows(common::numbered_rows(3)));
    let (status, body) = send(
        &t.app,
        json_request(
            "/api/clickhouse/export/preview",
            json!({
                "config": config_json(),
                "tables": ["orders"],
                "columns": [{"table": "orders", "column": "id"}]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rowCount"], 3);
    assert_eq!(body["preview"][2], json!({"id": "3"}));
}

#[tokio::test]
async fn test_export_then_download() {
    let t = test_app(MockDatabase::new().with_rows(vec![json!({"id": "1", "amount": 2.5})]));
    let (status, body) = send(
        &t.app,
        json_request(
            "/api/clickhouse/export",
            json!({
                "config": config_json(),
                "tables": ["orders"],
                "columns": [
                    {"table": "orders", "column": "id"},
                    {"table": "orders", "column": "amount"}
                ],
                "delimiter": ";"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rowCount"], 1);
    let file_name = body["fileName"].as_str().unwrap().to_string();
    assert_eq!(body["filePath"], format!("/downloads/{file_name}"));
    assert!(t.holding.path().join(&file_name).exists());

    let response = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/downloads/{file_name}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"id;amount\n1;2.5\n");
}

#[tokio::test]
async fn test_download_rejects_traversal_and_unknown_files() {
    let t = test_app(MockDatabase::new());
    for uri in ["/downloads/..%2Fsecret.csv", "/downloads/missing.csv"] {
        let response = t
            .app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn test_flatfile_schema_and_upload_cleanup() {
    let t = test_app(MockDatabase::new());
    let (status, body) = send(
        &t.app,
        multipart_request(
            "/api/flatfile/schema",
            Some("id,name\n1,ann\n2,bob"),
            &[("delimiter", ","), ("hasHeader", "true")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["columns"], json!(["id", "name"]));
    assert_eq!(body["sampleCount"], 2);
    assert!(is_empty_dir(t.uploads.path()));
}

#[tokio::test]
async fn test_flatfile_schema_without_file() {
    let t = test_app(MockDatabase::new());
    let (status, body) = send(
        &t.app,
        multipart_request("/api/flatfile/schema", None, &[("hasHeader", "true")]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Error analyzing file schema");
}

#[tokio::test]
async fn test_flatfile_preview() {
    let t = test_app(MockDatabase::new());
    let (status, body) = send(
        &t.app,
        multipart_request(
            "/api/flatfile/preview",
            Some("id|name\n1|ann\n2|bob\n3|cy"),
            &[
                ("delimiter", "|"),
                ("hasHeader", "true"),
                ("columns", r#"["name", "missing"]"#),
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rowCount"], 3);
    assert_eq!(body["totalRows"], 3);
    assert_eq!(body["headers"], json!(["id", "name"]));
    assert_eq!(body["selectedColumns"], json!(["name", "missing"]));
    assert_eq!(body["preview"][0], json!({"name": "ann", "missing": ""}));
    assert!(is_empty_dir(t.uploads.path()));
}

#[tokio::test]
async fn test_flatfile_import() {
    let t = test_app(MockDatabase::new());
    let config = config_json().to_string();
    let (status, body) = send(
        &t.app,
        multipart_request(
            "/api/flatfile/import",
            Some("id,amount\n1,9.5\n2,7.0"),
            &[
                ("delimiter", ","),
                ("hasHeader", "true"),
                ("columns", r#"["id", "amount"]"#),
                ("clickhouseConfig", config.as_str()),
                ("targetTable", "t"),
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["rowCount"], 2);
    assert_eq!(body["message"], "Data imported successfully to table db.t");
    assert_eq!(t.db.statements().len(), 2);
    assert!(is_empty_dir(t.uploads.path()));
}

#[tokio::test]
async fn test_flatfile_import_failure_still_cleans_up() {
    let t = test_app(MockDatabase::new().failing_on("INSERT", "Code: 27. Cannot parse input"));
    let config = config_json().to_string();
    let (status, body) = send(
        &t.app,
        multipart_request(
            "/api/flatfile/import",
            Some("qty\n5\nmany"),
            &[
                ("hasHeader", "true"),
                ("columns", r#"["qty"]"#),
                ("clickhouseConfig", config.as_str()),
                ("targetTable", "stock"),
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Error importing data to ClickHouse");
    assert!(body["error"].as_str().unwrap().starts_with("insert failed"));
    assert!(is_empty_dir(t.uploads.path()));
}
