//! Route handlers.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::ConnectionConfig;
use crate::database::{ColumnInfo, Row};
use crate::flatfile::writer::is_servable_name;
use crate::flatfile::Delimiter;
use crate::transfer::{ImportRequest, Selection, TransferError};

use super::error::ApiError;
use super::server::AppState;
use super::upload::UploadForm;

type ApiResult<T> = Result<Json<T>, ApiError>;

// ============================================================================
// Database routes
// ============================================================================

#[derive(Serialize)]
pub struct ConnectResponse {
    message: &'static str,
    tables: Vec<String>,
}

/// POST /api/clickhouse/connect - List tables in the configured database
pub async fn connect(
    State(state): State<Arc<AppState>>,
    Json(config): Json<ConnectionConfig>,
) -> ApiResult<ConnectResponse> {
    let tables = state
        .orchestrator
        .list_tables(&config)
        .await
        .map_err(ApiError::with("Error connecting to ClickHouse"))?;
    Ok(Json(ConnectResponse {
        message: "Connected to ClickHouse successfully",
        tables,
    }))
}

#[derive(Deserialize)]
pub struct ColumnsRequest {
    #[serde(default)]
    config: ConnectionConfig,
    #[serde(default)]
    tables: Vec<String>,
}

#[derive(Serialize)]
pub struct ColumnsResponse {
    message: &'static str,
    schema: Vec<ColumnInfo>,
}

/// POST /api/clickhouse/columns - Columns and types for the given tables
pub async fn columns(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ColumnsRequest>,
) -> ApiResult<ColumnsResponse> {
    let schema = state
        .orchestrator
        .list_columns(&req.config, &req.tables)
        .await
        .map_err(ApiError::with("Error fetching columns"))?;
    Ok(Json(ColumnsResponse {
        message: "Columns fetched successfully",
        schema,
    }))
}

#[derive(Deserialize)]
pub struct ExportRequest {
    #[serde(default)]
    config: ConnectionConfig,
    #[serde(flatten)]
    selection: Selection,
    #[serde(default)]
    delimiter: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    message: &'static str,
    preview: Vec<Row>,
    row_count: usize,
}

/// POST /api/clickhouse/export/preview - First rows of the selection
pub async fn export_preview(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExportRequest>,
) -> ApiResult<PreviewResponse> {
    let result = state
        .orchestrator
        .preview(&req.config, &req.selection)
        .await
        .map_err(ApiError::with("Preview failed"))?;
    Ok(Json(PreviewResponse {
        message: "Preview generated successfully",
        preview: result.rows,
        row_count: result.row_count,
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResponse {
    message: &'static str,
    file_path: String,
    file_name: String,
    row_count: usize,
}

/// POST /api/clickhouse/export - Write the selection to a downloadable file
pub async fn export(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExportRequest>,
) -> ApiResult<ExportResponse> {
    let delimiter = parse_delimiter(req.delimiter.as_deref(), &state.default_delimiter)
        .map_err(ApiError::with("Export failed"))?;
    let result = state
        .orchestrator
        .export(&req.config, &req.selection, delimiter)
        .await
        .map_err(ApiError::with("Export failed"))?;
    Ok(Json(ExportResponse {
        message: "Data exported successfully",
        file_path: format!("/downloads/{}", result.file_name),
        file_name: result.file_name,
        row_count: result.row_count,
    }))
}

// ============================================================================
// Flat-file routes
// ============================================================================

/// POST /api/flatfile/schema - Columns detected in an uploaded file
pub async fn flatfile_schema(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    const FAILED: &str = "Error analyzing file schema";
    let mut form = UploadForm::read(multipart, &state.upload_dir)
        .await
        .map_err(ApiError::with(FAILED))?;
    let upload = form.take_file().map_err(ApiError::with(FAILED))?;
    let format = form
        .format(&state.default_delimiter)
        .map_err(ApiError::with(FAILED))?;

    let schema = state
        .orchestrator
        .flatfile_schema(upload.path(), format)
        .await
        .map_err(ApiError::with(FAILED))?;
    Ok(Json(json!({
        "message": "File schema analyzed successfully",
        "columns": schema.columns,
        "sampleCount": schema.sample_count,
    })))
}

/// POST /api/flatfile/preview - First rows of an uploaded file
pub async fn flatfile_preview(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    const FAILED: &str = "Error generating file preview";
    let mut form = UploadForm::read(multipart, &state.upload_dir)
        .await
        .map_err(ApiError::with(FAILED))?;
    let upload = form.take_file().map_err(ApiError::with(FAILED))?;
    let format = form
        .format(&state.default_delimiter)
        .map_err(ApiError::with(FAILED))?;
    let columns: Vec<String> = form.json("columns").map_err(ApiError::with(FAILED))?;

    let preview = state
        .orchestrator
        .flatfile_preview(upload.path(), format, &columns)
        .await
        .map_err(ApiError::with(FAILED))?;
    Ok(Json(json!({
        "message": "File preview generated successfully",
        "preview": preview.rows,
        "headers": preview.headers,
        "rowCount": preview.row_count,
        "totalRows": preview.total_rows,
        "selectedColumns": preview.selected_columns,
    })))
}

/// POST /api/flatfile/import - Load an uploaded file into a new table
pub async fn flatfile_import(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    const FAILED: &str = "Error importing data to ClickHouse";
    let mut form = UploadForm::read(multipart, &state.upload_dir)
        .await
        .map_err(ApiError::with(FAILED))?;
    let upload = form.take_file().map_err(ApiError::with(FAILED))?;
    let format = form
        .format(&state.default_delimiter)
        .map_err(ApiError::with(FAILED))?;
    let columns: Vec<String> = form.json("columns").map_err(ApiError::with(FAILED))?;
    let config: ConnectionConfig = form
        .json("clickhouseConfig")
        .map_err(ApiError::with(FAILED))?;

    let request = ImportRequest {
        format,
        columns,
        target_table: form.field("targetTable").unwrap_or_default().to_string(),
    };
    let result = state
        .orchestrator
        .import_upload(&config, upload, &request)
        .await
        .map_err(ApiError::with(FAILED))?;
    Ok(Json(json!({
        "message": format!(
            "Data imported successfully to table {}.{}",
            config.database, result.table
        ),
        "rowCount": result.row_count,
    })))
}

// ============================================================================
// Files and health
// ============================================================================

/// GET /downloads/{name} - Serve an export file from the holding directory
pub async fn download(State(state): State<Arc<AppState>>, Path(name): Path<String>) -> Response {
    if !is_servable_name(&name) {
        return StatusCode::NOT_FOUND.into_response();
    }
    let path = state.orchestrator.options().holding_dir.join(&name);
    match tokio::fs::read(&path).await {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{name}\""),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

/// GET /api/health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn parse_delimiter(requested: Option<&str>, default: &str) -> Result<Delimiter, TransferError> {
    let raw = match requested {
        Some(d) if !d.is_empty() => d,
        _ => default,
    };
    Ok(Delimiter::parse(raw)?)
}
