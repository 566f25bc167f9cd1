//! Transfer workflows.
//!
//! Each workflow is one sequential unit of work: validate the request,
//! build statements, talk to the database, then write or return the
//! result. Nothing is shared between invocations except the connection
//! factory and the export holding directory.

use std::collections::HashSet;
use std::fs;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::config::{ConnectionConfig, SettingsError, TransferSettings};
use crate::database::{value_to_field, ColumnInfo, ConnectionFactory, DatabaseProvider, Row};
use crate::flatfile::parser::normalize_header;
use crate::flatfile::writer::write_delimited;
use crate::flatfile::{
    create_export_file, Delimiter, FilePreview, FileSchema, FlatFileResult, InferredSchema,
    ParsedTable, PREVIEW_ROW_CAP,
};
use crate::sql::{validate_identifier, Dialect, IdentKind};

use super::builder::{build_create_table, build_insert, build_select};
use super::error::{Stage, TransferError, TransferResult};
use super::selection::{ResolvedSelection, Selection};
use super::upload::TempUpload;

// ============================================================================
// Options, requests and results
// ============================================================================

/// Where exports go and how many rows a preview returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOptions {
    pub holding_dir: PathBuf,
    pub preview_limit: u64,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            holding_dir: PathBuf::from("exports"),
            preview_limit: PREVIEW_ROW_CAP as u64,
        }
    }
}

impl TransferOptions {
    pub fn from_settings(settings: &TransferSettings) -> Result<Self, SettingsError> {
        Ok(Self {
            holding_dir: settings.resolved_holding_dir()?,
            preview_limit: settings.preview_limit,
        })
    }

    /// Preview row cap, never above [`PREVIEW_ROW_CAP`].
    pub fn preview_cap(&self) -> u64 {
        self.preview_limit.clamp(1, PREVIEW_ROW_CAP as u64)
    }
}

/// How to read an uploaded flat file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileFormat {
    pub delimiter: Delimiter,
    pub has_header: bool,
}

impl Default for FileFormat {
    fn default() -> Self {
        Self {
            delimiter: Delimiter::COMMA,
            has_header: true,
        }
    }
}

/// Import of selected file columns into a new table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRequest {
    pub format: FileFormat,
    pub columns: Vec<String>,
    pub target_table: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResult {
    pub rows: Vec<Row>,
    pub row_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResult {
    pub file_path: PathBuf,
    pub file_name: String,
    pub row_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub table: String,
    pub row_count: usize,
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Runs discovery, preview, export and import workflows.
#[derive(Clone)]
pub struct Orchestrator {
    factory: Arc<dyn ConnectionFactory>,
    options: TransferOptions,
}

impl Orchestrator {
    pub fn new(factory: Arc<dyn ConnectionFactory>, options: TransferOptions) -> Self {
        Self { factory, options }
    }

    pub fn options(&self) -> &TransferOptions {
        &self.options
    }

    fn connect(&self, config: &ConnectionConfig) -> TransferResult<Box<dyn DatabaseProvider>> {
        config.validate()?;
        self.factory
            .connect(config)
            .map_err(TransferError::at(Stage::Discovery))
    }

    /// Tables in the configured database.
    #[instrument(skip_all, fields(database = %config.database))]
    pub async fn list_tables(&self, config: &ConnectionConfig) -> TransferResult<Vec<String>> {
        let db = self.connect(config)?;
        let tables = db
            .list_tables(&config.database)
            .await
            .map_err(TransferError::at(Stage::Discovery))?;
        info!(count = tables.len(), "listed tables");
        Ok(tables)
    }

    /// Columns and types of `tables`, in table order.
    #[instrument(skip_all, fields(database = %config.database))]
    pub async fn list_columns(
        &self,
        config: &ConnectionConfig,
        tables: &[String],
    ) -> TransferResult<Vec<ColumnInfo>> {
        if tables.is_empty() {
            return Err(TransferError::configuration(
                "at least one table must be selected",
            ));
        }
        for table in tables {
            validate_identifier(IdentKind::Table, table)?;
        }

        let db = self.connect(config)?;
        let columns = db
            .list_columns(&config.database, tables)
            .await
            .map_err(TransferError::at(Stage::Discovery))?;
        info!(tables = tables.len(), columns = columns.len(), "listed columns");
        Ok(columns)
    }

    /// The first rows of the selection, keyed by alias.
    #[instrument(skip_all, fields(database = %config.database))]
    pub async fn preview(
        &self,
        config: &ConnectionConfig,
        selection: &Selection,
    ) -> TransferResult<PreviewResult> {
        config.validate()?;
        let resolved = ResolvedSelection::resolve(&config.database, selection)?;
        let cap = self.options.preview_cap();
        let sql = build_select(&resolved, Some(cap)).to_sql(Dialect::ClickHouse);
        debug!(%sql, "preview query");

        let db = self.connect(config)?;
        let rows = db
            .execute_query(&sql)
            .await
            .map_err(TransferError::at(Stage::Preview))?;

        let rows: Vec<Row> = rows
            .iter()
            .take(cap as usize)
            .map(|row| resolved.map_row(row))
            .collect();
        info!(rows = rows.len(), "preview complete");

        Ok(PreviewResult {
            row_count: rows.len(),
            rows,
        })
    }

    /// Run the selection uncapped and write the result to a new export file.
    #[instrument(skip_all, fields(database = %config.database))]
    pub async fn export(
        &self,
        config: &ConnectionConfig,
        selection: &Selection,
        delimiter: Delimiter,
    ) -> TransferResult<ExportResult> {
        config.validate()?;
        let resolved = ResolvedSelection::resolve(&config.database, selection)?;
        let sql = build_select(&resolved, None).to_sql(Dialect::ClickHouse);
        debug!(%sql, "export query");

        let db = self.connect(config)?;
        let rows = db
            .execute_query(&sql)
            .await
            .map_err(TransferError::at(Stage::Export))?;

        let headers = resolved.aliases();
        let records: Vec<Vec<String>> = rows
            .iter()
            .map(|row| resolved.map_row(row).values().map(value_to_field).collect())
            .collect();

        let dir = self.options.holding_dir.clone();
        let (file_path, row_count) =
            tokio::task::spawn_blocking(move || write_export(&dir, &headers, records, delimiter))
                .await
                .map_err(|e| TransferError::io("export writer stopped", io::Error::other(e)))??;

        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        info!(rows = row_count, file = %file_name, "export complete");

        Ok(ExportResult {
            file_path,
            file_name,
            row_count,
        })
    }

    /// Create the target table from the file's first row and insert every row.
    ///
    /// A table created here is left in place if the insert fails.
    #[instrument(skip_all, fields(database = %config.database, table = %request.target_table))]
    pub async fn import(
        &self,
        config: &ConnectionConfig,
        file: &Path,
        request: &ImportRequest,
    ) -> TransferResult<ImportResult> {
        config.validate()?;
        if request.columns.is_empty() {
            return Err(TransferError::configuration(
                "at least one column must be selected",
            ));
        }
        let target = request.target_table.trim();
        if target.is_empty() {
            return Err(TransferError::configuration("target table name is required"));
        }
        validate_identifier(IdentKind::Table, target)?;
        reject_duplicate_columns(&request.columns)?;

        let table = read_table(file, request.format).await?;
        let projection = table.project(&request.columns);
        let schema = projection
            .first_row()
            .map(InferredSchema::from_row)
            .ok_or(TransferError::EmptyFile)?;

        let create = build_create_table(&config.database, target, &schema)?
            .to_sql(Dialect::ClickHouse);
        let insert = build_insert(&config.database, target, &projection, &schema)?;
        let row_count = insert.row_count();
        let insert = insert.to_sql(Dialect::ClickHouse);

        let db = self.connect(config)?;
        debug!(sql = %create, "create table");
        db.execute_statement(&create)
            .await
            .map_err(TransferError::at(Stage::CreateTable))?;
        db.execute_statement(&insert)
            .await
            .map_err(TransferError::at(Stage::Insert))?;
        info!(rows = row_count, "import complete");

        Ok(ImportResult {
            table: target.to_string(),
            row_count,
        })
    }

    /// [`import`](Self::import) from an upload, which is removed afterwards
    /// whether or not the import succeeded.
    pub async fn import_upload(
        &self,
        config: &ConnectionConfig,
        upload: TempUpload,
        request: &ImportRequest,
    ) -> TransferResult<ImportResult> {
        let result = self.import(config, upload.path(), request).await;
        drop(upload);
        result
    }

    /// Column names detected in a file.
    pub async fn flatfile_schema(&self, file: &Path, format: FileFormat) -> TransferResult<FileSchema> {
        let table = read_table(file, format).await?;
        let schema = table.schema();
        info!(columns = schema.columns.len(), "read file schema");
        Ok(schema)
    }

    /// The first rows of a file, restricted to `columns` when non-empty.
    pub async fn flatfile_preview(
        &self,
        file: &Path,
        format: FileFormat,
        columns: &[String],
    ) -> TransferResult<FilePreview> {
        let table = read_table(file, format).await?;
        let preview = table.preview(columns, self.options.preview_cap() as usize);
        info!(rows = preview.row_count, total = preview.total_rows, "file preview complete");
        Ok(preview)
    }
}

/// Selected import columns must stay distinct after normalization.
fn reject_duplicate_columns(columns: &[String]) -> TransferResult<()> {
    let mut seen = HashSet::new();
    for column in columns {
        let key = normalize_header(column);
        if !seen.insert(key.clone()) {
            return Err(TransferError::configuration(format!(
                "column {column:?} is selected more than once (as {key:?})"
            )));
        }
    }
    Ok(())
}

async fn read_table(file: &Path, format: FileFormat) -> TransferResult<ParsedTable> {
    let text = tokio::fs::read_to_string(file)
        .await
        .map_err(|e| TransferError::io(format!("failed to read {}", file.display()), e))?;
    Ok(ParsedTable::parse(&text, format.delimiter, format.has_header)?)
}

fn write_export(
    dir: &Path,
    headers: &[String],
    records: Vec<Vec<String>>,
    delimiter: Delimiter,
) -> FlatFileResult<(PathBuf, usize)> {
    let (path, file) = create_export_file(dir)?;
    match write_delimited(BufWriter::new(file), &path, headers, records, delimiter) {
        Ok(count) => Ok((path, count)),
        Err(e) => {
            if let Err(rm) = fs::remove_file(&path) {
                warn!(path = %path.display(), error = %rm, "failed to remove partial export");
            }
            Err(e)
        }
    }
}
