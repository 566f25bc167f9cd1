//! ClickHouse provider over the HTTP interface.
//!
//! Statements are POSTed as the request body. Queries get `FORMAT JSON`
//! appended and their `data` array is decoded into rows. Discovery queries
//! bind names through ClickHouse query parameters (`{db:String}` with a
//! `param_db` URL parameter) rather than splicing them into SQL.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use super::error::{DatabaseError, DatabaseResult};
use super::provider::{ConnectionFactory, DatabaseProvider};
use super::types::{ColumnInfo, Row};
use crate::config::ConnectionConfig;

const LIST_TABLES_SQL: &str =
    "SELECT name FROM system.tables WHERE database = {db:String} ORDER BY name";

const LIST_COLUMNS_SQL: &str = "SELECT name, type FROM system.columns \
     WHERE database = {db:String} AND table = {table:String} ORDER BY position";

/// Settings sent with every statement. Imported DateTime values arrive in
/// the shapes inference accepts (ISO 8601, RFC 2822, `MM/DD/YYYY`, ...),
/// which the default `basic` input format rejects.
const STATEMENT_SETTINGS: &[(&str, &str)] = &[("date_time_input_format", "best_effort")];

/// Body of a `FORMAT JSON` response. Only the rows are used.
#[derive(Debug, Deserialize)]
struct JsonResponse {
    #[serde(default)]
    data: Vec<Row>,
}

// ============================================================================
// Provider
// ============================================================================

/// A provider bound to one ClickHouse server and database.
pub struct ClickHouseProvider {
    client: Client,
    base_url: Url,
    database: String,
    user: String,
    token: Option<String>,
}

impl ClickHouseProvider {
    /// Build a provider from a validated connection config.
    pub fn new(client: Client, config: &ConnectionConfig) -> DatabaseResult<Self> {
        config.validate()?;
        Ok(Self {
            client,
            base_url: config.base_url()?,
            database: config.database.clone(),
            user: config.user().to_string(),
            token: config.token.clone().filter(|t| !t.is_empty()),
        })
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn request(&self, sql: String, params: &[(&str, &str)]) -> RequestBuilder {
        self.client
            .post(self.base_url.clone())
            .basic_auth(&self.user, self.token.as_deref())
            .query(&[("database", self.database.as_str())])
            .query(params)
            .body(sql)
    }

    fn statement_request(&self, sql: &str) -> RequestBuilder {
        self.request(sql.to_string(), STATEMENT_SETTINGS)
    }

    async fn send(&self, request: RequestBuilder) -> DatabaseResult<String> {
        let response = request.send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(DatabaseError::server(status.as_u16(), body));
        }
        Ok(body)
    }

    async fn query_with_params(
        &self,
        sql: &str,
        params: &[(&str, &str)],
    ) -> DatabaseResult<Vec<Row>> {
        let body = self.send(self.request(with_json_format(sql), params)).await?;
        decode_rows(&body)
    }
}

#[async_trait]
impl DatabaseProvider for ClickHouseProvider {
    #[instrument(skip(self))]
    async fn list_tables(&self, database: &str) -> DatabaseResult<Vec<String>> {
        let rows = self
            .query_with_params(LIST_TABLES_SQL, &[("param_db", database)])
            .await?;
        Ok(rows
            .iter()
            .filter_map(|row| string_field(row, "name"))
            .collect())
    }

    #[instrument(skip(self))]
    async fn list_columns(
        &self,
        database: &str,
        tables: &[String],
    ) -> DatabaseResult<Vec<ColumnInfo>> {
        let mut columns = Vec::new();
        for table in tables {
            let rows = self
                .query_with_params(
                    LIST_COLUMNS_SQL,
                    &[("param_db", database), ("param_table", table.as_str())],
                )
                .await?;
            columns.extend(columns_from_rows(table, &rows));
        }
        Ok(columns)
    }

    async fn execute_query(&self, sql: &str) -> DatabaseResult<Vec<Row>> {
        debug!(%sql, "executing query");
        self.query_with_params(sql, &[]).await
    }

    async fn execute_statement(&self, sql: &str) -> DatabaseResult<()> {
        debug!(sql = %truncate(sql, 500), "executing statement");
        self.send(self.statement_request(sql)).await?;
        Ok(())
    }
}

// ============================================================================
// Factory
// ============================================================================

/// Creates [`ClickHouseProvider`]s that share one HTTP connection pool.
///
/// Credentials live on each provider, never on the shared client.
#[derive(Clone)]
pub struct ClickHouseConnectionFactory {
    client: Client,
}

impl ClickHouseConnectionFactory {
    /// Create a factory whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> DatabaseResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl ConnectionFactory for ClickHouseConnectionFactory {
    fn connect(&self, config: &ConnectionConfig) -> DatabaseResult<Box<dyn DatabaseProvider>> {
        let provider = ClickHouseProvider::new(self.client.clone(), config)?;
        debug!(url = %provider.base_url(), database = %config.database, "connected");
        Ok(Box::new(provider))
    }
}

// ============================================================================
// Response handling
// ============================================================================

fn with_json_format(sql: &str) -> String {
    let sql = sql.trim_end().trim_end_matches(';').trim_end();
    format!("{sql} FORMAT JSON")
}

fn decode_rows(body: &str) -> DatabaseResult<Vec<Row>> {
    serde_json::from_str::<JsonResponse>(body)
        .map(|r| r.data)
        .map_err(DatabaseError::Decode)
}

fn string_field(row: &Row, key: &str) -> Option<String> {
    match row.get(key)? {
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn columns_from_rows(table: &str, rows: &[Row]) -> Vec<ColumnInfo> {
    rows.iter()
        .filter_map(|row| {
            Some(ColumnInfo::new(
                table,
                string_field(row, "name")?,
                string_field(row, "type")?,
            ))
        })
        .collect()
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
