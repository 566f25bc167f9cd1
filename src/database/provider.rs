//! DatabaseProvider and ConnectionFactory trait definitions.
//!
//! The transfer workflows only ever talk to a database through these
//! traits, so tests can swap in an in-memory implementation.

use async_trait::async_trait;

use super::error::DatabaseResult;
use super::types::{ColumnInfo, Row};
use crate::config::ConnectionConfig;

/// Trait for talking to the database.
///
/// # Example
///
/// ```ignore
/// use flatbridge::database::DatabaseProvider;
///
/// async fn example(db: &dyn DatabaseProvider) -> DatabaseResult<()> {
///     let tables = db.list_tables("analytics").await?;
///     let columns = db.list_columns("analytics", &tables).await?;
///     let rows = db.execute_query("SELECT 1 AS `x`").await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait DatabaseProvider: Send + Sync {
    /// List table names in a database.
    async fn list_tables(&self, database: &str) -> DatabaseResult<Vec<String>>;

    /// List columns and their types for each table, in table order.
    async fn list_columns(
        &self,
        database: &str,
        tables: &[String],
    ) -> DatabaseResult<Vec<ColumnInfo>>;

    /// Run a query and return its rows.
    async fn execute_query(&self, sql: &str) -> DatabaseResult<Vec<Row>>;

    /// Run a statement that returns no rows (DDL, INSERT).
    async fn execute_statement(&self, sql: &str) -> DatabaseResult<()>;
}

/// Builds one short-lived provider per workflow invocation.
///
/// Every call site that needs a database goes through a factory, so
/// connection construction is defined in exactly one place.
pub trait ConnectionFactory: Send + Sync {
    /// Validate `config` and create a provider for it.
    fn connect(&self, config: &ConnectionConfig) -> DatabaseResult<Box<dyn DatabaseProvider>>;
}
