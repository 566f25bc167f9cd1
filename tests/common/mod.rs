//! In-memory database shared by the integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;

use flatbridge::config::ConnectionConfig;
use flatbridge::database::{
    ColumnInfo, ConnectionFactory, DatabaseError, DatabaseProvider, DatabaseResult, Row,
};
use flatbridge::transfer::{Orchestrator, TransferOptions};

#[derive(Default)]
pub struct MockState {
    pub tables: BTreeMap<String, Vec<(String, String)>>,
    pub rows: Vec<Row>,
    pub queries: Vec<String>,
    pub statements: Vec<String>,
    pub connects: usize,
    /// Statements starting with this prefix fail with the given message.
    pub fail_on: Option<(String, String)>,
}

/// A database that records what it is sent and answers from memory.
#[derive(Clone, Default)]
pub struct MockDatabase {
    state: Arc<Mutex<MockState>>,
}

impl MockDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(self, name: &str, columns: &[(&str, &str)]) -> Self {
        self.state().tables.insert(
            name.to_string(),
            columns
                .iter()
                .map(|(n, t)| (n.to_string(), t.to_string()))
                .collect(),
        );
        self
    }

    /// Rows returned by every query.
    pub fn with_rows(self, rows: Vec<Value>) -> Self {
        self.state().rows = rows
            .into_iter()
            .map(|v| match v {
                Value::Object(map) => map,
                other => panic!("mock rows must be objects, got {other}"),
            })
            .collect();
        self
    }

    pub fn failing_on(self, prefix: &str, message: &str) -> Self {
        self.state().fail_on = Some((prefix.to_string(), message.to_string()));
        self
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn queries(&self) -> Vec<String> {
        self.state().queries.clone()
    }

    pub fn statements(&self) -> Vec<String> {
        self.state().statements.clone()
    }
}

#[async_trait]
impl DatabaseProvider for MockDatabase {
    async fn list_tables(&self, _database: &str) -> DatabaseResult<Vec<String>> {
        Ok(self.state().tables.keys().cloned().collect())
    }

    async fn list_columns(
        &self,
        _database: &str,
        tables: &[String],
    ) -> DatabaseResult<Vec<ColumnInfo>> {
        let state = self.state();
        let mut out = Vec::new();
        for table in tables {
            let columns = state.tables.get(table).ok_or_else(|| {
                DatabaseError::server(404, format!("Table {table} does not exist"))
            })?;
            out.extend(
                columns
                    .iter()
                    .map(|(name, ty)| ColumnInfo::new(table.as_str(), name.as_str(), ty.as_str())),
            );
        }
        Ok(out)
    }

    async fn execute_query(&self, sql: &str) -> DatabaseResult<Vec<Row>> {
        let mut state = self.state();
        state.queries.push(sql.to_string());
        Ok(state.rows.clone())
    }

    async fn execute_statement(&self, sql: &str) -> DatabaseResult<()> {
        let mut state = self.state();
        state.statements.push(sql.to_string());
        if let Some((prefix, message)) = &state.fail_on {
            if sql.starts_with(prefix.as_str()) {
                return Err(DatabaseError::server(500, message.as_str()));
            }
        }
        Ok(())
    }
}

/// Hands out the same [`MockDatabase`] for every connection.
pub struct MockFactory {
    pub db: MockDatabase,
}

impl ConnectionFactory for MockFactory {
    fn connect(&self, config: &ConnectionConfig) -> DatabaseResult<Box<dyn DatabaseProvider>> {
        config.validate()?;
        self.db.state().connects += 1;
        Ok(Box::new(self.db.clone()))
    }
}

pub fn config() -> ConnectionConfig {
    ConnectionConfig::new("localhost", "db")
}

pub fn orchestrator(db: &MockDatabase, holding_dir: &std::path::Path) -> Orchestrator {
    Orchestrator::new(
        Arc::new(MockFactory { db: db.clone() }),
        TransferOptions {
            holding_dir: holding_dir.to_path_buf(),
            ..TransferOptions::default()
        },
    )
}

/// `n` rows of `{id, amount}`.
pub fn numbered_rows(n: usize) -> Vec<Value> {
    (1..=n)
        .map(|i| serde_json::json!({ "id": i.to_string(), "amount": i as f64 * 1.5 }))
        .collect()
}
