//! DDL (Data Definition Language) support.
//!
//! Only `CREATE TABLE` is needed: imports create their destination table
//! when it is absent and never alter or drop it afterwards.
//!
//! # Examples
//!
//! ```ignore
//! use flatbridge::sql::ddl::{CreateTable, ColumnDef, DataType, TableEngine};
//! use flatbridge::sql::dialect::Dialect;
//!
//! let table = CreateTable::new("events")
//!     .schema("analytics")
//!     .if_not_exists()
//!     .column(ColumnDef::new("id", DataType::Float64))
//!     .engine(TableEngine::merge_tree());
//!
//! println!("{}", table.to_sql(Dialect::ClickHouse));
//! ```

use super::dialect::{Dialect, SqlDialect};
use super::token::{Token, TokenStream};

pub use super::types::DataType;

// ============================================================================
// CREATE TABLE
// ============================================================================

/// CREATE TABLE statement.
#[derive(Debug, Clone)]
#[must_use = "DDL statements have no effect until converted to SQL with to_sql()"]
pub struct CreateTable {
    pub if_not_exists: bool,
    pub schema: Option<String>,
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub engine: Option<TableEngine>,
}

impl CreateTable {
    /// Create a new CREATE TABLE statement.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            if_not_exists: false,
            schema: None,
            name: name.into(),
            columns: Vec::new(),
            engine: None,
        }
    }

    /// Set the schema (database).
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Add IF NOT EXISTS clause.
    pub fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    /// Add a column definition.
    pub fn column(mut self, col: ColumnDef) -> Self {
        self.columns.push(col);
        self
    }

    /// Add multiple column definitions.
    pub fn columns(mut self, cols: impl IntoIterator<Item = ColumnDef>) -> Self {
        self.columns.extend(cols);
        self
    }

    /// Set the storage engine.
    pub fn engine(mut self, engine: TableEngine) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Convert to SQL for the given dialect.
    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.to_tokens(dialect).serialize(dialect)
    }

    /// Convert to token stream.
    ///
    /// Dialects that require an engine get the default MergeTree engine
    /// when none was set.
    pub fn to_tokens(&self, dialect: Dialect) -> TokenStream {
        let mut ts = TokenStream::new();

        // CREATE TABLE
        ts.push(Token::Create).space().push(Token::Table);

        // IF NOT EXISTS (dialect-specific)
        if self.if_not_exists && dialect.supports_if_not_exists() {
            ts.space()
                .push(Token::If)
                .space()
                .push(Token::Not)
                .space()
                .push(Token::Exists);
        }

        // Table name
        ts.space();
        ts.push(Token::QualifiedIdent {
            schema: self.schema.clone(),
            name: self.name.clone(),
        });

        // Column definitions
        ts.space().lparen();
        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                ts.comma().space();
            }
            ts.append(&col.to_tokens(dialect));
        }
        ts.rparen();

        // ENGINE = ...
        let default_engine = TableEngine::merge_tree();
        let engine = match &self.engine {
            Some(engine) => Some(engine),
            None if dialect.requires_table_engine() => Some(&default_engine),
            None => None,
        };
        if let Some(engine) = engine {
            ts.space().append(&engine.to_tokens());
        }

        ts
    }
}

/// Column definition for CREATE TABLE.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: DataType,
}

impl ColumnDef {
    /// Create a new column definition.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }

    /// Convert to token stream.
    pub fn to_tokens(&self, dialect: Dialect) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.push(Token::Ident(self.name.clone()))
            .space()
            .push(Token::Raw(dialect.emit_data_type(&self.data_type)));
        ts
    }
}

// ============================================================================
// Table engines
// ============================================================================

/// Storage engine clause.
#[derive(Debug, Clone, PartialEq)]
pub enum TableEngine {
    /// `ENGINE = MergeTree() ORDER BY ...`; an empty key renders `tuple()`.
    MergeTree { order_by: Vec<String> },
}

impl TableEngine {
    /// Append-only MergeTree with the trivial ordering key.
    pub fn merge_tree() -> Self {
        TableEngine::MergeTree {
            order_by: Vec::new(),
        }
    }

    /// Convert to token stream.
    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();
        match self {
            TableEngine::MergeTree { order_by } => {
                ts.push(Token::Engine)
                    .space()
                    .push(Token::Eq)
                    .space()
                    .push(Token::FunctionName("MergeTree".into()))
                    .lparen()
                    .rparen()
                    .space()
                    .push(Token::OrderBy)
                    .space();

                match order_by.as_slice() {
                    [] => {
                        ts.push(Token::FunctionName("tuple".into())).lparen().rparen();
                    }
                    [single] => {
                        ts.push(Token::Ident(single.clone()));
                    }
                    many => {
                        ts.lparen();
                        for (i, col) in many.iter().enumerate() {
                            if i > 0 {
                                ts.comma().space();
                            }
                            ts.push(Token::Ident(col.clone()));
                        }
                        ts.rparen();
                    }
                }
            }
        }
        ts
    }
}
