//! SQL generation module.
//!
//! A small, type-safe SQL builder for the statements a transfer emits:
//!
//! - [`query`] - SELECT with aliased columns, joins and LIMIT
//! - [`ddl`] - CREATE TABLE for import targets
//! - [`dml`] - multi-row INSERT
//! - [`expr`] - column references, literals and validated predicates
//! - [`ident`] / [`predicate`] - identifier allow-list and join predicate checks
//! - [`token`] - Token types for SQL generation
//! - [`dialect`] - SQL dialect implementations

pub mod ddl;
pub mod dialect;
pub mod dml;
pub mod expr;
pub mod ident;
pub mod predicate;
pub mod query;
pub mod token;
pub mod types;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types at the sql module level
pub use dialect::{Dialect, SqlDialect};
pub use expr::{col, lit_bool, lit_bool_text, lit_numeric, lit_str, table_col, Expr, Literal};
pub use ident::{validate_identifier, IdentKind, InvalidIdentifier};
pub use predicate::{InvalidPredicate, JoinPredicate};
pub use query::{Join, Query, SelectExpr, TableRef};
pub use token::{Token, TokenStream};
pub use types::DataType;

pub use ddl::{ColumnDef, CreateTable, TableEngine};
pub use dml::Insert;
