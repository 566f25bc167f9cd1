//! ClickHouse SQL dialect.
//!
//! ClickHouse differences from ANSI:
//! - Backtick identifier quoting (`` `name` ``), double quotes also accepted
//! - Backslash is an escape character inside string literals
//! - Booleans are `Bool`/`UInt8`; `true`/`false` literals are accepted
//! - Tables need an `ENGINE = ...` clause and (for MergeTree) an ORDER BY key
//! - `JOIN` without a qualifier means `INNER JOIN`

use super::helpers;
use super::SqlDialect;
use crate::sql::token::TokenStream;
use crate::sql::types::DataType;

/// ClickHouse SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct ClickHouse;

impl SqlDialect for ClickHouse {
    fn name(&self) -> &'static str {
        "clickhouse"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_backtick(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_backslash_aware(s)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_literal(b)
    }

    fn emit_limit(&self, limit: u64) -> TokenStream {
        helpers::emit_limit_standard(limit)
    }

    fn emit_data_type(&self, dt: &DataType) -> String {
        helpers::emit_data_type_clickhouse(dt)
    }

    fn requires_table_engine(&self) -> bool {
        true
    }
}
