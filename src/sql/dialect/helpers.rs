//! Shared helper functions for SQL dialect implementations.
//!
//! This module provides reusable building blocks that dialects can compose
//! to implement the `SqlDialect` trait with minimal duplication.

use super::super::token::{Token, TokenStream};
use super::super::types::DataType;

// =============================================================================
// Identifier Quoting
// =============================================================================

/// Quote identifier with backticks.
/// Used by: ClickHouse
pub fn quote_backtick(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

// =============================================================================
// String Quoting
// =============================================================================

/// Quote string with single quotes (standard SQL).
pub fn quote_string_single(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Quote string with single quotes for dialects where backslash is an
/// escape character inside literals.
/// Used by: ClickHouse
pub fn quote_string_backslash_aware(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "''"))
}

// =============================================================================
// Boolean Formatting
// =============================================================================

/// Format boolean as literal true/false.
/// Used by: ClickHouse
pub fn format_bool_literal(b: bool) -> &'static str {
    if b {
        "true"
    } else {
        "false"
    }
}

// =============================================================================
// Row caps
// =============================================================================

/// Emit `LIMIT n`.
/// Used by: ClickHouse
pub fn emit_limit_standard(limit: u64) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(Token::Limit)
        .space()
        .push(Token::LitInt(limit as i64));
    ts
}

// =============================================================================
// Data Types
// =============================================================================

/// Emit a column type using ClickHouse type names.
pub fn emit_data_type_clickhouse(dt: &DataType) -> String {
    match dt {
        DataType::Float64 => "Float64".into(),
        DataType::UInt8 => "UInt8".into(),
        DataType::DateTime => "DateTime".into(),
        DataType::String => "String".into(),
    }
}
