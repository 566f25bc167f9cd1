//! SQL-level data types for DDL generation.
//!
//! Imported tables only ever carry the four column types the inferencer can
//! produce. Rendering to a concrete type name is the dialect's job
//! (see [`crate::sql::dialect::SqlDialect::emit_data_type`]).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Column type of a table created by an import.
///
/// # Examples
///
/// ```ignore
/// use flatbridge::sql::types::DataType;
///
/// assert_eq!(DataType::parse("Float64"), Some(DataType::Float64));
/// assert!(DataType::UInt8.is_bare_literal());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// 64-bit floating point. Every finite number lands here.
    Float64,

    /// Unsigned byte, used for `true`/`false` columns.
    UInt8,

    /// Calendar date or timestamp.
    DateTime,

    /// Anything else, including empty values.
    String,
}

impl DataType {
    /// Parse a type name as reported by ClickHouse `system.columns`.
    ///
    /// Wrappers such as `Nullable(...)` and `LowCardinality(...)` are
    /// unwrapped. Returns `None` for types outside the import vocabulary.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let inner = strip_wrapper(s, "Nullable")
            .or_else(|| strip_wrapper(s, "LowCardinality"))
            .unwrap_or(s);
        if inner != s {
            return Self::parse(inner);
        }

        match inner {
            "Float64" => Some(DataType::Float64),
            "UInt8" | "Bool" => Some(DataType::UInt8),
            "String" => Some(DataType::String),
            _ if inner.starts_with("DateTime") => Some(DataType::DateTime),
            _ => None,
        }
    }

    /// Whether values of this type are written as bare (unquoted) tokens in
    /// `INSERT ... VALUES`.
    pub fn is_bare_literal(&self) -> bool {
        matches!(self, DataType::Float64 | DataType::UInt8)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Float64 => write!(f, "Float64"),
            DataType::UInt8 => write!(f, "UInt8"),
            DataType::DateTime => write!(f, "DateTime"),
            DataType::String => write!(f, "String"),
        }
    }
}

/// `Wrapper(inner)` -> `inner`
fn strip_wrapper<'a>(s: &'a str, wrapper: &str) -> Option<&'a str> {
    s.strip_prefix(wrapper)?
        .strip_prefix('(')?
        .strip_suffix(')')
        .map(str::trim)
}
