//! Identifier allow-listing.
//!
//! Every database, table and column name that reaches a statement passes
//! through [`validate_identifier`] before it is quoted by the dialect.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Longest identifier accepted.
pub const MAX_IDENTIFIER_LEN: usize = 255;

/// Letters, digits, `_` and `$` at both ends; `-`, `.` and inner spaces in
/// between (CSV headers such as `order id` are common).
static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\p{L}\p{N}_$](?:[\p{L}\p{N}_$ .\-]*[\p{L}\p{N}_$])?$")
        .expect("identifier pattern is valid")
});

/// A name that cannot be used as a SQL identifier.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid {kind} name {name:?}: {reason}")]
pub struct InvalidIdentifier {
    pub kind: IdentKind,
    pub name: String,
    pub reason: &'static str,
}

/// What an identifier names; used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentKind {
    Database,
    Table,
    Column,
}

impl std::fmt::Display for IdentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentKind::Database => write!(f, "database"),
            IdentKind::Table => write!(f, "table"),
            IdentKind::Column => write!(f, "column"),
        }
    }
}

/// Check a name against the identifier allow-list.
pub fn validate_identifier(kind: IdentKind, name: &str) -> Result<(), InvalidIdentifier> {
    let fail = |reason| InvalidIdentifier {
        kind,
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(fail("must not be empty"));
    }
    if name.len() > MAX_IDENTIFIER_LEN {
        return Err(fail("longer than 255 bytes"));
    }
    if !IDENTIFIER.is_match(name) {
        return Err(fail(
            "only letters, digits, '_', '$', '-', '.' and inner spaces are allowed",
        ));
    }
    Ok(())
}
