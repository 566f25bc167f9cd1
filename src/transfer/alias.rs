//! Output column aliasing.
//!
//! With one table, a column keeps its own name. With several, it becomes
//! `<table>_<column>`. When two selections would still share an alias
//! (the same column picked twice, or `a_b.c` next to `a.b_c`), later ones
//! get `_2`, `_3`, ... appended so every alias in a query is distinct.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::error::{TransferError, TransferResult};

/// A column picked by the user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

impl ColumnRef {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

/// A column with the name it takes in query output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AliasedColumn {
    pub table: String,
    pub column: String,
    pub alias: String,
}

/// Assign output aliases to `refs`, preserving order.
///
/// `table_count` is the number of tables in the query, which decides
/// whether aliases are table-qualified.
pub fn resolve_aliases(refs: &[ColumnRef], table_count: usize) -> TransferResult<Vec<AliasedColumn>> {
    let mut used = HashSet::with_capacity(refs.len());
    let mut out = Vec::with_capacity(refs.len());

    for (index, r) in refs.iter().enumerate() {
        if r.table.trim().is_empty() || r.column.trim().is_empty() {
            return Err(TransferError::InvalidColumnSpec { index });
        }

        let base = base_alias(r, table_count);
        let mut alias = base.clone();
        let mut n = 2;
        while used.contains(&alias) {
            alias = format!("{base}_{n}");
            n += 1;
        }
        used.insert(alias.clone());

        out.push(AliasedColumn {
            table: r.table.clone(),
            column: r.column.clone(),
            alias,
        });
    }

    Ok(out)
}

fn base_alias(r: &ColumnRef, table_count: usize) -> String {
    if table_count > 1 {
        format!("{}_{}", r.table, r.column)
    } else {
        r.column.clone()
    }
}
