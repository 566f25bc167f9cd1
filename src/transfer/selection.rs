//! Validated table and column selections.
//!
//! A [`Selection`] arrives from the caller; [`ResolvedSelection`] is what the
//! query builder and the row mapper both read, so the aliases a query emits
//! and the keys a result row is read back with cannot drift apart.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::alias::{resolve_aliases, AliasedColumn, ColumnRef};
use super::error::{TransferError, TransferResult};
use crate::database::Row;
use crate::sql::{validate_identifier, IdentKind, JoinPredicate};

/// Tables, columns and join conditions as chosen by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    /// Tables in join order; the first is the anchor.
    #[serde(default)]
    pub tables: Vec<String>,
    #[serde(default)]
    pub columns: Vec<ColumnRef>,
    /// One predicate applied to every joined table.
    #[serde(default)]
    pub join_condition: Option<String>,
    /// Per-table predicates; takes precedence over `join_condition`.
    #[serde(default)]
    pub joins: Option<Vec<JoinSpec>>,
}

/// A predicate for joining one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinSpec {
    pub table: String,
    pub on: String,
}

impl JoinSpec {
    pub fn new(table: impl Into<String>, on: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            on: on.into(),
        }
    }
}

// ============================================================================
// Join plan
// ============================================================================

/// One joined table and the predicate it is joined on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinStep {
    pub table: String,
    pub predicate: JoinPredicate,
}

/// Ordered joins for every non-anchor table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinPlan {
    steps: Vec<JoinStep>,
}

impl JoinPlan {
    /// Build the plan for `tables`.
    ///
    /// Explicit `joins` must list the non-anchor tables in order. Otherwise
    /// `condition` is applied to each of them. A single table needs no plan.
    pub fn build(
        tables: &[String],
        condition: Option<&str>,
        joins: Option<&[JoinSpec]>,
    ) -> TransferResult<Self> {
        let joined = tables.get(1..).unwrap_or_default();
        let explicit = joins.filter(|j| !j.is_empty());

        if joined.is_empty() {
            if explicit.is_some() {
                return Err(TransferError::configuration(
                    "joins were given but only one table is selected",
                ));
            }
            return Ok(Self::default());
        }

        let steps = match explicit {
            Some(joins) => {
                if joins.len() != joined.len() {
                    return Err(TransferError::configuration(format!(
                        "expected {} join(s), one per table after the first, got {}",
                        joined.len(),
                        joins.len()
                    )));
                }
                joined
                    .iter()
                    .zip(joins)
                    .map(|(table, spec)| {
                        if spec.table != *table {
                            return Err(TransferError::configuration(format!(
                                "join for {:?} listed where {:?} was expected",
                                spec.table, table
                            )));
                        }
                        Ok(JoinStep {
                            table: table.clone(),
                            predicate: JoinPredicate::parse(&spec.on)?,
                        })
                    })
                    .collect::<TransferResult<Vec<_>>>()?
            }
            None => {
                let text = condition
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .ok_or(TransferError::MissingJoinCondition)?;
                let predicate = JoinPredicate::parse(text)?;
                joined
                    .iter()
                    .map(|table| JoinStep {
                        table: table.clone(),
                        predicate: predicate.clone(),
                    })
                    .collect()
            }
        };

        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[JoinStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

// ============================================================================
// Resolved selection
// ============================================================================

/// A selection whose names are validated and whose aliases are fixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSelection {
    database: String,
    tables: Vec<String>,
    columns: Vec<AliasedColumn>,
    joins: JoinPlan,
}

impl ResolvedSelection {
    /// Validate `selection` against `database` and assign aliases.
    pub fn resolve(database: &str, selection: &Selection) -> TransferResult<Self> {
        if selection.tables.is_empty() {
            return Err(TransferError::configuration("at least one table must be selected"));
        }
        if selection.columns.is_empty() {
            return Err(TransferError::configuration("at least one column must be selected"));
        }

        validate_identifier(IdentKind::Database, database)?;
        let mut seen = HashSet::new();
        for table in &selection.tables {
            validate_identifier(IdentKind::Table, table)?;
            if !seen.insert(table.as_str()) {
                return Err(TransferError::configuration(format!(
                    "table {table:?} is selected more than once"
                )));
            }
        }

        let columns = resolve_aliases(&selection.columns, selection.tables.len())?;
        for c in &columns {
            if !seen.contains(c.table.as_str()) {
                return Err(TransferError::configuration(format!(
                    "column {:?} belongs to table {:?}, which is not selected",
                    c.column, c.table
                )));
            }
            validate_identifier(IdentKind::Column, &c.column)?;
        }

        let joins = JoinPlan::build(
            &selection.tables,
            selection.join_condition.as_deref(),
            selection.joins.as_deref(),
        )?;

        Ok(Self {
            database: database.to_string(),
            tables: selection.tables.clone(),
            columns,
            joins,
        })
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// The anchor table every other table is joined onto.
    pub fn anchor(&self) -> &str {
        &self.tables[0]
    }

    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    pub fn columns(&self) -> &[AliasedColumn] {
        &self.columns
    }

    pub fn joins(&self) -> &JoinPlan {
        &self.joins
    }

    /// Output column names, in selection order.
    pub fn aliases(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.alias.clone()).collect()
    }

    /// Re-key a result row by alias, in selection order.
    ///
    /// Looks up the alias, then `<table>_<column>`, then the bare column
    /// name. A column found under none of them is null.
    pub fn map_row(&self, row: &Row) -> Row {
        self.columns
            .iter()
            .map(|c| {
                let value = row
                    .get(&c.alias)
                    .or_else(|| row.get(&format!("{}_{}", c.table, c.column)))
                    .or_else(|| row.get(&c.column))
                    .cloned()
                    .unwrap_or(Value::Null);
                (c.alias.clone(), value)
            })
            .collect()
    }
}
