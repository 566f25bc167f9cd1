//! Statements for the transfer workflows.
//!
//! - [`build_select`] - preview and export query for a resolved selection
//! - [`build_create_table`] / [`build_insert`] - import target and rows

use crate::flatfile::{InferredSchema, Projection};
use crate::sql::{
    lit_bool_text, lit_numeric, lit_str, table_col, validate_identifier, ColumnDef, CreateTable,
    DataType, Expr, IdentKind, Insert, Query, SelectExpr, TableRef,
};

use super::error::TransferResult;
use super::selection::ResolvedSelection;

/// SELECT every aliased column, joining tables in plan order.
pub fn build_select(selection: &ResolvedSelection, limit: Option<u64>) -> Query {
    let db = selection.database();

    let select: Vec<SelectExpr> = selection
        .columns()
        .iter()
        .map(|c| SelectExpr::new(table_col(&c.table, &c.column)).with_alias(&c.alias))
        .collect();

    let mut query = Query::new()
        .select(select)
        .from(TableRef::new(selection.anchor()).with_schema(db));

    for step in selection.joins().steps() {
        query = query.inner_join(
            TableRef::new(&step.table).with_schema(db),
            Expr::from(step.predicate.clone()),
        );
    }

    match limit {
        Some(n) => query.limit(n),
        None => query,
    }
}

/// CREATE TABLE IF NOT EXISTS with one column per inferred type.
pub fn build_create_table(
    database: &str,
    table: &str,
    schema: &InferredSchema,
) -> TransferResult<CreateTable> {
    validate_target(database, table)?;
    let mut columns = Vec::with_capacity(schema.len());
    for (name, ty) in schema.iter() {
        validate_identifier(IdentKind::Column, name)?;
        columns.push(ColumnDef::new(name, ty));
    }

    Ok(CreateTable::new(table)
        .schema(database)
        .if_not_exists()
        .columns(columns))
}

/// One multi-row INSERT for every projected row.
///
/// Values of numeric and boolean columns are written bare only when they
/// still read as a number or `true`/`false`; anything else is quoted.
pub fn build_insert(
    database: &str,
    table: &str,
    projection: &Projection,
    schema: &InferredSchema,
) -> TransferResult<Insert> {
    validate_target(database, table)?;
    for name in &projection.columns {
        validate_identifier(IdentKind::Column, name)?;
    }

    let types: Vec<DataType> = projection
        .columns
        .iter()
        .map(|name| schema.get(name).unwrap_or(DataType::String))
        .collect();

    let rows = projection.rows.iter().map(|row| {
        types
            .iter()
            .zip(row)
            .map(|(ty, value)| value_expr(*ty, value))
            .collect::<Vec<_>>()
    });

    Ok(Insert::into(table)
        .schema(database)
        .columns(projection.columns.iter().cloned())
        .values_many(rows))
}

fn value_expr(ty: DataType, value: &str) -> Expr {
    match ty {
        DataType::Float64 => lit_numeric(value),
        DataType::UInt8 => lit_bool_text(value),
        DataType::DateTime | DataType::String => lit_str(value),
    }
}

fn validate_target(database: &str, table: &str) -> TransferResult<()> {
    validate_identifier(IdentKind::Database, database)?;
    validate_identifier(IdentKind::Table, table)?;
    Ok(())
}
