//! Column type inference from sample values.
//!
//! Only one row is consulted. A column whose first value is numeric but
//! whose later values are text is still typed `Float64`, and the insert of
//! those later rows is rejected by the database.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::sql::DataType;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Column name to inferred type, in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InferredSchema {
    columns: Vec<(String, DataType)>,
}

impl InferredSchema {
    /// Infer one type per column from a single representative row.
    pub fn from_row<'a>(row: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            columns: row
                .into_iter()
                .map(|(name, value)| (name.to_string(), infer_value(value)))
                .collect(),
        }
    }

    pub fn get(&self, column: &str) -> Option<DataType> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, ty)| *ty)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, DataType)> {
        self.columns.iter().map(|(n, t)| (n.as_str(), *t))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Infer the type of a single value.
///
/// Checked in order: finite number, `true`/`false`, date or timestamp,
/// then text. Empty values are always text.
pub fn infer_value(value: &str) -> DataType {
    if value.is_empty() {
        return DataType::String;
    }
    if value.parse::<f64>().is_ok_and(f64::is_finite) {
        return DataType::Float64;
    }
    if value == "true" || value == "false" {
        return DataType::UInt8;
    }
    if is_datetime(value) {
        return DataType::DateTime;
    }
    DataType::String
}

fn is_datetime(value: &str) -> bool {
    DateTime::parse_from_rfc3339(value).is_ok()
        || DateTime::parse_from_rfc2822(value).is_ok()
        || DATE_FORMATS
            .iter()
            .any(|f| NaiveDate::parse_from_str(value, f).is_ok())
        || DATETIME_FORMATS
            .iter()
            .any(|f| NaiveDateTime::parse_from_str(value, f).is_ok())
}
