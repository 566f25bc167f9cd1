//! Delimited-text parser.
//!
//! Records are read with the `csv` crate with quoting disabled, so a
//! delimiter inside a value always starts a new field. Values are trimmed.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::{Delimiter, FlatFileError, FlatFileResult};

/// Upper bound on rows returned by [`ParsedTable::schema`] sampling and
/// [`ParsedTable::preview`].
pub const PREVIEW_ROW_CAP: usize = 100;

/// Headers plus positional rows.
///
/// Rows are looked up by normalized (trimmed, lower-cased) header name.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTable {
    headers: Vec<String>,
    keys: Vec<String>,
    rows: Vec<Vec<String>>,
    has_header: bool,
}

/// A column subset of a [`ParsedTable`], in selection order.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Column names detected in a file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSchema {
    pub columns: Vec<String>,
    pub sample_count: usize,
}

/// The first rows of a file, optionally restricted to some columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePreview {
    pub rows: Vec<Map<String, Value>>,
    pub headers: Vec<String>,
    pub row_count: usize,
    pub total_rows: usize,
    pub selected_columns: Vec<String>,
}

/// Trim and lower-case a header for lookups.
pub fn normalize_header(name: &str) -> String {
    name.trim().to_lowercase()
}

impl ParsedTable {
    /// Parse raw text.
    ///
    /// With `has_header`, the first non-blank line names the columns and is
    /// not a data row. Without it, columns are named `column1..columnN` after
    /// the first line's field count and that line is data.
    pub fn parse(text: &str, delimiter: Delimiter, has_header: bool) -> FlatFileResult<Self> {
        // Blank lines are dropped; kept lines are not trimmed, so a leading
        // empty field keeps its column.
        let content: String = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .flat_map(|line| [line, "\n"])
            .collect();
        if content.is_empty() {
            return Err(FlatFileError::EmptyFile);
        }

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter.as_byte())
            .quoting(false)
            .flexible(true)
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let mut records = reader.records();
        let first = match records.next() {
            Some(record) => to_fields(&record.map_err(FlatFileError::Parse)?),
            None => return Err(FlatFileError::EmptyFile),
        };

        let (headers, mut rows) = if has_header {
            (first, Vec::new())
        } else {
            let synthetic = (1..=first.len()).map(|i| format!("column{i}")).collect();
            (synthetic, vec![first])
        };

        for record in records {
            let mut row = to_fields(&record.map_err(FlatFileError::Parse)?);
            if row.len() < headers.len() {
                row.resize(headers.len(), String::new());
            }
            rows.push(row);
        }

        let keys = headers.iter().map(|h| normalize_header(h)).collect();
        debug!(columns = headers.len(), rows = rows.len(), %delimiter, "parsed delimited text");

        Ok(Self {
            headers,
            keys,
            rows,
            has_header,
        })
    }

    /// Column names as written in the file (trimmed) or synthesized.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Data rows, each at least as wide as the header.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn has_header(&self) -> bool {
        self.has_header
    }

    /// Position of a column by normalized name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let key = normalize_header(name);
        self.keys.iter().position(|k| *k == key)
    }

    /// Value of `column` in data row `row`, looked up by normalized name.
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx).map(String::as_str)
    }

    /// Restrict rows to the selected columns, in selection order.
    ///
    /// Column names are normalized. A name missing from the headers falls
    /// back to the field at the same position as the name in `selected`;
    /// this is only right when the selection follows the file's column order.
    pub fn project<S: AsRef<str>>(&self, selected: &[S]) -> Projection {
        let columns: Vec<String> = selected.iter().map(|s| normalize_header(s.as_ref())).collect();

        let sources: Vec<usize> = columns
            .iter()
            .enumerate()
            .map(|(pos, name)| match self.keys.iter().position(|k| k == name) {
                Some(idx) => idx,
                None => {
                    warn!(
                        column = %name,
                        position = pos,
                        "selected column not found in headers, falling back to positional mapping"
                    );
                    pos
                }
            })
            .collect();

        let rows = self
            .rows
            .iter()
            .map(|row| {
                sources
                    .iter()
                    .map(|&idx| row.get(idx).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();

        Projection { columns, rows }
    }

    /// Detected columns plus how many rows a sample scan would read.
    pub fn schema(&self) -> FileSchema {
        FileSchema {
            columns: self.headers.clone(),
            sample_count: self.rows.len().min(PREVIEW_ROW_CAP),
        }
    }

    /// Up to `limit` rows (never more than [`PREVIEW_ROW_CAP`]).
    ///
    /// With a non-empty `selected`, rows carry exactly those keys and a
    /// name that does not exactly match a header yields an empty string.
    pub fn preview<S: AsRef<str>>(&self, selected: &[S], limit: usize) -> FilePreview {
        let limit = limit.min(PREVIEW_ROW_CAP);
        let selected: Vec<String> = selected.iter().map(|s| s.as_ref().to_string()).collect();

        let columns: Vec<(String, Option<usize>)> = if selected.is_empty() {
            self.headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.clone(), Some(i)))
                .collect()
        } else {
            selected
                .iter()
                .map(|name| (name.clone(), self.headers.iter().position(|h| h == name)))
                .collect()
        };

        let rows: Vec<Map<String, Value>> = self
            .rows
            .iter()
            .take(limit)
            .map(|row| {
                columns
                    .iter()
                    .map(|(name, idx)| {
                        let value = idx
                            .and_then(|i| row.get(i))
                            .cloned()
                            .unwrap_or_default();
                        (name.clone(), Value::String(value))
                    })
                    .collect()
            })
            .collect();

        FilePreview {
            row_count: rows.len(),
            rows,
            headers: self.headers.clone(),
            total_rows: self.rows.len(),
            selected_columns: if selected.is_empty() {
                self.headers.clone()
            } else {
                selected
            },
        }
    }
}

impl Projection {
    /// The first row as (column, value) pairs.
    pub fn first_row(&self) -> Option<impl Iterator<Item = (&str, &str)>> {
        self.rows.first().map(|row| {
            self.columns
                .iter()
                .map(String::as_str)
                .zip(row.iter().map(String::as_str))
        })
    }
}

fn to_fields(record: &csv::StringRecord) -> Vec<String> {
    record.iter().map(str::to_string).collect()
}
