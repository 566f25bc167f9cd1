//! Delimited flat files: parsing, type inference and writing.
//!
//! - [`parser`] - raw text into a [`ParsedTable`]
//! - [`infer`] - column types from a sample row
//! - [`writer`] - export files in the holding directory

pub mod infer;
pub mod parser;
pub mod writer;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use infer::{infer_value, InferredSchema};
pub use parser::{FilePreview, FileSchema, ParsedTable, Projection, PREVIEW_ROW_CAP};
pub use writer::{create_export_file, write_delimited_file};

/// Result type for flat-file operations.
pub type FlatFileResult<T> = Result<T, FlatFileError>;

/// Errors from reading, parsing or writing delimited files.
#[derive(Error, Debug)]
pub enum FlatFileError {
    /// Input has no lines after trimming.
    #[error("file is empty")]
    EmptyFile,

    /// Delimiter is not a single supported character.
    #[error("invalid delimiter {0:?}: expected a single ASCII character other than a quote or line break")]
    InvalidDelimiter(String),

    /// Reading or writing a file failed.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// The CSV reader rejected the input.
    #[error("failed to parse delimited text: {0}")]
    Parse(#[source] csv::Error),

    /// The CSV writer failed.
    #[error("failed to write {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl FlatFileError {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Single-byte field delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiter(u8);

impl Delimiter {
    pub const COMMA: Delimiter = Delimiter(b',');

    /// Parse a delimiter as sent by a client.
    ///
    /// Empty input means comma. `\t` and `tab` both mean a tab character.
    pub fn parse(s: &str) -> FlatFileResult<Self> {
        match s {
            "" => Ok(Self::COMMA),
            "\\t" | "tab" => Ok(Delimiter(b'\t')),
            _ => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii() && !matches!(c, '\n' | '\r' | '"') => {
                        Ok(Delimiter(c as u8))
                    }
                    _ => Err(FlatFileError::InvalidDelimiter(s.to_string())),
                }
            }
        }
    }

    pub fn as_byte(self) -> u8 {
        self.0
    }

    pub fn as_char(self) -> char {
        self.0 as char
    }
}

impl Default for Delimiter {
    fn default() -> Self {
        Self::COMMA
    }
}

impl std::fmt::Display for Delimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            b'\t' => f.write_str("\\t"),
            _ => write!(f, "{}", self.as_char()),
        }
    }
}
