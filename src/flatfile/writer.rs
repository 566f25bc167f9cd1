//! Export file sink.
//!
//! Export files land in a shared holding directory and stay there until
//! something outside this crate removes them. Names carry a millisecond
//! timestamp; a numeric suffix is added if the name is already taken.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;

use super::{Delimiter, FlatFileError, FlatFileResult};

/// Prefix of every export file name.
pub const EXPORT_PREFIX: &str = "export_";

/// `export_<millis>.csv`, or `export_<millis>_<n>.csv` for `attempt > 0`.
pub fn export_file_name(at: DateTime<Utc>, attempt: u32) -> String {
    let millis = at.timestamp_millis();
    if attempt == 0 {
        format!("{EXPORT_PREFIX}{millis}.csv")
    } else {
        format!("{EXPORT_PREFIX}{millis}_{attempt}.csv")
    }
}

/// Create a new, uniquely named export file in `dir`.
///
/// The directory is created if needed. The file is opened with
/// `create_new`, so concurrent exports never share a file.
pub fn create_export_file(dir: &Path) -> FlatFileResult<(PathBuf, File)> {
    fs::create_dir_all(dir)
        .map_err(|e| FlatFileError::io(format!("failed to create {}", dir.display()), e))?;

    let now = Utc::now();
    let mut attempt = 0;
    loop {
        let path = dir.join(export_file_name(now, attempt));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => {
                return Err(FlatFileError::io(
                    format!("failed to create {}", path.display()),
                    e,
                ))
            }
        }
    }
}

/// Write a header line and rows to `out` as delimited text.
///
/// Fields containing the delimiter, quotes or line breaks are quoted.
pub fn write_delimited<W: Write, S: AsRef<str>>(
    out: W,
    path: &Path,
    headers: &[S],
    rows: impl IntoIterator<Item = Vec<String>>,
    delimiter: Delimiter,
) -> FlatFileResult<usize> {
    let csv_err = |source| FlatFileError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter.as_byte())
        .from_writer(out);

    writer
        .write_record(headers.iter().map(|h| h.as_ref()))
        .map_err(csv_err)?;

    let mut count = 0;
    for row in rows {
        writer.write_record(&row).map_err(csv_err)?;
        count += 1;
    }

    writer
        .flush()
        .map_err(|e| FlatFileError::io(format!("failed to flush {}", path.display()), e))?;

    debug!(path = %path.display(), rows = count, "wrote delimited file");
    Ok(count)
}

/// Create or truncate `path` and write `headers` and `rows` to it.
pub fn write_delimited_file<S: AsRef<str>>(
    path: &Path,
    headers: &[S],
    rows: impl IntoIterator<Item = Vec<String>>,
    delimiter: Delimiter,
) -> FlatFileResult<usize> {
    let file = File::create(path)
        .map_err(|e| FlatFileError::io(format!("failed to create {}", path.display()), e))?;
    write_delimited(file, path, headers, rows, delimiter)
}

/// Whether `name` is a plain export file name (no directories, no dot
/// segments) that is safe to join onto the holding directory.
pub fn is_servable_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        && Path::new(name).file_name().is_some_and(|f| f == name)
}
