//! Multipart form handling for flat-file routes.

use std::collections::HashMap;
use std::path::Path;

use axum::extract::Multipart;
use serde::de::DeserializeOwned;

use crate::flatfile::Delimiter;
use crate::transfer::{FileFormat, TempUpload, TransferError, TransferResult};

/// Text fields and the uploaded file of one multipart request.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<TempUpload>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    /// Read every part; the `file` part is stored under `upload_dir`.
    pub async fn read(mut multipart: Multipart, upload_dir: &Path) -> TransferResult<Self> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await.map_err(invalid_body)? {
            let name = field.name().unwrap_or_default().to_string();
            if name == "file" {
                let original = field.file_name().map(str::to_string);
                let bytes = field.bytes().await.map_err(invalid_body)?;
                form.file = Some(TempUpload::persist(upload_dir, original, &bytes).await?);
            } else {
                let value = field.text().await.map_err(invalid_body)?;
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }

    #[cfg(test)]
    pub(crate) fn from_fields<'a>(fields: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            file: None,
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// The uploaded file, or an error if none was sent.
    pub fn take_file(&mut self) -> TransferResult<TempUpload> {
        self.file
            .take()
            .ok_or_else(|| TransferError::configuration("no file uploaded"))
    }

    /// `delimiter` and `hasHeader` fields. `hasHeader` is true only when
    /// sent as `true`.
    pub fn format(&self, default_delimiter: &str) -> TransferResult<FileFormat> {
        let delimiter = match self.field("delimiter") {
            Some(d) if !d.is_empty() => d,
            _ => default_delimiter,
        };
        Ok(FileFormat {
            delimiter: Delimiter::parse(delimiter)?,
            has_header: self.field("hasHeader") == Some("true"),
        })
    }

    /// A field holding JSON, or `T::default()` when absent or empty.
    pub fn json<T: DeserializeOwned + Default>(&self, name: &str) -> TransferResult<T> {
        match self.field(name).map(str::trim) {
            None | Some("") => Ok(T::default()),
            Some(raw) => serde_json::from_str(raw)
                .map_err(|e| TransferError::configuration(format!("invalid {name}: {e}"))),
        }
    }
}

fn invalid_body(err: axum::extract::multipart::MultipartError) -> TransferError {
    TransferError::configuration(format!("invalid multipart body: {err}"))
}
