//! JSON error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

use crate::transfer::TransferError;

/// A failed request: a short summary plus the underlying error.
///
/// Renders as `{message, error}` with 400 for bad input and 500 otherwise.
#[derive(Debug)]
pub struct ApiError {
    message: &'static str,
    source: TransferError,
}

impl ApiError {
    pub fn new(message: &'static str, source: impl Into<TransferError>) -> Self {
        Self {
            message,
            source: source.into(),
        }
    }

    /// `map_err` adapter that attaches `message`.
    pub fn with(message: &'static str) -> impl FnOnce(TransferError) -> Self {
        move |source| Self { message, source }
    }

    pub fn status(&self) -> StatusCode {
        if self.source.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.source, "{}", self.message);
        } else {
            warn!(error = %self.source, "{}", self.message);
        }
        let body = json!({
            "message": self.message,
            "error": self.source.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
