//! Maps `catalog_store::StoreError` (and anything else a handler can fail
//! with) onto HTTP status codes and a log severity.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use catalog_store::StoreError;
use tracing::{error, warn};

/// Error type handlers return; carries its own status so `AppError` never
/// has to re-derive one from a generic `anyhow::Error`.
pub(crate) struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

/// Converts a store failure observed while serving a request. `NotFound`
/// is routine and unlogged; everything else gets a line at a severity
/// matching how actionable it is.
impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AppError::not_found("Catalog not found"),
            StoreError::Permission(_) => {
                warn!(error = %err, "permission error while serving request");
                AppError::internal("internal server error")
            }
            StoreError::IndexDecode(_) => {
                error!(error = %err, "index file is corrupt");
                AppError::internal("internal server error")
            }
            StoreError::Cancelled => AppError::internal("request cancelled"),
            StoreError::InvalidName(_) => AppError::not_found("Catalog not found"),
            StoreError::InputWalk(_) | StoreError::Io(_) | StoreError::Joined(_, _) => {
                error!(error = %err, "internal error while serving request");
                AppError::internal("internal server error")
            }
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        error!(error = %err, "io error while serving request");
        AppError::internal("internal server error")
    }
}
