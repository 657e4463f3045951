//! Request-level errors and their HTTP rendering.
//!
//! Every failure reaches the client as `{"error": "<message>"}`. Storage
//! failures keep their source for the log but only expose the context
//! message, so driver details never leak into responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    BoxError, Json,
};
use serde_json::json;
use thiserror::Error;
use tower::timeout::error::Elapsed;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed body, bad id, or an update with nothing to change.
    #[error("{0}")]
    ClientInput(String),

    /// The targeted todo does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The request outlived the configured timeout and was cancelled.
    #[error("Request timed out")]
    Timeout,

    #[error("Internal server error")]
    Middleware(#[source] BoxError),

    #[error("{context}")]
    Storage {
        context: &'static str,
        #[source]
        source: StoreError,
    },
}

impl AppError {
    pub fn client_input(message: impl Into<String>) -> Self {
        AppError::ClientInput(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ClientInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Timeout => StatusCode::REQUEST_TIMEOUT,
            AppError::Middleware(_) | AppError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Attach a client-facing context message to a storage failure.
pub trait StorageContext<T> {
    fn context(self, context: &'static str) -> Result<T, AppError>;
}

impl<T> StorageContext<T> for Result<T, StoreError> {
    fn context(self, context: &'static str) -> Result<T, AppError> {
        self.map_err(|source| AppError::Storage { context, source })
    }
}

impl From<BoxError> for AppError {
    fn from(error: BoxError) -> Self {
        if error.is::<Elapsed>() {
            AppError::Timeout
        } else {
            AppError::Middleware(error)
        }
    }
}

/// Turns errors from the service middleware stack into JSON responses.
pub async fn handle_middleware_error(error: BoxError) -> AppError {
    AppError::from(error)
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::ClientInput(errors.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Storage { context, source } => tracing::error!(error = %source, "{context}"),
            AppError::Middleware(source) => tracing::error!(error = %source, "Middleware error"),
            AppError::Timeout => tracing::warn!("Request timed out"),
            AppError::ClientInput(_) | AppError::NotFound(_) => {}
        }
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
