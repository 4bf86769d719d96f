use crate::search::SearchError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Application error types surfaced at the HTTP boundary.
#[derive(Error, Debug)]
pub enum AppError {
    /// Search engine errors (index access, query execution)
    #[error("search error: {0}")]
    Search(#[from] SearchError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            // A query the engine's grammar rejects is the caller's fault.
            AppError::Search(SearchError::QueryParse(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        (status, self.to_string()).into_response()
    }
}

/// Convenience result alias for HTTP handlers.
pub type Result<T> = std::result::Result<T, AppError>;
