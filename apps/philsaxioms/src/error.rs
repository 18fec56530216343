//! # Application Errors
//!
//! Every fallible operation of the binary returns [`AppError`]. Handlers
//! return it directly; the [`IntoResponse`] impl maps it to a status code and
//! a `{"error": "..."}` body.

use crate::api::ErrorResponse;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use philsaxioms_core::AxiomsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] AxiomsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Server error: {0}")]
    Server(String),

    /// The consistency check found errors.
    #[error("Dataset has {0} consistency error(s)")]
    DatasetInvalid(usize),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Core(AxiomsError::NodeNotFound(_)) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Core(AxiomsError::DuplicateNode(_)) => StatusCode::CONFLICT,
            Self::Core(AxiomsError::InvalidNode(_)) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Core(_)
            | Self::Io(_)
            | Self::Watch(_)
            | Self::Config(_)
            | Self::Server(_)
            | Self::DatasetInvalid(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to API clients.
    ///
    /// Authoring errors keep the wording the front end matches on; internal
    /// failures are logged and reported generically.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::Core(AxiomsError::NodeNotFound(_)) => "Node not found".to_string(),
            Self::Core(AxiomsError::DuplicateNode(_)) => {
                "Node with this ID already exists".to_string()
            }
            Self::Core(AxiomsError::InvalidNode(message)) => message.clone(),
            Self::BadRequest(message) | Self::NotFound(message) => message.clone(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        (status, Json(ErrorResponse::new(self.client_message()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use philsaxioms_core::NodeId;

    #[test]
    fn core_errors_map_to_authoring_statuses() {
        let missing = AppError::from(AxiomsError::NodeNotFound(NodeId::new("x")));
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(missing.client_message(), "Node not found");

        let duplicate = AppError::from(AxiomsError::DuplicateNode(NodeId::new("x")));
        assert_eq!(duplicate.status_code(), StatusCode::CONFLICT);

        let invalid = AppError::from(AxiomsError::InvalidNode("bad".to_string()));
        assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(invalid.client_message(), "bad");
    }

    #[test]
    fn internal_errors_are_not_leaked() {
        let err = AppError::Server("bind failed on secret host".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.client_message(), "Internal server error");
    }
}
