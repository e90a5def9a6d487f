use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Failures reported by [`crate::store::Store`].
///
/// The `Display` text of each variant is the exact message sent to HTTP
/// clients, so callers can match on it.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    InvalidArgument(&'static str),

    #[error("No value found for provided key")]
    NotFound,

    #[error("Key is already in use")]
    KeyConflict,

    #[error("{}: {source}", .path.display())]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed database file {}: {source}", .path.display())]
    Parse {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not serialize database: {0}")]
    Serialization(#[source] serde_json::Error),
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

impl StoreError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidArgument(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::KeyConflict => StatusCode::PRECONDITION_FAILED,
            Self::Io { .. } | Self::Parse { .. } | Self::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "store failure");
            // Internal details stay in the log.
            return plain_text(status, "Internal Server Error");
        }
        plain_text(status, &self.to_string())
    }
}

/// A `text/plain` response whose body is `message` followed by a newline.
pub fn plain_text(status: StatusCode, message: &str) -> Response {
    (status, format!("{message}\n")).into_response()
}
