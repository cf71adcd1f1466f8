use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Operation failures, each mapped onto the JSON error envelope
/// `{"error": …}` with its HTTP status.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or malformed required fields, invalid enum values.
    #[error("{0}")]
    Validation(String),
    /// The acting user's role does not permit the operation.
    #[error("{0}")]
    Authorization(String),
    /// Bad signin credentials. Unknown username and wrong password are
    /// indistinguishable on the wire.
    #[error("Invalid credentials")]
    Credentials,
    #[error("{0}")]
    NotFound(String),
    /// Duplicate application. Rendered as 400, not 409.
    #[error("{0}")]
    Conflict(String),
    /// Store or transport failure; the cause is logged, never sent.
    #[error(transparent)]
    Internal(#[from] eyre::Report),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Error::Authorization(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Error::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Error::Conflict(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::Conflict(_) => StatusCode::BAD_REQUEST,
            Error::Authorization(_) => StatusCode::FORBIDDEN,
            Error::Credentials => StatusCode::UNAUTHORIZED,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(error: sqlx::Error) -> Self {
        Error::Internal(error.into())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Error::Internal(report) => {
                error!(error = %report, "request failed");
                "Internal server error".to_owned()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
