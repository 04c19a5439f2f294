use axum::{http::StatusCode, response::IntoResponse, Json};
use regulator::RegistryError;
use serde::{Deserialize, Serialize};

/// Body of every response, successful or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub message: String,
    pub status: u16,
    pub data: Option<T>,
}

/// Successful response carrying `data` under a 200 status.
pub struct ApiResponse<T> {
    message: String,
    data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::OK;
        let body = Envelope {
            message: self.message,
            status: status.as_u16(),
            data: Some(self.data),
        };
        (status, Json(body)).into_response()
    }
}

/// Error response. 5xx responses carry a generic message, the details go to the log.
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    #[must_use]
    pub fn internal_server_error() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error. Please try again.",
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::InputOutOfField { .. } | RegistryError::IndexOutOfRange { .. } => {
                Self::bad_request(err.to_string())
            }
            RegistryError::CapacityExceeded { .. } => Self::new(StatusCode::CONFLICT, err.to_string()),
            RegistryError::InvalidDepth { .. } | RegistryError::Persistence(_) => {
                tracing::error!(error = %err, "registry failure");
                Self::internal_server_error()
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = Envelope::<()> {
            message: self.message,
            status: self.status.as_u16(),
            data: None,
        };
        (self.status, Json(body)).into_response()
    }
}
