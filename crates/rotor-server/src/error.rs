use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rotor_core::RotorError;

// ---------------------------------------------------------------------------
// AppError: unified error type for HTTP responses
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    /// Construct a 400 Bad Request error with the given message.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(RotorError::InvalidRequest(msg.into()).into())
    }
}

/// HTTP status for a domain error.
pub fn status_for(err: &RotorError) -> StatusCode {
    match err {
        RotorError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        RotorError::RotationInProgress => StatusCode::CONFLICT,
        RotorError::Configuration(_)
        | RotorError::Platform(_)
        | RotorError::DeployTimeout { .. }
        | RotorError::Store(_)
        | RotorError::Io(_)
        | RotorError::Yaml(_)
        | RotorError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0.downcast_ref::<RotorError>() {
            // Client errors carry a message meant for the caller as-is.
            Some(RotorError::InvalidRequest(msg)) => (StatusCode::BAD_REQUEST, msg.clone()),
            Some(e) => (status_for(e), e.to_string()),
            None => (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string()),
        };
        if status.is_server_error() {
            tracing::error!(error = %format!("{:#}", self.0), "request failed");
        }

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
