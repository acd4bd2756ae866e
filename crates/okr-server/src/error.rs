use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use okr_core::error::OkrError;

// ---------------------------------------------------------------------------
// Internal sentinel for request-shape errors
// ---------------------------------------------------------------------------

/// Carries an explicit HTTP 400 for malformed requests that never reach the
/// store (missing query parameters, unparsable dates in a body).
#[derive(Debug)]
struct BadRequestError(String);

impl std::fmt::Display for BadRequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for BadRequestError {}

// ---------------------------------------------------------------------------
// AppError: unified error type for HTTP responses
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    /// Construct a 400 Bad Request error with the given message.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(BadRequestError(msg.into()).into())
    }
}

pub fn status_for(err: &OkrError) -> StatusCode {
    match err {
        OkrError::NotInitialized => StatusCode::BAD_REQUEST,
        OkrError::CycleNotFound(_)
        | OkrError::ObjectiveNotFound(_)
        | OkrError::KeyResultNotFound(_)
        | OkrError::LinkNotFound { .. }
        | OkrError::TeamNotFound(_)
        | OkrError::NotificationNotFound(_) => StatusCode::NOT_FOUND,
        OkrError::CycleExists(_) | OkrError::ObjectiveExists(_) | OkrError::TeamExists(_) => {
            StatusCode::CONFLICT
        }
        OkrError::InvalidSlug(_)
        | OkrError::InvalidObjectiveType(_)
        | OkrError::InvalidAmbition(_)
        | OkrError::InvalidConfidence(_)
        | OkrError::InvalidRole(_)
        | OkrError::InvalidDate(_)
        | OkrError::InvalidCycleRange { .. }
        | OkrError::SelfLink(_) => StatusCode::BAD_REQUEST,
        OkrError::InvalidLink { .. } | OkrError::DraftLine { .. } | OkrError::InvalidDraft(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        OkrError::PermissionDenied { .. } | OkrError::UnknownUser(_) => StatusCode::FORBIDDEN,
        OkrError::Io(_) | OkrError::Yaml(_) | OkrError::Json(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = if self.0.downcast_ref::<BadRequestError>().is_some() {
            StatusCode::BAD_REQUEST
        } else if let Some(e) = self.0.downcast_ref::<OkrError>() {
            status_for(e)
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        let body = serde_json::json!({ "error": self.0.to_string() });
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
