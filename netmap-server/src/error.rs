use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use netmap_core::Error as CoreError;
use serde::Serialize;

/// Maps [`CoreError`] to a status code via matching on the *variant*, never
/// on the contained message text (§7).
pub struct ApiError(pub CoreError);

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError(err)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::Validation { .. } | CoreError::Format(_) => StatusCode::BAD_REQUEST,
        };
        tracing::warn!(error = %self.0, %status, "request failed");
        (status, Json(ErrorBody { error: self.0.to_string() })).into_response()
    }
}
