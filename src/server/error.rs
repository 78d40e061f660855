//! Mapping of pipeline errors onto HTTP responses.

use crate::error::DocqaError;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    /// Whether retrying the same request may succeed.
    pub transient: bool,
}

/// Error returned from handlers.
#[derive(Debug)]
pub struct ApiError(pub DocqaError);

impl From<DocqaError> for ApiError {
    fn from(e: DocqaError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        } else {
            warn!("Request rejected ({}): {}", status.as_u16(), self.0);
        }

        let body = ErrorBody {
            error: self.0.to_string(),
            transient: self.0.is_transient(),
        };
        let mut response = (status, Json(body)).into_response();

        if let DocqaError::RangeNotSatisfiable { size } = self.0 {
            if let Ok(value) = HeaderValue::from_str(&format!("bytes */{}", size)) {
                response.headers_mut().insert(header::CONTENT_RANGE, value);
            }
        }

        response
    }
}
