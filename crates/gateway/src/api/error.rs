//! Maps [`conclave_domain::Error`] to an HTTP response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use conclave_domain::Error;

pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::RoomNotFound(_) => StatusCode::NOT_FOUND,
            Error::AlreadyActive(_) => StatusCode::CONFLICT,
            Error::RoomInvalid(_) | Error::Config(_) | Error::Auth(_) => StatusCode::BAD_REQUEST,
            Error::Timeout(_) | Error::Backend { .. } | Error::Http(_) => StatusCode::GATEWAY_TIMEOUT,
            Error::Io(_) | Error::Json(_) | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({
            "error": { "code": self.0.code(), "message": self.0.to_string() }
        }));
        (status, body).into_response()
    }
}
