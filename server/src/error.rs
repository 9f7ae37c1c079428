use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("generation backend is not configured")]
    NotConfigured,
    #[error("backend not reachable")]
    Unreachable(#[source] reqwest::Error),
    #[error("processing error (upstream status {0})")]
    Upstream(StatusCode),
    #[error("invalid request: {0}")]
    BadRequest(String),
    #[error("storage error")]
    Storage(#[from] std::io::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Unreachable(_) => StatusCode::BAD_GATEWAY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotConfigured | ApiError::Upstream(_) | ApiError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
