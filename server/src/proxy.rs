use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ProxyParams {
    pub url: String,
}

/// Fetches an external image server-side and re-serves it same-origin, so
/// client canvases that draw it stay exportable via `toDataURL`.
pub async fn proxy_image(
    State(state): State<AppState>,
    Query(params): Query<ProxyParams>,
) -> Result<Response, ApiError> {
    if !(params.url.starts_with("http://") || params.url.starts_with("https://")) {
        return Err(ApiError::BadRequest("url must be http or https".into()));
    }
    let upstream = state
        .http
        .get(&params.url)
        .send()
        .await
        .map_err(ApiError::Unreachable)?;
    let status = upstream.status();
    if !status.is_success() {
        tracing::warn!(url = %params.url, %status, "image proxy upstream error");
        return Err(ApiError::Upstream(
            StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY),
        ));
    }
    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    let bytes = upstream.bytes().await.map_err(ApiError::Unreachable)?;
    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

/// Forwards a generation request to the configured backend. Connection
/// failures and upstream rejections surface as distinct errors so the client
/// can tell "backend down" from "prompt rejected".
pub async fn process(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let generate_url = state.generate_url.as_ref().ok_or(ApiError::NotConfigured)?;
    let upstream = state
        .http
        .post(generate_url)
        .json(&body)
        .send()
        .await
        .map_err(ApiError::Unreachable)?;
    let status = upstream.status();
    if !status.is_success() {
        tracing::warn!(%status, "generation backend rejected request");
        return Err(ApiError::Upstream(
            StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        ));
    }
    let payload = upstream
        .json::<serde_json::Value>()
        .await
        .map_err(ApiError::Unreachable)?;
    Ok(Json(payload))
}
