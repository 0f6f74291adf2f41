use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

use crate::types::ErrorResponse;

pub const SEARCH_UNAVAILABLE: &str = "搜索服务暂时不可用";
pub const HEALTH_UNAVAILABLE: &str = "健康检查服务暂时不可用";

/// Failure talking to the external search engine.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("invalid request body: {0}")]
    InvalidRequest(#[source] serde_json::Error),

    #[error("search engine URL is not configured")]
    MissingUpstream,

    #[error("request to search engine failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("failed to read search engine response: {0}")]
    Body(#[source] reqwest::Error),

    #[error("search engine returned invalid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("HTTP error! status: {0}")]
    UpstreamStatus(u16),
}

/// A proxy failure tagged with the endpoint it happened on, which decides
/// the envelope the caller sees.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Search(ProxyError),

    #[error(transparent)]
    Health(ProxyError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self {
            ApiError::Search(_) => ErrorResponse {
                error: SEARCH_UNAVAILABLE.to_string(),
                details: None,
            },
            ApiError::Health(e) => ErrorResponse {
                error: HEALTH_UNAVAILABLE.to_string(),
                details: Some(e.to_string()),
            },
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

/// Failure on the front-end side of `/api/search`.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("could not reach search proxy: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected search response: {0}")]
    Decode(#[from] serde_json::Error),
}
