//! Single-shot relay to the external search engine.
//!
//! One request in, one response out: no retries, no caching, and no timeout
//! beyond what the HTTP client itself applies.

use crate::error::ProxyError;
use crate::AppState;
use serde_json::{json, Value};
use tracing::{debug, error, info};

pub const UNKNOWN_HEALTH_MESSAGE: &str = "无法解析健康检查响应";

/// Upstream status code and JSON body, passed back to the caller as is.
#[derive(Debug, Clone, PartialEq)]
pub struct Relayed {
    pub status: u16,
    pub body: Value,
}

/// Health endpoint derived from the search URL: the first `/search` becomes
/// `/health`.
pub fn health_url(search_url: &str) -> String {
    search_url.replacen("/search", "/health", 1)
}

pub async fn forward_search(state: &AppState, body: &Value) -> Result<Relayed, ProxyError> {
    if state.search_url.is_empty() {
        return Err(ProxyError::MissingUpstream);
    }
    info!("Forwarding search to {}", state.search_url);
    debug!("Search body: {}", body);

    let resp = state
        .http_client
        .post(&state.search_url)
        .json(body)
        .send()
        .await
        .map_err(ProxyError::Transport)?;

    let status = resp.status().as_u16();
    let bytes = resp.bytes().await.map_err(ProxyError::Body)?;
    let body: Value = serde_json::from_slice(&bytes)?;

    info!("Search engine answered {}", status);
    Ok(Relayed { status, body })
}

pub async fn forward_health(state: &AppState) -> Result<Relayed, ProxyError> {
    if state.search_url.is_empty() {
        return Err(ProxyError::MissingUpstream);
    }
    let url = health_url(&state.search_url);
    debug!("Health URL: {}", url);

    let resp = state
        .http_client
        .get(&url)
        .send()
        .await
        .map_err(ProxyError::Transport)?;

    let status = resp.status();
    if !status.is_success() {
        return Err(ProxyError::UpstreamStatus(status.as_u16()));
    }

    let text = resp.text().await.map_err(ProxyError::Body)?;
    let body = match serde_json::from_str::<Value>(&text) {
        Ok(parsed) => parsed,
        Err(e) => {
            error!("Health response is not JSON: {}", e);
            error!("Health response text: {}", text);
            json!({"status": "unknown", "message": UNKNOWN_HEALTH_MESSAGE})
        }
    };

    Ok(Relayed {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_url_replaces_first_search_segment() {
        assert_eq!(
            health_url("https://api.example.com/api/search"),
            "https://api.example.com/api/health"
        );
        assert_eq!(
            health_url("http://h/search/v1/search"),
            "http://h/health/v1/search"
        );
    }

    #[test]
    fn health_url_without_search_is_unchanged() {
        assert_eq!(health_url("http://h/query"), "http://h/query");
        assert_eq!(health_url(""), "");
    }

    #[tokio::test]
    async fn missing_upstream_fails_without_network() {
        let state = AppState::new(String::new(), reqwest::Client::new());
        let err = forward_search(&state, &json!({"kw": "x"})).await.unwrap_err();
        assert!(matches!(err, ProxyError::MissingUpstream));
        let err = forward_health(&state).await.unwrap_err();
        assert!(matches!(err, ProxyError::MissingUpstream));
    }
}
