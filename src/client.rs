//! HTTP client the front end uses to reach the search proxy.

use reqwest::Client;
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::types::{HealthBody, SearchEnvelope, SearchQuery, SearchResultSet};

/// Result of a search call that reached the proxy.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Found(SearchResultSet),
    /// Non-2xx status from the proxy; the body is not inspected.
    Rejected(u16),
}

#[derive(Debug, Clone, PartialEq)]
pub enum HealthReport {
    Healthy { plugin_count: Option<u64> },
    Unknown { message: String },
    Failing(u16),
    Unreachable,
}

pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/api/search", self.base_url)
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<SearchOutcome, ClientError> {
        let resp = self.client.post(self.endpoint()).json(query).send().await?;

        let status = resp.status();
        if !status.is_success() {
            debug!("Search rejected with {}", status);
            return Ok(SearchOutcome::Rejected(status.as_u16()));
        }

        let body: serde_json::Value = resp.json().await?;
        Ok(SearchOutcome::Found(SearchEnvelope::decode(body)?))
    }

    pub async fn health(&self) -> HealthReport {
        let resp = match self.client.get(self.endpoint()).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!("Health check failed: {}", e);
                return HealthReport::Unreachable;
            }
        };

        let status = resp.status();
        if !status.is_success() {
            return HealthReport::Failing(status.as_u16());
        }

        match resp.json::<HealthBody>().await {
            Ok(body) => HealthReport::from_body(body),
            Err(e) => {
                warn!("Health body unreadable: {}", e);
                HealthReport::Unknown {
                    message: crate::proxy::UNKNOWN_HEALTH_MESSAGE.to_string(),
                }
            }
        }
    }
}

impl HealthReport {
    pub fn from_body(body: HealthBody) -> Self {
        match body.status.as_deref() {
            Some("unknown") => HealthReport::Unknown {
                message: body
                    .message
                    .unwrap_or_else(|| crate::proxy::UNKNOWN_HEALTH_MESSAGE.to_string()),
            },
            _ => HealthReport::Healthy {
                plugin_count: body.plugin_count,
            },
        }
    }
}
