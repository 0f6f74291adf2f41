use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::error::{ApiError, ProxyError};
use crate::proxy::{self, Relayed};
use crate::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(liveness))
        .route("/api/search", get(health_handler).post(search_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn liveness() -> Json<Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

fn relay(relayed: Relayed) -> (StatusCode, Json<Value>) {
    let status = StatusCode::from_u16(relayed.status).unwrap_or(StatusCode::BAD_GATEWAY);
    (status, Json(relayed.body))
}

async fn search_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let request_id = Uuid::new_v4();
    async move {
        // Parsed regardless of content type.
        let body: Value = serde_json::from_slice(&body).map_err(|e| {
            error!("Search request body is not JSON: {}", e);
            ApiError::Search(ProxyError::InvalidRequest(e))
        })?;

        match proxy::forward_search(&state, &body).await {
            Ok(relayed) => Ok(relay(relayed)),
            Err(e) => {
                error!("Search proxy error: {}", e);
                Err(ApiError::Search(e))
            }
        }
    }
    .instrument(info_span!("search", %request_id))
    .await
}

async fn health_handler(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let request_id = Uuid::new_v4();
    async move {
        match proxy::forward_health(&state).await {
            Ok(relayed) => {
                info!("Health check relayed with status {}", relayed.status);
                Ok(relay(relayed))
            }
            Err(e) => {
                error!("Health check proxy error: {}", e);
                Err(ApiError::Health(e))
            }
        }
    }
    .instrument(info_span!("health", %request_id))
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn unconfigured() -> Router {
        router(Arc::new(AppState::new(String::new(), reqwest::Client::new())))
    }

    async fn json_body(resp: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn liveness_reports_service_name() {
        let resp = unconfigured()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["service"], "pan-search");
    }

    #[tokio::test]
    async fn search_without_upstream_returns_envelope() {
        let req = Request::post("/api/search")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"kw":"inception","res":"merge","src":"all"}"#))
            .unwrap();
        let resp = unconfigured().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(resp).await;
        assert_eq!(body, serde_json::json!({"error": "搜索服务暂时不可用"}));
    }

    #[tokio::test]
    async fn malformed_request_body_returns_search_envelope() {
        let req = Request::post("/api/search")
            .header("content-type", "application/json")
            .body(Body::from("not json"))
            .unwrap();
        let resp = unconfigured().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(resp).await["error"], "搜索服务暂时不可用");
    }

    async fn echo_upstream() -> String {
        let engine = Router::new().route(
            "/api/search",
            axum::routing::post(|Json(body): Json<Value>| async move {
                Json(serde_json::json!({"echo": body}))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, engine).await.unwrap();
        });
        format!("http://{addr}/api/search")
    }

    #[tokio::test]
    async fn json_body_is_relayed_whatever_the_content_type() {
        let app = router(Arc::new(AppState::new(echo_upstream().await, reqwest::Client::new())));
        let raw = r#"{"kw":"inception","res":"merge","src":"all"}"#;

        for content_type in [None, Some("text/plain;charset=UTF-8")] {
            let mut req = Request::post("/api/search");
            if let Some(ct) = content_type {
                req = req.header("content-type", ct);
            }
            let resp = app.clone().oneshot(req.body(Body::from(raw)).unwrap()).await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK, "content type {content_type:?}");
            let body = json_body(resp).await;
            assert_eq!(body["echo"]["kw"], "inception");
        }
    }

    #[tokio::test]
    async fn health_without_upstream_carries_details() {
        let resp = unconfigured()
            .oneshot(Request::get("/api/search").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(resp).await;
        assert_eq!(body["error"], "健康检查服务暂时不可用");
        assert_eq!(body["details"], "search engine URL is not configured");
    }
}
