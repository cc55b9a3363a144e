//! Router construction and server host for the webhook listener.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::Request;
use axum::routing::{get, post};
use seedkeep_telemetry::{propagate_request_id_layer, request_span, set_request_id_layer};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{Span, info};

use crate::error::{ApiServerError, ApiServerResult};
use crate::handlers::{health, metrics, webhook};
use crate::state::ApiState;

/// Axum router wrapper hosting the webhook endpoints.
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    /// Build the router with request-id propagation and per-request tracing spans.
    #[must_use]
    pub fn new(state: ApiState) -> Self {
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(request_span::<Body>)
            .on_request(|_request: &Request<_>, _span: &Span| {})
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &Span| {
                    span.record("status_code", response.status().as_u16());
                    let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
                    span.record("latency_ms", latency_ms);
                },
            );
        let layered = ServiceBuilder::new()
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
            .layer(trace_layer);

        let router = Router::new()
            .route("/webhook", post(webhook))
            .route("/health", get(health))
            .route("/metrics", get(metrics))
            .route_layer(layered)
            .with_state(state);

        Self { router }
    }

    /// Bind `addr` and serve until `shutdown` resolves, letting in-flight requests finish.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener fails to bind or the server terminates unexpectedly.
    pub async fn serve<F>(self, addr: SocketAddr, shutdown: F) -> ApiServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ApiServerError::Bind { addr, source })?;
        info!(%addr, "webhook listener started");
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|source| ApiServerError::Serve { source })
    }

    /// Router for in-process use.
    #[must_use]
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{IGNORED, PROMOTED};
    use crate::promoter::{PromotionRequest, PromotionVerdict, Promoter};
    use anyhow::Result;
    use async_trait::async_trait;
    use axum::body::to_bytes;
    use axum::http::{StatusCode, header::CONTENT_TYPE};
    use seedkeep_telemetry::{Metrics, REQUEST_ID_HEADER};
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use tokio::sync::Notify;
    use tower::ServiceExt;

    #[derive(Default)]
    struct StubPromoter {
        seen: Mutex<Vec<PromotionRequest>>,
        verdict: Option<PromotionVerdict>,
        gate: Option<Arc<Notify>>,
    }

    #[async_trait]
    impl Promoter for StubPromoter {
        async fn promote(&self, request: PromotionRequest) -> PromotionVerdict {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(request);
            }
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.verdict.unwrap_or(PromotionVerdict::Promoted)
        }
    }

    fn server(promoter: Arc<StubPromoter>) -> Result<(ApiServer, ApiState)> {
        let state = ApiState::new(promoter, "race", Metrics::new()?);
        Ok((ApiServer::new(state.clone()), state))
    }

    fn json_request(body: &serde_json::Value) -> Result<Request<Body>> {
        Ok(Request::builder()
            .method("POST")
            .uri("/webhook")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(body)?))?)
    }

    async fn send(router: Router, request: Request<Body>) -> Result<(StatusCode, String)> {
        let response = router.oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        Ok((status, String::from_utf8(bytes.to_vec())?))
    }

    fn injected(category: &str) -> serde_json::Value {
        json!({
            "extra": {
                "result": "INJECTED",
                "infoHashes": ["bbb"],
                "trackers": ["https://tracker.example.com/announce"],
                "searchee": {"infoHash": "aaa", "category": category, "name": "Show"}
            }
        })
    }

    #[tokio::test]
    async fn admitted_notification_runs_promotion() -> Result<()> {
        let promoter = Arc::new(StubPromoter::default());
        let (server, _state) = server(Arc::clone(&promoter))?;

        let (status, body) = send(server.router(), json_request(&injected("race"))?).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, PROMOTED);
        let seen = promoter
            .seen
            .lock()
            .map_err(|_| anyhow::anyhow!("poisoned"))?;
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].original.hash, "aaa");
        assert_eq!(seen[0].duplicates[0].hash, "bbb");
        Ok(())
    }

    #[tokio::test]
    async fn failed_promotion_is_500() -> Result<()> {
        let promoter = Arc::new(StubPromoter {
            verdict: Some(PromotionVerdict::Failed),
            ..StubPromoter::default()
        });
        let (server, _state) = server(promoter)?;
        let (status, body) = send(server.router(), json_request(&injected("race"))?).await?;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Promotion action failed.");
        Ok(())
    }

    #[tokio::test]
    async fn unwatched_category_never_reaches_promoter() -> Result<()> {
        let promoter = Arc::new(StubPromoter::default());
        let (server, _state) = server(Arc::clone(&promoter))?;

        let (status, body) = send(server.router(), json_request(&injected("movies"))?).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, IGNORED);
        assert!(
            promoter
                .seen
                .lock()
                .map_err(|_| anyhow::anyhow!("poisoned"))?
                .is_empty()
        );
        Ok(())
    }

    #[tokio::test]
    async fn malformed_requests_map_to_client_errors() -> Result<()> {
        let (server, _state) = server(Arc::new(StubPromoter::default()))?;

        let plain = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header(CONTENT_TYPE, "text/plain")
            .body(Body::from("hello"))?;
        let (status, body) = send(server.router(), plain).await?;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body, "Error: Content-Type must be application/json");

        let (status, body) = send(server.router(), json_request(&json!({"extra": {}}))?).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Error: Invalid JSON structure");

        let broken = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))?;
        let (status, body) = send(server.router(), broken).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Error: Invalid JSON structure");

        let no_hash = json!({"extra": {"searchee": {"category": "race"}}});
        let (status, body) = send(server.router(), json_request(&no_hash)?).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Error: 'infoHash' is required");

        let flag_hash = json!({"extra": {"searchee": {"infoHash": true, "category": "race"}}});
        let (status, body) = send(server.router(), json_request(&flag_hash)?).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Error: 'infoHash' must be a string or a number");
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_notification_for_same_hash_is_refused() -> Result<()> {
        let gate = Arc::new(Notify::new());
        let promoter = Arc::new(StubPromoter {
            gate: Some(Arc::clone(&gate)),
            ..StubPromoter::default()
        });
        let (server, state) = server(promoter)?;

        let first = tokio::spawn(send(server.router(), json_request(&injected("race"))?));
        while !state.in_flight.contains("aaa") {
            tokio::task::yield_now().await;
        }
        let (status, body) = send(server.router(), json_request(&injected("race"))?).await?;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body, "Error: a promotion for this torrent is already running");

        gate.notify_one();
        let (status, _) = first.await??;
        assert_eq!(status, StatusCode::OK);
        assert!(!state.in_flight.contains("aaa"));
        Ok(())
    }

    #[tokio::test]
    async fn health_metrics_and_request_ids() -> Result<()> {
        let (server, _state) = server(Arc::new(StubPromoter::default()))?;
        let response = server
            .router()
            .oneshot(Request::builder().uri("/health").body(Body::empty())?)
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));

        send(server.router(), json_request(&injected("movies"))?).await?;
        let (status, body) = send(
            server.router(),
            Request::builder().uri("/metrics").body(Body::empty())?,
        )
        .await?;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("webhook_verdicts_total"));
        assert!(body.contains("verdict=\"ignored\""));
        Ok(())
    }
}
