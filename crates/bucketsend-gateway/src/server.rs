//! HTTP server implementation using Axum.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{any, get};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use bucketsend_core::config::BucketSendConfig;
use bucketsend_engine::{run_pipeline, Collaborators};

/// Shared state for the gateway server.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<BucketSendConfig>,
    pub collaborators: Collaborators,
    pub start_time: std::time::Instant,
}

/// Health probe.
async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "ok": true,
        "uptime_secs": state.start_time.elapsed().as_secs(),
        "timezone": state.config.timezone,
    }))
}

/// Trigger endpoint: OPTIONS answers the CORS preflight, every other
/// method runs the full pipeline. The external scheduler needs no
/// payload, and none is read.
async fn trigger_run(State(state): State<Arc<AppState>>, method: Method) -> Response {
    if method == Method::OPTIONS {
        return StatusCode::NO_CONTENT.into_response();
    }

    match run_pipeline(&state.config, &state.collaborators).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => {
            tracing::error!("❌ Nudge run failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": e.to_string()})),
            )
                .into_response()
        }
    }
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    let shared = Arc::new(state);
    Router::new()
        .route("/api/v1/nudges/run", any(trigger_run))
        .route("/api/v1/health", get(health))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: AppState) -> std::io::Result<()> {
    let addr = format!("{}:{}", state.config.gateway.host, state.config.gateway.port);
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("🌐 BucketSend gateway listening on {addr}");
    axum::serve(listener, router).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use bucketsend_channels::TemplateGenerator;
    use bucketsend_core::traits::SmsSender;
    use bucketsend_core::types::OutboundSms;
    use bucketsend_store::MemoryStore;

    struct NoSms;

    #[async_trait]
    impl SmsSender for NoSms {
        async fn send(&self, _: &OutboundSms) -> bucketsend_core::Result<String> {
            Ok("SM0".into())
        }
    }

    fn test_state() -> AppState {
        let store = Arc::new(MemoryStore::new());
        AppState {
            config: Arc::new(BucketSendConfig::default()),
            collaborators: Collaborators {
                buckets: store.clone(),
                ledger: store.clone(),
                profiles: store.clone(),
                aggregates: store,
                copygen: Arc::new(TemplateGenerator::default()),
                sms: Arc::new(NoSms),
            },
            start_time: std::time::Instant::now(),
        }
    }

    #[tokio::test]
    async fn test_options_preflight_is_204() {
        let router = build_router(test_state());
        let response = router
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/v1/nudges/run")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_run_works_for_any_method_and_no_body() {
        for method in ["POST", "GET"] {
            let router = build_router(test_state());
            let response = router
                .oneshot(
                    Request::builder()
                        .method(method)
                        .uri("/api/v1/nudges/run")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);

            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
            assert!(json["isoWeek"].as_str().unwrap().contains("-W"));
            assert_eq!(json["totalSent"], 0);
        }
    }

    #[tokio::test]
    async fn test_health() {
        let router = build_router(test_state());
        let response = router
            .oneshot(Request::builder().uri("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
