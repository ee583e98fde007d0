//! Router construction and server host for the API.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::MatchedPath,
    http::{HeaderName, Method, Request, header::CONTENT_TYPE},
    middleware,
    routing::get,
};
use seedwire_relay::RelaySettings;
use seedwire_telemetry::{Metrics, REQUEST_ID_HEADER, build_sha, set_request_context};
use seedwire_torrent_core::WorkerRegistry;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{Span, info};

use crate::error::{ApiServerError, ApiServerResult};
use crate::http::constants::{ROUTE_HEALTH, ROUTE_METRICS, ROUTE_WS};
use crate::http::health::{health, metrics};
use crate::http::telemetry::count_requests;
use crate::http::ws::ws_handler;
use crate::state::ApiState;

/// Axum router wrapper that hosts the relay endpoints.
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    /// Build the router over the given worker registry.
    #[must_use]
    pub fn new(
        registry: Arc<dyn WorkerRegistry>,
        settings: RelaySettings,
        telemetry: Metrics,
    ) -> Self {
        Self::with_state(Arc::new(ApiState::new(registry, settings, telemetry)))
    }

    /// Build the router over prepared state.
    #[must_use]
    pub fn with_state(state: Arc<ApiState>) -> Self {
        let cors_layer = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers([CONTENT_TYPE, HeaderName::from_static(REQUEST_ID_HEADER)]);
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                let route = request.extensions().get::<MatchedPath>().map_or_else(
                    || request.uri().path().to_string(),
                    |matched| matched.as_str().to_string(),
                );

                let span = tracing::info_span!(
                    "http.request",
                    method = %request.method(),
                    route = tracing::field::Empty,
                    request_id = tracing::field::Empty,
                    build_sha = %build_sha(),
                    status_code = tracing::field::Empty,
                    latency_ms = tracing::field::Empty
                );
                set_request_context(&span, request_id, route);
                span
            })
            .on_request(|_request: &Request<_>, _span: &Span| {})
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &Span| {
                    span.record("status_code", response.status().as_u16());
                    let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
                    span.record("latency_ms", latency_ms);
                },
            );
        let layered = ServiceBuilder::new()
            .layer(seedwire_telemetry::propagate_request_id_layer())
            .layer(seedwire_telemetry::set_request_id_layer())
            .layer(trace_layer)
            .layer(middleware::from_fn_with_state(
                state.telemetry.clone(),
                count_requests,
            ));

        let router = Router::new()
            .route(ROUTE_WS, get(ws_handler))
            .route(ROUTE_HEALTH, get(health))
            .route(ROUTE_METRICS, get(metrics))
            .layer(cors_layer)
            .route_layer(layered)
            .with_state(state);

        Self { router }
    }

    /// Consume the server and return the underlying router.
    #[must_use]
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Bind `addr` and serve until `shutdown` resolves.
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
        self.serve_on(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns an error if the server terminates unexpectedly.
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> ApiServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Ok(local) = listener.local_addr() {
            info!(addr = %local, "starting api");
        }
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|source| ApiServerError::Serve { source })?;
        info!("api stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::StatusCode,
    };
    use seedwire_test_support::fixtures::relay_metrics;
    use seedwire_torrent_core::MemoryRegistry;
    use tower::ServiceExt;

    use super::*;

    fn server(telemetry: &Metrics) -> Router {
        ApiServer::new(
            Arc::new(MemoryRegistry::new()),
            RelaySettings::default(),
            telemetry.clone(),
        )
        .into_router()
    }

    fn get_request(path: &str) -> Request<Body> {
        Request::builder()
            .uri(path)
            .body(Body::empty())
            .expect("request")
    }

    #[tokio::test]
    async fn health_route_returns_json_and_request_id() {
        let telemetry = relay_metrics();
        let response = server(&telemetry)
            .oneshot(get_request("/health"))
            .await
            .expect("health response");

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(json["status"], "ok");
        assert_eq!(json["connections"], 0);
        assert!(json["started_at"].is_string());
        let rendered = telemetry.render().expect("render");
        assert!(rendered.contains("route=\"/health\""));
    }

    #[tokio::test]
    async fn metrics_route_exposes_prometheus_text() {
        let telemetry = relay_metrics();
        telemetry.inc_message_sent("stats");
        let response = server(&telemetry)
            .oneshot(get_request("/metrics"))
            .await
            .expect("metrics response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let text = String::from_utf8(body.to_vec()).expect("utf8");
        assert!(text.contains("relay_messages_sent_total{type=\"stats\"} 1"));
    }

    #[tokio::test]
    async fn plain_get_on_ws_is_rejected() {
        let telemetry = relay_metrics();
        let response = server(&telemetry)
            .oneshot(get_request("/ws"))
            .await
            .expect("ws response");
        assert!(response.status().is_client_error());
        assert_eq!(telemetry.snapshot().connections_active, 0);
    }

    #[tokio::test]
    async fn unknown_routes_are_not_found() {
        let telemetry = relay_metrics();
        let response = server(&telemetry)
            .oneshot(get_request("/nope"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
