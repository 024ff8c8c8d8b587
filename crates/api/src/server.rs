//! Router assembly and server lifecycle.
//!
//! A server moves through [`ServerPhase`]s in one direction:
//! `Starting -> Listening -> ShuttingDown`, or `Starting -> Crashed` when the
//! listener cannot be bound. Each transition is logged.

use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
};
use kori_core::KoriConfig;
use thiserror::Error;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::error::handle_panic;
use crate::middleware::{
    cors_layer, rate_limit_middleware, rate_limiter, request_id_middleware,
    security_headers_middleware,
};
use crate::routes;
use crate::state::AppState;

/// Lifecycle phase of the API server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerPhase {
    Starting,
    Listening,
    ShuttingDown,
    Crashed,
}

impl fmt::Display for ServerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Starting => "starting",
            Self::Listening => "listening",
            Self::ShuttingDown => "shutting_down",
            Self::Crashed => "crashed",
        })
    }
}

/// Errors that end the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listen address could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The accept loop failed.
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

fn enter(phase: ServerPhase) {
    match phase {
        ServerPhase::Crashed => tracing::error!(phase = %phase, "API server phase changed"),
        _ => tracing::info!(phase = %phase, "API server phase changed"),
    }
}

/// Build the complete application: routes, state and middleware.
///
/// The stack, outermost first: Sentry, tracing span, security headers,
/// CORS, rate limiting, request ID, panic catcher.
pub fn build_app(state: AppState) -> Router {
    let config = state.config();

    let middleware = ServiceBuilder::new()
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .layer(from_fn(security_headers_middleware))
        .layer(cors_layer(&config.cors_origins))
        .layer(from_fn_with_state(
            rate_limiter(&config.rate_limit),
            rate_limit_middleware,
        ))
        .layer(from_fn(request_id_middleware))
        .layer(CatchPanicLayer::custom(handle_panic));

    routes::routes()
        .with_state(state)
        .layer(middleware)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// A server whose listener is bound but not yet accepting.
pub struct BoundServer {
    listener: TcpListener,
    app: Router,
}

impl BoundServer {
    /// Build the application and bind its listener.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Bind` if the address is unavailable. The server
    /// is then `Crashed`.
    pub async fn bind(config: KoriConfig) -> Result<Self, ServerError> {
        enter(ServerPhase::Starting);

        let addr = config.socket_addr();
        for warning in config.weak_secret_warnings() {
            tracing::warn!("{warning}");
        }

        let app = build_app(AppState::new(config));

        let listener = match TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(source) => {
                enter(ServerPhase::Crashed);
                return Err(ServerError::Bind { addr, source });
            }
        };

        Ok(Self { listener, app })
    }

    /// The address the listener is bound to.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the socket cannot report its address.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until `shutdown` resolves, then drain in-flight
    /// requests.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Serve` if the accept loop fails.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        enter(ServerPhase::Listening);
        if let Ok(addr) = self.listener.local_addr() {
            tracing::info!("kori-api listening on {}", addr);
        }

        let result = axum::serve(
            self.listener,
            self.app
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            shutdown.await;
            enter(ServerPhase::ShuttingDown);
        })
        .await;

        if let Err(e) = result {
            enter(ServerPhase::Crashed);
            return Err(ServerError::Serve(e));
        }

        tracing::info!("kori-api stopped");
        Ok(())
    }
}

/// Bind and serve until SIGINT or SIGTERM.
///
/// # Errors
///
/// Returns the `ServerError` that ended the server.
pub async fn run(config: KoriConfig) -> Result<(), ServerError> {
    BoundServer::bind(config)
        .await?
        .serve(shutdown_signal())
        .await
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode, header},
        response::Response,
    };
    use std::path::Path;

    use tower::ServiceExt;

    use super::*;
    use crate::test_support;

    fn app(overrides: &[(&str, &str)]) -> Router {
        build_app(AppState::new(test_support::config(overrides)))
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("x-forwarded-for", "203.0.113.10")
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_healthz() {
        let response = app(&[]).oneshot(get("/healthz")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"ok": true, "app": "Kori"})
        );
    }

    #[tokio::test]
    async fn test_readyz() {
        let response = app(&[]).oneshot(get("/readyz")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!({"ready": true}));
    }

    #[tokio::test]
    async fn test_version_reports_configured_value() {
        let response = app(&[]).oneshot(get("/version")).await.unwrap();

        assert_eq!(
            body_json(response).await,
            serde_json::json!({"version": "1.2.3-test"})
        );
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = app(&[]).oneshot(get("/nope")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": "Not Found"})
        );
    }

    #[tokio::test]
    async fn test_unsupported_method_is_404() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/healthz")
            .body(Body::empty())
            .unwrap();
        let response = app(&[]).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": "Not Found"})
        );
    }

    #[tokio::test]
    async fn test_security_headers_on_every_response() {
        for uri in ["/healthz", "/nope"] {
            let response = app(&[]).oneshot(get(uri)).await.unwrap();
            let headers = response.headers();

            assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
            assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
            assert_eq!(headers[header::CACHE_CONTROL], "no-store");
        }
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let request = Request::builder()
            .uri("/healthz")
            .header("x-request-id", "req-abc-123")
            .body(Body::empty())
            .unwrap();
        let response = app(&[]).oneshot(request).await.unwrap();

        assert_eq!(response.headers()["x-request-id"], "req-abc-123");
    }

    #[tokio::test]
    async fn test_request_id_is_generated() {
        let response = app(&[]).oneshot(get("/healthz")).await.unwrap();
        let id = response.headers()["x-request-id"].to_str().unwrap();

        assert!(uuid::Uuid::parse_str(id).is_ok());
    }

    #[tokio::test]
    async fn test_oversized_request_id_is_replaced() {
        let request = Request::builder()
            .uri("/healthz")
            .header("x-request-id", "x".repeat(200))
            .body(Body::empty())
            .unwrap();
        let response = app(&[]).oneshot(request).await.unwrap();
        let id = response.headers()["x-request-id"].to_str().unwrap();

        assert!(uuid::Uuid::parse_str(id).is_ok());
    }

    #[tokio::test]
    async fn test_cors_preflight_for_allowed_origin() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/healthz")
            .header(header::ORIGIN, "http://localhost:5173")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "x-custom")
            .body(Body::empty())
            .unwrap();
        let response = app(&[]).oneshot(request).await.unwrap();
        let headers = response.headers();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:5173"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "x-custom");
    }

    #[tokio::test]
    async fn test_bare_options_is_not_rejected() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/anything")
            .body(Body::empty())
            .unwrap();
        let response = app(&[]).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_cors_ignores_unlisted_origin() {
        let request = Request::builder()
            .uri("/healthz")
            .header(header::ORIGIN, "https://evil.example")
            .body(Body::empty())
            .unwrap();
        let response = app(&[]).oneshot(request).await.unwrap();

        assert!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_rate_limit_rejects_then_recovers() {
        let app = app(&[("RATE_LIMIT_MAX", "3"), ("RATE_LIMIT_WINDOW_SECS", "1")]);

        for _ in 0..3 {
            let response = app.clone().oneshot(get("/healthz")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
        let response = app.clone().oneshot(get("/healthz")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "1");
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": "Too Many Requests"})
        );

        // Other clients keep their own budget
        let other = Request::builder()
            .uri("/healthz")
            .header("x-forwarded-for", "198.51.100.20")
            .body(Body::empty())
            .unwrap();
        assert_eq!(app.clone().oneshot(other).await.unwrap().status(), StatusCode::OK);

        tokio::time::sleep(Duration::from_millis(1100)).await;

        let response = app.oneshot(get("/healthz")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_rate_limit_budget_not_refilled_within_window() {
        let app = app(&[("RATE_LIMIT_MAX", "3"), ("RATE_LIMIT_WINDOW_SECS", "3")]);

        let mut accepted = 0;
        for _ in 0..20 {
            let response = app.clone().oneshot(get("/healthz")).await.unwrap();
            if response.status() == StatusCode::OK {
                accepted += 1;
            } else {
                assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        assert_eq!(accepted, 3);
    }

    #[tokio::test]
    async fn test_openapi_json_served_from_yaml() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("openapi.yaml");
        let path = path.to_str().unwrap();
        let response = app(&[("OPENAPI_PATH", path)])
            .oneshot(get("/openapi.json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let document = body_json(response).await;
        assert_eq!(document["info"]["title"], "Kori API");
        assert!(document["paths"]["/healthz"]["get"]["responses"]["200"].is_object());
    }

    #[tokio::test]
    async fn test_openapi_missing_file_is_500() {
        let response = app(&[("OPENAPI_PATH", "/nonexistent/kori/openapi.yaml")])
            .oneshot(get("/openapi.json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": "Internal Server Error"})
        );
    }

    #[tokio::test]
    async fn test_bind_failure_is_reported() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port().to_string();
        let config = test_support::config(&[("HOST", "127.0.0.1"), ("PORT", &port)]);

        let result = BoundServer::bind(config).await;
        assert!(matches!(result, Err(ServerError::Bind { .. })));
    }

    #[tokio::test]
    async fn test_serve_until_shutdown() {
        let mut config = test_support::config(&[("HOST", "127.0.0.1")]);
        config.port = 0;

        let server = BoundServer::bind(config).await.unwrap();
        assert_ne!(server.local_addr().unwrap().port(), 0);

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(server.serve(async move {
            let _ = rx.await;
        }));
        tx.send(()).unwrap();

        assert!(handle.await.unwrap().is_ok());
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(ServerPhase::Starting.to_string(), "starting");
        assert_eq!(ServerPhase::Listening.to_string(), "listening");
        assert_eq!(ServerPhase::ShuttingDown.to_string(), "shutting_down");
        assert_eq!(ServerPhase::Crashed.to_string(), "crashed");
    }
}
