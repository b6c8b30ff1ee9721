//! HTTP server for the webhook receiver.
//!
//! # Endpoints
//!
//! - `POST /webhook/github` - Accepts GitHub webhook deliveries and runs them
//!   through the [`Bot`]
//! - `GET /health` - Returns 200 if the server is running

use std::io;
use std::net::SocketAddr;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::bot::Bot;

pub mod webhook;

pub use webhook::webhook_handler;

/// Route deliveries are posted to.
pub const WEBHOOK_PATH: &str = "/webhook/github";

/// Shared application state, passed to handlers via axum's `State` extractor.
#[derive(Clone, Debug)]
pub struct AppState {
    pub bot: Bot,
    /// Cancelled when the server begins shutting down.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(bot: Bot, shutdown: CancellationToken) -> Self {
        AppState { bot, shutdown }
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route(WEBHOOK_PATH, post(webhook_handler))
        .route("/health", get(|| async { (StatusCode::OK, "OK") }))
        .with_state(app_state)
}

/// Serves `bot` on `addr` until `shutdown` is cancelled.
///
/// In-flight requests are allowed to finish; their hooks see the
/// cancellation through [`HookContext`](crate::dispatch::HookContext).
pub async fn serve(bot: Bot, addr: SocketAddr, shutdown: CancellationToken) -> io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Listening");

    let app = build_router(AppState::new(bot, shutdown.clone()));
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::bot::BotConfig;
    use crate::dispatch::HookContext;
    use crate::test_utils::{RecordingLogger, push_body};
    use crate::webhooks::events::PushEvent;
    use crate::webhooks::{EventKind, sign_payload};

    const SECRET: &[u8] = b"test-secret";

    fn test_bot(lenient: bool) -> Bot {
        Bot::new(BotConfig {
            webhook_secret: SECRET.to_vec(),
            lenient_events: lenient,
        })
    }

    fn app(bot: &Bot) -> Router {
        build_router(AppState::new(bot.clone(), CancellationToken::new()))
    }

    /// Creates a webhook request signed with `secret`.
    fn signed_request(secret: &[u8], event_type: &str, body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(WEBHOOK_PATH)
            .header("content-type", "application/json")
            .header("x-github-event", event_type)
            .header("x-github-delivery", "550e8400-e29b-41d4-a716-446655440000")
            .header("x-hub-signature-256", sign_payload(&body, secret))
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    // ─── Health endpoint tests ───

    #[tokio::test]
    async fn health_returns_200() {
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app(&test_bot(false)).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "OK");
    }

    // ─── Webhook endpoint tests ───

    #[tokio::test]
    async fn signed_push_returns_200_and_runs_hooks() {
        let bot = test_bot(false);
        let logger = Arc::new(RecordingLogger::default());
        bot.set_logger(logger.clone());
        let calls = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&calls);
        bot.register(move |_ctx: HookContext, _push: Arc<PushEvent>| {
            let sink = Arc::clone(&sink);
            async move {
                *sink.lock().unwrap() += 1;
                Ok(())
            }
        });

        let response = app(&bot)
            .oneshot(signed_request(SECRET, "push", push_body()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "OK");
        assert_eq!(*calls.lock().unwrap(), 1);
        assert_eq!(
            logger.records()[0].to_json_line(),
            r#"{"type":"push","sender":"octocat","repo":"hello-world"}"#
        );
    }

    #[tokio::test]
    async fn invalid_signature_returns_400() {
        let bot = test_bot(false);
        let logger = Arc::new(RecordingLogger::default());
        bot.set_logger(logger.clone());

        let response = app(&bot)
            .oneshot(signed_request(b"wrong-secret", "push", push_body()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(logger.records().is_empty());
    }

    #[tokio::test]
    async fn missing_signature_returns_400() {
        let request = Request::builder()
            .method("POST")
            .uri(WEBHOOK_PATH)
            .header("x-github-event", "push")
            .body(Body::from(push_body()))
            .unwrap();

        let response = app(&test_bot(false)).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_event_header_returns_400() {
        let body = push_body();
        let request = Request::builder()
            .method("POST")
            .uri(WEBHOOK_PATH)
            .header("x-hub-signature-256", sign_payload(&body, SECRET))
            .body(Body::from(body))
            .unwrap();

        let response = app(&test_bot(false)).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("x-github-event"));
    }

    #[tokio::test]
    async fn unknown_event_type_is_400_when_strict() {
        let response = app(&test_bot(false))
            .oneshot(signed_request(SECRET, "not_a_real_kind", b"{}".to_vec()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_event_type_is_500_when_lenient() {
        let response = app(&test_bot(true))
            .oneshot(signed_request(SECRET, "not_a_real_kind", b"{}".to_vec()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn malformed_json_returns_400() {
        let response = app(&test_bot(false))
            .oneshot(signed_request(SECRET, "push", b"{not json".to_vec()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn failing_hook_returns_500() {
        let bot = test_bot(false);
        bot.register_for(EventKind::Push, |_ctx, _event| async {
            Err::<(), _>(anyhow::anyhow!("boom"))
        });

        let response = app(&bot)
            .oneshot(signed_request(SECRET, "push", push_body()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_text(response).await;
        assert_eq!(body, "webhook processing failed");
        assert!(!body.contains("boom"));
    }

    #[tokio::test]
    async fn form_encoded_delivery_returns_200() {
        let bot = test_bot(false);
        let logger = Arc::new(RecordingLogger::default());
        bot.set_logger(logger.clone());

        let json = String::from_utf8(push_body()).unwrap();
        let body = serde_urlencoded::to_string([("payload", json.as_str())])
            .unwrap()
            .into_bytes();
        let request = Request::builder()
            .method("POST")
            .uri(WEBHOOK_PATH)
            .header("content-type", "application/x-www-form-urlencoded")
            .header("x-github-event", "push")
            .header("x-hub-signature-256", sign_payload(&body, SECRET))
            .body(Body::from(body))
            .unwrap();

        let response = app(&bot).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            logger.records()[0].to_json_line(),
            r#"{"type":"push","sender":"octocat","repo":"hello-world"}"#
        );
    }

    #[tokio::test]
    async fn form_encoded_delivery_without_payload_returns_400() {
        let body = b"zen=nope".to_vec();
        let request = Request::builder()
            .method("POST")
            .uri(WEBHOOK_PATH)
            .header("content-type", "application/x-www-form-urlencoded")
            .header("x-github-event", "ping")
            .header("x-hub-signature-256", sign_payload(&body, SECRET))
            .body(Body::from(body))
            .unwrap();

        let response = app(&test_bot(false)).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn get_on_webhook_returns_405() {
        let request = Request::builder()
            .method("GET")
            .uri(WEBHOOK_PATH)
            .body(Body::empty())
            .unwrap();

        let response = app(&test_bot(false)).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn serve_stops_on_cancellation() {
        let shutdown = CancellationToken::new();
        let server = tokio::spawn(serve(
            test_bot(false),
            "127.0.0.1:0".parse().unwrap(),
            shutdown.clone(),
        ));

        shutdown.cancel();

        server.await.unwrap().unwrap();
    }
}
