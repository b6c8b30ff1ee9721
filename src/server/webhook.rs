//! Webhook endpoint handler.
//!
//! Extracts the GitHub headers, hands the delivery to the [`Bot`] and maps the
//! outcome to a status code. Hooks run before the response is sent.
//!
//! [`Bot`]: crate::bot::Bot

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{debug, warn};

use super::AppState;
use crate::bot::{Delivery, ReceiveError};
use crate::webhooks::{DELIVERY_HEADER, EVENT_HEADER, SIGNATURE_HEADER};

/// Errors that can occur when processing a webhook.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Missing required header.
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    #[error(transparent)]
    Receive(#[from] ReceiveError),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            WebhookError::MissingHeader(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            WebhookError::Receive(e) if e.is_client_error() => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            // Hook errors stay in the server log
            WebhookError::Receive(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "webhook processing failed".to_string(),
            ),
        };

        (status, message).into_response()
    }
}

/// Webhook handler.
///
/// # Request
///
/// - Method: POST
/// - Headers:
///   - `X-GitHub-Event`: Event type (required)
///   - `X-Hub-Signature-256`: HMAC-SHA256 signature of the payload (required
///     unless the bot has no secret)
///   - `X-GitHub-Delivery`: Delivery ID, passed to hooks
///   - `Content-Type`: `application/json`, or
///     `application/x-www-form-urlencoded` with the JSON in `payload`
/// - Body: webhook payload
///
/// # Response
///
/// - 200 OK: Every hook for the event succeeded
/// - 400 Bad Request: Missing header, bad signature, or undecodable payload
/// - 500 Internal Server Error: Unsupported event kind or a hook failed
pub async fn webhook_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, &'static str), WebhookError> {
    let event_type = get_header(&headers, EVENT_HEADER)?;
    let delivery = Delivery {
        event_type,
        signature: optional_header(&headers, SIGNATURE_HEADER),
        delivery_id: optional_header(&headers, DELIVERY_HEADER),
        content_type: optional_header(&headers, CONTENT_TYPE.as_str()),
        body: &body,
    };

    debug!(
        delivery_id = delivery.delivery_id,
        event_type = %event_type,
        "Received webhook"
    );

    match app_state.bot.receive(delivery, &app_state.shutdown).await {
        Ok(()) => Ok((StatusCode::OK, "OK")),
        Err(e) => {
            warn!(
                delivery_id = delivery.delivery_id,
                event_type = %event_type,
                error = %e,
                "Webhook delivery failed"
            );
            Err(e.into())
        }
    }
}

/// Extracts a required header value as a string.
fn get_header<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, WebhookError> {
    optional_header(headers, name).ok_or(WebhookError::MissingHeader(name))
}

fn optional_header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::DispatchError;
    use crate::webhooks::DecodeError;

    #[test]
    fn get_header_present() {
        let mut headers = HeaderMap::new();
        headers.insert("x-github-event", "pull_request".parse().unwrap());

        let result = get_header(&headers, "x-github-event").unwrap();
        assert_eq!(result, "pull_request");
    }

    #[test]
    fn get_header_missing() {
        let headers = HeaderMap::new();

        let result = get_header(&headers, "x-github-event");
        assert!(matches!(result, Err(WebhookError::MissingHeader(_))));
    }

    #[test]
    fn status_codes_follow_fault() {
        let cases = [
            (WebhookError::MissingHeader(EVENT_HEADER), StatusCode::BAD_REQUEST),
            (ReceiveError::Authentication.into(), StatusCode::BAD_REQUEST),
            (
                ReceiveError::from(DecodeError::UnknownEventType("x".into())).into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                ReceiveError::from(DispatchError::UnsupportedKind("x".into())).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn server_errors_do_not_echo_hook_details() {
        let error: WebhookError = ReceiveError::from(DispatchError::Hook {
            kind: crate::webhooks::EventKind::Push,
            position: 1,
            source: anyhow::anyhow!("database password is hunter2"),
        })
        .into();

        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = http_body_util::BodyExt::collect(response.into_body())
            .await
            .unwrap()
            .to_bytes();
        assert_eq!(&body[..], b"webhook processing failed");
    }
}
