//! GitHub webhook payload decoder.
//!
//! Turns the `X-GitHub-Event` discriminator and the raw body into a typed
//! [`Event`]. The decoder never looks at signatures; callers verify first.
//!
//! # Unknown discriminators
//!
//! GitHub adds event types over time. A strict decoder (the default) rejects
//! discriminators outside [`EventKind`] with [`DecodeError::UnknownEventType`].
//! A lenient decoder instead yields [`Event::Unknown`] so the delivery still
//! reaches the dispatcher, which logs it and reports it as unsupported.
//!
//! # Form-encoded deliveries
//!
//! A hook configured with content type `application/x-www-form-urlencoded`
//! sends the JSON document in a `payload` form field. [`json_payload`] pulls
//! it out; the signature still covers the raw form body.

use std::borrow::Cow;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use super::events::{Event, EventKind, UnknownEvent};

/// Header carrying the event discriminator.
pub const EVENT_HEADER: &str = "x-github-event";

/// Header carrying the delivery ID.
pub const DELIVERY_HEADER: &str = "x-github-delivery";

/// Content type of form-encoded deliveries.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Error type for webhook decoding failures.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The discriminator is not a known event kind.
    #[error("unknown X-GitHub-Event type: {0}")]
    UnknownEventType(String),

    /// The body is not a JSON object matching the payload shape.
    #[error("JSON parse error for {event_type} payload: {source}")]
    Json {
        event_type: String,
        #[source]
        source: serde_json::Error,
    },

    /// A form-encoded body without a usable `payload` field.
    #[error("invalid form-encoded payload: {0}")]
    Form(#[from] serde_urlencoded::de::Error),
}

#[derive(Deserialize)]
struct FormBody {
    payload: String,
}

/// Returns the JSON document carried by a delivery body.
///
/// JSON bodies are returned as-is. Form-encoded bodies yield their `payload`
/// field.
pub fn json_payload<'a>(
    content_type: Option<&str>,
    body: &'a [u8],
) -> Result<Cow<'a, [u8]>, DecodeError> {
    let is_form = content_type
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE));
    if !is_form {
        return Ok(Cow::Borrowed(body));
    }

    let form: FormBody = serde_urlencoded::from_bytes(body)?;
    Ok(Cow::Owned(form.payload.into_bytes()))
}

/// Decodes a delivery body into a typed event.
pub trait EventDecoder: Send + Sync {
    fn decode(&self, discriminator: &str, body: &[u8]) -> Result<Event, DecodeError>;
}

/// Serde-backed decoder for GitHub's JSON payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEventDecoder {
    lenient: bool,
}

impl JsonEventDecoder {
    /// A decoder that rejects unknown discriminators.
    pub fn strict() -> Self {
        JsonEventDecoder { lenient: false }
    }

    /// A decoder that maps unknown discriminators to [`Event::Unknown`].
    pub fn lenient() -> Self {
        JsonEventDecoder { lenient: true }
    }

    pub fn is_lenient(&self) -> bool {
        self.lenient
    }
}

impl EventDecoder for JsonEventDecoder {
    fn decode(&self, discriminator: &str, body: &[u8]) -> Result<Event, DecodeError> {
        let json_error = |source| DecodeError::Json {
            event_type: discriminator.to_string(),
            source,
        };

        match discriminator.parse::<EventKind>() {
            Ok(kind) => Event::from_slice(kind, body).map_err(json_error),
            Err(_) if self.lenient => {
                let mut unknown: UnknownEvent = serde_json::from_slice(body).map_err(json_error)?;
                unknown.discriminator = discriminator.to_string();
                Ok(Event::Unknown(Arc::new(unknown)))
            }
            Err(_) => Err(DecodeError::UnknownEventType(discriminator.to_string())),
        }
    }
}

/// Decodes with the strict decoder.
///
/// # Examples
///
/// ```
/// use hookwire::webhooks::{EventKind, parse_webhook};
///
/// let body = br#"{
///     "action": "opened",
///     "number": 42,
///     "sender": { "login": "octocat" },
///     "repository": { "name": "hello-world" }
/// }"#;
///
/// let event = parse_webhook("pull_request", body).unwrap();
/// assert_eq!(event.kind(), Some(EventKind::PullRequest));
/// assert!(parse_webhook("not_a_real_kind", body).is_err());
/// ```
pub fn parse_webhook(event_type: &str, payload: &[u8]) -> Result<Event, DecodeError> {
    JsonEventDecoder::strict().decode(event_type, payload)
}
