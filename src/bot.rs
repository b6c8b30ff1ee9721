//! The long-lived webhook receiver.
//!
//! A [`Bot`] owns the shared secret, the signature verifier, the decoder and
//! the [`Dispatcher`]. [`Bot::receive`] runs one delivery through all of
//! them: verify, then decode, then dispatch.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::dispatch::{DispatchError, Dispatcher, HookContext, HookResult, TriggerLogger};
use crate::types::DeliveryId;
use crate::webhooks::{
    DecodeError, Event, EventDecoder, EventKind, HmacSha256Verifier, JsonEventDecoder,
    SignatureVerifier, TypedEvent, json_payload,
};

/// Construction parameters for a [`Bot`].
#[derive(Clone, Default)]
pub struct BotConfig {
    /// Shared webhook secret. Empty disables signature verification.
    pub webhook_secret: Vec<u8>,
    /// Decode unrecognised event types to [`Event::Unknown`].
    pub lenient_events: bool,
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("webhook_secret", &"<redacted>")
            .field("lenient_events", &self.lenient_events)
            .finish()
    }
}

/// One inbound delivery, as the transport received it.
#[derive(Debug, Clone, Copy)]
pub struct Delivery<'a> {
    /// The `X-GitHub-Event` value.
    pub event_type: &'a str,
    /// The `X-Hub-Signature-256` value, if sent.
    pub signature: Option<&'a str>,
    /// The `X-GitHub-Delivery` value, if sent.
    pub delivery_id: Option<&'a str>,
    /// The `Content-Type` value, if sent. Form-encoded bodies are unwrapped
    /// after verification.
    pub content_type: Option<&'a str>,
    pub body: &'a [u8],
}

/// Why a delivery was not handled.
#[derive(Debug, Error)]
pub enum ReceiveError {
    /// Missing or invalid signature.
    #[error("webhook signature verification failed")]
    Authentication,

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl ReceiveError {
    /// True when the sender is at fault (bad signature or undecodable body).
    pub fn is_client_error(&self) -> bool {
        matches!(self, ReceiveError::Authentication | ReceiveError::Decode(_))
    }
}

/// Cheap-to-clone handle to the receiver.
#[derive(Clone)]
pub struct Bot {
    inner: Arc<BotInner>,
}

struct BotInner {
    webhook_secret: Vec<u8>,
    verifier: Box<dyn SignatureVerifier>,
    decoder: Box<dyn EventDecoder>,
    dispatcher: Dispatcher,
}

impl Bot {
    /// Creates a bot with HMAC-SHA256 verification and the JSON decoder.
    pub fn new(config: BotConfig) -> Self {
        let decoder = if config.lenient_events {
            JsonEventDecoder::lenient()
        } else {
            JsonEventDecoder::strict()
        };
        Self::with_parts(config, Box::new(HmacSha256Verifier), Box::new(decoder))
    }

    /// Creates a bot with the given verifier and decoder.
    pub fn with_parts(
        config: BotConfig,
        verifier: Box<dyn SignatureVerifier>,
        decoder: Box<dyn EventDecoder>,
    ) -> Self {
        if config.webhook_secret.is_empty() {
            warn!("No webhook secret configured; signatures will not be verified");
        }
        Bot {
            inner: Arc::new(BotInner {
                webhook_secret: config.webhook_secret,
                verifier,
                decoder,
                dispatcher: Dispatcher::new(),
            }),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    /// See [`Dispatcher::register`].
    pub fn register<E, F, Fut>(&self, hook: F)
    where
        E: TypedEvent,
        F: Fn(HookContext, Arc<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        self.inner.dispatcher.register(hook);
    }

    /// See [`Dispatcher::register_for`].
    pub fn register_for<F, Fut>(&self, kind: EventKind, hook: F)
    where
        F: Fn(HookContext, Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        self.inner.dispatcher.register_for(kind, hook);
    }

    pub fn set_logger(&self, logger: Arc<dyn TriggerLogger>) {
        self.inner.dispatcher.set_logger(logger);
    }

    /// Verifies, decodes and dispatches one delivery.
    ///
    /// Hooks receive a child of `cancellation`.
    pub async fn receive(
        &self,
        delivery: Delivery<'_>,
        cancellation: &CancellationToken,
    ) -> Result<(), ReceiveError> {
        self.authenticate(&delivery)?;

        let payload = json_payload(delivery.content_type, delivery.body)?;
        let event = self.inner.decoder.decode(delivery.event_type, &payload)?;

        let ctx = HookContext::new(
            delivery.delivery_id.map(DeliveryId::from),
            cancellation.child_token(),
        );
        self.inner
            .dispatcher
            .handle(ctx, delivery.event_type, &event)
            .await?;
        Ok(())
    }

    // Nothing about the payload is logged on failure; it is unauthenticated.
    fn authenticate(&self, delivery: &Delivery<'_>) -> Result<(), ReceiveError> {
        let secret = &self.inner.webhook_secret;
        if secret.is_empty() {
            return Ok(());
        }
        let Some(signature) = delivery.signature else {
            debug!("Delivery has no signature");
            return Err(ReceiveError::Authentication);
        };
        if !self.inner.verifier.verify(delivery.body, signature, secret) {
            debug!("Delivery signature rejected");
            return Err(ReceiveError::Authentication);
        }
        Ok(())
    }
}

impl fmt::Debug for Bot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bot")
            .field("verifies_signatures", &!self.inner.webhook_secret.is_empty())
            .field("dispatcher", &self.inner.dispatcher)
            .finish_non_exhaustive()
    }
}
