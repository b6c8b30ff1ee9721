//! Webhook handling for GitHub events.
//!
//! This module provides:
//! - Signature verification for webhook payloads (HMAC-SHA256)
//! - Typed event kinds and payloads
//! - Decoding of raw deliveries into those types

pub mod events;
pub mod parser;
pub mod signature;

pub use events::{CarriedFields, Envelope, Event, EventKind, TypedEvent, UnknownEvent, UnknownEventKind};
pub use parser::{
    DELIVERY_HEADER, DecodeError, EVENT_HEADER, EventDecoder, FORM_CONTENT_TYPE, JsonEventDecoder,
    json_payload, parse_webhook,
};
pub use signature::{
    HmacSha256Verifier, SIGNATURE_HEADER, SignatureVerifier, compute_signature,
    format_signature_header, parse_signature_header, sign_payload, verify_signature,
};
