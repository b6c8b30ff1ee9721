//! Shared test utilities and arbitrary generators for property-based testing.

use std::sync::{Mutex, PoisonError};

use proptest::prelude::*;
use serde_json::json;

use crate::dispatch::{TriggerLogRecord, TriggerLogger};
use crate::webhooks::{Event, EventKind};

pub fn arb_event_kind() -> impl Strategy<Value = EventKind> {
    proptest::sample::select(EventKind::ALL)
}

/// A payload of `kind` with every field absent.
pub fn empty_event(kind: EventKind) -> Event {
    Event::from_slice(kind, b"{}").unwrap()
}

/// A push payload carrying all three envelope fields.
pub fn push_body() -> Vec<u8> {
    serde_json::to_vec(&json!({
        "ref": "refs/heads/main",
        "before": "0000000000000000000000000000000000000000",
        "after": "6dcb09b5b57875f334f61aebed695e2e4193db5e",
        "commits": [],
        "sender": { "login": "octocat", "id": 1, "type": "User" },
        "organization": { "login": "octo-org", "id": 2 },
        "repository": {
            "id": 3,
            "name": "hello-world",
            "full_name": "octo-org/hello-world",
            "owner": { "login": "octo-org", "id": 2, "type": "Organization" }
        }
    }))
    .unwrap()
}

/// Captures everything the dispatcher logs.
#[derive(Debug, Default)]
pub struct RecordingLogger {
    records: Mutex<Vec<TriggerLogRecord>>,
    failures: Mutex<Vec<(String, usize, String)>>,
}

impl RecordingLogger {
    pub fn records(&self) -> Vec<TriggerLogRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// `(kind, position, message)` for each hook failure.
    pub fn failures(&self) -> Vec<(String, usize, String)> {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl TriggerLogger for RecordingLogger {
    fn log_trigger(&self, record: &TriggerLogRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
    }

    fn log_hook_failure(&self, kind: &str, position: usize, error: &anyhow::Error) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((kind.to_string(), position, error.to_string()));
    }
}
