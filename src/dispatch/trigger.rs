//! Trigger logging: one structured record per delivery.
//!
//! The record names the event kind and, where the kind carries them and the
//! payload actually has them, the sending actor, the organization and the
//! repository. Absent values are left out of the record rather than treated
//! as errors.

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use tracing::{error, info, warn};

use crate::webhooks::{CarriedFields, Event, EventKind};

/// What the dispatcher logs for each delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerLogRecord {
    /// The discriminator the delivery arrived with.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
}

impl TriggerLogRecord {
    /// Builds the record for `event`, received as `discriminator`.
    ///
    /// For unknown kinds every envelope field that is present is kept, since
    /// there is no table entry to consult.
    pub fn from_event(discriminator: &str, event: &Event) -> Self {
        let envelope = event.envelope();
        let carried = event.kind().map(EventKind::carried_fields);
        let keep = |wanted: fn(CarriedFields) -> bool| carried.is_none_or(wanted);

        TriggerLogRecord {
            kind: discriminator.to_string(),
            sender: envelope
                .sender_login()
                .filter(|_| keep(|c| c.sender))
                .map(str::to_string),
            org: envelope
                .org_login()
                .filter(|_| keep(|c| c.org))
                .map(str::to_string),
            repo: envelope
                .repo_name()
                .filter(|_| keep(|c| c.repo))
                .map(str::to_string),
        }
    }

    /// Serializes the record as a single JSON line (no trailing newline).
    pub fn to_json_line(&self) -> String {
        match serde_json::to_string(self) {
            Ok(line) => line,
            // Unreachable for this shape; fall back to the kind alone
            Err(_) => format!("{{\"type\":{:?}}}", self.kind),
        }
    }
}

/// Sink for trigger records and hook failures.
///
/// Implementations must not panic; a failure to record is the logger's own
/// business and never fails the delivery.
pub trait TriggerLogger: Send + Sync {
    /// Called exactly once per delivery, before any hook runs.
    fn log_trigger(&self, record: &TriggerLogRecord);

    /// Called when hook number `position` (1-based) for `kind` fails.
    fn log_hook_failure(&self, kind: &str, position: usize, error: &anyhow::Error) {
        let _ = (kind, position, error);
    }
}

/// Discards everything. The dispatcher's default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl TriggerLogger for NoopLogger {
    fn log_trigger(&self, _record: &TriggerLogRecord) {}
}

/// Emits records as `tracing` events under the `hookwire::trigger` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TriggerLogger for TracingLogger {
    fn log_trigger(&self, record: &TriggerLogRecord) {
        info!(
            target: "hookwire::trigger",
            event = %record.kind,
            sender = record.sender.as_deref(),
            org = record.org.as_deref(),
            repo = record.repo.as_deref(),
            "Webhook triggered"
        );
    }

    fn log_hook_failure(&self, kind: &str, position: usize, error: &anyhow::Error) {
        error!(
            target: "hookwire::trigger",
            event = %kind,
            position,
            error = %error,
            "Error on hook"
        );
    }
}

/// Writes each record as one JSON line to `W`.
pub struct JsonLineLogger<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLineLogger<W> {
    pub fn new(writer: W) -> Self {
        JsonLineLogger {
            writer: Mutex::new(writer),
        }
    }

    /// Consumes the logger and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_line(&self, line: &str) {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(writer, "{line}").and_then(|()| writer.flush()) {
            warn!(error = %e, "Failed to write trigger log line");
        }
    }
}

impl<W: Write + Send> TriggerLogger for JsonLineLogger<W> {
    fn log_trigger(&self, record: &TriggerLogRecord) {
        self.write_line(&record.to_json_line());
    }

    fn log_hook_failure(&self, kind: &str, position: usize, error: &anyhow::Error) {
        let line = serde_json::json!({
            "type": kind,
            "hook": position,
            "error": format!("{error:#}"),
        });
        self.write_line(&line.to_string());
    }
}
