//! Routes decoded events to the hooks registered for their kind.
//!
//! # Locking
//!
//! One mutex guards both the hook registry and the trigger logger. It is held
//! only to append a hook, swap the logger, or take a snapshot at the start of
//! a delivery; never while a hook runs. Registrations that race with a
//! delivery may or may not be seen by it, but the relative order of hooks it
//! does see always matches registration order.
//!
//! # Control flow
//!
//! ```text
//! handle(ctx, discriminator, event)
//!   ├─ snapshot logger (+ hooks for event.kind())
//!   ├─ logger.log_trigger(record)          exactly once
//!   ├─ unknown discriminator
//!   │    or Event::Unknown      → Err(UnsupportedKind)
//!   ├─ discriminator ≠ kind     → Err(KindMismatch)
//!   └─ for hook in hooks (in order)
//!        └─ Err(e) → log, Err(Hook { position, e })   remaining hooks skipped
//! ```

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::{debug, error, instrument, warn};

use super::context::HookContext;
use super::registry::{HookRegistry, HookResult, erase_typed, erase_untyped};
use super::trigger::{NoopLogger, TriggerLogRecord, TriggerLogger};
use crate::webhooks::{Event, EventKind, TypedEvent};

/// Errors that can occur while dispatching one delivery.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The event's kind is outside the set this dispatcher knows.
    #[error("unsupported event kind: {0}")]
    UnsupportedKind(String),

    /// The discriminator names a different kind than the decoded payload.
    #[error("event type {discriminator} does not match decoded {kind} payload")]
    KindMismatch {
        discriminator: String,
        kind: EventKind,
    },

    /// A hook failed; hooks after it were not run.
    #[error("error on hook {position} for {kind}: {source}")]
    Hook {
        kind: EventKind,
        /// 1-based position of the failing hook in registration order.
        position: usize,
        #[source]
        source: anyhow::Error,
    },
}

/// Result type for dispatch operations.
pub type Result<T> = std::result::Result<T, DispatchError>;

struct Shared {
    registry: HookRegistry,
    logger: Arc<dyn TriggerLogger>,
}

/// Owns the hook registry and the trigger logger.
///
/// Safe to share across tasks; every method takes `&self`.
pub struct Dispatcher {
    shared: Mutex<Shared>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Creates a dispatcher with no hooks and a [`NoopLogger`].
    pub fn new() -> Self {
        Self::with_logger(Arc::new(NoopLogger))
    }

    pub fn with_logger(logger: Arc<dyn TriggerLogger>) -> Self {
        Dispatcher {
            shared: Mutex::new(Shared {
                registry: HookRegistry::new(),
                logger,
            }),
        }
    }

    // Appends and swaps cannot leave `Shared` half-updated, so a poisoned
    // lock is still consistent.
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a hook for the kind of `E`.
    ///
    /// ```
    /// use std::sync::Arc;
    /// use hookwire::dispatch::{Dispatcher, HookContext};
    /// use hookwire::webhooks::{EventKind, events::PushEvent};
    ///
    /// let dispatcher = Dispatcher::new();
    /// dispatcher.register(|_ctx: HookContext, push: Arc<PushEvent>| async move {
    ///     println!("pushed to {:?}", push.ref_name);
    ///     Ok(())
    /// });
    /// assert_eq!(dispatcher.hook_count(EventKind::Push), 1);
    /// ```
    pub fn register<E, F, Fut>(&self, hook: F)
    where
        E: TypedEvent,
        F: Fn(HookContext, Arc<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        let hook = erase_typed(hook);
        self.lock().registry.register(E::KIND, hook);
        debug!(event = %E::KIND, "Registered hook");
    }

    /// Registers a hook for `kind` that receives the whole [`Event`].
    pub fn register_for<F, Fut>(&self, kind: EventKind, hook: F)
    where
        F: Fn(HookContext, Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        let hook = erase_untyped(hook);
        self.lock().registry.register(kind, hook);
        debug!(event = %kind, "Registered hook");
    }

    /// Replaces the trigger logger. Deliveries already past their snapshot
    /// keep the old one.
    pub fn set_logger(&self, logger: Arc<dyn TriggerLogger>) {
        self.lock().logger = logger;
    }

    pub fn hook_count(&self, kind: EventKind) -> usize {
        self.lock().registry.hook_count(kind)
    }

    /// Logs the delivery, then runs the hooks for its kind in order.
    ///
    /// Returns on the first hook failure. Zero hooks is a success.
    #[instrument(skip_all, fields(event = %discriminator, delivery_id = ctx.delivery_id().map(|d| d.as_str())))]
    pub async fn handle(&self, ctx: HookContext, discriminator: &str, event: &Event) -> Result<()> {
        let record = TriggerLogRecord::from_event(discriminator, event);
        let kind = event.kind();

        let (logger, hooks) = {
            let shared = self.lock();
            let hooks = kind.map(|k| shared.registry.handlers_for(k));
            (Arc::clone(&shared.logger), hooks)
        };

        logger.log_trigger(&record);

        let named = discriminator.parse::<EventKind>();
        let (Ok(named), Some(kind), Some(hooks)) = (named, kind, hooks) else {
            warn!("Unsupported event kind");
            return Err(DispatchError::UnsupportedKind(discriminator.to_string()));
        };

        if named != kind {
            warn!(decoded = %kind, "Event type does not match payload");
            return Err(DispatchError::KindMismatch {
                discriminator: discriminator.to_string(),
                kind,
            });
        }

        debug!(hooks = hooks.len(), "Dispatching event");

        for (index, hook) in hooks.iter().enumerate() {
            let position = index + 1;
            if let Err(source) = hook(ctx.clone(), event).await {
                logger.log_hook_failure(discriminator, position, &source);
                error!(position, error = %source, "Error on hook");
                return Err(DispatchError::Hook {
                    kind,
                    position,
                    source,
                });
            }
        }

        Ok(())
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.lock().registry)
            .finish_non_exhaustive()
    }
}
