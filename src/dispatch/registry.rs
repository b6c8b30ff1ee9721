//! Append-only registry of hooks, keyed by event kind.
//!
//! Hooks are stored type-erased so one map can hold all 41 kinds. Typed hooks
//! are wrapped by [`erase_typed`], which recovers the concrete payload with
//! [`TypedEvent::from_event`] before calling the user's closure.
//!
//! The registry itself is not synchronised; [`Dispatcher`] owns it behind its
//! mutex.
//!
//! [`Dispatcher`]: super::Dispatcher

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::anyhow;

use super::context::HookContext;
use crate::webhooks::{Event, EventKind, TypedEvent};

/// Outcome of one hook invocation.
pub type HookResult = anyhow::Result<()>;

/// Boxed future returned by an erased hook.
pub type HookFuture = Pin<Box<dyn Future<Output = HookResult> + Send + 'static>>;

/// A hook with its payload type erased.
pub type ErasedHook = Arc<dyn Fn(HookContext, &Event) -> HookFuture + Send + Sync>;

/// Wraps a hook that takes one concrete payload type.
pub fn erase_typed<E, F, Fut>(hook: F) -> ErasedHook
where
    E: TypedEvent,
    F: Fn(HookContext, Arc<E>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HookResult> + Send + 'static,
{
    Arc::new(move |ctx: HookContext, event: &Event| -> HookFuture {
        match E::from_event(event) {
            Some(payload) => Box::pin(hook(ctx, Arc::clone(payload))),
            None => {
                // Only reachable if a hook was filed under the wrong kind.
                let received = event.discriminator().to_string();
                Box::pin(async move {
                    Err(anyhow!(
                        "hook for {} received a {received} event",
                        E::KIND
                    ))
                })
            }
        }
    })
}

/// Wraps a hook that takes the whole [`Event`].
pub fn erase_untyped<F, Fut>(hook: F) -> ErasedHook
where
    F: Fn(HookContext, Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HookResult> + Send + 'static,
{
    Arc::new(move |ctx: HookContext, event: &Event| -> HookFuture {
        Box::pin(hook(ctx, event.clone()))
    })
}

/// Ordered hook lists per event kind.
///
/// Lists only grow. Insertion order is invocation order, and the same hook
/// may be registered more than once.
#[derive(Default)]
pub struct HookRegistry {
    hooks: HashMap<EventKind, Vec<ErasedHook>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `hook` to the list for `kind`.
    pub fn register(&mut self, kind: EventKind, hook: ErasedHook) {
        self.hooks.entry(kind).or_default().push(hook);
    }

    /// Snapshot of the hooks for `kind`, in registration order.
    ///
    /// The returned list is independent of the registry, so the caller can
    /// release any lock before invoking the hooks.
    pub fn handlers_for(&self, kind: EventKind) -> Vec<ErasedHook> {
        self.hooks.get(&kind).cloned().unwrap_or_default()
    }

    pub fn hook_count(&self, kind: EventKind) -> usize {
        self.hooks.get(&kind).map_or(0, Vec::len)
    }

    /// Returns true if no hook is registered for any kind.
    pub fn is_empty(&self) -> bool {
        self.hooks.values().all(Vec::is_empty)
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut counts: Vec<_> = self
            .hooks
            .iter()
            .map(|(kind, hooks)| (kind.as_str(), hooks.len()))
            .collect();
        counts.sort_unstable();
        f.debug_struct("HookRegistry").field("hooks", &counts).finish()
    }
}
