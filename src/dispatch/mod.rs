//! Hook registration and dispatch.
//!
//! A [`Dispatcher`] keeps an ordered list of hooks per [`EventKind`] and runs
//! them for each delivery. Every delivery produces exactly one
//! [`TriggerLogRecord`], whether or not any hook is registered.
//!
//! [`EventKind`]: crate::webhooks::EventKind

pub mod context;
pub mod dispatcher;
pub mod registry;
pub mod trigger;

pub use context::HookContext;
pub use dispatcher::{DispatchError, Dispatcher};
pub use registry::{ErasedHook, HookFuture, HookRegistry, HookResult};
pub use trigger::{JsonLineLogger, NoopLogger, TracingLogger, TriggerLogRecord, TriggerLogger};
