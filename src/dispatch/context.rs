//! Per-delivery context handed to every hook.

use tokio_util::sync::CancellationToken;

use crate::types::DeliveryId;

/// Context for one delivery.
///
/// The dispatcher never enforces timeouts. A hook that may block for long
/// should watch [`HookContext::cancellation`], which the transport cancels
/// when the server shuts down.
#[derive(Debug, Clone, Default)]
pub struct HookContext {
    delivery_id: Option<DeliveryId>,
    cancellation: CancellationToken,
}

impl HookContext {
    pub fn new(delivery_id: Option<DeliveryId>, cancellation: CancellationToken) -> Self {
        HookContext {
            delivery_id,
            cancellation,
        }
    }

    /// The `X-GitHub-Delivery` value, when the sender supplied one.
    pub fn delivery_id(&self) -> Option<&DeliveryId> {
        self.delivery_id.as_ref()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_context_is_live_and_anonymous() {
        let ctx = HookContext::default();
        assert!(ctx.delivery_id().is_none());
        assert!(!ctx.is_cancelled());
    }

    #[test]
    fn clones_share_cancellation() {
        let token = CancellationToken::new();
        let ctx = HookContext::new(Some(DeliveryId::new("abc")), token.child_token());
        let cloned = ctx.clone();

        token.cancel();

        assert!(ctx.is_cancelled());
        assert!(cloned.is_cancelled());
        assert_eq!(cloned.delivery_id().map(DeliveryId::as_str), Some("abc"));
    }
}
