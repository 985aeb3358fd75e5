//! # Core subscriber trait
//!
//! `Subscribe` is the extension point for plugging custom event handlers into a
//! controller. Each subscriber is driven by a dedicated worker loop fed by a bounded
//! queue owned by the [`SubscriberSet`](crate::SubscriberSet).
//!
//! ## Contract
//! - Implementations may be slow (I/O, batching); they do **not** block the
//!   controller nor other subscribers.
//! - If a queue overflows, events for that subscriber are **dropped** and a
//!   `SubscriberOverflow` event is published.

use async_trait::async_trait;

use crate::events::Event;

/// Contract for lifecycle event subscribers.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use initvisor::{Event, EventKind, Subscribe};
///
/// struct Alerts;
///
/// #[async_trait]
/// impl Subscribe for Alerts {
///     async fn on_event(&self, ev: &Event) {
///         if ev.kind == EventKind::TimeoutHit {
///             // page someone...
///         }
///     }
///
///     fn name(&self) -> &'static str { "alerts" }
/// }
/// ```
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event for this subscriber.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs/metrics).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    fn queue_capacity(&self) -> usize {
        256
    }
}
