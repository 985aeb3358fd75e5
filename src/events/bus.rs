//! # Event bus for broadcasting lifecycle events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] used by the controller,
//! its init runners and the subscriber workers to publish [`Event`]s without blocking.
//!
//! ## Architecture
//! ```text
//! Publishers:                         Consumers:
//!   Controller ──┐                  ┌──► subscriber_listener ──► SubscriberSet
//!   Runner(s)  ──┼──► Bus ──────────┤
//!   Workers    ──┘ (broadcast chan) └──► Controller::subscribe() receivers
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks.
//! - **Bounded capacity**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: events are lost if there are no receivers at send time.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for lifecycle events.
///
/// Cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Event>(capacity);
        Self { tx }
    }

    /// Publishes an event to all active receivers.
    ///
    /// If there are no receivers, the event is dropped.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that will observe subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn test_receivers_observe_events_after_subscribe() {
        let bus = Bus::new(8);
        bus.publish(Event::new(EventKind::InitStarting));

        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::InitSucceeded).with_generation(1));

        let ev = rx.recv().await.expect("event");
        assert_eq!(ev.kind, EventKind::InitSucceeded);
        assert_eq!(ev.generation, Some(1));
    }

    #[test]
    fn test_publish_without_receivers_is_silent() {
        let bus = Bus::new(0);
        bus.publish(Event::new(EventKind::ForcedReady));
    }
}
