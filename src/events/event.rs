//! # Lifecycle events emitted by the controller.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Generation events**: the init attempt of one generation (starting, succeeded, failed, timeout, canceled)
//! - **Administrative events**: forced readiness and re-initialization
//! - **Subscriber events**: delivery problems inside the subscriber fan-out
//!
//! The [`Event`] struct carries additional metadata such as timestamps, owner name,
//! generation id, the configured timeout and a reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use initvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TimeoutHit)
//!     .with_owner("database")
//!     .with_generation(2)
//!     .with_timeout(Duration::from_secs(5));
//!
//! assert_eq!(ev.kind, EventKind::TimeoutHit);
//! assert_eq!(ev.owner.as_deref(), Some("database"));
//! assert_eq!(ev.timeout_ms, Some(5_000));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Generation events ===
    /// `on_init` was started for a generation.
    ///
    /// Sets: `owner`, `generation`, `timeout_ms` (if a timer is armed)
    InitStarting,

    /// `on_init` finished first; the signal was fulfilled.
    ///
    /// Sets: `owner`, `generation`
    InitSucceeded,

    /// `on_init` returned an error; the signal was failed with it.
    ///
    /// Sets: `owner`, `generation`, `reason`
    InitFailed,

    /// The timer fired before `on_init` finished; the signal was failed.
    ///
    /// Sets: `owner`, `generation`, `timeout_ms`
    TimeoutHit,

    /// The init task observed cancellation and exited without touching the signal.
    ///
    /// Sets: `owner`, `generation`
    InitCanceled,

    /// An init task reached the signal after it was already terminal or superseded.
    ///
    /// Sets: `owner`, `generation`, `reason`
    StaleCompletion,

    /// `on_ready` returned an error (not propagated to readiness observers).
    ///
    /// Sets: `owner`, `generation`, `reason`
    ReadyHookFailed,

    // === Administrative events ===
    /// Readiness was forced to success.
    ///
    /// Sets: `owner`, `generation`
    ForcedReady,

    /// Readiness was forced to failure.
    ///
    /// Sets: `owner`, `generation`, `reason`
    ForcedFailure,

    /// A pending generation was failed because it was discarded.
    ///
    /// Sets: `owner`, `generation` (the discarded one)
    GenerationInterrupted,

    /// A new generation was installed.
    ///
    /// Sets: `owner`, `generation` (the new one)
    Reinitialized,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `owner` (subscriber name), `reason`
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `owner` (subscriber name), `reason`
    SubscriberOverflow,
}

/// Lifecycle event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the owning lifecycle (or subscriber, for subscriber events).
    pub owner: Option<Arc<str>>,
    /// Generation the event refers to.
    pub generation: Option<u64>,
    /// Initialization timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            owner: None,
            generation: None,
            timeout_ms: None,
            reason: None,
        }
    }

    /// Attaches the owner name.
    #[inline]
    pub fn with_owner(mut self, owner: impl Into<Arc<str>>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Attaches a generation id.
    #[inline]
    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = Some(generation);
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_owner(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_owner(subscriber)
            .with_reason(info)
    }

    /// True for events raised by subscriber workers (overflow, panic).
    ///
    /// `owner` then names the subscriber, not the lifecycle.
    #[inline]
    pub fn is_subscriber_event(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::InitStarting);
        let b = Event::new(EventKind::InitSucceeded);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_timeout_saturates() {
        let ev = Event::new(EventKind::TimeoutHit).with_timeout(Duration::from_secs(u64::MAX));
        assert_eq!(ev.timeout_ms, Some(u32::MAX));
    }

    #[test]
    fn test_subscriber_overflow_reason() {
        let ev = Event::subscriber_overflow("audit", "full");
        assert!(ev.is_subscriber_event());
        assert!(!Event::new(EventKind::InitSucceeded).is_subscriber_event());
        assert_eq!(ev.owner.as_deref(), Some("audit"));
        assert_eq!(ev.reason.as_deref(), Some("subscriber=audit reason=full"));
    }
}
