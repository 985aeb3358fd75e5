//! # LogWriter: lifecycle events rendered through `tracing`
//!
//! A minimal subscriber that turns incoming [`Event`]s into `tracing` records.
//! Install any `tracing` subscriber (e.g. `tracing_subscriber::fmt`) to see them.
//!
//! ## Example output
//! ```text
//! INFO [init-starting] owner="db" generation=1 timeout_ms=Some(5000)
//! INFO [ready] owner="db" generation=1
//! WARN [timeout] owner="db" generation=2 timeout_ms=Some(100)
//! INFO [reinitialized] owner="db" generation=3
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let owner = e.owner.as_deref().unwrap_or("unknown");
        let generation = e.generation.unwrap_or_default();
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::InitStarting => {
                info!(owner, generation, timeout_ms = ?e.timeout_ms, "[init-starting]");
            }
            EventKind::InitSucceeded => info!(owner, generation, "[ready]"),
            EventKind::InitFailed => warn!(owner, generation, reason, "[failed]"),
            EventKind::TimeoutHit => {
                warn!(owner, generation, timeout_ms = ?e.timeout_ms, "[timeout]");
            }
            EventKind::InitCanceled => debug!(owner, generation, "[canceled]"),
            EventKind::StaleCompletion => debug!(owner, generation, reason, "[stale]"),
            EventKind::ReadyHookFailed => warn!(owner, generation, reason, "[ready-hook-failed]"),
            EventKind::ForcedReady => info!(owner, generation, "[forced-ready]"),
            EventKind::ForcedFailure => warn!(owner, generation, reason, "[forced-failure]"),
            EventKind::GenerationInterrupted => {
                info!(owner, generation, "[generation-interrupted]");
            }
            EventKind::Reinitialized => info!(owner, generation, "[reinitialized]"),
            EventKind::SubscriberOverflow => {
                warn!(subscriber = owner, reason, "[subscriber-overflow]");
            }
            EventKind::SubscriberPanicked => {
                warn!(subscriber = owner, reason, "[subscriber-panicked]");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
