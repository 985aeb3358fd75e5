//! # Run the init attempt of one generation.
//!
//! Races [`Lifecycle::on_init`] against the generation's timer and cancellation
//! token, then writes the winner into the readiness signal.
//!
//! ## Event flow
//!
//! ```text
//! Success:
//!   publish InitStarting → on_init() → Ok  → signal = Ok   → publish InitSucceeded → on_ready()
//!
//! Failure:
//!   publish InitStarting → on_init() → Err → signal = Err  → publish InitFailed
//!
//! Timeout:
//!   publish InitStarting → timer fires → cancel child → signal = Timeout → publish TimeoutHit
//!
//! Cancellation (force_ready / re_initialize / drop):
//!   publish InitStarting → token cancelled → drop on_init → publish InitCanceled   (signal untouched)
//!   token cancelled before the first poll → exit silently (no InitStarting)
//!
//! Lost race:
//!   ... → signal already terminal or generation superseded → publish StaleCompletion
//! ```
//!
//! ## Rules
//! - The runner never writes a signal after observing cancellation.
//! - A write that loses the race is a no-op; it never touches another generation.
//! - `on_ready` runs inline in the runner task after the signal is fulfilled; its outcome
//!   is reported, not propagated.
//! - Panics inside `on_init` are caught and become [`InitError::Init`].

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::{select, time};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::controller::Shared;
use super::generation::Generation;
use super::signal::Outcome;
use crate::error::{panic_message, InitError};
use crate::events::{Event, EventKind};
use crate::lifecycle::Lifecycle;

/// Drives one generation from `InitStarting` to a terminal signal (or cancellation).
///
/// `limit = None` runs `on_init` without a timer.
pub(crate) async fn run_generation(
    shared: Arc<Shared>,
    generation: Arc<Generation>,
    limit: Option<Duration>,
) {
    let lifecycle = Arc::clone(&shared.lifecycle);
    let owner: Arc<str> = Arc::from(lifecycle.name());
    let id = generation.id;

    if generation.token.is_cancelled() {
        debug!(owner = %owner, generation = id, "generation cancelled before start");
        return;
    }

    let mut starting = Event::new(EventKind::InitStarting)
        .with_owner(Arc::clone(&owner))
        .with_generation(id);
    if let Some(dur) = limit {
        starting = starting.with_timeout(dur);
    }
    shared.bus.publish(starting);
    debug!(owner = %owner, generation = id, ?limit, "initialization started");

    let outcome = select! {
        biased;
        _ = generation.token.cancelled() => {
            debug!(owner = %owner, generation = id, "initialization canceled");
            shared.bus.publish(
                Event::new(EventKind::InitCanceled)
                    .with_owner(Arc::clone(&owner))
                    .with_generation(id),
            );
            return;
        }
        outcome = attempt(lifecycle.as_ref(), &generation.token, &owner, limit) => outcome,
    };

    if shared.current_generation() != id {
        publish_stale(&shared, owner, id, "generation superseded");
        return;
    }

    let terminal = terminal_event(&outcome, &owner, id);
    let succeeded = outcome.is_ok();
    if generation.signal.complete(outcome).is_err() {
        publish_stale(&shared, owner, id, "signal already terminal");
        return;
    }
    shared.finish(id);
    shared.bus.publish(terminal);

    if !succeeded {
        debug!(owner = %owner, generation = id, "initialization failed");
        return;
    }
    debug!(owner = %owner, generation = id, "initialization succeeded");
    run_ready_hook(&shared, lifecycle.as_ref(), owner, id).await;
}

/// Runs `on_init` under a child token, with an optional timer.
async fn attempt(
    lifecycle: &dyn Lifecycle,
    token: &CancellationToken,
    owner: &Arc<str>,
    limit: Option<Duration>,
) -> Outcome {
    let child = token.child_token();
    let init = AssertUnwindSafe(lifecycle.on_init(child.clone())).catch_unwind();

    let res = match limit {
        Some(dur) => match time::timeout(dur, init).await {
            Ok(r) => r,
            Err(_elapsed) => {
                child.cancel();
                return Err(InitError::Timeout {
                    owner: Arc::clone(owner),
                    limit: dur,
                });
            }
        },
        None => init.await,
    };

    match res {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(InitError::init(e)),
        Err(panic) => Err(InitError::init(
            format!("on_init panicked: {}", panic_message(&*panic)).into(),
        )),
    }
}

/// Builds the event describing a terminal outcome written by the runner.
fn terminal_event(outcome: &Outcome, owner: &Arc<str>, id: u64) -> Event {
    let ev = match outcome {
        Ok(()) => Event::new(EventKind::InitSucceeded),
        Err(InitError::Timeout { limit, .. }) => {
            Event::new(EventKind::TimeoutHit).with_timeout(*limit)
        }
        Err(e) => Event::new(EventKind::InitFailed).with_reason(e.to_string()),
    };
    ev.with_owner(Arc::clone(owner)).with_generation(id)
}

/// Runs `on_ready`, reporting failures and panics without touching the signal.
async fn run_ready_hook(shared: &Shared, lifecycle: &dyn Lifecycle, owner: Arc<str>, id: u64) {
    let reason = match AssertUnwindSafe(lifecycle.on_ready()).catch_unwind().await {
        Ok(Ok(())) => return,
        Ok(Err(e)) => e.to_string(),
        Err(panic) => format!("on_ready panicked: {}", panic_message(&*panic)),
    };
    warn!(owner = %owner, generation = id, %reason, "ready hook failed");
    shared.bus.publish(
        Event::new(EventKind::ReadyHookFailed)
            .with_owner(owner)
            .with_generation(id)
            .with_reason(reason),
    );
}

fn publish_stale(shared: &Shared, owner: Arc<str>, id: u64, reason: &'static str) {
    debug!(owner = %owner, generation = id, reason, "discarding stale completion");
    shared.bus.publish(
        Event::new(EventKind::StaleCompletion)
            .with_owner(owner)
            .with_generation(id)
            .with_reason(reason),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::BoxError;
    use crate::events::Bus;
    use crate::lifecycle::{LifecycleFn, LifecycleRef};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::broadcast;

    fn counting_ready(ready_calls: &Arc<AtomicUsize>) -> LifecycleRef {
        let counter = Arc::clone(ready_calls);
        Arc::new(
            LifecycleFn::new("db", |_ctx: CancellationToken| async {
                Ok::<_, BoxError>(())
            })
            .with_ready(move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, BoxError>(())
                }
            }),
        )
    }

    fn stale_events(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::StaleCompletion {
                out.push(ev);
            }
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_after_terminal_signal_is_stale() {
        let ready_calls = Arc::new(AtomicUsize::new(0));
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let shared = Shared::new(
            counting_ready(&ready_calls),
            Config::default(),
            bus,
            CancellationToken::new(),
        );
        let generation = shared.current();
        generation
            .signal
            .complete(Err(InitError::Forced {
                message: Arc::from("first"),
            }))
            .expect("pending");

        run_generation(Arc::clone(&shared), Arc::clone(&generation), None).await;

        assert!(matches!(
            generation.signal.peek(),
            Some(Err(InitError::Forced { .. }))
        ));
        let stale = stale_events(&mut rx);
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].generation, Some(1));
        assert_eq!(stale[0].reason.as_deref(), Some("signal already terminal"));
        assert_eq!(ready_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_of_replaced_generation_is_stale() {
        let ready_calls = Arc::new(AtomicUsize::new(0));
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let shared = Shared::new(
            counting_ready(&ready_calls),
            Config::default(),
            bus,
            CancellationToken::new(),
        );
        let old = shared.current();
        // no attempt was spawned for generation 1, so its token stays live
        assert_eq!(shared.reinitialize(), 2);
        assert!(!old.token.is_cancelled());

        run_generation(Arc::clone(&shared), Arc::clone(&old), None).await;

        assert!(matches!(
            old.signal.peek(),
            Some(Err(InitError::Reinitialized { generation: 1 }))
        ));
        let stale = stale_events(&mut rx);
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].generation, Some(1));
        assert_eq!(stale[0].reason.as_deref(), Some("generation superseded"));
        assert_eq!(shared.current_generation(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_generation_announces_nothing() {
        let ready_calls = Arc::new(AtomicUsize::new(0));
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let shared = Shared::new(
            counting_ready(&ready_calls),
            Config::default(),
            bus,
            CancellationToken::new(),
        );
        let generation = shared.current();
        generation.token.cancel();

        run_generation(Arc::clone(&shared), Arc::clone(&generation), None).await;

        assert!(rx.try_recv().is_err());
        assert!(generation.signal.peek().is_none());
    }
}
