//! # Controller: the lifecycle state machine of one owning object.
//!
//! The [`Controller`] owns the current [`Generation`], the handle of its in-flight
//! init attempt and the event bus. It is built once by the owning object and lives
//! as long as that object does.
//!
//! ## State machine
//! ```text
//!                   start()/re_initialize()
//!   ┌─────────┐   spawn run_generation()   ┌──────────────┐
//!   │ Pending │ ─────────────────────────► │ Initializing │
//!   └─────────┘                            └──────┬───────┘
//!                on_init Ok / force_ready()       │      on_init Err / timeout /
//!                      ┌──────────────────────────┴──────┐  force_ready(fail)
//!                      ▼                                 ▼
//!                 ┌─────────┐                       ┌────────┐
//!                 │  Ready  │                       │ Failed │
//!                 └─────────┘                       └────────┘
//!
//!   re_initialize(): cancel task → fail pending signal (Reinitialized)
//!                    → install generation N+1 → spawn run_generation()
//! ```
//!
//! ## Rules
//! - One generation is current at a time; it is swapped, never mutated.
//! - The slot mutex is held only for short synchronous sections (never across `.await`).
//! - `force_ready` on a terminal generation returns [`LifecycleError::AlreadyCompleted`].
//! - Dropping the controller cancels the runtime token: the in-flight `on_init` and
//!   the subscriber listener stop; pending observers resolve to `Abandoned`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::builder::ControllerBuilder;
use super::generation::{Generation, InitTask};
use super::runner::run_generation;
use super::signal;
use crate::config::Config;
use crate::error::{InitError, LifecycleError};
use crate::events::{Bus, Event, EventKind};
use crate::lifecycle::LifecycleRef;

/// Message used by [`ForceReady::default`].
pub const DEFAULT_FORCE_MESSAGE: &str = "Interrupt initialization";

/// Observable state of the current generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Signal pending and no init attempt running (before the first attempt is spawned).
    Pending,
    /// Signal pending while `on_init` runs.
    Initializing,
    /// Signal fulfilled.
    Ready,
    /// Signal failed.
    Failed,
}

/// Arguments of [`Controller::force_ready`].
///
/// # Example
/// ```
/// use initvisor::ForceReady;
///
/// let ok = ForceReady::default();
/// assert!(!ok.fail);
///
/// let failed = ForceReady::fail("maintenance window");
/// assert!(failed.fail);
/// assert_eq!(failed.message, "maintenance window");
/// ```
#[derive(Debug, Clone)]
pub struct ForceReady {
    /// Fail the generation instead of fulfilling it.
    pub fail: bool,
    /// Message carried by [`InitError::Forced`] when `fail` is set.
    pub message: String,
}

impl ForceReady {
    /// Forced failure carrying `message`.
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            fail: true,
            message: message.into(),
        }
    }
}

impl Default for ForceReady {
    /// Forced success with the message `"Interrupt initialization"`.
    fn default() -> Self {
        Self {
            fail: false,
            message: DEFAULT_FORCE_MESSAGE.to_string(),
        }
    }
}

/// Current generation plus the handle of its init attempt.
struct Slot {
    current: Arc<Generation>,
    task: Option<InitTask>,
    limit: Option<Duration>,
}

/// State shared between the controller and its runners.
pub(crate) struct Shared {
    pub(crate) lifecycle: LifecycleRef,
    pub(crate) bus: Bus,
    cfg: Config,
    runtime: CancellationToken,
    slot: Mutex<Slot>,
}

impl Shared {
    /// Creates shared state holding a pending generation 1. Nothing is spawned.
    pub(crate) fn new(
        lifecycle: LifecycleRef,
        cfg: Config,
        bus: Bus,
        runtime: CancellationToken,
    ) -> Arc<Self> {
        let first = Arc::new(Generation::new(1, &runtime));
        Arc::new(Self {
            lifecycle,
            bus,
            cfg,
            runtime,
            slot: Mutex::new(Slot {
                current: first,
                task: None,
                limit: None,
            }),
        })
    }

    /// The current generation.
    pub(crate) fn current(&self) -> Arc<Generation> {
        Arc::clone(&self.slot.lock().current)
    }

    /// Id of the current generation.
    pub(crate) fn current_generation(&self) -> u64 {
        self.slot.lock().current.id
    }

    /// Releases the task handle once generation `id` reached its signal.
    pub(crate) fn finish(&self, id: u64) {
        let mut slot = self.slot.lock();
        if slot.task.as_ref().is_some_and(|t| t.generation == id) {
            slot.task = None;
        }
    }

    /// Spawns the init attempt for the current generation and stores its handle.
    ///
    /// The effective limit is read once here: config override first, then the lifecycle hook.
    fn initialize(self: &Arc<Self>, slot: &mut Slot) {
        let generation = Arc::clone(&slot.current);
        let limit = self
            .cfg
            .timeout_override()
            .unwrap_or_else(|| self.lifecycle.timeout_limit());
        let limit = Some(limit).filter(|d| *d > Duration::ZERO);

        let handle = tokio::spawn(run_generation(
            Arc::clone(self),
            Arc::clone(&generation),
            limit,
        ));
        slot.task = Some(InitTask::new(generation.id, generation.token.clone(), handle));
        slot.limit = limit;
    }

    /// Spawns the init attempt of the current generation.
    pub(crate) fn start(self: &Arc<Self>) {
        let mut slot = self.slot.lock();
        self.initialize(&mut slot);
    }

    /// Derived state of the current generation.
    pub(crate) fn state(&self) -> LifecycleState {
        let slot = self.slot.lock();
        match slot.current.signal.peek() {
            Some(Ok(())) => LifecycleState::Ready,
            Some(Err(_)) => LifecycleState::Failed,
            None if slot.task.as_ref().is_some_and(InitTask::is_running) => {
                LifecycleState::Initializing
            }
            None => LifecycleState::Pending,
        }
    }

    /// Replaces the current generation with a fresh one and starts it.
    ///
    /// Events for the switch are published before the new attempt is spawned,
    /// so `Reinitialized` always precedes the new generation's `InitStarting`.
    pub(crate) fn reinitialize(self: &Arc<Self>) -> u64 {
        let mut slot = self.slot.lock();
        if let Some(task) = slot.task.take() {
            task.cancel();
        }
        let old = Arc::clone(&slot.current);
        let interrupted = old
            .signal
            .complete(Err(InitError::Reinitialized { generation: old.id }))
            .is_ok();

        let next = Arc::new(Generation::new(old.id + 1, &self.runtime));
        let next_id = next.id;
        slot.current = next;

        debug!(
            owner = self.lifecycle.name(),
            from = old.id,
            to = next_id,
            interrupted,
            "re-initializing"
        );
        if interrupted {
            self.bus.publish(self.event(EventKind::GenerationInterrupted, old.id));
        }
        self.bus.publish(self.event(EventKind::Reinitialized, next_id));

        self.initialize(&mut slot);
        next_id
    }

    fn event(&self, kind: EventKind, generation: u64) -> Event {
        Event::new(kind)
            .with_owner(self.lifecycle.name())
            .with_generation(generation)
    }
}

/// Asynchronous readiness controller for one owning object.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// use initvisor::{BoxError, Config, Controller, LifecycleFn, LifecycleRef};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let db: LifecycleRef = LifecycleFn::arc("db", |_ctx: CancellationToken| async {
///         tokio::time::sleep(Duration::from_millis(10)).await;
///         Ok::<_, BoxError>(())
///     });
///
///     let ctl = Controller::start(db, Config::default());
///     assert!(!ctl.is_initialized());
///     assert!(ctl.is_ready().await.unwrap());
///     assert!(ctl.is_initialized());
/// }
/// ```
pub struct Controller {
    shared: Arc<Shared>,
}

impl Controller {
    /// Creates a controller and immediately starts generation 1.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(lifecycle: LifecycleRef, cfg: Config) -> Self {
        ControllerBuilder::new(lifecycle).with_config(cfg).build()
    }

    /// Returns a builder (config, subscribers).
    pub fn builder(lifecycle: LifecycleRef) -> ControllerBuilder {
        ControllerBuilder::new(lifecycle)
    }

    pub(crate) fn new_internal(
        lifecycle: LifecycleRef,
        cfg: Config,
        bus: Bus,
        runtime: CancellationToken,
    ) -> Self {
        let shared = Shared::new(lifecycle, cfg, bus, runtime);
        shared.start();
        Self { shared }
    }

    /// Name of the owning lifecycle.
    pub fn name(&self) -> &str {
        self.shared.lifecycle.name()
    }

    /// True once the current generation reached a terminal state (ready **or** failed).
    pub fn is_initialized(&self) -> bool {
        self.shared.slot.lock().current.signal.is_terminal()
    }

    /// True while an init attempt of the current generation is running.
    pub fn is_initializing(&self) -> bool {
        let slot = self.shared.slot.lock();
        !slot.current.signal.is_terminal() && slot.task.as_ref().is_some_and(InitTask::is_running)
    }

    /// Waits for the generation that is current **now** to reach a terminal state.
    ///
    /// Resolves to `Ok(true)` on success or the stored [`InitError`] on failure.
    /// The returned future is bound to the generation at call time: a later
    /// `re_initialize` rejects it with [`InitError::Reinitialized`].
    pub fn is_ready(&self) -> impl Future<Output = Result<bool, InitError>> + Send + 'static {
        let rx = self.shared.current().signal.observe();
        signal::wait(rx)
    }

    /// Non-blocking view of the current generation's outcome.
    pub fn outcome(&self) -> Option<Result<bool, InitError>> {
        self.shared
            .slot
            .lock()
            .current
            .signal
            .peek()
            .map(|o| o.map(|()| true))
    }

    /// Derived state of the current generation.
    ///
    /// [`LifecycleState::Pending`] is reported only while the generation has no
    /// running attempt and no outcome. Attempts are spawned synchronously by
    /// `start` and `re_initialize`, and every cancellation path completes or
    /// replaces the signal, so a live controller moves straight to `Initializing`.
    pub fn state(&self) -> LifecycleState {
        self.shared.state()
    }

    /// Id of the current generation (1 for the first).
    pub fn generation(&self) -> u64 {
        self.shared.current_generation()
    }

    /// Effective timeout of the current generation (`None` = no timer).
    pub fn timeout_limit(&self) -> Option<Duration> {
        self.shared.slot.lock().limit
    }

    /// Raw stream of lifecycle events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.shared.bus.subscribe()
    }

    /// Drives the current generation to a terminal state out of band.
    ///
    /// Cancels the in-flight init attempt (its late completion is discarded), then
    /// fulfills the signal, or fails it with [`InitError::Forced`] when `opts.fail` is set.
    ///
    /// # Errors
    /// [`LifecycleError::AlreadyCompleted`] if the generation was already terminal.
    pub fn force_ready(&self, opts: ForceReady) -> Result<(), LifecycleError> {
        let mut slot = self.shared.slot.lock();
        if let Some(task) = slot.task.take() {
            task.cancel();
        }
        let generation = Arc::clone(&slot.current);

        let (outcome, kind) = if opts.fail {
            let err = InitError::Forced {
                message: Arc::from(opts.message.as_str()),
            };
            (Err(err), EventKind::ForcedFailure)
        } else {
            (Ok(()), EventKind::ForcedReady)
        };
        generation
            .signal
            .complete(outcome)
            .map_err(|_| LifecycleError::AlreadyCompleted {
                generation: generation.id,
            })?;
        drop(slot);

        debug!(owner = self.name(), generation = generation.id, fail = opts.fail, "readiness forced");
        let mut ev = self.shared.event(kind, generation.id);
        if opts.fail {
            ev = ev.with_reason(opts.message);
        }
        self.shared.bus.publish(ev);
        Ok(())
    }

    /// Discards the current generation and starts a new one.
    ///
    /// A still-pending generation is failed with [`InitError::Reinitialized`] so its
    /// observers do not hang. Returns the id of the new generation.
    pub fn re_initialize(&self) -> u64 {
        self.shared.reinitialize()
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.shared.runtime.cancel();
    }
}
