//! # Generations and init task handles.
//!
//! A [`Generation`] is one pending → terminal cycle: a readiness signal plus the
//! cancellation token of its init attempt. `re_initialize` swaps in a fresh
//! `Arc<Generation>`; the old one is never mutated, so a late runner still holding
//! it can only hit its (already terminal) signal.
//!
//! ```text
//! runtime token (per controller)
//!   ├── generation 1 token ──► child token handed to on_init
//!   ├── generation 2 token ──► ...
//!   └── subscriber listener
//! ```

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::signal::ReadySignal;

/// One lifecycle generation.
pub(crate) struct Generation {
    /// Monotonic id, starting at 1.
    pub(crate) id: u64,
    /// One-shot readiness cell observed by `is_ready`.
    pub(crate) signal: ReadySignal,
    /// Cancels this generation's init attempt.
    pub(crate) token: CancellationToken,
}

impl Generation {
    /// Creates a pending generation whose token is a child of `runtime`.
    pub(crate) fn new(id: u64, runtime: &CancellationToken) -> Self {
        Self {
            id,
            signal: ReadySignal::new(),
            token: runtime.child_token(),
        }
    }
}

/// Owned handle to an in-flight init attempt.
pub(crate) struct InitTask {
    pub(crate) generation: u64,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl InitTask {
    pub(crate) fn new(generation: u64, token: CancellationToken, handle: JoinHandle<()>) -> Self {
        Self {
            generation,
            token,
            handle,
        }
    }

    /// Requests cancellation. No-op for attempts that already finished or were cancelled.
    pub(crate) fn cancel(&self) {
        self.token.cancel();
    }

    /// True while the runner task is still executing.
    pub(crate) fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}
