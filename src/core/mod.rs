//! Lifecycle core: generations, init runner and the controller.
//!
//! The public API from this module is [`Controller`] (plus its builder and the
//! small value types it takes and returns).
//!
//! Internal modules:
//! - [`signal`]: one-shot readiness cell observed by many awaiters;
//! - [`generation`]: one pending → terminal cycle and its init task handle;
//! - [`runner`]: races `on_init` against timeout and cancellation, writes the signal;
//! - [`controller`]: state machine, force/re-initialize, queries;
//! - [`builder`]: wiring of bus, subscribers and the first generation.

mod builder;
mod controller;
mod generation;
mod runner;
mod signal;

pub use builder::ControllerBuilder;
pub use controller::{Controller, ForceReady, LifecycleState, DEFAULT_FORCE_MESSAGE};
