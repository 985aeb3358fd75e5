//! # initvisor
//!
//! **Initvisor** is a small asynchronous readiness controller for Rust.
//!
//! An owning object (a connection pool, a cache, a client) plugs its startup work
//! into a [`Lifecycle`] and hands it to a [`Controller`]. The controller runs the
//! work once in the background, bounds it with a timeout, and lets any number of
//! callers await the single outcome. Readiness can be forced out of band and the
//! whole cycle can be restarted as a new generation.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────────────────────────────────────┐
//!     │        Lifecycle (owning object hooks)       │
//!     │   on_init(ctx) · on_ready() · timeout_limit  │
//!     └──────────────────────┬───────────────────────┘
//!                            ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Controller (one per owning object)                               │
//! │  - current Generation { id, ReadySignal, CancellationToken }      │
//! │  - InitTask handle of the in-flight attempt                       │
//! │  - Bus (broadcast events)                                         │
//! └──────┬───────────────────────────┬───────────────────────┬────────┘
//!        ▼                           ▼                       │
//!  ┌────────────────┐      is_ready() / outcome()            │
//!  │ run_generation │      force_ready() / re_initialize()   │
//!  │ (init runner)  │                                        │
//!  └┬───────────────┘                                        │
//!   │ Publishes                                              │
//!   │ - InitStarting / InitSucceeded / InitFailed            │
//!   │ - TimeoutHit / InitCanceled / StaleCompletion          │
//!   ▼                                                        ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │                   (capacity: Config::bus_capacity)                │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │  subscriber_listener   │
//!                       │  (ControllerBuilder)   │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                            (per-sub queues)
//!                         ┌─────────┼─────────┐
//!                         ▼         ▼         ▼
//!                      worker1   worker2   workerN
//! ```
//!
//! ### Lifecycle
//! ```text
//! Controller::start() ──► generation 1 ──► run_generation()
//!
//!   ├─► publish InitStarting{ generation, timeout }
//!   ├─► select! {
//!   │     token cancelled  ─► publish InitCanceled, exit (signal untouched)
//!   │     on_init(ctx)     ─► Ok   ─► signal = Ok      ─► InitSucceeded ─► on_ready()
//!   │                      ─► Err  ─► signal = Err     ─► InitFailed
//!   │     timer            ─► cancel ctx, signal = Timeout ─► TimeoutHit
//!   │   }
//!   └─► signal already terminal / generation replaced ─► StaleCompletion
//!
//! force_ready()    ─► cancel task, signal = Ok | Forced
//! re_initialize()  ─► cancel task, pending signal = Reinitialized, generation N+1
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                        |
//! |-------------------|---------------------------------------------------------------|-------------------------------------------|
//! | **Lifecycle**     | Startup hooks of the owning object, as a trait or closures.   | [`Lifecycle`], [`LifecycleFn`]            |
//! | **Controller**    | Await, force and restart readiness.                           | [`Controller`], [`ForceReady`]            |
//! | **Subscriber API**| Hook into lifecycle events (logging, metrics, custom).        | [`Subscribe`], [`Event`]                  |
//! | **Errors**        | Typed readiness failures and misuse errors.                   | [`InitError`], [`LifecycleError`]         |
//! | **Configuration** | Timeout override and bus sizing.                              | [`Config`]                                |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use initvisor::{BoxError, Config, Controller, ForceReady, LifecycleFn, LifecycleRef};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Build subscribers (optional)
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn initvisor::Subscribe>> = {
//!         use initvisor::LogWriter;
//!         vec![Arc::new(LogWriter::default())]
//!     };
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn initvisor::Subscribe>> = Vec::new();
//!
//!     let pool: LifecycleRef = Arc::new(
//!         LifecycleFn::new("pool", |ctx: CancellationToken| async move {
//!             tokio::select! {
//!                 _ = ctx.cancelled() => Err::<(), BoxError>("stopped".into()),
//!                 _ = tokio::time::sleep(Duration::from_millis(20)) => Ok(()),
//!             }
//!         })
//!         .with_timeout(Duration::from_secs(5)),
//!     );
//!
//!     let ctl = Controller::builder(pool)
//!         .with_config(Config::default())
//!         .with_subscribers(subs)
//!         .build();
//!
//!     assert!(ctl.is_ready().await?);
//!
//!     // Restart and skip the wait
//!     ctl.re_initialize();
//!     ctl.force_ready(ForceReady::default())?;
//!     assert!(ctl.is_ready().await?);
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod lifecycle;
mod subscribers;

// ---- Public re-exports ----

pub use config::{Config, DEFAULT_TIMEOUT_LIMIT};
pub use core::{Controller, ControllerBuilder, ForceReady, LifecycleState, DEFAULT_FORCE_MESSAGE};
pub use error::{BoxError, InitError, LifecycleError};
pub use events::{Bus, Event, EventKind};
pub use lifecycle::{Lifecycle, LifecycleFn, LifecycleRef};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
