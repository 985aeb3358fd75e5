//! # Example: basic_ready
//!
//! Minimal example of one owning object that becomes ready in the background.
//!
//! Demonstrates how to:
//! - Implement [`Lifecycle`] for a type that owns its startup work.
//! - Start a [`Controller`] and await readiness from several callers.
//! - Inspect [`LifecycleState`] while initialization is running.
//!
//! ## Flow
//! ```text
//! Controller::start()
//!     ├─► generation 1
//!     ├─► run_generation()
//!     │     ├─► publish(InitStarting)
//!     │     ├─► Pool::on_init(ctx)
//!     │     ├─► signal = Ok
//!     │     ├─► publish(InitSucceeded)
//!     │     └─► Pool::on_ready()
//!     └─► is_ready() x3 ──► Ok(true)
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example basic_ready
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use initvisor::{BoxError, Config, Controller, Lifecycle, LifecycleState};
use tokio_util::sync::CancellationToken;

/// Pretend connection pool that needs a moment to dial its peers.
struct Pool {
    connections: AtomicUsize,
}

#[async_trait]
impl Lifecycle for Pool {
    fn name(&self) -> &str {
        "pool"
    }

    fn timeout_limit(&self) -> Duration {
        Duration::from_secs(2)
    }

    async fn on_init(&self, ctx: CancellationToken) -> Result<(), BoxError> {
        for i in 1..=4 {
            tokio::select! {
                _ = ctx.cancelled() => return Err("pool init cancelled".into()),
                _ = tokio::time::sleep(Duration::from_millis(100)) => {}
            }
            self.connections.store(i, Ordering::SeqCst);
            println!("[pool] connection {i} up");
        }
        Ok(())
    }

    async fn on_ready(&self) -> Result<(), BoxError> {
        println!(
            "[pool] ready with {} connections",
            self.connections.load(Ordering::SeqCst)
        );
        Ok(())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // 1. The owning object
    let pool = Arc::new(Pool {
        connections: AtomicUsize::new(0),
    });

    // 2. Start the controller (generation 1 begins immediately)
    let ctl = Controller::start(pool.clone(), Config::default());
    tokio::task::yield_now().await;
    assert_eq!(ctl.state(), LifecycleState::Initializing);
    println!("[main] state={:?} timeout={:?}", ctl.state(), ctl.timeout_limit());

    // 3. Several callers wait for the same outcome
    let waiters: Vec<_> = (0..3).map(|_| tokio::spawn(ctl.is_ready())).collect();
    for (i, w) in waiters.into_iter().enumerate() {
        let ready = w.await??;
        println!("[caller {i}] ready={ready}");
    }

    println!(
        "[main] state={:?} initialized={} generation={}",
        ctl.state(),
        ctl.is_initialized(),
        ctl.generation()
    );
    Ok(())
}
