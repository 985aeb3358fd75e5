//! # Example: timeout_and_reinit
//!
//! Shows the failure paths of a controller and how to recover from them.
//!
//! Demonstrates how to:
//! - Bound initialization with a timeout and observe [`InitError::Timeout`].
//! - Recover with [`Controller::re_initialize`] (no automatic retry happens).
//! - Skip the wait with [`Controller::force_ready`].
//! - Render events through the built-in [`LogWriter`] and `tracing_subscriber`.
//!
//! ## Flow
//! ```text
//! generation 1: on_init sleeps 300ms, limit 100ms ─► TimeoutHit ─► is_ready() = Err(Timeout)
//! re_initialize()
//! generation 2: on_init succeeds quickly          ─► InitSucceeded ─► is_ready() = Ok(true)
//! re_initialize()
//! generation 3: force_ready(fail "maintenance")   ─► ForcedFailure ─► is_ready() = Err(Forced)
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example timeout_and_reinit --features logging
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use initvisor::{
    BoxError, Config, Controller, ForceReady, LifecycleFn, LifecycleRef, LogWriter, Subscribe,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // First attempt is slow, every later one is fast.
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);
    let cache: LifecycleRef = Arc::new(
        LifecycleFn::new("cache", move |ctx: CancellationToken| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                let delay = if n == 0 { 300 } else { 20 };
                tokio::select! {
                    _ = ctx.cancelled() => Err::<(), BoxError>("cache warmup stopped".into()),
                    _ = tokio::time::sleep(Duration::from_millis(delay)) => Ok(()),
                }
            }
        })
        .with_timeout(Duration::from_millis(100)),
    );

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let ctl = Controller::builder(cache)
        .with_config(Config::default())
        .with_subscribers(subs)
        .build();

    // 1. Timeout
    match ctl.is_ready().await {
        Ok(_) => println!("[main] unexpectedly ready"),
        Err(e) => println!("[main] generation {} failed: {} ({})", ctl.generation(), e, e.as_label()),
    }

    // 2. Recover by starting a new generation
    let next = ctl.re_initialize();
    println!("[main] generation {next} ready={}", ctl.is_ready().await?);

    // 3. Force a failure on a fresh generation
    ctl.re_initialize();
    ctl.force_ready(ForceReady::fail("maintenance"))?;
    if let Err(e) = ctl.is_ready().await {
        println!("[main] generation {} forced: {e}", ctl.generation());
    }

    // Let subscriber workers drain before exit
    tokio::time::sleep(Duration::from_millis(50)).await;
    println!("[main] on_init ran {} times", attempts.load(Ordering::SeqCst));
    Ok(())
}
