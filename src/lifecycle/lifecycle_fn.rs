//! # Function-backed lifecycle (`LifecycleFn`)
//!
//! [`LifecycleFn`] bundles an init closure, an optional ready closure and a timeout
//! so callers can get readiness semantics without writing a trait impl.
//!
//! The init closure is `Fn`, not `FnOnce`: every generation (including each
//! `re_initialize`) calls it again and gets a fresh future. Shared state goes
//! into an `Arc<...>` captured by the closure.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use initvisor::{BoxError, LifecycleFn, LifecycleRef};
//!
//! let lc: LifecycleRef = LifecycleFn::arc("warmup", |_ctx: CancellationToken| async {
//!     Ok::<_, BoxError>(())
//! });
//!
//! assert_eq!(lc.name(), "warmup");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::config::DEFAULT_TIMEOUT_LIMIT;
use crate::error::BoxError;
use crate::lifecycle::lifecycle::Lifecycle;

type ReadyFn = Arc<dyn Fn() -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync>;

/// Function-backed lifecycle implementation.
pub struct LifecycleFn<F> {
    name: Cow<'static, str>,
    init: F,
    ready: Option<ReadyFn>,
    timeout: Duration,
}

impl<F> LifecycleFn<F> {
    /// Creates a lifecycle with the default 50 second limit and no ready hook.
    pub fn new(name: impl Into<Cow<'static, str>>, init: F) -> Self {
        Self {
            name: name.into(),
            init,
            ready: None,
            timeout: DEFAULT_TIMEOUT_LIMIT,
        }
    }

    /// Same as [`LifecycleFn::new`], wrapped in an `Arc` (coerces to [`LifecycleRef`](crate::LifecycleRef)).
    pub fn arc(name: impl Into<Cow<'static, str>>, init: F) -> Arc<Self> {
        Arc::new(Self::new(name, init))
    }

    /// Sets the initialization timeout (`Duration::ZERO` = none).
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the hook invoked after a successful initialization.
    #[must_use]
    pub fn with_ready<G, RFut>(mut self, ready: G) -> Self
    where
        G: Fn() -> RFut + Send + Sync + 'static,
        RFut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.ready = Some(Arc::new(move || -> BoxFuture<'static, Result<(), BoxError>> {
            Box::pin(ready())
        }));
        self
    }
}

#[async_trait]
impl<F, Fut> Lifecycle for LifecycleFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn timeout_limit(&self) -> Duration {
        self.timeout
    }

    async fn on_init(&self, ctx: CancellationToken) -> Result<(), BoxError> {
        (self.init)(ctx).await
    }

    async fn on_ready(&self) -> Result<(), BoxError> {
        match &self.ready {
            Some(ready) => ready().await,
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_init_closure_runs_per_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let lc = LifecycleFn::new("counter", move |_ctx: CancellationToken| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, BoxError>(())
            }
        });

        lc.on_init(CancellationToken::new()).await.expect("first");
        lc.on_init(CancellationToken::new()).await.expect("second");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_defaults_and_overrides() {
        let lc = LifecycleFn::new("svc", |_ctx: CancellationToken| async {
            Ok::<_, BoxError>(())
        });
        assert_eq!(lc.timeout_limit(), DEFAULT_TIMEOUT_LIMIT);
        assert!(lc.on_ready().await.is_ok());

        let lc = lc
            .with_timeout(Duration::from_millis(250))
            .with_ready(|| async { Err::<(), BoxError>("hook broke".into()) });
        assert_eq!(lc.timeout_limit(), Duration::from_millis(250));
        let err = lc.on_ready().await.expect_err("ready hook error");
        assert_eq!(err.to_string(), "hook broke");
    }
}
