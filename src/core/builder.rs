use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::controller::Controller;
use crate::{
    config::Config,
    events::{Bus, Event},
    lifecycle::LifecycleRef,
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing a [`Controller`] with optional subscribers.
pub struct ControllerBuilder {
    lifecycle: LifecycleRef,
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl ControllerBuilder {
    /// Creates a builder with [`Config::default`] and no subscribers.
    pub fn new(lifecycle: LifecycleRef) -> Self {
        Self {
            lifecycle,
            cfg: Config::default(),
            subscribers: Vec::new(),
        }
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, cfg: Config) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive lifecycle events through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the controller and starts generation 1.
    ///
    /// This consumes the builder and initializes:
    /// - Event bus for broadcasting
    /// - Subscriber workers and their listener (if any subscribers were given)
    /// - The first init attempt
    ///
    /// Must be called inside a tokio runtime.
    pub fn build(self) -> Controller {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let runtime = CancellationToken::new();

        if !self.subscribers.is_empty() {
            let set = SubscriberSet::new(self.subscribers, bus.clone());
            // subscribe before the first generation publishes anything
            let rx = bus.subscribe();
            tokio::spawn(subscriber_listener(rx, set, runtime.clone()));
        }

        Controller::new_internal(self.lifecycle, self.cfg, bus, runtime)
    }
}

/// Forwards bus events to the subscriber set until the controller is dropped.
async fn subscriber_listener(
    mut rx: broadcast::Receiver<Event>,
    set: SubscriberSet,
    runtime: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = runtime.cancelled() => break,
            res = rx.recv() => match res {
                Ok(ev) => set.emit(&ev),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "subscriber listener lagged behind the event bus");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }
    set.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::events::EventKind;
    use crate::lifecycle::LifecycleFn;
    use crate::ForceReady;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct Collect {
        kinds: Mutex<Vec<EventKind>>,
    }

    #[async_trait]
    impl Subscribe for Collect {
        async fn on_event(&self, event: &Event) {
            self.kinds.lock().push(event.kind);
        }

        fn name(&self) -> &'static str {
            "collect"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_lifecycle_events() {
        let collect = Arc::new(Collect::default());
        let lc: LifecycleRef = LifecycleFn::arc("svc", |_ctx: CancellationToken| async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok::<_, BoxError>(())
        });
        let subs: Vec<Arc<dyn Subscribe>> = vec![collect.clone()];
        let ctl = Controller::builder(lc)
            .with_config(Config {
                bus_capacity: 8,
                ..Config::default()
            })
            .with_subscribers(subs)
            .build();

        assert!(ctl.is_ready().await.expect("ready"));
        ctl.re_initialize();
        ctl.force_ready(ForceReady::fail("stop")).expect("force");
        tokio::time::sleep(Duration::from_millis(50)).await;

        let kinds = collect.kinds.lock().clone();
        assert_eq!(
            &kinds[..2],
            &[EventKind::InitStarting, EventKind::InitSucceeded]
        );
        assert!(kinds.contains(&EventKind::Reinitialized), "{kinds:?}");
        assert!(kinds.contains(&EventKind::ForcedFailure), "{kinds:?}");
    }

    struct Faulty {
        name: &'static str,
        calls: AtomicUsize,
    }

    impl Faulty {
        fn new(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Subscribe for Faulty {
        async fn on_event(&self, _event: &Event) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            panic!("{} cannot handle events", self.name);
        }

        fn name(&self) -> &'static str {
            self.name
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_subscribers_settle() {
        let a = Faulty::new("faulty-a");
        let b = Faulty::new("faulty-b");
        let lc: LifecycleRef = LifecycleFn::arc("svc", |_ctx: CancellationToken| async {
            Ok::<_, BoxError>(())
        });
        let subs: Vec<Arc<dyn Subscribe>> = vec![a.clone(), b.clone()];
        let ctl = Controller::builder(lc).with_subscribers(subs).build();
        let mut rx = ctl.subscribe();

        assert!(ctl.is_ready().await.expect("ready"));
        tokio::time::sleep(Duration::from_millis(200)).await;

        // 2 lifecycle events each, plus the other subscriber's 2 panic reports
        assert_eq!(a.calls.load(Ordering::SeqCst), 4);
        assert_eq!(b.calls.load(Ordering::SeqCst), 4);

        let mut panicked = 0;
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::SubscriberPanicked {
                panicked += 1;
            }
        }
        assert_eq!(panicked, 4);
    }
}
