//! # One-shot readiness signal with many observers.
//!
//! [`ReadySignal`] is a `tokio::sync::watch` cell holding `Option<Outcome>`:
//! `None` while pending, `Some(..)` once terminal. The write path goes through
//! `send_if_modified`, so the pending → terminal check and the store happen under
//! the channel's own lock.
//!
//! ```text
//! pending (None) ──complete(Ok)──►  Some(Ok(()))      ─┐
//!                └─complete(Err)─►  Some(Err(error))  ─┴─► immutable
//! ```
//!
//! ## Rules
//! - Exactly one `complete` call wins; later calls get their outcome back.
//! - Observers created before or after completion see the same value.
//! - Observers of a signal dropped while pending resolve to [`InitError::Abandoned`].

use tokio::sync::watch;

use crate::error::InitError;

/// Terminal value of a generation.
pub(crate) type Outcome = Result<(), InitError>;

pub(crate) struct ReadySignal {
    tx: watch::Sender<Option<Outcome>>,
}

impl ReadySignal {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// True once the signal holds a terminal outcome.
    pub(crate) fn is_terminal(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Non-blocking copy of the terminal outcome, if any.
    pub(crate) fn peek(&self) -> Option<Outcome> {
        self.tx.borrow().clone()
    }

    /// Stores `outcome` if the signal is still pending.
    ///
    /// Returns the outcome back as `Err` when the signal was already terminal.
    pub(crate) fn complete(&self, outcome: Outcome) -> Result<(), Outcome> {
        let mut slot = Some(outcome);
        self.tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = slot.take();
            true
        });
        match slot {
            None => Ok(()),
            Some(rejected) => Err(rejected),
        }
    }

    /// Creates an observer bound to this signal.
    pub(crate) fn observe(&self) -> watch::Receiver<Option<Outcome>> {
        self.tx.subscribe()
    }
}

/// Waits until the observed signal is terminal and maps it to the public readiness result.
pub(crate) async fn wait(mut rx: watch::Receiver<Option<Outcome>>) -> Result<bool, InitError> {
    let outcome = match rx.wait_for(Option::is_some).await {
        Ok(slot) => slot.clone(),
        Err(_closed) => None,
    };
    match outcome {
        Some(Ok(())) => Ok(true),
        Some(Err(e)) => Err(e),
        None => Err(InitError::Abandoned),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_first_completion_wins() {
        let signal = ReadySignal::new();
        assert!(!signal.is_terminal());

        assert!(signal.complete(Ok(())).is_ok());
        let rejected = signal
            .complete(Err(InitError::Forced {
                message: Arc::from("late"),
            }))
            .expect_err("second completion must be rejected");
        assert!(rejected.is_err());

        assert!(signal.is_terminal());
        assert!(matches!(signal.peek(), Some(Ok(()))));
        assert!(wait(signal.observe()).await.expect("ready"));
    }

    #[tokio::test]
    async fn test_all_observers_see_same_failure() {
        let signal = ReadySignal::new();
        let early: Vec<_> = (0..4).map(|_| signal.observe()).collect();

        let waiters: Vec<_> = early.into_iter().map(|rx| tokio::spawn(wait(rx))).collect();
        signal
            .complete(Err(InitError::Reinitialized { generation: 7 }))
            .expect("first completion");

        for w in waiters {
            let err = w.await.expect("join").expect_err("failure");
            assert!(matches!(err, InitError::Reinitialized { generation: 7 }));
        }

        // late observer and repeated awaits keep seeing the same value
        for _ in 0..2 {
            let err = wait(signal.observe()).await.expect_err("failure");
            assert!(err.is_reinitialized());
        }
    }

    #[tokio::test]
    async fn test_dropped_pending_signal_abandons_observers() {
        let signal = ReadySignal::new();
        let rx = signal.observe();
        drop(signal);
        let err = wait(rx).await.expect_err("abandoned");
        assert!(matches!(err, InitError::Abandoned));
    }

    #[tokio::test]
    async fn test_terminal_value_survives_sender_drop() {
        let signal = ReadySignal::new();
        let rx = signal.observe();
        signal.complete(Ok(())).expect("complete");
        drop(signal);
        assert!(wait(rx).await.expect("ready"));
    }
}
