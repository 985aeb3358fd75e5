//! Error types used by the lifecycle controller.
//!
//! This module defines two error enums:
//!
//! - [`InitError`]: why a generation failed; delivered to every observer of [`Controller::is_ready`](crate::Controller::is_ready).
//! - [`LifecycleError`]: misuse of the administrative API (completing an already-terminal generation).
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.

use std::any::Any;
use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Boxed error returned by user callbacks ([`Lifecycle::on_init`](crate::Lifecycle::on_init),
/// [`Lifecycle::on_ready`](crate::Lifecycle::on_ready)).
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// # Reasons a lifecycle generation ended in failure.
///
/// The value is stored once in the readiness signal and cloned out to every observer,
/// so all awaiters of one generation see the same error (user errors are shared via `Arc`).
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum InitError {
    /// `on_init` did not finish within the configured limit.
    #[error("{owner} initialization timed out after {limit:?}")]
    Timeout {
        /// Name of the owning lifecycle.
        owner: Arc<str>,
        /// The limit that was exceeded.
        limit: Duration,
    },

    /// Readiness was forced into failure by an administrative call.
    #[error("forced failure: {message}")]
    Forced {
        /// Caller-supplied message.
        message: Arc<str>,
    },

    /// `on_init` returned an error.
    #[error("initialization failed: {source}")]
    Init {
        /// The original error raised by `on_init`.
        #[source]
        source: Arc<dyn StdError + Send + Sync + 'static>,
    },

    /// The generation was still pending when `re_initialize` discarded it.
    #[error("generation {generation} interrupted by re-initialization")]
    Reinitialized {
        /// Id of the discarded generation.
        generation: u64,
    },

    /// The controller went away before the generation reached a terminal state.
    #[error("lifecycle dropped before initialization completed")]
    Abandoned,
}

impl InitError {
    /// Wraps an error raised by user code, keeping the original value reachable
    /// through [`InitError::init_source`] and [`std::error::Error::source`].
    pub fn init(err: BoxError) -> Self {
        InitError::Init {
            source: Arc::from(err),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use initvisor::InitError;
    ///
    /// let err = InitError::Reinitialized { generation: 3 };
    /// assert_eq!(err.as_label(), "init_reinitialized");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            InitError::Timeout { .. } => "init_timeout",
            InitError::Forced { .. } => "init_forced",
            InitError::Init { .. } => "init_failed",
            InitError::Reinitialized { .. } => "init_reinitialized",
            InitError::Abandoned => "init_abandoned",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            InitError::Timeout { owner, limit } => format!("timeout: owner={owner} limit={limit:?}"),
            InitError::Forced { message } => format!("forced: {message}"),
            InitError::Init { source } => format!("error: {source}"),
            InitError::Reinitialized { generation } => {
                format!("reinitialized: generation={generation}")
            }
            InitError::Abandoned => "abandoned".to_string(),
        }
    }

    /// True for [`InitError::Timeout`].
    pub fn is_timeout(&self) -> bool {
        matches!(self, InitError::Timeout { .. })
    }

    /// True for [`InitError::Forced`].
    pub fn is_forced(&self) -> bool {
        matches!(self, InitError::Forced { .. })
    }

    /// True for [`InitError::Reinitialized`].
    pub fn is_reinitialized(&self) -> bool {
        matches!(self, InitError::Reinitialized { .. })
    }

    /// The error raised by `on_init`, if this is an [`InitError::Init`].
    ///
    /// Use `downcast_ref` on the result to recover the concrete type.
    ///
    /// # Example
    /// ```
    /// use initvisor::InitError;
    ///
    /// let err = InitError::init("disk not mounted".into());
    /// let src = err.init_source().unwrap();
    /// assert_eq!(src.to_string(), "disk not mounted");
    /// ```
    pub fn init_source(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        match self {
            InitError::Init { source } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// # Errors produced by administrative calls on a controller.
///
/// These indicate programming errors rather than initialization outcomes.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// The readiness signal of this generation is already terminal and cannot be completed again.
    #[error("generation {generation} already completed")]
    AlreadyCompleted {
        /// Id of the generation that was already terminal.
        generation: u64,
    },
}

impl LifecycleError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            LifecycleError::AlreadyCompleted { .. } => "lifecycle_already_completed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            LifecycleError::AlreadyCompleted { generation } => {
                format!("already completed: generation={generation}")
            }
        }
    }
}

/// Extracts a printable message from a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
