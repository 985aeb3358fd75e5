//! # Lifecycle extension contract.
//!
//! This module defines the [`Lifecycle`] trait, the hooks an owning object implements
//! to give itself asynchronous readiness. The common handle type is [`LifecycleRef`],
//! an `Arc<dyn Lifecycle>` shared between the controller and its init runners.
//!
//! Every hook has a default, so an implementor only overrides what it needs:
//!
//! | Hook                  | Default                   | Called                                   |
//! |-----------------------|---------------------------|------------------------------------------|
//! | `name`                | `type_name::<Self>()`     | events, timeout errors                   |
//! | `timeout_limit`       | 50 seconds                | once per generation                      |
//! | `on_init`             | no-op                     | once per generation, raced with a timer  |
//! | `on_ready`            | no-op                     | after a successful `on_init`, detached   |

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::config::DEFAULT_TIMEOUT_LIMIT;
use crate::error::BoxError;

/// Shared handle to a lifecycle implementation.
pub type LifecycleRef = Arc<dyn Lifecycle>;

/// # Asynchronous readiness hooks.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use initvisor::{BoxError, Lifecycle};
///
/// struct Cache;
///
/// #[async_trait]
/// impl Lifecycle for Cache {
///     fn name(&self) -> &str { "cache" }
///
///     fn timeout_limit(&self) -> Duration { Duration::from_secs(5) }
///
///     async fn on_init(&self, ctx: CancellationToken) -> Result<(), BoxError> {
///         if ctx.is_cancelled() {
///             return Ok(());
///         }
///         // warm up...
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Lifecycle: Send + Sync + 'static {
    /// Returns the owner's name, used in events and timeout errors.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Maximum time `on_init` may take. `Duration::ZERO` disables the timer.
    fn timeout_limit(&self) -> Duration {
        DEFAULT_TIMEOUT_LIMIT
    }

    /// Performs the initialization work.
    ///
    /// `ctx` is cancelled when the attempt is superseded (timeout, forced readiness,
    /// re-initialization, controller drop). The future is also dropped at its next
    /// suspension point in that case.
    async fn on_init(&self, ctx: CancellationToken) -> Result<(), BoxError> {
        let _ = ctx;
        Ok(())
    }

    /// Runs after a successful `on_init`, once the readiness signal is already fulfilled.
    ///
    /// Errors are logged and published as `ReadyHookFailed`; readiness observers never see them.
    async fn on_ready(&self) -> Result<(), BoxError> {
        Ok(())
    }
}
