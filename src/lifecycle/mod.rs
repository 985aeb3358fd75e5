//! # Lifecycle hooks supplied by the owning object.
//!
//! - [`Lifecycle`] - trait with overridable `on_init` / `on_ready` / `timeout_limit`
//! - [`LifecycleFn`] - closure-backed implementation
//! - [`LifecycleRef`] - shared reference to a lifecycle (`Arc<dyn Lifecycle>`)

#[allow(clippy::module_inception)]
mod lifecycle;
mod lifecycle_fn;

pub use lifecycle::{Lifecycle, LifecycleRef};
pub use lifecycle_fn::LifecycleFn;
