//! # Controller configuration.
//!
//! Provides [`Config`], the settings shared by a [`Controller`](crate::Controller)
//! and every generation it runs.
//!
//! ## Sentinel values
//! - `timeout = 0s` → defer to [`Lifecycle::timeout_limit`](crate::Lifecycle::timeout_limit)
//! - effective limit `0s` → no timer (initialization may run forever)

use std::time::Duration;

/// Timeout applied by [`Lifecycle::timeout_limit`](crate::Lifecycle::timeout_limit) unless overridden.
pub const DEFAULT_TIMEOUT_LIMIT: Duration = Duration::from_secs(50);

/// Configuration for a lifecycle controller.
///
/// ## Field semantics
/// - `bus_capacity`: Event bus ring buffer size (min 1; clamped by Bus)
/// - `timeout`: Override for the lifecycle's own limit (`0s` = no override)
#[derive(Clone, Debug)]
pub struct Config {
    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Receivers that lag behind more than `bus_capacity` events observe `Lagged`
    /// and skip older items.
    pub bus_capacity: usize,

    /// Initialization timeout override.
    ///
    /// - `Duration::ZERO` = use `Lifecycle::timeout_limit()` (read once per generation)
    /// - `> 0` = applied to every generation instead
    pub timeout: Duration,
}

impl Config {
    /// Returns the timeout override as an `Option`.
    #[inline]
    pub fn timeout_override(&self) -> Option<Duration> {
        if self.timeout == Duration::ZERO {
            None
        } else {
            Some(self.timeout)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024`
    /// - `timeout = 0s` (the lifecycle decides)
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            timeout: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_timeout_defers_to_lifecycle() {
        assert_eq!(Config::default().timeout_override(), None);

        let cfg = Config {
            timeout: Duration::from_secs(3),
            ..Config::default()
        };
        assert_eq!(cfg.timeout_override(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_bus_capacity_clamped() {
        let cfg = Config {
            bus_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
