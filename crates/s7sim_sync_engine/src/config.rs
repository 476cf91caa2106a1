//! Configuration for the sync engine.

use std::time::Duration;
use tracing::warn;

/// Shortest allowed tick interval.
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(10);
/// Longest allowed tick interval.
pub const MAX_TICK_INTERVAL: Duration = Duration::from_secs(5);
/// Default tick interval, chosen for low-latency reconciliation.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(20);

/// Configuration for the reconciliation loop.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Time between reconciliation ticks.
    pub tick_interval: Duration,
    /// Interval at which local readers poll snapshots. Disabled by default;
    /// when enabled it should be an order of magnitude slower than the tick
    /// interval to keep lock contention negligible.
    pub poll_interval: Option<Duration>,
}

impl SyncConfig {
    /// Creates a configuration with the default tick interval and polling
    /// disabled.
    pub fn new() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            poll_interval: None,
        }
    }

    /// Sets the tick interval, clamped to 10ms..=5s. Lower values trade CPU
    /// for latency.
    #[must_use]
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = clamp_tick_interval(interval);
        self
    }

    /// Enables snapshot polling at the given interval.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Clamps a requested tick interval into the supported range, warning when
/// the request is adjusted.
pub fn clamp_tick_interval(interval: Duration) -> Duration {
    if interval < MIN_TICK_INTERVAL {
        warn!(
            requested_ms = interval.as_millis() as u64,
            "sync interval too low, clamping to 10ms"
        );
        MIN_TICK_INTERVAL
    } else if interval > MAX_TICK_INTERVAL {
        warn!(
            requested_ms = interval.as_millis() as u64,
            "sync interval too high, clamping to 5s"
        );
        MAX_TICK_INTERVAL
    } else {
        interval
    }
}
