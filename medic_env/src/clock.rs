//! Clock trait driving the drill's periodic tick.

use async_trait::async_trait;
use std::time::Duration;

/// The central interface for time in a drill.
///
/// This trait abstracts the host's interval facility so that the same
/// session loop runs under a real clock (tokio) and under a virtual
/// clock in the deterministic harness.
///
/// # Implementations
///
/// - **Production**: `TokioClock` - wraps `tokio::time`
/// - **Simulation**: `SimClock` (in `medic_sim`) - manually advanced
#[async_trait]
pub trait DrillClock: Send + Sync + 'static {
    /// Returns the monotonic time since the clock was created.
    ///
    /// In simulation, this is the virtual clock time.
    fn now(&self) -> Duration;

    /// Suspends execution for the given duration.
    ///
    /// In production: wraps `tokio::time::sleep`
    /// In simulation: advances the virtual clock and returns immediately
    async fn sleep(&self, duration: Duration);

    /// Returns the clock's seed (for logging/debugging).
    ///
    /// Production clocks are not seeded and return 0.
    fn seed(&self) -> u64;
}
