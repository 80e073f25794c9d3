//! Provider trait for snapshot sources

use crate::Result;
use crate::types::TelemetrySnapshot;

/// Trait for telemetry snapshot sources
///
/// Providers pace themselves: `next_snapshot` waits until the next tick is due.
#[async_trait::async_trait]
pub trait Provider: Send + 'static {
    /// Read the next snapshot
    ///
    /// Returns:
    /// - `Ok(Some(snapshot))` - A tick was decoded
    /// - `Ok(None)` - Source ended (normal termination)
    /// - `Err(e)` - The tick failed; see [`crate::TelemetryError::is_recoverable`]
    async fn next_snapshot(&mut self) -> Result<Option<TelemetrySnapshot>>;

    /// Ticks per second this provider produces
    fn tick_rate(&self) -> f64;
}
