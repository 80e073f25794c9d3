//! Provider that polls a running game process.

use std::time::Duration;

use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::Result;
use crate::decoder::TelemetryDecoder;
use crate::memory::ProcessMemory;
use crate::provider::Provider;
use crate::types::TelemetrySnapshot;

/// Decodes one snapshot from process memory per refresh interval.
pub struct LiveProvider<M> {
    decoder: TelemetryDecoder<M>,
    period: Duration,
    /// Created on the first tick, inside the runtime
    interval: Option<Interval>,
}

impl<M> LiveProvider<M>
where
    M: ProcessMemory + Send + Sync + 'static,
{
    pub fn new(decoder: TelemetryDecoder<M>, period: Duration) -> Self {
        info!(
            base = %decoder.base(),
            period_ms = period.as_millis() as u64,
            "Live provider ready"
        );
        Self { decoder, period, interval: None }
    }

    pub fn decoder(&self) -> &TelemetryDecoder<M> {
        &self.decoder
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    async fn wait_for_tick(&mut self) {
        let period = self.period;
        let interval = self.interval.get_or_insert_with(|| {
            let mut interval = tokio::time::interval(period);
            // A slow read should not cause a burst of catch-up ticks
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        interval.tick().await;
    }
}

#[async_trait::async_trait]
impl<M> Provider for LiveProvider<M>
where
    M: ProcessMemory + Send + Sync + 'static,
{
    async fn next_snapshot(&mut self) -> Result<Option<TelemetrySnapshot>> {
        self.wait_for_tick().await;
        self.decoder.snapshot().map(Some)
    }

    fn tick_rate(&self) -> f64 {
        let secs = self.period.as_secs_f64();
        if secs > 0.0 { 1.0 / secs } else { f64::INFINITY }
    }
}

impl<M> Drop for LiveProvider<M> {
    fn drop(&mut self) {
        debug!("Dropping live provider");
    }
}
