//! A running telemetry session: one attached game, one tick loop.

use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::Result;
use crate::config::Config;
use crate::decoder::TelemetryDecoder;
use crate::driver::{Driver, DriverCommand};
use crate::locator;
use crate::provider::Provider;
use crate::providers::LiveProvider;
use crate::splits::{SplitConfig, SplitTracker};
use crate::stream::ThrottleExt;
use crate::types::{TickReport, UpdateRate};

/// Handle to a running tick loop.
///
/// Dropping the session cancels the loop, which releases the process handle.
pub struct Session {
    reports: watch::Receiver<Option<Arc<TickReport>>>,
    commands: mpsc::UnboundedSender<DriverCommand>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
    source_hz: f64,
}

impl Session {
    /// Spawn the tick loop over any provider. Must be called inside a tokio runtime.
    pub fn start<P: Provider>(provider: P, splits: SplitConfig) -> Self {
        let source_hz = provider.tick_rate();
        let channels = Driver::spawn(provider, SplitTracker::new(splits));

        Self {
            reports: channels.reports,
            commands: channels.commands,
            cancel: channels.cancel,
            task: Some(channels.task),
            source_hz,
        }
    }

    /// Find the running game, resolve its image base and start ticking.
    ///
    /// Fails when the game window or the image signature cannot be found.
    pub fn attach(config: &Config) -> Result<Self> {
        let profile = config.profile();
        let attachment = locator::attach(profile)?;
        info!(
            title = %attachment.window.title,
            base = %attachment.base,
            interval_ms = config.refresh_interval_ms,
            "Attached to game"
        );

        let decoder = TelemetryDecoder::new(attachment.memory, attachment.base, profile.offsets);
        let provider = LiveProvider::new(decoder, config.refresh_interval());
        Ok(Self::start(provider, config.splits))
    }

    /// Reports as they are published, throttled to `rate`.
    ///
    /// Waits for the first tick, and ends when the tick loop ends. Like any watch
    /// subscription, a slow consumer only sees the latest report.
    pub fn reports(
        &self,
        rate: UpdateRate,
    ) -> impl Stream<Item = Arc<TickReport>> + Send + Unpin + 'static {
        // Skip the empty value present before the first tick; the next None means the loop ended
        let reports = WatchStream::new(self.reports.clone())
            .skip_while(|opt| {
                let is_none = opt.is_none();
                async move { is_none }
            })
            .take_while(|opt| {
                let is_some = opt.is_some();
                async move { is_some }
            })
            .filter_map(|opt| async move { opt });

        match rate.throttle_interval(self.source_hz) {
            None => reports.boxed(),
            Some(interval) => reports.throttle(interval).boxed(),
        }
    }

    /// The most recently published report, if the loop is running and has ticked.
    pub fn latest(&self) -> Option<Arc<TickReport>> {
        self.reports.borrow().clone()
    }

    /// Ask the loop to start split timing over, out-lap included.
    ///
    /// Applied before the next tick. Returns false if the loop has already ended.
    pub fn reset_splits(&self) -> bool {
        self.commands.send(DriverCommand::ResetSplits).is_ok()
    }

    /// Ticks per second of the underlying provider.
    pub fn source_hz(&self) -> f64 {
        self.source_hz
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop the loop and wait until it has released the provider.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                debug!("Tick loop task failed: {}", e);
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        debug!("Dropping session");
        self.cancel.cancel();
    }
}
