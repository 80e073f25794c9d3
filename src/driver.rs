//! Driver spawns and runs the tick loop

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::provider::Provider;
use crate::splits::SplitTracker;
use crate::types::{PLAYER_SLOT, TelemetrySnapshot, TickData, TickReport};

/// Requests the tick loop handles between ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverCommand {
    /// Replace the split state with a fresh one
    ResetSplits,
}

/// Result of spawning the driver task
pub struct DriverChannels {
    /// Latest published report; `None` before the first tick and after the loop ended
    pub reports: watch::Receiver<Option<Arc<TickReport>>>,
    /// Commands applied between ticks
    pub commands: mpsc::UnboundedSender<DriverCommand>,
    /// Cancellation token for graceful shutdown
    pub cancel: CancellationToken,
    /// The tick loop task
    pub task: JoinHandle<()>,
}

/// Feed one snapshot to the tracker and build the report to publish.
///
/// Without a player car the tracker is left alone and no events are raised.
pub fn process_snapshot(
    tracker: &mut SplitTracker,
    tick: u64,
    snapshot: TelemetrySnapshot,
) -> TickReport {
    let events = match snapshot.cars.get(PLAYER_SLOT) {
        Some(player) => tracker.update(player.dlong, snapshot.session_time_ms),
        None => Vec::new(),
    };
    TickReport::Data(TickData { tick, snapshot, events, summary: tracker.summary() })
}

/// Driver spawns and runs the tick loop
///
/// The spawned task owns the provider (and with it the process handle) and the split tracker.
/// Everything it hands out is an immutable, already published report.
pub struct Driver;

impl Driver {
    /// Spawn the tick loop for the given provider
    pub fn spawn<P>(provider: P, tracker: SplitTracker) -> DriverChannels
    where
        P: Provider,
    {
        let (report_tx, report_rx) = watch::channel(None);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let cancel_loop = cancel.clone();
        let task = tokio::spawn(async move {
            Self::tick_loop(provider, tracker, report_tx, command_rx, cancel_loop).await;
        });

        DriverChannels { reports: report_rx, commands: command_tx, cancel, task }
    }

    async fn tick_loop<P>(
        mut provider: P,
        mut tracker: SplitTracker,
        report_tx: watch::Sender<Option<Arc<TickReport>>>,
        mut commands: mpsc::UnboundedReceiver<DriverCommand>,
        cancel: CancellationToken,
    ) where
        P: Provider,
    {
        info!(tick_rate = provider.tick_rate(), "Tick loop started");
        let mut tick = 0u64;
        let mut failed_ticks = 0u64;

        loop {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Tick loop cancelled");
                    break;
                }
                Some(command) = commands.recv() => {
                    match command {
                        DriverCommand::ResetSplits => tracker.reset(),
                    }
                    continue;
                }
                result = provider.next_snapshot() => result,
            };

            let report = match result {
                Ok(Some(snapshot)) => {
                    tick += 1;
                    let report = process_snapshot(&mut tracker, tick, snapshot);
                    trace!(tick, events = report.events().len(), "Tick processed");
                    report
                }
                Ok(None) => {
                    info!("Provider ended after {} ticks", tick);
                    break;
                }
                Err(e) if e.is_recoverable() => {
                    failed_ticks += 1;
                    warn!(failed_ticks, "Tick abandoned: {}", e);
                    TickReport::no_data(e.to_string())
                }
                Err(e) => {
                    error!("Tick loop stopping: {}", e);
                    break;
                }
            };

            if report_tx.send(Some(Arc::new(report))).is_err() {
                debug!("Report receivers dropped, shutting down");
                break;
            }
        }

        // Tell subscribers the stream is over
        let _ = report_tx.send(None);
        info!(tick, failed_ticks, "Tick loop ended");
    }
}
