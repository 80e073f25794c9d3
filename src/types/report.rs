//! What the tick loop publishes to sinks.

use super::snapshot::{ExportRecord, TelemetrySnapshot};
use crate::splits::{SplitEvent, SplitSummary};

/// Published outcome of one tick. Immutable once sent.
#[derive(Debug, Clone, PartialEq)]
pub enum TickReport {
    /// Telemetry was read and fed to the split tracker
    Data(TickData),
    /// The tick was abandoned; split state was not touched
    NoData { reason: String },
}

/// A successful tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickData {
    /// Tick counter since the driver started
    pub tick: u64,
    pub snapshot: TelemetrySnapshot,
    /// Split events raised by this tick, in order
    pub events: Vec<SplitEvent>,
    /// Split table as of the end of this tick
    pub summary: SplitSummary,
}

impl TickReport {
    pub fn no_data(reason: impl Into<String>) -> Self {
        TickReport::NoData { reason: reason.into() }
    }

    pub fn data(&self) -> Option<&TickData> {
        match self {
            TickReport::Data(data) => Some(data),
            TickReport::NoData { .. } => None,
        }
    }

    /// Events of this tick, empty when there was no data.
    pub fn events(&self) -> &[SplitEvent] {
        self.data().map(|d| d.events.as_slice()).unwrap_or_default()
    }

    pub fn export_record(&self) -> Option<ExportRecord> {
        self.data().and_then(|d| d.snapshot.export_record())
    }
}
