//! Consumers of published tick reports.
//!
//! Sinks only ever see an already published [`TickReport`], never the state the tick loop is
//! mutating.

mod display;
mod export;

pub use display::{ConsoleDisplay, render_text_block};
pub use export::JsonFileExport;

use crate::Result;
use crate::types::{ExportRecord, TickReport};

/// Shows one report per tick.
pub trait DisplaySink {
    fn show(&mut self, report: &TickReport) -> Result<()>;

    /// Called when the split table was reset.
    fn reset(&mut self) -> Result<()>;
}

/// Persists the latest tick's flat record, replacing the previous one.
pub trait ExportSink {
    fn export(&mut self, record: &ExportRecord) -> Result<()>;
}
