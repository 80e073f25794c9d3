//! Core types for decoded telemetry.
//!
//! - [`BaseAddress`] is where the game's executable image is loaded; every field offset is
//!   relative to it
//! - [`CarRecord`] is one slot of the game's 40-slot car array
//! - [`TelemetrySnapshot`] is everything decoded in one tick
//! - [`TickReport`] is what the tick loop publishes to sinks
//! - [`units`] converts raw integers into physical units
//! - [`UpdateRate`] limits how often report streams yield
//!
//! ```rust
//! use icr2_telemetry::types::{CarRecord, units};
//!
//! let car = CarRecord { speed: 15_000, ..CarRecord::default() };
//! assert_eq!(car.speed_mph(), 200.0);
//! assert_eq!(units::boost_psi(17929), 29.0);
//! ```

mod car;
mod report;
mod snapshot;
pub mod units;
mod update_rate;

use std::fmt;

pub use car::{CAR_RECORD_SIZE, CAR_SLOTS, CarRecord, FIELDS_PER_SLOT, PLAYER_SLOT};
pub use report::{TickData, TickReport};
pub use snapshot::{ExportRecord, TelemetrySnapshot};
pub use update_rate::UpdateRate;

/// Load address of the target executable image.
///
/// Resolved once per session and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BaseAddress(usize);

impl BaseAddress {
    pub const fn new(address: usize) -> Self {
        Self(address)
    }

    pub const fn get(self) -> usize {
        self.0
    }

    /// Absolute address of an image-relative offset.
    pub const fn at(self, offset: usize) -> usize {
        self.0.saturating_add(offset)
    }
}

impl fmt::Display for BaseAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl fmt::LowerHex for BaseAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}
