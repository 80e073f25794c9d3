//! Live telemetry and split timing for IndyCar Racing II.
//!
//! The game keeps its telemetry at fixed offsets inside its executable image. This crate finds
//! the game window, resolves the image's load address by scanning for a signature embedded at a
//! known offset, decodes the player car and session fields on every tick, and times sectors and
//! laps from the player's track position.
//!
//! # Features
//!
//! - **Base resolution**: region-by-region signature scan that skips unreadable memory
//! - **Decoding**: 40-slot car array, session clock, engine durability and boost
//! - **Split timing**: three sectors with out-lap detection, bests and previous bests
//! - **Sinks**: a console text block and a JSON file holding the latest tick
//! - **Simulation**: an in-memory process that lays out a game image, for tests and demos
//!
//! Live attachment needs Windows; everything else works anywhere.
//!
//! ## Example (simulated process)
//!
//! ```rust
//! use std::time::Duration;
//! use futures::StreamExt;
//! use icr2_telemetry::{GameImage, LiveProvider, REND32A, Session, SplitConfig, UpdateRate};
//! use icr2_telemetry::{TelemetryDecoder, locator};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> icr2_telemetry::Result<()> {
//! let image = GameImage::new(&REND32A);
//! image.set_session_time(83_250)?;
//!
//! let base = locator::resolve_base(&*image.process(), REND32A.signature, REND32A.signature_offset)?;
//! assert_eq!(base, image.base());
//!
//! let decoder = TelemetryDecoder::new(image.process(), base, REND32A.offsets);
//! let session = Session::start(LiveProvider::new(decoder, Duration::from_millis(20)), SplitConfig::default());
//!
//! let mut reports = session.reports(UpdateRate::Native);
//! if let Some(report) = reports.next().await {
//!     println!("{}", icr2_telemetry::sink::render_text_block(&report));
//! }
//! session.shutdown().await;
//! # Ok(())
//! # }
//! ```

// Core types and error handling
mod error;
pub mod offsets;
pub mod types;

// Memory access and decoding
pub mod decoder;
pub mod locator;
pub mod memory;

// Split timing
pub mod splits;

// Tick loop and consumers
pub mod config;
pub mod driver;
pub mod provider;
pub mod providers;
pub mod session;
pub mod sink;
pub mod stream;

// Platform-specific modules
#[cfg(windows)]
pub mod windows;

// Core exports
pub use error::*;
pub use types::*;

pub use config::{Config, ExportConfig};
pub use decoder::TelemetryDecoder;
pub use memory::{GameImage, MemoryRegion, ProcessMemory, SimulatedProcess};
pub use offsets::{BinaryRevision, FieldOffsetTable, REND32A, RevisionProfile};
pub use splits::{SplitConfig, SplitEvent, SplitState, SplitSummary, SplitTracker};

// Main API exports
pub use providers::LiveProvider;
pub use session::Session;

#[cfg(windows)]
pub use windows::ProcessHandle;
