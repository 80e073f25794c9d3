//! Stream adapters for published reports.

mod throttle;

pub use throttle::{Throttle, ThrottleExt};
