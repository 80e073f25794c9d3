//! Conversions from the game's raw integers to physical units.
//!
//! Each conversion is a pure function of one raw value. The arithmetic order is fixed so that
//! results are bit-for-bit reproducible.

use std::f64::consts::PI;

/// Raw boost reading that corresponds to the reference pressure.
pub const BOOST_REFERENCE_RAW: f64 = 17929.0;
/// Raw boost units per PSI.
pub const BOOST_RAW_PER_PSI: f64 = 1616.0;
/// Boost pressure at the reference reading.
pub const BOOST_REFERENCE_PSI: f64 = 29.0;
/// Raw durability of a fresh engine.
pub const DURABILITY_FULL: f64 = 9_830_400.0;
/// Raw rotation units per half turn.
pub const ROTATION_HALF_TURN: f64 = 2_147_483_648.0;
/// Raw steering units per degree.
pub const STEERING_PER_DEGREE: f64 = 11_600_000.0;
/// Raw speed units per mile per hour.
pub const SPEED_PER_MPH: f64 = 75.0;

/// Turbo boost in PSI from the 16-bit boost field.
pub fn boost_psi(raw: u16) -> f64 {
    (f64::from(raw) - BOOST_REFERENCE_RAW) / BOOST_RAW_PER_PSI + BOOST_REFERENCE_PSI
}

/// Remaining engine durability as a percentage.
pub fn durability_percent(raw: i64) -> f64 {
    raw as f64 / DURABILITY_FULL * 100.0
}

/// Heading in degrees. A full signed 32-bit range spans -180..180.
pub fn rotation_degrees(raw: i64) -> f64 {
    raw as f64 / ROTATION_HALF_TURN * 180.0
}

/// Heading in radians.
pub fn rotation_radians(raw: i64) -> f64 {
    raw as f64 / ROTATION_HALF_TURN * PI
}

/// Front wheel steering angle in degrees.
pub fn steering_degrees(raw: i64) -> f64 {
    raw as f64 / STEERING_PER_DEGREE
}

/// Road speed in miles per hour.
pub fn speed_mph(raw: i64) -> f64 {
    raw as f64 / SPEED_PER_MPH
}

/// Whole miles per hour, rounded towards negative infinity, as shown on the overlay.
pub fn speed_mph_whole(raw: i64) -> i64 {
    raw.div_euclid(SPEED_PER_MPH as i64)
}
