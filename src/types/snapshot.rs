//! One tick's decoded telemetry and its flat export form.

use serde::Serialize;

use super::car::{CarRecord, PLAYER_SLOT};
use super::units;

/// Decoded telemetry for one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySnapshot {
    /// Session clock in milliseconds
    pub session_time_ms: i32,
    /// Raw value of the lap timer field
    pub lap_time_raw: i32,
    pub durability_raw: i32,
    /// Boost pressure in PSI
    pub boost_psi: f64,
    /// Every car slot, player at [`PLAYER_SLOT`]
    pub cars: Vec<CarRecord>,
}

impl TelemetrySnapshot {
    /// The player's car, if the snapshot holds enough slots.
    pub fn player(&self) -> Option<&CarRecord> {
        self.cars.get(PLAYER_SLOT)
    }

    pub fn durability_percent(&self) -> f64 {
        units::durability_percent(i64::from(self.durability_raw))
    }

    /// Flatten the player's state into the export record.
    pub fn export_record(&self) -> Option<ExportRecord> {
        let player = self.player()?;
        Some(ExportRecord {
            time_ms: self.session_time_ms,
            speed_raw: player.speed,
            speed_mph: player.speed_mph(),
            dlong: player.dlong,
            dlat: player.dlat,
            rotation_deg: player.rotation_degrees(),
            steering_raw: player.steering,
            steering_deg: player.steering_degrees(),
            durability_raw: self.durability_raw,
            durability_pct: self.durability_percent(),
            boost: self.boost_psi,
        })
    }
}

/// Flat per-tick record written by export sinks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExportRecord {
    pub time_ms: i32,
    pub speed_raw: i32,
    pub speed_mph: f64,
    pub dlong: i32,
    pub dlat: i32,
    pub rotation_deg: f64,
    pub steering_raw: i32,
    pub steering_deg: f64,
    pub durability_raw: i32,
    pub durability_pct: f64,
    pub boost: f64,
}
