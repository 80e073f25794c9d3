//! Per-car state as laid out in the game's car array.

use serde::Serialize;

use super::units;

/// Number of car slots in the array.
pub const CAR_SLOTS: usize = 40;
/// Number of 32-bit fields per slot.
pub const FIELDS_PER_SLOT: usize = 12;
/// Bytes occupied by one slot.
pub const CAR_RECORD_SIZE: usize = FIELDS_PER_SLOT * 4;
/// Slot holding the player-controlled car.
pub const PLAYER_SLOT: usize = 1;

/// One slot of the car array.
///
/// Fields whose meaning is unknown keep their positional names so that nothing read from
/// memory is dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CarRecord {
    pub data1: i32,
    pub data2: i32,
    pub data3: i32,
    pub data4: i32,
    /// Distance along the track centreline
    pub dlong: i32,
    /// Offset across the track
    pub dlat: i32,
    pub data7: i32,
    /// Heading, a full turn spans the i32 range
    pub rotation: i32,
    pub speed: i32,
    pub tire_rotation: i32,
    pub steering: i32,
    pub data12: i32,
}

impl CarRecord {
    pub fn from_fields(fields: [i32; FIELDS_PER_SLOT]) -> Self {
        let [
            data1,
            data2,
            data3,
            data4,
            dlong,
            dlat,
            data7,
            rotation,
            speed,
            tire_rotation,
            steering,
            data12,
        ] = fields;
        Self {
            data1,
            data2,
            data3,
            data4,
            dlong,
            dlat,
            data7,
            rotation,
            speed,
            tire_rotation,
            steering,
            data12,
        }
    }

    /// Fields in memory order.
    pub fn fields(&self) -> [i32; FIELDS_PER_SLOT] {
        [
            self.data1,
            self.data2,
            self.data3,
            self.data4,
            self.dlong,
            self.dlat,
            self.data7,
            self.rotation,
            self.speed,
            self.tire_rotation,
            self.steering,
            self.data12,
        ]
    }

    /// Split a flat field array into car records, ignoring a trailing partial slot.
    pub fn from_flat(values: &[i32]) -> Vec<Self> {
        values
            .chunks_exact(FIELDS_PER_SLOT)
            .map(|chunk| {
                let mut fields = [0; FIELDS_PER_SLOT];
                fields.copy_from_slice(chunk);
                Self::from_fields(fields)
            })
            .collect()
    }

    pub fn speed_mph(&self) -> f64 {
        units::speed_mph(i64::from(self.speed))
    }

    pub fn rotation_degrees(&self) -> f64 {
        units::rotation_degrees(i64::from(self.rotation))
    }

    pub fn rotation_radians(&self) -> f64 {
        units::rotation_radians(i64::from(self.rotation))
    }

    pub fn steering_degrees(&self) -> f64 {
        units::steering_degrees(i64::from(self.steering))
    }
}
