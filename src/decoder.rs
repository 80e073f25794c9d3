//! Typed telemetry reads at image-relative offsets.

use tracing::trace;

use crate::Result;
use crate::memory::ProcessMemory;
use crate::offsets::FieldOffsetTable;
use crate::types::{BaseAddress, CAR_SLOTS, CarRecord, FIELDS_PER_SLOT, TelemetrySnapshot, units};

/// Read `slot_count` car records starting at `base + offset`.
///
/// Unused slots are resident too, so every slot is always returned.
pub fn read_cars<M: ProcessMemory + ?Sized>(
    memory: &M,
    base: BaseAddress,
    offset: usize,
    slot_count: usize,
) -> Result<Vec<CarRecord>> {
    let values = memory.read_i32_array(base.at(offset), slot_count * FIELDS_PER_SLOT)?;
    Ok(CarRecord::from_flat(&values))
}

/// Decodes one revision's fields from a process.
///
/// Owns the process handle for the session; dropping the decoder releases it.
#[derive(Debug)]
pub struct TelemetryDecoder<M> {
    memory: M,
    base: BaseAddress,
    offsets: FieldOffsetTable,
}

impl<M: ProcessMemory> TelemetryDecoder<M> {
    pub fn new(memory: M, base: BaseAddress, offsets: FieldOffsetTable) -> Self {
        Self { memory, base, offsets }
    }

    pub fn base(&self) -> BaseAddress {
        self.base
    }

    pub fn offsets(&self) -> &FieldOffsetTable {
        &self.offsets
    }

    pub fn memory(&self) -> &M {
        &self.memory
    }

    pub fn into_memory(self) -> M {
        self.memory
    }

    /// All 40 slots of the primary car array.
    pub fn read_cars(&self) -> Result<Vec<CarRecord>> {
        read_cars(&self.memory, self.base, self.offsets.cars, CAR_SLOTS)
    }

    /// All 40 slots of the secondary car array.
    pub fn read_secondary_cars(&self) -> Result<Vec<CarRecord>> {
        read_cars(&self.memory, self.base, self.offsets.cars_secondary, CAR_SLOTS)
    }

    /// Session clock in milliseconds.
    pub fn read_session_time(&self) -> Result<i32> {
        self.memory.read_i32(self.base.at(self.offsets.session_time))
    }

    pub fn read_lap_time(&self) -> Result<i32> {
        self.memory.read_i32(self.base.at(self.offsets.lap_time))
    }

    /// Raw engine durability, see [`units::durability_percent`].
    pub fn read_durability(&self) -> Result<i32> {
        self.memory.read_i32(self.base.at(self.offsets.engine_durability))
    }

    pub fn read_boost_raw(&self) -> Result<u16> {
        self.memory.read_u16(self.base.at(self.offsets.boost))
    }

    /// Boost in PSI.
    pub fn read_boost(&self) -> Result<f64> {
        self.read_boost_raw().map(units::boost_psi)
    }

    /// Player dlong from its standalone field.
    pub fn read_player_dlong(&self) -> Result<i32> {
        self.memory.read_i32(self.base.at(self.offsets.player_dlong))
    }

    /// Decode everything for one tick. Any failed read fails the whole snapshot.
    pub fn snapshot(&self) -> Result<TelemetrySnapshot> {
        let session_time_ms = self.read_session_time()?;
        let snapshot = TelemetrySnapshot {
            session_time_ms,
            lap_time_raw: self.read_lap_time()?,
            durability_raw: self.read_durability()?,
            boost_psi: self.read_boost()?,
            cars: self.read_cars()?,
        };
        trace!(session_time_ms, cars = snapshot.cars.len(), "Decoded snapshot");
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TelemetryError;
    use crate::memory::{GameImage, SimulatedProcess};
    use crate::offsets::REND32A;
    use crate::types::PLAYER_SLOT;
    use std::sync::Arc;

    fn decoder_for(image: &GameImage) -> TelemetryDecoder<Arc<SimulatedProcess>> {
        TelemetryDecoder::new(image.process(), image.base(), REND32A.offsets)
    }

    #[test]
    fn scalar_fields_decode_with_conversions() {
        let image = GameImage::new(&REND32A);
        image.set_session_time(125_750).unwrap();
        image.set_durability(9_830_400).unwrap();
        image.set_boost_raw(17_929 + 1616).unwrap();
        image.set_lap_time(4242).unwrap();

        let decoder = decoder_for(&image);
        assert_eq!(decoder.read_session_time().unwrap(), 125_750);
        assert_eq!(decoder.read_durability().unwrap(), 9_830_400);
        assert_eq!(decoder.read_boost().unwrap(), 30.0);
        assert_eq!(decoder.read_lap_time().unwrap(), 4242);
    }

    #[test]
    fn car_array_always_has_forty_slots() {
        let image = GameImage::new(&REND32A);
        let player = CarRecord { dlong: 24_800_001, dlat: 300, speed: 15_000, ..Default::default() };
        image.set_car(PLAYER_SLOT, &player).unwrap();
        image.set_car(39, &CarRecord { data12: -1, ..Default::default() }).unwrap();

        let cars = decoder_for(&image).read_cars().unwrap();
        assert_eq!(cars.len(), CAR_SLOTS);
        assert_eq!(cars[PLAYER_SLOT], player);
        assert_eq!(cars[0], CarRecord::default());
        assert_eq!(cars[39].data12, -1);
    }

    #[test]
    fn free_function_reads_arbitrary_slot_counts() {
        let image = GameImage::new(&REND32A);
        image.set_car(2, &CarRecord { dlong: 77, ..Default::default() }).unwrap();

        let cars = read_cars(&*image.process(), image.base(), REND32A.offsets.cars, 3).unwrap();
        assert_eq!(cars.len(), 3);
        assert_eq!(cars[2].dlong, 77);
    }

    #[test]
    fn secondary_array_and_standalone_dlong_are_readable() {
        let image = GameImage::new(&REND32A);
        let process = image.process();
        process.write(image.base().at(REND32A.offsets.player_dlong), &123i32.to_le_bytes()).unwrap();

        let decoder = decoder_for(&image);
        assert_eq!(decoder.read_player_dlong().unwrap(), 123);
        assert_eq!(decoder.read_secondary_cars().unwrap().len(), CAR_SLOTS);
    }

    #[test]
    fn snapshot_collects_every_field() {
        let image = GameImage::new(&REND32A);
        image.set_session_time(1000).unwrap();
        image.set_durability(4_915_200).unwrap();
        image.set_boost_raw(17_929).unwrap();
        image.set_car(PLAYER_SLOT, &CarRecord { dlong: 5, ..Default::default() }).unwrap();

        let snapshot = decoder_for(&image).snapshot().unwrap();
        assert_eq!(snapshot.session_time_ms, 1000);
        assert_eq!(snapshot.durability_percent(), 50.0);
        assert_eq!(snapshot.boost_psi, 29.0);
        assert_eq!(snapshot.player().unwrap().dlong, 5);
    }

    #[test]
    fn failed_reads_surface_as_errors() {
        let image = GameImage::new(&REND32A);
        let decoder = decoder_for(&image);

        image.process().set_faulty(image.base().get(), true);
        assert!(matches!(decoder.snapshot(), Err(TelemetryError::Read { .. })));

        image.process().set_faulty(image.base().get(), false);
        assert!(decoder.snapshot().is_ok());

        image.process().close();
        assert!(matches!(decoder.read_session_time(), Err(TelemetryError::HandleClosed)));
    }
}
