//! In-memory stand-in for a target process.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::trace;

use super::{MemoryRegion, PAGE_READWRITE, PAGE_SIZE, ProcessMemory};
use crate::offsets::{FieldOffsetTable, RevisionProfile};
use crate::types::{BaseAddress, CAR_RECORD_SIZE, CarRecord};
use crate::{Result, TelemetryError};

/// `PAGE_NOACCESS`
const PAGE_NOACCESS: u32 = 0x01;

#[derive(Debug)]
struct SimRegion {
    base: usize,
    data: Vec<u8>,
    committed: bool,
    protection: u32,
    faulty: bool,
}

impl SimRegion {
    fn describe(&self) -> MemoryRegion {
        MemoryRegion {
            base: self.base,
            size: self.data.len(),
            committed: self.committed,
            protection: self.protection,
        }
    }

    fn end(&self) -> usize {
        self.base + self.data.len()
    }
}

/// A fake address space made of explicit regions.
///
/// Gaps between regions are reported as free, non-readable regions, like the OS does. A region
/// can be marked faulty so that reads fail even though it claims to be readable, which is what a
/// page unmapped between query and read looks like.
#[derive(Debug, Default)]
pub struct SimulatedProcess {
    regions: RwLock<Vec<SimRegion>>,
    closed: AtomicBool,
}

impl SimulatedProcess {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map committed memory with the given protection, replacing any region at `base`.
    pub fn map_region(&self, base: usize, data: Vec<u8>, protection: u32) {
        self.insert(SimRegion { base, data, committed: true, protection, faulty: false });
    }

    /// Reserve address space without committing it.
    pub fn reserve_region(&self, base: usize, size: usize) {
        self.insert(SimRegion {
            base,
            data: vec![0; size],
            committed: false,
            protection: PAGE_NOACCESS,
            faulty: false,
        });
    }

    /// Make reads of the region at `base` fail (or succeed again).
    pub fn set_faulty(&self, base: usize, faulty: bool) {
        if let Some(region) = self.regions_mut().iter_mut().find(|r| r.base == base) {
            region.faulty = faulty;
        }
    }

    /// Overwrite bytes inside an existing region.
    pub fn write(&self, address: usize, bytes: &[u8]) -> Result<()> {
        let mut regions = self.regions_mut();
        let region = regions
            .iter_mut()
            .find(|r| address >= r.base && address + bytes.len() <= r.end())
            .ok_or_else(|| TelemetryError::read_failed(address, bytes.len()))?;
        let start = address - region.base;
        region.data[start..start + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Invalidate the handle; every later call fails with [`TelemetryError::HandleClosed`].
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn insert(&self, region: SimRegion) {
        let mut regions = self.regions_mut();
        regions.retain(|r| r.base != region.base);
        regions.push(region);
        regions.sort_by_key(|r| r.base);
    }

    fn regions(&self) -> RwLockReadGuard<'_, Vec<SimRegion>> {
        self.regions.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn regions_mut(&self) -> RwLockWriteGuard<'_, Vec<SimRegion>> {
        self.regions.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ProcessMemory for SimulatedProcess {
    fn read_into(&self, address: usize, buffer: &mut [u8]) -> Result<()> {
        if self.is_closed() {
            return Err(TelemetryError::HandleClosed);
        }

        let regions = self.regions();
        let end = address
            .checked_add(buffer.len())
            .ok_or_else(|| TelemetryError::read_failed(address, buffer.len()))?;
        let region = regions
            .iter()
            .find(|r| address >= r.base && end <= r.end())
            .filter(|r| r.describe().is_readable() && !r.faulty)
            .ok_or_else(|| TelemetryError::read_failed(address, buffer.len()))?;

        let start = address - region.base;
        buffer.copy_from_slice(&region.data[start..start + buffer.len()]);
        Ok(())
    }

    fn query_region(&self, address: usize) -> Result<Option<MemoryRegion>> {
        if self.is_closed() {
            return Err(TelemetryError::HandleClosed);
        }

        let regions = self.regions();
        if let Some(region) = regions.iter().find(|r| address >= r.base && address < r.end()) {
            return Ok(Some(region.describe()));
        }

        // Free space up to the next mapped region
        Ok(regions.iter().find(|r| r.base > address).map(|next| MemoryRegion {
            base: address,
            size: next.base - address,
            committed: false,
            protection: PAGE_NOACCESS,
        }))
    }
}

/// A simulated game process laid out like a given revision's executable image.
///
/// The image holds the revision's signature at its documented offset and zeroed telemetry
/// fields that can be updated between ticks. Below the image sit a reserved range and a
/// committed no-access page so base resolution has to skip regions like it does live.
#[derive(Debug, Clone)]
pub struct GameImage {
    process: Arc<SimulatedProcess>,
    base: BaseAddress,
    offsets: FieldOffsetTable,
}

impl GameImage {
    /// Load address used for simulated images.
    pub const DEFAULT_BASE: usize = 0x0040_0000;

    pub fn new(profile: &RevisionProfile) -> Self {
        Self::at(profile, Self::DEFAULT_BASE)
    }

    /// Build an image loaded at `base`, which must leave room for two pages below it.
    pub fn at(profile: &RevisionProfile, base: usize) -> Self {
        let extent = profile
            .offsets
            .image_extent()
            .max(profile.signature_offset + profile.signature.len());
        let size = extent.div_ceil(PAGE_SIZE) * PAGE_SIZE;

        let mut image = vec![0u8; size];
        image[profile.signature_offset..profile.signature_offset + profile.signature.len()]
            .copy_from_slice(profile.signature);

        let process = SimulatedProcess::new();
        process.reserve_region(base - 2 * PAGE_SIZE, PAGE_SIZE);
        process.map_region(base - PAGE_SIZE, vec![0; PAGE_SIZE], PAGE_NOACCESS);
        process.map_region(base, image, PAGE_READWRITE);

        trace!(base = %format!("{:#x}", base), size, "Built simulated game image");

        Self { process: Arc::new(process), base: BaseAddress::new(base), offsets: profile.offsets }
    }

    /// Shared handle to the simulated process.
    pub fn process(&self) -> Arc<SimulatedProcess> {
        Arc::clone(&self.process)
    }

    /// Where the image is loaded.
    pub fn base(&self) -> BaseAddress {
        self.base
    }

    pub fn set_session_time(&self, millis: i32) -> Result<()> {
        self.write_field(self.offsets.session_time, &millis.to_le_bytes())
    }

    pub fn set_lap_time(&self, raw: i32) -> Result<()> {
        self.write_field(self.offsets.lap_time, &raw.to_le_bytes())
    }

    pub fn set_durability(&self, raw: i32) -> Result<()> {
        self.write_field(self.offsets.engine_durability, &raw.to_le_bytes())
    }

    pub fn set_boost_raw(&self, raw: u16) -> Result<()> {
        self.write_field(self.offsets.boost, &raw.to_le_bytes())
    }

    /// Store a car record in `slot` of the primary car array.
    pub fn set_car(&self, slot: usize, car: &CarRecord) -> Result<()> {
        let bytes: Vec<u8> = car.fields().iter().flat_map(|f| f.to_le_bytes()).collect();
        self.write_field(self.offsets.cars + slot * CAR_RECORD_SIZE, &bytes)
    }

    fn write_field(&self, offset: usize, bytes: &[u8]) -> Result<()> {
        self.process.write(self.base.at(offset), bytes)
    }
}
