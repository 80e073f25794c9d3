//! Bounded, typed reads from another process's address space.
//!
//! [`ProcessMemory`] is the seam between the decoding logic and the operating system. The
//! live implementation is [`crate::windows::ProcessHandle`]; [`SimulatedProcess`] backs tests,
//! benchmarks and offline runs with plain byte buffers.
//!
//! All multi-byte values are little-endian, matching the 32-bit x86 game binary.

pub mod simulated;

use std::sync::Arc;

use crate::{Result, TelemetryError};

pub use simulated::{GameImage, SimulatedProcess};

/// `MEM_COMMIT` region state.
pub const MEM_COMMIT: u32 = 0x1000;
/// `PAGE_READONLY`
pub const PAGE_READONLY: u32 = 0x02;
/// `PAGE_READWRITE`
pub const PAGE_READWRITE: u32 = 0x04;
/// `PAGE_EXECUTE_READ`
pub const PAGE_EXECUTE_READ: u32 = 0x20;
/// `PAGE_EXECUTE_READWRITE`
pub const PAGE_EXECUTE_READWRITE: u32 = 0x40;
/// Protection bits that allow reading a committed page.
pub const PAGE_READABLE: u32 =
    PAGE_READONLY | PAGE_READWRITE | PAGE_EXECUTE_READ | PAGE_EXECUTE_READWRITE;
/// Allocation granularity used when a region query reports a zero-sized region.
pub const PAGE_SIZE: usize = 0x1000;
/// Upper bound of the user address space of a 32-bit process.
pub const USER_SPACE_LIMIT: usize = 0x7FFF_FFFF;

/// One contiguous range of pages sharing state and protection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRegion {
    /// First address of the region
    pub base: usize,
    /// Length in bytes
    pub size: usize,
    /// Whether the pages are committed (backed by storage)
    pub committed: bool,
    /// Raw page protection flags
    pub protection: u32,
}

impl MemoryRegion {
    /// Whether the region can be read in full.
    pub fn is_readable(&self) -> bool {
        self.committed && self.protection & PAGE_READABLE != 0
    }

    /// First address past the end of the region.
    pub fn end(&self) -> usize {
        self.base.saturating_add(self.size)
    }

    /// Whether `address` falls inside the region.
    pub fn contains(&self, address: usize) -> bool {
        address >= self.base && address < self.end()
    }
}

/// Read access to a target process.
///
/// Every read may fail at any time: the target can exit or unmap pages between two calls.
pub trait ProcessMemory {
    /// Fill `buffer` with the bytes at `address`. Partial reads are errors.
    fn read_into(&self, address: usize, buffer: &mut [u8]) -> Result<()>;

    /// Describe the region containing `address`.
    ///
    /// Returns `Ok(None)` once `address` lies past the last region the OS reports.
    fn query_region(&self, address: usize) -> Result<Option<MemoryRegion>>;

    /// Read `length` bytes at `address`.
    fn read_bytes(&self, address: usize, length: usize) -> Result<Vec<u8>> {
        let mut buffer = vec![0; length];
        self.read_into(address, &mut buffer)?;
        Ok(buffer)
    }

    /// Read a little-endian `i32`.
    fn read_i32(&self, address: usize) -> Result<i32> {
        let mut buffer = [0; 4];
        self.read_into(address, &mut buffer)?;
        Ok(i32::from_le_bytes(buffer))
    }

    /// Read a little-endian `u16`.
    fn read_u16(&self, address: usize) -> Result<u16> {
        let mut buffer = [0; 2];
        self.read_into(address, &mut buffer)?;
        Ok(u16::from_le_bytes(buffer))
    }

    /// Read `count` consecutive little-endian `i32` values.
    fn read_i32_array(&self, address: usize, count: usize) -> Result<Vec<i32>> {
        let length = count
            .checked_mul(4)
            .ok_or_else(|| TelemetryError::read_failed(address, usize::MAX))?;
        let bytes = self.read_bytes(address, length)?;
        Ok(bytes
            .chunks_exact(4)
            .map(|chunk| i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect())
    }
}

impl<T: ProcessMemory + ?Sized> ProcessMemory for &T {
    fn read_into(&self, address: usize, buffer: &mut [u8]) -> Result<()> {
        (**self).read_into(address, buffer)
    }

    fn query_region(&self, address: usize) -> Result<Option<MemoryRegion>> {
        (**self).query_region(address)
    }
}

impl<T: ProcessMemory + ?Sized> ProcessMemory for Arc<T> {
    fn read_into(&self, address: usize, buffer: &mut [u8]) -> Result<()> {
        (**self).read_into(address, buffer)
    }

    fn query_region(&self, address: usize) -> Result<Option<MemoryRegion>> {
        (**self).query_region(address)
    }
}

impl<T: ProcessMemory + ?Sized> ProcessMemory for Box<T> {
    fn read_into(&self, address: usize, buffer: &mut [u8]) -> Result<()> {
        (**self).read_into(address, buffer)
    }

    fn query_region(&self, address: usize) -> Result<Option<MemoryRegion>> {
        (**self).query_region(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn process_with(bytes: Vec<u8>) -> SimulatedProcess {
        let process = SimulatedProcess::new();
        process.map_region(0x1000, bytes, PAGE_READWRITE);
        process
    }

    #[test]
    fn typed_reads_are_little_endian() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(-5i32).to_le_bytes());
        bytes.extend_from_slice(&17929u16.to_le_bytes());
        bytes.extend_from_slice(&[0, 0]);
        let process = process_with(bytes);

        assert_eq!(process.read_i32(0x1000).unwrap(), -5);
        assert_eq!(process.read_u16(0x1004).unwrap(), 17929);
    }

    #[test]
    fn i32_array_reads_consecutive_values() {
        let values = [1, -2, 3, i32::MIN, i32::MAX];
        let bytes = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let process = process_with(bytes);

        assert_eq!(process.read_i32_array(0x1000, 5).unwrap(), values);
        assert_eq!(process.read_i32_array(0x1004, 2).unwrap(), vec![-2, 3]);
    }

    #[test]
    fn reads_past_the_region_fail() {
        let process = process_with(vec![0; 8]);

        assert!(process.read_i32(0x1006).is_err());
        assert!(process.read_i32_array(0x1000, 3).is_err());
    }

    #[test]
    fn readable_requires_commit_and_read_protection() {
        let region =
            MemoryRegion { base: 0x1000, size: 0x1000, committed: true, protection: PAGE_READONLY };
        assert!(region.is_readable());
        assert!(region.contains(0x1fff));
        assert!(!region.contains(0x2000));

        let no_access = MemoryRegion { protection: 0x01, ..region };
        assert!(!no_access.is_readable());

        let reserved = MemoryRegion { committed: false, ..region };
        assert!(!reserved.is_readable());
    }

    #[test]
    fn references_and_arcs_forward_reads() {
        let process = Arc::new(process_with(7i32.to_le_bytes().to_vec()));
        let by_ref = &process;

        assert_eq!(by_ref.read_i32(0x1000).unwrap(), 7);
        assert_eq!(Arc::clone(&process).read_i32(0x1000).unwrap(), 7);
    }
}
