//! Read-only handle to another process.

use std::ffi::c_void;

use tracing::{debug, trace};
use windows::Win32::Foundation::{CloseHandle, HANDLE};
use windows::Win32::System::Diagnostics::Debug::ReadProcessMemory;
use windows::Win32::System::Memory::{MEM_COMMIT, MEMORY_BASIC_INFORMATION, VirtualQueryEx};
use windows::Win32::System::Threading::{
    OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_VM_READ,
};

use crate::memory::{MemoryRegion, ProcessMemory};
use crate::{Result, TelemetryError};

/// Handle opened with `PROCESS_VM_READ | PROCESS_QUERY_INFORMATION`.
///
/// The OS handle is released exactly once, by [`ProcessHandle::close`] or on drop. After that
/// every call fails with [`TelemetryError::HandleClosed`].
#[derive(Debug)]
pub struct ProcessHandle {
    pid: u32,
    handle: Option<HANDLE>,
}

impl ProcessHandle {
    pub fn open(pid: u32) -> Result<Self> {
        trace!(pid, "Opening process");

        let handle = unsafe { OpenProcess(PROCESS_VM_READ | PROCESS_QUERY_INFORMATION, false, pid) }
            .map_err(|e| TelemetryError::process_not_accessible(pid, Some(Box::new(e))))?;

        debug!(pid, "Opened process for reading");
        Ok(Self { pid, handle: Some(handle) })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// Release the OS handle. Calling this again is a no-op.
    pub fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            unsafe {
                let _ = CloseHandle(handle);
            }
            debug!(pid = self.pid, "Closed process handle");
        }
    }

    fn raw(&self) -> Result<HANDLE> {
        self.handle.ok_or(TelemetryError::HandleClosed)
    }
}

impl ProcessMemory for ProcessHandle {
    fn read_into(&self, address: usize, buffer: &mut [u8]) -> Result<()> {
        let handle = self.raw()?;
        let mut bytes_read = 0usize;

        unsafe {
            ReadProcessMemory(
                handle,
                address as *const c_void,
                buffer.as_mut_ptr() as *mut c_void,
                buffer.len(),
                Some(&mut bytes_read),
            )
        }
        .map_err(|e| TelemetryError::read_failed_with_source(address, buffer.len(), Box::new(e)))?;

        if bytes_read != buffer.len() {
            return Err(TelemetryError::read_failed(address, buffer.len()));
        }
        Ok(())
    }

    fn query_region(&self, address: usize) -> Result<Option<MemoryRegion>> {
        let handle = self.raw()?;
        let mut info = MEMORY_BASIC_INFORMATION::default();

        let written = unsafe {
            VirtualQueryEx(
                handle,
                Some(address as *const c_void),
                &mut info,
                std::mem::size_of::<MEMORY_BASIC_INFORMATION>(),
            )
        };

        // Zero means the address is past the last region
        if written == 0 {
            return Ok(None);
        }

        Ok(Some(MemoryRegion {
            base: info.BaseAddress as usize,
            size: info.RegionSize,
            committed: info.State == MEM_COMMIT,
            protection: info.Protect.0,
        }))
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        self.close();
    }
}

// SAFETY: the handle is a kernel object reference only used for read-only queries, which
// Windows allows from any thread
unsafe impl Send for ProcessHandle {}
unsafe impl Sync for ProcessHandle {}
