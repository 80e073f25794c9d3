//! Finding the game process and its image base.
//!
//! The executable's load address changes between runs and Windows versions, but the
//! revision's signature always sits at the same offset from the image base. Attaching is:
//!
//! 1. pick the first visible window whose title contains every keyword (case-insensitive)
//! 2. open that window's process
//! 3. walk the address space region by region and search every committed, readable region
//!    for the signature
//! 4. subtract the signature offset from the match address
//!
//! Regions that cannot be read are skipped; only an exhausted address space is an error.

use tracing::{debug, info, trace, warn};

use crate::memory::{MemoryRegion, PAGE_SIZE, ProcessMemory, USER_SPACE_LIMIT};
use crate::offsets::RevisionProfile;
use crate::types::BaseAddress;
use crate::{Result, TelemetryError};

/// A top-level window and the process that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    pub title: String,
    pub pid: u32,
}

/// First window whose title contains every keyword, ignoring case.
pub fn find_target_window<'a, S: AsRef<str>>(
    windows: &'a [WindowInfo],
    keywords: &[S],
) -> Option<&'a WindowInfo> {
    windows.iter().find(|window| {
        let title = window.title.to_lowercase();
        keywords.iter().all(|keyword| title.contains(&keyword.as_ref().to_lowercase()))
    })
}

/// Outcome of searching one region.
#[derive(Debug)]
enum RegionScan {
    Match(usize),
    NoMatch,
    /// Not committed or not readable
    Skipped,
    /// Claimed readable but the read failed
    ReadFailed(TelemetryError),
}

fn scan_region<M: ProcessMemory + ?Sized>(
    memory: &M,
    region: &MemoryRegion,
    signature: &[u8],
) -> RegionScan {
    if !region.is_readable() {
        return RegionScan::Skipped;
    }

    match memory.read_bytes(region.base, region.size) {
        Ok(data) => match data.windows(signature.len()).position(|window| window == signature) {
            Some(index) => RegionScan::Match(region.base + index),
            None => RegionScan::NoMatch,
        },
        Err(err) => RegionScan::ReadFailed(err),
    }
}

/// Address of the first occurrence of `signature` below `limit`.
///
/// Matches spanning two regions are not found. Errors only when the region walk itself fails,
/// for example because the handle was closed.
pub fn scan_for_signature<M: ProcessMemory + ?Sized>(
    memory: &M,
    signature: &[u8],
    limit: usize,
) -> Result<Option<usize>> {
    if signature.is_empty() {
        return Ok(None);
    }

    let mut address = 0usize;
    let mut regions_read = 0usize;

    while address < limit {
        let Some(region) = memory.query_region(address)? else {
            trace!(address = %format!("{:#x}", address), "No more regions");
            break;
        };

        match scan_region(memory, &region, signature) {
            RegionScan::Match(found) => {
                debug!(
                    address = %format!("{:#x}", found),
                    regions_read, "Signature found"
                );
                return Ok(Some(found));
            }
            RegionScan::NoMatch => regions_read += 1,
            RegionScan::Skipped => {}
            RegionScan::ReadFailed(err) => {
                warn!(
                    base = %format!("{:#x}", region.base),
                    size = region.size,
                    "Skipping unreadable region: {}",
                    err
                );
            }
        }

        let next = region.end();
        address = if next > address { next } else { address.saturating_add(PAGE_SIZE) };
    }

    debug!(regions_read, "Signature not found");
    Ok(None)
}

/// Image base derived from the signature location.
pub fn resolve_base<M: ProcessMemory + ?Sized>(
    memory: &M,
    signature: &[u8],
    signature_offset: usize,
) -> Result<BaseAddress> {
    let found = scan_for_signature(memory, signature, USER_SPACE_LIMIT)?
        .ok_or(TelemetryError::SignatureNotFound { signature_len: signature.len() })?;

    let base = found.checked_sub(signature_offset).ok_or(TelemetryError::InvalidBase {
        signature_address: found,
        offset: signature_offset,
    })?;

    Ok(BaseAddress::new(base))
}

/// An opened game process with its resolved image base.
#[derive(Debug)]
pub struct Attachment<M> {
    pub memory: M,
    pub base: BaseAddress,
    pub window: WindowInfo,
}

/// Resolve the image base of an already opened process.
pub fn attach_to<M: ProcessMemory>(
    memory: M,
    window: WindowInfo,
    profile: &RevisionProfile,
) -> Result<Attachment<M>> {
    let base = resolve_base(&memory, profile.signature, profile.signature_offset)?;
    info!(revision = %profile.revision, pid = window.pid, %base, "Resolved game image base");
    Ok(Attachment { memory, base, window })
}

/// Find the running game and resolve its image base.
#[cfg(windows)]
pub fn attach(profile: &RevisionProfile) -> Result<Attachment<crate::windows::ProcessHandle>> {
    let windows = crate::windows::visible_windows()?;
    let window = find_target_window(&windows, profile.window_keywords)
        .cloned()
        .ok_or_else(|| TelemetryError::target_not_found(profile.window_keywords))?;

    info!(title = %window.title, pid = window.pid, "Found game window");

    // Dropping the handle on error closes it
    let handle = crate::windows::ProcessHandle::open(window.pid)?;
    attach_to(handle, window, profile)
}

/// Live attachment needs Windows; this always fails.
#[cfg(not(windows))]
pub fn attach(_profile: &RevisionProfile) -> Result<Attachment<crate::memory::SimulatedProcess>> {
    Err(TelemetryError::unsupported_platform("Live process attachment", "Windows"))
}
