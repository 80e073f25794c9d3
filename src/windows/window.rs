//! Top-level window enumeration.

use tracing::trace;
use windows::Win32::Foundation::{HWND, LPARAM};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetWindowTextW, GetWindowThreadProcessId, IsWindowVisible,
};
use windows::core::BOOL;

use crate::locator::WindowInfo;
use crate::{Result, TelemetryError};

/// Title and owning process of every visible top-level window, in Z order.
pub fn visible_windows() -> Result<Vec<WindowInfo>> {
    let mut windows: Vec<WindowInfo> = Vec::new();

    unsafe {
        EnumWindows(Some(collect_window), LPARAM(&mut windows as *mut Vec<WindowInfo> as isize))
    }
    .map_err(|e| TelemetryError::windows_api_error("EnumWindows", e))?;

    trace!(count = windows.len(), "Enumerated visible windows");
    Ok(windows)
}

unsafe extern "system" fn collect_window(hwnd: HWND, lparam: LPARAM) -> BOOL {
    // SAFETY: lparam is the Vec passed by visible_windows, alive for the whole enumeration
    let windows = unsafe { &mut *(lparam.0 as *mut Vec<WindowInfo>) };

    if unsafe { IsWindowVisible(hwnd) }.as_bool() {
        let mut buffer = [0u16; 512];
        let len = unsafe { GetWindowTextW(hwnd, &mut buffer) };
        let title = String::from_utf16_lossy(&buffer[..len.max(0) as usize]);

        let mut pid = 0u32;
        unsafe { GetWindowThreadProcessId(hwnd, Some(&mut pid)) };

        if !title.is_empty() {
            windows.push(WindowInfo { title, pid });
        }
    }

    BOOL(1)
}
