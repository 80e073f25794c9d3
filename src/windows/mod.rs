//! Win32 access to the game process.
//!
//! - [`ProcessHandle`] wraps `OpenProcess`, `ReadProcessMemory` and `VirtualQueryEx`
//! - [`visible_windows`] lists top-level windows with `EnumWindows`
//!
//! # Usage
//!
//! ```rust,ignore
//! use icr2_telemetry::memory::ProcessMemory;
//! use icr2_telemetry::windows::{ProcessHandle, visible_windows};
//!
//! let windows = visible_windows()?;
//! let handle = ProcessHandle::open(windows[0].pid)?;
//! let value = handle.read_i32(0x4ef858)?;
//! ```

mod process;
mod window;

pub use process::ProcessHandle;
pub use window::visible_windows;
