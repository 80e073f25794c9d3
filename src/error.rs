//! Error types for process access, decoding and output.
//!
//! Errors fall into two groups:
//!
//! - **Startup errors** such as [`TelemetryError::TargetNotFound`] or
//!   [`TelemetryError::SignatureNotFound`]. They mean the game is not running or is an
//!   unsupported revision, and attaching is abandoned.
//! - **Per-tick errors** such as [`TelemetryError::Read`]. The tick is dropped, split state is
//!   left alone and the display is told there is no data.
//!
//! ```rust
//! use icr2_telemetry::TelemetryError;
//!
//! let error = TelemetryError::read_failed(0x4e0e74, 1920);
//! assert!(error.is_recoverable());
//! for suggestion in error.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

#[cfg(windows)]
use windows_core as core;

/// Result type alias for telemetry operations.
pub type Result<T, E = TelemetryError> = std::result::Result<T, E>;

/// Main error type for telemetry operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TelemetryError {
    #[error("Process {pid} could not be opened for reading")]
    ProcessNotAccessible {
        pid: u32,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Failed to read {length} bytes at {address:#x}")]
    Read {
        address: usize,
        length: usize,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Process handle is closed")]
    HandleClosed,

    #[error("No visible window title contains all of {keywords:?}")]
    TargetNotFound { keywords: Vec<String> },

    #[error("Signature ({signature_len} bytes) not found in any readable region")]
    SignatureNotFound { signature_len: usize },

    #[error("Signature found at {signature_address:#x}, below its image offset {offset:#x}")]
    InvalidBase { signature_address: usize, offset: usize },

    #[error("Unknown game revision '{name}'")]
    UnknownRevision { name: String },

    #[error("Invalid configuration in {path}: {details}")]
    Config { path: PathBuf, details: String },

    #[error("Failed to write output to {target}")]
    Output {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization failed: {details}")]
    Serialize { details: String },

    #[error("{feature} is only available on {required_platform}")]
    UnsupportedPlatform { feature: String, required_platform: String },

    #[error("Windows API error: {operation}")]
    #[cfg(windows)]
    WindowsApi {
        operation: String,
        #[source]
        source: core::Error,
    },
}

impl TelemetryError {
    /// Returns whether the tick loop can carry on after this error.
    ///
    /// Read failures are expected while the game loads a track or exits; everything that
    /// indicates a missing or unsupported target is not.
    pub fn is_recoverable(&self) -> bool {
        match self {
            TelemetryError::Read { .. } => true,
            TelemetryError::Output { .. } => true,
            TelemetryError::Serialize { .. } => true,
            TelemetryError::HandleClosed => false,
            TelemetryError::ProcessNotAccessible { .. } => false,
            TelemetryError::TargetNotFound { .. } => false,
            TelemetryError::SignatureNotFound { .. } => false,
            TelemetryError::InvalidBase { .. } => false,
            TelemetryError::UnknownRevision { .. } => false,
            TelemetryError::Config { .. } => false,
            TelemetryError::UnsupportedPlatform { .. } => false,
            #[cfg(windows)]
            TelemetryError::WindowsApi { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            TelemetryError::ProcessNotAccessible { .. } => vec![
                "Run the overlay with the same privileges as the game",
                "Check that the game process is still running",
            ],
            TelemetryError::Read { .. } => vec![
                "Wait for the game to finish loading the session",
                "Check that the game process is still running",
            ],
            TelemetryError::HandleClosed => {
                vec!["Attach to the game again before reading telemetry"]
            }
            TelemetryError::TargetNotFound { .. } => vec![
                "Start the game before the overlay",
                "Make sure the game window is visible",
                "Check the window title keywords for this revision",
            ],
            TelemetryError::SignatureNotFound { .. } | TelemetryError::InvalidBase { .. } => vec![
                "Verify the game executable matches the configured revision",
                "Wait until the game has finished starting",
            ],
            TelemetryError::UnknownRevision { .. } => {
                vec!["Use one of the supported revisions (rend32a)"]
            }
            TelemetryError::Config { .. } => vec![
                "Check the configuration file syntax",
                "Remove unknown keys from the configuration file",
            ],
            TelemetryError::Output { .. } => vec![
                "Check the output directory exists and is writable",
                "Ensure sufficient disk space",
            ],
            TelemetryError::Serialize { .. } => vec!["Report the record that failed to serialize"],
            TelemetryError::UnsupportedPlatform { .. } => vec![
                "Run live telemetry on Windows",
                "Use a simulated process for offline testing",
            ],
            #[cfg(windows)]
            TelemetryError::WindowsApi { .. } => vec![
                "Check Windows API permissions",
                "Verify system resources availability",
            ],
        }
    }

    /// Helper constructor for a failed read without an underlying OS error.
    pub fn read_failed(address: usize, length: usize) -> Self {
        TelemetryError::Read { address, length, source: None }
    }

    /// Helper constructor for a failed read with its OS error attached.
    pub fn read_failed_with_source(
        address: usize,
        length: usize,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        TelemetryError::Read { address, length, source: Some(source) }
    }

    /// Helper constructor for processes that refuse to be opened.
    pub fn process_not_accessible(
        pid: u32,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        TelemetryError::ProcessNotAccessible { pid, source }
    }

    /// Helper constructor for a window search that matched nothing.
    pub fn target_not_found<S: AsRef<str>>(keywords: &[S]) -> Self {
        TelemetryError::TargetNotFound {
            keywords: keywords.iter().map(|k| k.as_ref().to_string()).collect(),
        }
    }

    /// Helper constructor for output failures.
    pub fn output_failed(target: impl Into<String>, source: std::io::Error) -> Self {
        TelemetryError::Output { target: target.into(), source }
    }

    /// Helper constructor for configuration problems.
    pub fn config_error(path: impl Into<PathBuf>, details: impl Into<String>) -> Self {
        TelemetryError::Config { path: path.into(), details: details.into() }
    }

    /// Helper constructor for Windows API errors.
    #[cfg(windows)]
    pub fn windows_api_error(operation: impl Into<String>, source: core::Error) -> Self {
        TelemetryError::WindowsApi { operation: operation.into(), source }
    }

    /// Helper constructor for unsupported platform errors.
    pub fn unsupported_platform(
        feature: impl Into<String>,
        required_platform: impl Into<String>,
    ) -> Self {
        TelemetryError::UnsupportedPlatform {
            feature: feature.into(),
            required_platform: required_platform.into(),
        }
    }
}

impl From<serde_json::Error> for TelemetryError {
    fn from(err: serde_json::Error) -> Self {
        TelemetryError::Serialize { details: err.to_string() }
    }
}

#[cfg(windows)]
impl From<core::Error> for TelemetryError {
    fn from(err: core::Error) -> Self {
        TelemetryError::WindowsApi {
            operation: "Unknown Windows operation".to_string(),
            source: err,
        }
    }
}
