//! JSON file holding the latest tick.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::trace;

use super::ExportSink;
use crate::types::ExportRecord;
use crate::{Result, TelemetryError};

/// Overwrites one JSON file with each exported record.
///
/// The record is written to a sibling temporary file and renamed over the target, so readers
/// never see a half-written file.
#[derive(Debug, Clone)]
pub struct JsonFileExport {
    path: PathBuf,
    enabled: bool,
}

impl JsonFileExport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), enabled: true }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Flip output on or off, returning the new setting.
    pub fn toggle(&mut self) -> bool {
        self.enabled = !self.enabled;
        self.enabled
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ExportSink for JsonFileExport {
    fn export(&mut self, record: &ExportRecord) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let json = serde_json::to_vec(record)?;
        let temp = self.temp_path();
        let target = self.path.display().to_string();

        fs::write(&temp, json).map_err(|e| TelemetryError::output_failed(target.clone(), e))?;
        fs::rename(&temp, &self.path).map_err(|e| TelemetryError::output_failed(target, e))?;

        trace!(path = %self.path.display(), time_ms = record.time_ms, "Exported record");
        Ok(())
    }
}
