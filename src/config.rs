//! Runtime configuration loaded from YAML.
//!
//! Every key is optional:
//!
//! ```yaml
//! revision: rend32a
//! refresh_interval_ms: 20
//! splits:
//!   split_points: [24800000, 42000000]
//!   wrap_threshold: -300000
//! export:
//!   enabled: true
//!   path: telemetry_output.json
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::offsets::{BinaryRevision, RevisionProfile};
use crate::sink::JsonFileExport;
use crate::splits::SplitConfig;
use crate::{Result, TelemetryError};

/// Where the latest tick is written.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    pub enabled: bool,
    pub path: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { enabled: true, path: PathBuf::from("telemetry_output.json") }
    }
}

impl ExportConfig {
    pub fn sink(&self) -> JsonFileExport {
        let mut sink = JsonFileExport::new(&self.path);
        sink.set_enabled(self.enabled);
        sink
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub revision: BinaryRevision,
    /// Milliseconds between ticks
    pub refresh_interval_ms: u64,
    pub splits: SplitConfig,
    pub export: ExportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            revision: BinaryRevision::default(),
            refresh_interval_ms: 20,
            splits: SplitConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

impl Config {
    /// Read and validate a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| TelemetryError::config_error(path, e.to_string()))?;
        let config = Self::parse(path, &text)?;
        debug!(path = %path.display(), ?config, "Loaded configuration");
        Ok(config)
    }

    /// Parse and validate YAML text. An empty document yields the defaults.
    pub fn from_yaml(text: &str) -> Result<Self> {
        Self::parse(Path::new("<inline>"), text)
    }

    fn parse(path: &Path, text: &str) -> Result<Self> {
        let config = if text.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml_ng::from_str(text)
                .map_err(|e| TelemetryError::config_error(path, e.to_string()))?
        };
        config.validate().map_err(|details| TelemetryError::config_error(path, details))?;
        Ok(config)
    }

    /// Check values that deserialize fine but cannot work.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.refresh_interval_ms == 0 {
            return Err("refresh_interval_ms must be greater than zero".to_string());
        }
        let [first, second] = self.splits.split_points;
        if first >= second {
            return Err(format!(
                "split points must increase, got {} then {}",
                first, second
            ));
        }
        if self.splits.wrap_threshold >= 0 {
            return Err(format!(
                "wrap_threshold must be negative, got {}",
                self.splits.wrap_threshold
            ));
        }
        if self.export.path.as_os_str().is_empty() {
            return Err("export.path must not be empty".to_string());
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn profile(&self) -> &'static RevisionProfile {
        self.revision.profile()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_is_default() {
        let config = Config::from_yaml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.refresh_interval(), Duration::from_millis(20));
        assert_eq!(config.export.path, PathBuf::from("telemetry_output.json"));
        assert!(config.export.enabled);
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let config = Config::from_yaml(
            "revision: REND32A\n\
             splits:\n  wrap_threshold: -200000\n\
             export:\n  enabled: false\n",
        )
        .unwrap();

        assert_eq!(config.revision, BinaryRevision::Rend32a);
        assert_eq!(config.splits.wrap_threshold, -200_000);
        assert_eq!(config.splits.split_points, [24_800_000, 42_000_000]);
        assert!(!config.export.enabled);
        assert!(!config.export.sink().is_enabled());
    }

    #[test]
    fn unknown_keys_and_revisions_are_rejected() {
        let err = Config::from_yaml("refresh_rate: 10").unwrap_err();
        assert!(matches!(err, TelemetryError::Config { .. }));

        let err = Config::from_yaml("revision: dos16").unwrap_err();
        assert!(err.to_string().contains("dos16"), "{}", err);
    }

    #[test]
    fn invalid_values_fail_validation() {
        for yaml in [
            "refresh_interval_ms: 0",
            "splits:\n  split_points: [42000000, 24800000]",
            "splits:\n  wrap_threshold: 5",
            "export:\n  path: ''",
        ] {
            let err = Config::from_yaml(yaml).unwrap_err();
            assert!(matches!(err, TelemetryError::Config { .. }), "{}: {}", yaml, err);
        }
    }

    #[test]
    fn load_reads_a_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "refresh_interval_ms: 50").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.refresh_interval(), Duration::from_millis(50));
        assert_eq!(config.profile().signature, b"license with Bob");
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, TelemetryError::Config { .. }));
        assert!(!err.is_recoverable());
    }
}
