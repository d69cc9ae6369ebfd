use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::data::calibration::{Calibration, CalibrationConfig};
use crate::data::model::Variant;
use crate::error::{CalibrationError, ConfigError};
use crate::processor::FileProcessor;
use crate::store::SummaryStore;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Everything the reporter needs, passed explicitly to each component.
///
/// ```toml
/// data_dir = "data"
/// summary_file = "summary.csv"
/// variant = "structured"
///
/// [calibration]
/// gain = 10000.0
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Folder scanned/watched for measurement files.
    pub data_dir: PathBuf,
    /// Relative paths resolve inside `data_dir`.
    pub summary_file: PathBuf,
    pub variant: Variant,
    /// Defaults to the variant's usual extension.
    pub extension: Option<String>,
    /// Wait after a create event so the instrument can finish writing.
    pub settle_delay_ms: u64,
    pub calibration: CalibrationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from("data"),
            summary_file: PathBuf::from("summary.csv"),
            variant: Variant::Structured,
            extension: None,
            settle_delay_ms: 250,
            calibration: CalibrationConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn summary_path(&self) -> PathBuf {
        if self.summary_file.is_absolute() {
            self.summary_file.clone()
        } else {
            self.data_dir.join(&self.summary_file)
        }
    }

    pub fn extension(&self) -> String {
        self.extension
            .clone()
            .unwrap_or_else(|| self.variant.default_extension().to_string())
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Build the calibration model; fails on zero slope or non-finite constants.
    pub fn validate(&self) -> Result<Calibration, CalibrationError> {
        Calibration::for_variant(self.variant, &self.calibration)
    }

    pub fn open_store(&self) -> Arc<SummaryStore> {
        Arc::new(SummaryStore::new(self.summary_path(), self.variant))
    }

    /// Wire reader, calibration and store for the configured variant.
    pub fn build_processor(&self, store: Arc<SummaryStore>) -> Result<FileProcessor, ConfigError> {
        let calibration = self.validate()?;
        Ok(FileProcessor::new(self.variant, self.extension(), calibration, store)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_means_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.extension(), "pssession");
        assert_eq!(config.summary_path(), PathBuf::from("data").join("summary.csv"));
    }

    #[test]
    fn partial_calibration_table_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            data_dir = "/srv/sensor"
            variant = "delimited"

            [calibration]
            slope = 0.042
            intercept = -0.37
            "#,
        )
        .unwrap();
        assert_eq!(config.variant, Variant::Delimited);
        assert_eq!(config.extension(), "txt");
        assert_eq!(config.calibration.gain, 10_000.0);
        assert_eq!(
            config.validate().unwrap(),
            Calibration::CurrentIntercept {
                slope: 0.042,
                intercept: -0.37
            }
        );
    }

    #[test]
    fn absolute_summary_file_is_kept() {
        let config = Config {
            summary_file: PathBuf::from("/var/log/summary.csv"),
            ..Config::default()
        };
        assert_eq!(config.summary_path(), PathBuf::from("/var/log/summary.csv"));
    }

    #[test]
    fn zero_slope_fails_validation() {
        let config = Config {
            variant: Variant::Delimited,
            calibration: CalibrationConfig {
                slope: 0.0,
                ..CalibrationConfig::default()
            },
            ..Config::default()
        };
        assert!(config.validate().is_err());
        let store = config.open_store();
        assert!(matches!(
            config.build_processor(store),
            Err(ConfigError::Calibration(_))
        ));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<Config>("data_folder = \"x\"").is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Config::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
