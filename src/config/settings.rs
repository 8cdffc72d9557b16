//! Measurement model settings
//!
//! These settings describe the physical measurement setup that the project
//! model has to understand: how many sensors sit on a section, how many
//! measurements make up one sweep, where the sensor and measurement codes
//! live in a data file name, and how strictly bad file names are treated.
//!
//! # Main Types
//!
//! - [`ModelSettings`] - All model settings, persisted as TOML
//! - [`FilenameConvention`] - Character positions of the sensor/measurement codes
//! - [`UnparseablePolicy`] - What aggregation does with badly named files

use crate::error::{BoreholeError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default number of sensors on one section
pub const DEFAULT_SENSOR_AMOUNT: usize = 4;

/// Default number of measurements in one frequency sweep
pub const DEFAULT_MEASUREMENT_NUMBER: usize = 21;

/// Default section length in meters
pub const DEFAULT_SECTION_LENGTH: f64 = 8.0;

/// Default borehole info filename
pub const DEFAULT_INFO_FILENAME: &str = "info.txt";

/// Number of `Key:Value` lines at the top of a measurement file
pub const DEFAULT_CSV_HEADER_SIZE: usize = 7;

/// Settings filename inside the app data directory
pub const SETTINGS_FILENAME: &str = "settings.toml";

/// Model settings shared by every node of a borehole tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Number of sensors (sensor codes run from `A` upwards)
    #[serde(default = "default_sensor_amount")]
    pub sensor_amount: usize,

    /// Number of measurements per sweep (slots per sensor in a step)
    #[serde(default = "default_measurement_number")]
    pub measurement_number: usize,

    /// Length given to sections created without an explicit length
    #[serde(default = "default_section_length")]
    pub default_section_length: f64,

    /// Name of the info file inside the borehole directory
    #[serde(default = "default_info_filename")]
    pub info_filename: String,

    /// Maximum number of header lines in a measurement file
    #[serde(default = "default_csv_header_size")]
    pub csv_header_size: usize,

    /// Where the sensor and measurement codes sit in a file name
    #[serde(default)]
    pub filename: FilenameConvention,

    /// Behaviour of aggregation queries when a step holds a badly named file
    #[serde(default)]
    pub unparseable_policy: UnparseablePolicy,
}

fn default_sensor_amount() -> usize {
    DEFAULT_SENSOR_AMOUNT
}

fn default_measurement_number() -> usize {
    DEFAULT_MEASUREMENT_NUMBER
}

fn default_section_length() -> f64 {
    DEFAULT_SECTION_LENGTH
}

fn default_info_filename() -> String {
    DEFAULT_INFO_FILENAME.to_string()
}

fn default_csv_header_size() -> usize {
    DEFAULT_CSV_HEADER_SIZE
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            sensor_amount: DEFAULT_SENSOR_AMOUNT,
            measurement_number: DEFAULT_MEASUREMENT_NUMBER,
            default_section_length: DEFAULT_SECTION_LENGTH,
            info_filename: DEFAULT_INFO_FILENAME.to_string(),
            csv_header_size: DEFAULT_CSV_HEADER_SIZE,
            filename: FilenameConvention::default(),
            unparseable_policy: UnparseablePolicy::default(),
        }
    }
}

impl ModelSettings {
    /// Load settings from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            BoreholeError::Config(format!("Failed to read settings {:?}: {}", path, e))
        })?;

        toml::from_str(&content).map_err(|e| {
            BoreholeError::Config(format!("Failed to parse settings {:?}: {}", path, e))
        })
    }

    /// Load settings, returning defaults if the file is missing or broken
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load model settings, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save settings to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| BoreholeError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            BoreholeError::Config(format!("Failed to write settings {:?}: {}", path, e))
        })
    }
}

/// Positions of the coded characters in a data file name
///
/// Converted files are named `DEFAULT_<sensor>_<depth>mm_<measurement>.csv`,
/// so by default the sensor letter is the ninth character of the name and the
/// measurement code is the last character before the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilenameConvention {
    /// Index of the sensor letter, counted from the start of the file name
    pub sensor_char_index: usize,

    /// Offset of the measurement code, counted back from the end of the stem
    /// (1 = last character before the extension)
    pub measurement_char_offset: usize,
}

impl Default for FilenameConvention {
    fn default() -> Self {
        Self {
            sensor_char_index: 8,
            measurement_char_offset: 1,
        }
    }
}

/// What sensor/oscillogram queries do when a step holds a badly named file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnparseablePolicy {
    /// Leave the bad file out and keep the rest of the step
    #[default]
    SkipFile,
    /// Purge every badly named file from the step and return nothing for it
    PurgeStep,
}

impl std::fmt::Display for UnparseablePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnparseablePolicy::SkipFile => write!(f, "Skip file"),
            UnparseablePolicy::PurgeStep => write!(f, "Purge step"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ModelSettings::default();
        assert_eq!(settings.sensor_amount, 4);
        assert_eq!(settings.measurement_number, 21);
        assert_eq!(settings.info_filename, "info.txt");
        assert_eq!(settings.unparseable_policy, UnparseablePolicy::SkipFile);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings: ModelSettings = toml::from_str(
            r#"
            sensor_amount = 8
            unparseable_policy = "purge_step"
            "#,
        )
        .unwrap();
        assert_eq!(settings.sensor_amount, 8);
        assert_eq!(settings.measurement_number, DEFAULT_MEASUREMENT_NUMBER);
        assert_eq!(settings.unparseable_policy, UnparseablePolicy::PurgeStep);
        assert_eq!(settings.filename, FilenameConvention::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILENAME);

        let mut settings = ModelSettings::default();
        settings.measurement_number = 12;
        settings.filename.sensor_char_index = 2;
        settings.save(&path).unwrap();

        let loaded = ModelSettings::load(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = ModelSettings::load_or_default(dir.path().join("nope.toml"));
        assert_eq!(settings, ModelSettings::default());
    }
}
