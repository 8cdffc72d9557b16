//! Measurement file reading
//!
//! A measurement file is one oscilloscope capture: a short header block of
//! `Key:Value<unit>` lines followed by one amplitude sample per line. The
//! project model only needs the samples and their maximum, so reading goes
//! through the [`MeasurementSource`] trait and the model never touches the
//! file format directly.
//!
//! # Main Types
//!
//! - [`MeasurementSource`] - Reads a file into an [`XySeries`]
//! - [`CsvMeasurementSource`] - Default reader built on the `csv` crate
//! - [`MeasurementError`] - Why a file could not be used
//! - [`XySeries`] - Samples plus header of one file

pub mod header;

pub use header::MeasurementHeader;

use header::{header_format, split_unit, ValueKind};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::DEFAULT_CSV_HEADER_SIZE;

pub const FILE_NOT_EXIST_WARNING_TITLE: &str = "File not exist";
pub const WRONG_FILENAME_WARNING_TITLE: &str = "Wrong filename";
pub const INCORRECT_FILE_CONTENT_WARNING_TITLE: &str = "Incorrect file content";
pub const UNKNOWN_WARNING_TITLE: &str = "Unknown warning";

/// Why a measurement file could not be used
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeasurementError {
    #[error("{0:?} does not exist")]
    FileNotFound(PathBuf),

    #[error("{path:?}: line {line} is not a header line")]
    IncorrectHeader { path: PathBuf, line: usize },

    #[error("{path:?}: unknown header key `{key}`")]
    UnknownHeaderKey { path: PathBuf, key: String },

    #[error("{path:?}: value `{value}` of `{key}` has no known unit")]
    MissingUnit {
        path: PathBuf,
        key: String,
        value: String,
    },

    #[error("{path:?}: line {line} holds an invalid value `{value}`")]
    InvalidValue {
        path: PathBuf,
        line: usize,
        value: String,
    },

    #[error("{0:?} contains no samples")]
    NoSamples(PathBuf),

    #[error("{0} does not follow the measurement file naming convention")]
    WrongFilename(String),

    #[error("CSV error: {0}")]
    Csv(String),
}

impl MeasurementError {
    /// Title shown to the user for this kind of problem
    pub fn title(&self) -> &'static str {
        match self {
            MeasurementError::FileNotFound(_) => FILE_NOT_EXIST_WARNING_TITLE,
            MeasurementError::WrongFilename(_) => WRONG_FILENAME_WARNING_TITLE,
            MeasurementError::Csv(_) => UNKNOWN_WARNING_TITLE,
            _ => INCORRECT_FILE_CONTENT_WARNING_TITLE,
        }
    }
}

/// Samples and header of one measurement file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XySeries {
    /// File name
    pub name: String,
    /// Full path the series was read from
    pub path: PathBuf,
    /// Parsed header block
    pub header: MeasurementHeader,
    /// Amplitude samples
    pub y: Vec<f64>,
    /// Largest sample
    pub max_y: f64,
}

impl XySeries {
    /// Build a series from samples, computing the maximum
    pub fn new(path: impl Into<PathBuf>, header: MeasurementHeader, y: Vec<f64>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let max_y = y.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self {
            name,
            path,
            header,
            y,
            max_y,
        }
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// Time axis in seconds.
    ///
    /// Sample spacing is `time_base * 32 / data_points` microseconds and the
    /// axis is shifted so that `zero_index` lands on t = 0. Returns `None`
    /// without a time base.
    pub fn x_axis(&self) -> Option<Vec<f64>> {
        let time_base = self.header.time_base_us?;
        let points = self.header.data_points.unwrap_or(self.y.len());
        if points == 0 {
            return None;
        }
        let zero = self.header.zero_index.unwrap_or(0);
        let step = time_base * 32.0 / points as f64 * 1e-6;
        Some(
            (0..points)
                .map(|i| (i as i64 - zero) as f64 * step)
                .collect(),
        )
    }
}

/// Reads measurement files for the project model
#[cfg_attr(test, mockall::automock)]
pub trait MeasurementSource: Send + Sync {
    /// Read a measurement file into a series
    fn read(&self, path: &Path) -> Result<XySeries, MeasurementError>;
}

/// Default measurement reader for oscilloscope CSV exports
#[derive(Debug, Clone)]
pub struct CsvMeasurementSource {
    header_size: usize,
}

impl Default for CsvMeasurementSource {
    fn default() -> Self {
        Self::new(DEFAULT_CSV_HEADER_SIZE)
    }
}

impl CsvMeasurementSource {
    /// Create a reader accepting at most `header_size` header lines
    pub fn new(header_size: usize) -> Self {
        Self { header_size }
    }

    /// Parse header and samples from any reader
    pub fn parse<R: std::io::Read>(
        &self,
        path: &Path,
        input: R,
    ) -> Result<XySeries, MeasurementError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(input);

        let mut header = MeasurementHeader::default();
        let mut header_lines = 0;
        let mut samples = Vec::new();

        for (idx, record) in reader.records().enumerate() {
            let record = record.map_err(|e| MeasurementError::Csv(e.to_string()))?;
            let line = idx + 1;
            let Some(field) = record.get(0) else {
                continue;
            };
            if field.is_empty() {
                continue;
            }

            let in_header = samples.is_empty() && header_lines < self.header_size;
            if in_header {
                if let Some((key, value)) = field.split_once(':') {
                    self.apply_header_line(path, &mut header, key.trim(), value)?;
                    header_lines += 1;
                    continue;
                }
                if header_lines == 0 {
                    return Err(MeasurementError::IncorrectHeader {
                        path: path.to_path_buf(),
                        line,
                    });
                }
            }

            let value: f64 = field.parse().map_err(|_| MeasurementError::InvalidValue {
                path: path.to_path_buf(),
                line,
                value: field.to_string(),
            })?;
            samples.push(value);
        }

        if samples.is_empty() {
            return Err(MeasurementError::NoSamples(path.to_path_buf()));
        }

        Ok(XySeries::new(path, header, samples))
    }

    fn apply_header_line(
        &self,
        path: &Path,
        header: &mut MeasurementHeader,
        key: &str,
        raw: &str,
    ) -> Result<(), MeasurementError> {
        let (kind, units) =
            header_format(key).ok_or_else(|| MeasurementError::UnknownHeaderKey {
                path: path.to_path_buf(),
                key: key.to_string(),
            })?;

        let (number, unit) = split_unit(raw, units).ok_or_else(|| MeasurementError::MissingUnit {
            path: path.to_path_buf(),
            key: key.to_string(),
            value: raw.trim().to_string(),
        })?;

        let invalid = || MeasurementError::InvalidValue {
            path: path.to_path_buf(),
            line: 0,
            value: raw.trim().to_string(),
        };

        match kind {
            ValueKind::Float => header.set_float(key, number.parse().map_err(|_| invalid())?, unit),
            ValueKind::Int => header.set_int(key, number.parse().map_err(|_| invalid())?),
            ValueKind::Text => header.set_text(key, number),
        }
        Ok(())
    }
}

impl MeasurementSource for CsvMeasurementSource {
    fn read(&self, path: &Path) -> Result<XySeries, MeasurementError> {
        if !path.is_file() {
            return Err(MeasurementError::FileNotFound(path.to_path_buf()));
        }
        let file = std::fs::File::open(path)
            .map_err(|e| MeasurementError::Csv(format!("{:?}: {}", path, e)))?;
        self.parse(path, std::io::BufReader::new(file))
    }
}
