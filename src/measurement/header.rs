//! Measurement file header
//!
//! Every measurement file starts with a block of `Key:Value<unit>` lines
//! written by the oscilloscope. Each known key has a value kind and a list of
//! unit suffixes that may follow the number.

use serde::{Deserialize, Serialize};

pub const TIME_BASE_HEADER: &str = "Time Base";
pub const SAMPLING_RATE_HEADER: &str = "Sampling Rate";
pub const AMPLITUDE_HEADER: &str = "Amplitude";
pub const AMPLITUDE_RESOLUTION_HEADER: &str = "Amplitude resolution";
pub const DATA_UNIT_HEADER: &str = "Data Uint";
pub const DATA_POINTS_HEADER: &str = "Data points";
pub const ZERO_INDEX_HEADER: &str = "Zero index";

/// How the value of a header line is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Float,
    Int,
    Text,
}

/// Value kind and accepted unit suffixes for a header key.
///
/// Longer suffixes come first so that `mV` is not read as `V`. `Ojs` is
/// what a cp1251-mangled `μs` looks like on some exports.
pub fn header_format(key: &str) -> Option<(ValueKind, &'static [&'static str])> {
    match key {
        TIME_BASE_HEADER => Some((ValueKind::Float, &["μs", "ms", "Ojs"])),
        SAMPLING_RATE_HEADER => Some((ValueKind::Float, &["MSa/s"])),
        AMPLITUDE_HEADER | AMPLITUDE_RESOLUTION_HEADER => {
            Some((ValueKind::Float, &["mV", "μV", "Ojs", "V"]))
        }
        DATA_UNIT_HEADER => Some((ValueKind::Text, &[])),
        DATA_POINTS_HEADER | ZERO_INDEX_HEADER => Some((ValueKind::Int, &[])),
        _ => None,
    }
}

/// Split a header value into its number part and unit suffix.
///
/// Returns `None` when units are expected but none is present.
pub fn split_unit<'a>(value: &'a str, units: &[&'static str]) -> Option<(&'a str, &'static str)> {
    let value = value.trim();
    if units.is_empty() {
        return Some((value, ""));
    }
    units
        .iter()
        .find_map(|unit| value.find(unit).map(|idx| (value[..idx].trim(), *unit)))
}

/// Parsed header block of a measurement file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementHeader {
    /// Time base in microseconds
    pub time_base_us: Option<f64>,
    /// Sampling rate in MSa/s
    pub sampling_rate_msa: Option<f64>,
    /// Amplitude range in millivolts
    pub amplitude_mv: Option<f64>,
    /// Amplitude resolution in millivolts
    pub amplitude_resolution_mv: Option<f64>,
    /// Data unit label
    pub data_unit: Option<String>,
    /// Declared number of samples
    pub data_points: Option<usize>,
    /// Sample index of the trigger point
    pub zero_index: Option<i64>,
}

impl MeasurementHeader {
    /// Store a float value, normalizing its unit
    pub(crate) fn set_float(&mut self, key: &str, value: f64, unit: &str) {
        match key {
            TIME_BASE_HEADER => {
                let scale = if unit == "ms" { 1_000.0 } else { 1.0 };
                self.time_base_us = Some(value * scale);
            }
            SAMPLING_RATE_HEADER => self.sampling_rate_msa = Some(value),
            AMPLITUDE_HEADER => self.amplitude_mv = Some(value * millivolt_scale(unit)),
            AMPLITUDE_RESOLUTION_HEADER => {
                self.amplitude_resolution_mv = Some(value * millivolt_scale(unit))
            }
            _ => {}
        }
    }

    pub(crate) fn set_int(&mut self, key: &str, value: i64) {
        match key {
            DATA_POINTS_HEADER => self.data_points = usize::try_from(value).ok(),
            ZERO_INDEX_HEADER => self.zero_index = Some(value),
            _ => {}
        }
    }

    pub(crate) fn set_text(&mut self, key: &str, value: &str) {
        if key == DATA_UNIT_HEADER {
            self.data_unit = Some(value.to_string());
        }
    }
}

fn millivolt_scale(unit: &str) -> f64 {
    match unit {
        "V" => 1_000.0,
        "μV" => 0.001,
        _ => 1.0,
    }
}
