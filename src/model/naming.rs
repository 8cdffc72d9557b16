//! Data file naming convention.
//!
//! A measurement file carries its sensor and measurement index in fixed
//! character positions of its name, e.g. `DEFAULT_B_0mm_5.csv` is sensor `B`
//! (index 1), measurement `5`. Sensors are letters starting at `A`;
//! measurements are `0`-`9` followed by `A`, `B`, ... for 10 and up.
//!
//! Node names (borehole, section, data file) must also be usable as a
//! single directory entry, see [`validate_entry_name`].

use crate::config::FilenameConvention;
use crate::error::{BoreholeError, Result};

/// Check that `name` names exactly one entry inside its parent directory.
///
/// Empty names, `.`, `..`, path separators and line breaks are rejected;
/// the last would also break the line-based info file.
pub fn validate_entry_name(kind: &'static str, name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\n', '\r', '\0']);
    if valid {
        Ok(())
    } else {
        Err(BoreholeError::InvalidName {
            kind,
            name: name.to_string(),
        })
    }
}

/// Sensor and measurement index decoded from a file name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileIndices {
    pub measurement: usize,
    pub sensor: usize,
}

/// Decode the indices of a data file name.
///
/// Returns `None` when either coded character is missing, not a valid code,
/// or outside the configured sensor/measurement range.
pub fn parse_indices(
    name: &str,
    convention: &FilenameConvention,
    sensor_amount: usize,
    measurement_number: usize,
) -> Option<FileIndices> {
    let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);

    let sensor = name
        .chars()
        .nth(convention.sensor_char_index)
        .and_then(decode_sensor)
        .filter(|&s| s < sensor_amount)?;

    let stem_len = stem.chars().count();
    let offset = convention.measurement_char_offset;
    if offset == 0 || offset > stem_len {
        return None;
    }
    let measurement = stem
        .chars()
        .nth(stem_len - offset)
        .and_then(decode_measurement)
        .filter(|&m| m < measurement_number)?;

    Some(FileIndices {
        measurement,
        sensor,
    })
}

/// `A` -> 0, `B` -> 1, ...
pub fn decode_sensor(c: char) -> Option<usize> {
    c.is_ascii_uppercase().then(|| (c as u8 - b'A') as usize)
}

/// `0`-`9` -> 0-9, `A` -> 10, `B` -> 11, ...
pub fn decode_measurement(c: char) -> Option<usize> {
    if c.is_ascii_digit() {
        Some((c as u8 - b'0') as usize)
    } else if c.is_ascii_uppercase() {
        Some(10 + (c as u8 - b'A') as usize)
    } else {
        None
    }
}

pub fn encode_sensor(sensor: usize) -> Option<char> {
    (sensor < 26).then(|| (b'A' + sensor as u8) as char)
}

pub fn encode_measurement(measurement: usize) -> Option<char> {
    match measurement {
        0..=9 => Some((b'0' + measurement as u8) as char),
        10..=35 => Some((b'A' + (measurement - 10) as u8) as char),
        _ => None,
    }
}

/// File name the converter gives a measurement:
/// `DEFAULT_<sensor>_<depth>mm_<measurement>.csv`
pub fn convention_file_name(sensor: usize, crack_depth_mm: u32, measurement: usize) -> Option<String> {
    Some(format!(
        "DEFAULT_{}_{}mm_{}.csv",
        encode_sensor(sensor)?,
        crack_depth_mm,
        encode_measurement(measurement)?
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn parse(name: &str) -> Option<FileIndices> {
        parse_indices(name, &FilenameConvention::default(), 4, 21)
    }

    #[test]
    fn test_parse_sensor_b_measurement_5() {
        assert_eq!(
            parse("DEFAULT_B_0mm_5.csv"),
            Some(FileIndices {
                measurement: 5,
                sensor: 1
            })
        );
    }

    #[test]
    fn test_parse_letter_measurement() {
        let indices = parse("DEFAULT_D_120mm_K.csv").unwrap();
        assert_eq!(indices.sensor, 3);
        assert_eq!(indices.measurement, 20);
    }

    #[test]
    fn test_parse_rejects_bad_codes() {
        assert_eq!(parse("DEFAULT_b_0mm_5.csv"), None);
        assert_eq!(parse("DEFAULT_B_0mm_x.csv"), None);
        // Sensor E is outside four sensors, measurement L (21) outside 21 slots
        assert_eq!(parse("DEFAULT_E_0mm_5.csv"), None);
        assert_eq!(parse("DEFAULT_A_0mm_L.csv"), None);
        assert_eq!(parse("short.csv"), None);
        assert_eq!(parse(""), None);
    }

    #[test]
    fn test_custom_convention() {
        let convention = FilenameConvention {
            sensor_char_index: 0,
            measurement_char_offset: 2,
        };
        let indices = parse_indices("C_7x.csv", &convention, 4, 21).unwrap();
        assert_eq!(indices.sensor, 2);
        assert_eq!(indices.measurement, 7);
    }

    #[test]
    fn test_convention_file_name() {
        assert_eq!(
            convention_file_name(0, 3, 12).as_deref(),
            Some("DEFAULT_A_3mm_C.csv")
        );
        assert_eq!(convention_file_name(0, 3, 36), None);
    }

    #[test]
    fn test_entry_names() {
        for name in ["s1", "upper part", "DEFAULT_A_0mm_0.csv", "..hidden", "a.b"] {
            assert!(validate_entry_name("section", name).is_ok(), "{:?}", name);
        }
        for name in ["", ".", "..", "a/b", "/abs", "a\\b", "a\nb", "a\r", "nul\0"] {
            let err = validate_entry_name("section", name).unwrap_err();
            assert!(matches!(err, BoreholeError::InvalidName { kind: "section", .. }));
        }
    }

    proptest! {
        #[test]
        fn test_generated_names_decode(sensor in 0usize..4, measurement in 0usize..21, depth in 0u32..10_000) {
            let name = convention_file_name(sensor, depth, measurement).unwrap();
            let indices = parse(&name);
            prop_assert_eq!(indices, Some(FileIndices { measurement, sensor }));
        }
    }
}
