//! Conversion of raw oscilloscope exports into measurement files
//!
//! A raw export starts with six header lines (possibly carrying extra
//! columns or a prefix before the key) followed by one sample per row. The
//! converter keeps the `Key:Value` part of each header line and the first
//! column of each sample row, and writes the result next to the source
//! under the naming convention `DEFAULT_<sensor>_<depth>mm_<measurement>.csv`.

use crate::error::{BoreholeError, Result, ResultExt};
use crate::measurement::header::{
    AMPLITUDE_HEADER, AMPLITUDE_RESOLUTION_HEADER, DATA_POINTS_HEADER, DATA_UNIT_HEADER,
    SAMPLING_RATE_HEADER, TIME_BASE_HEADER,
};
use crate::model::naming::convention_file_name;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Header lines a raw export must start with, in order
pub const RAW_HEADER_KEYS: [&str; 6] = [
    TIME_BASE_HEADER,
    SAMPLING_RATE_HEADER,
    AMPLITUDE_HEADER,
    AMPLITUDE_RESOLUTION_HEADER,
    DATA_UNIT_HEADER,
    DATA_POINTS_HEADER,
];

/// Largest measurement index the file name can encode (`Z`)
pub const MAX_MEASUREMENT_INDEX: usize = 35;

/// Convert one raw export; returns the path of the written file.
///
/// Nothing is written when the source is malformed.
pub fn convert_file(
    src: &Path,
    sensor: usize,
    crack_depth_mm: u32,
    measurement: usize,
) -> Result<PathBuf> {
    if !src.is_file() {
        return Err(BoreholeError::NotFound(format!("{:?}", src)));
    }
    let name = convention_file_name(sensor, crack_depth_mm, measurement).ok_or_else(|| {
        BoreholeError::Convert(format!(
            "sensor {} / measurement {} cannot be encoded in a file name",
            sensor, measurement
        ))
    })?;
    let dest = src.with_file_name(name);

    let input = std::fs::File::open(src).with_context(|| format!("Opening {:?}", src))?;
    let converted = convert_records(src, input)?;
    std::fs::write(&dest, converted).with_context(|| format!("Writing {:?}", dest))?;

    tracing::debug!("Converted {:?} -> {:?}", src, dest);
    Ok(dest)
}

/// Convert raw exports as consecutive measurements starting at
/// `start_measurement`.
///
/// Stops at the first failure. Files past [`MAX_MEASUREMENT_INDEX`] are
/// left alone.
pub fn convert_batch(
    files: &[PathBuf],
    sensor: usize,
    crack_depth_mm: u32,
    start_measurement: usize,
) -> Result<Vec<PathBuf>> {
    let mut converted = Vec::with_capacity(files.len());
    for (measurement, src) in (start_measurement..).zip(files) {
        if measurement > MAX_MEASUREMENT_INDEX {
            tracing::warn!(
                "Measurement index limit reached, {} file(s) not converted",
                files.len() - converted.len()
            );
            break;
        }
        converted.push(convert_file(src, sensor, crack_depth_mm, measurement)?);
    }
    tracing::info!("Converted {} file(s)", converted.len());
    Ok(converted)
}

fn convert_records<R: Read>(src: &Path, input: R) -> Result<Vec<u8>> {
    let csv_error = |e: csv::Error| BoreholeError::Convert(format!("{:?}: {}", src, e));

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input);
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    let mut records = reader.records();
    for key in RAW_HEADER_KEYS {
        let record = records
            .next()
            .transpose()
            .map_err(csv_error)?
            .ok_or_else(|| BoreholeError::Convert(format!("{:?}: missing {} line", src, key)))?;

        let line = record.iter().collect::<Vec<_>>().join(",");
        let tag = format!("{}:", key);
        let start = line.find(&tag).ok_or_else(|| {
            BoreholeError::Convert(format!("{:?}: expected {} line, found {:?}", src, key, line))
        })?;
        let value = line[start + tag.len()..].trim_end_matches(',').trim();
        writer
            .write_record([format!("{}{}", tag, value)])
            .map_err(csv_error)?;
    }

    let mut samples = 0usize;
    for record in records {
        let record = record.map_err(csv_error)?;
        let field = record.get(0).unwrap_or_default().trim();
        if field.is_empty() {
            continue;
        }
        if field.parse::<f64>().is_err() {
            return Err(BoreholeError::Convert(format!(
                "{:?}: sample {:?} is not a number",
                src, field
            )));
        }
        writer.write_record([field]).map_err(csv_error)?;
        samples += 1;
    }
    if samples == 0 {
        return Err(BoreholeError::Convert(format!("{:?}: no samples", src)));
    }

    writer
        .into_inner()
        .map_err(|e| BoreholeError::Convert(format!("{:?}: {}", src, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::{CsvMeasurementSource, MeasurementSource};

    const RAW: &str = "Time Base:100.00μs,,\n\
                       Sampling Rate:125.00MSa/s,,\n\
                       Amplitude:250.0mV,,\n\
                       Amplitude resolution:0.98mV,,\n\
                       Data Uint:mV,,\n\
                       Data points:4,,\n\
                       1.5,0.1,\n\
                       -2.0,0.2,\n\
                       8.25,0.3,\n\
                       0.0,0.4,\n";

    fn raw_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_convert_file_output() {
        let dir = tempfile::tempdir().unwrap();
        let src = raw_file(dir.path(), "scope.csv", RAW);

        let dest = convert_file(&src, 1, 40, 11).unwrap();
        assert_eq!(dest, dir.path().join("DEFAULT_B_40mm_B.csv"));

        let text = std::fs::read_to_string(&dest).unwrap();
        assert_eq!(
            text,
            "Time Base:100.00μs\nSampling Rate:125.00MSa/s\nAmplitude:250.0mV\n\
             Amplitude resolution:0.98mV\nData Uint:mV\nData points:4\n\
             1.5\n-2.0\n8.25\n0.0\n"
        );
    }

    #[test]
    fn test_converted_file_is_readable() {
        let dir = tempfile::tempdir().unwrap();
        let src = raw_file(dir.path(), "scope.csv", RAW);
        let dest = convert_file(&src, 0, 0, 0).unwrap();

        let series = CsvMeasurementSource::default().read(&dest).unwrap();
        assert_eq!(series.max_y, 8.25);
        assert_eq!(series.header.data_points, Some(4));
    }

    #[test]
    fn test_header_out_of_order_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let src = raw_file(
            dir.path(),
            "scope.csv",
            "Sampling Rate:125.00MSa/s\nTime Base:100.00μs\n",
        );
        let err = convert_file(&src, 0, 0, 0).unwrap_err();
        assert!(matches!(err, BoreholeError::Convert(_)));
        assert!(!dir.path().join("DEFAULT_A_0mm_0.csv").exists());
    }

    #[test]
    fn test_non_numeric_sample_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let content = RAW.replace("8.25", "eight");
        let src = raw_file(dir.path(), "scope.csv", &content);
        assert!(convert_file(&src, 0, 0, 0).is_err());
        assert!(!dir.path().join("DEFAULT_A_0mm_0.csv").exists());
    }

    #[test]
    fn test_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let err = convert_file(&dir.path().join("nope.csv"), 0, 0, 0).unwrap_err();
        assert!(matches!(err, BoreholeError::NotFound(_)));
    }

    #[test]
    fn test_batch_assigns_consecutive_measurements() {
        let dir = tempfile::tempdir().unwrap();
        let files: Vec<PathBuf> = (0..3)
            .map(|i| raw_file(dir.path(), &format!("raw{}.csv", i), RAW))
            .collect();

        let out = convert_batch(&files, 2, 5, 9).unwrap();
        let names: Vec<String> = out
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["DEFAULT_C_5mm_9.csv", "DEFAULT_C_5mm_A.csv", "DEFAULT_C_5mm_B.csv"]
        );
    }

    #[test]
    fn test_batch_stops_at_index_limit() {
        let dir = tempfile::tempdir().unwrap();
        let files: Vec<PathBuf> = (0..3)
            .map(|i| raw_file(dir.path(), &format!("raw{}.csv", i), RAW))
            .collect();

        let out = convert_batch(&files, 0, 0, 34).unwrap();
        assert_eq!(out.len(), 2);
        assert!(dir.path().join("DEFAULT_A_0mm_Z.csv").exists());
    }
}
