//! Test to verify test infrastructure works correctly

mod common;

use borehole_rs::{CsvMeasurementSource, MeasurementSource};
use common::builders::{file_name, CsvFileBuilder, ProjectBuilder};

#[test]
fn test_infrastructure_setup() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = ProjectBuilder::new(tmp.path(), "hole")
        .measurement("s1", 1, &file_name(0, 0), 4.0)
        .empty_step("s1", 2)
        .build();

    assert!(dir.join("s1/1").join(file_name(0, 0)).is_file());
    assert!(dir.join("s1/2").is_dir());
}

#[test]
fn test_built_csv_is_readable() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("m.csv");
    std::fs::write(&path, CsvFileBuilder::new().samples(&[1.0, 6.5, -3.0]).build()).unwrap();

    let series = CsvMeasurementSource::default().read(&path).unwrap();
    assert_eq!(series.y, vec![1.0, 6.5, -3.0]);
    common::assert_float_eq(series.max_y, 6.5, 1e-12);
}

#[test]
fn test_float_comparison() {
    common::assert_float_eq(1.0, 1.0000001, 0.001);
}

#[test]
#[should_panic]
fn test_float_comparison_fails() {
    common::assert_float_eq(1.0, 2.0, 0.001);
}
