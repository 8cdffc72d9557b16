//! Integration tests for the raw export workflow
//!
//! Raw oscilloscope exports are converted in place inside a step directory
//! and then picked up by correlate like any other measurement.

mod common;

use borehole_rs::convert::convert_batch;
use borehole_rs::jobs::{BackgroundWorker, JobEvent};
use borehole_rs::{Borehole, SectionKey, StepKey};
use std::path::PathBuf;
use std::time::Duration;

fn raw_export(peak: f64) -> String {
    format!(
        "Time Base:100.00μs,,\nSampling Rate:125.00MSa/s,,\nAmplitude:250.0mV,,\n\
         Amplitude resolution:0.98mV,,\nData Uint:mV,,\nData points:3,,\n\
         0.5,x,\n{},y,\n-1.0,z,\n",
        peak
    )
}

#[test]
fn test_converted_files_join_the_tree() {
    let tmp = tempfile::tempdir().unwrap();
    let raw_dir = tmp.path().join("raw");
    std::fs::create_dir_all(&raw_dir).unwrap();
    let step_dir = tmp.path().join("hole/s1/1");
    std::fs::create_dir_all(&step_dir).unwrap();

    let raw: Vec<PathBuf> = [1.5, 9.0, 4.0]
        .iter()
        .enumerate()
        .map(|(i, peak)| {
            let path = step_dir.join(format!("raw_{}.csv", i));
            std::fs::write(&path, raw_export(*peak)).unwrap();
            path
        })
        .collect();
    let converted = convert_batch(&raw, 2, 35, 0).unwrap();
    assert_eq!(converted.len(), 3);
    for path in &raw {
        std::fs::remove_file(path).unwrap();
    }

    let (ctx, notifier) = common::test_context();
    let mut borehole = Borehole::open("hole", tmp.path(), ctx).unwrap();
    borehole.correlate().unwrap();
    assert_eq!(borehole.max(false), 9.0);
    assert!(notifier.is_empty());

    let step = borehole
        .section(&SectionKey::name("s1"))
        .unwrap()
        .step(StepKey::ByNumber(1))
        .unwrap();
    let names: Vec<&str> = step.files().iter().map(|f| f.name()).collect();
    assert_eq!(
        names,
        vec!["DEFAULT_C_35mm_0.csv", "DEFAULT_C_35mm_1.csv", "DEFAULT_C_35mm_2.csv"]
    );

    let map = borehole.sensor_map().unwrap();
    assert_eq!(map["s1"][2].y, vec![1.5, 9.0, 4.0]);
    borehole.save_info().unwrap();
}

#[test]
fn test_query_on_background_worker() {
    let tmp = tempfile::tempdir().unwrap();
    let step_dir = tmp.path().join("hole/s1/3");
    std::fs::create_dir_all(&step_dir).unwrap();
    let raw = step_dir.join("raw.csv");
    std::fs::write(&raw, raw_export(6.0)).unwrap();
    convert_batch(&[raw.clone()], 0, 0, 4).unwrap();
    std::fs::remove_file(&raw).unwrap();

    let (ctx, _) = common::test_context();
    let mut borehole = Borehole::open("hole", tmp.path(), ctx).unwrap();
    let worker = BackgroundWorker::new();
    worker
        .submit("Depth response", move || {
            borehole.correlate()?;
            let table = borehole.depth_response()?;
            borehole.close()?;
            Ok(table)
        })
        .unwrap();

    match worker.wait(Duration::from_secs(10)) {
        Some(JobEvent::Finished(table)) => {
            assert_eq!(table.steps, vec![3]);
            assert_eq!(table.cells[0].max, 6.0);
        }
        other => panic!("unexpected event: {:?}", other),
    }
}
