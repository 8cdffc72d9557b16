//! Test data builders for creating project trees on disk

use std::path::{Path, PathBuf};

/// Builder for measurement CSV contents
pub struct CsvFileBuilder {
    time_base: String,
    zero_index: i64,
    samples: Vec<f64>,
}

impl CsvFileBuilder {
    pub fn new() -> Self {
        Self {
            time_base: "100.00μs".to_string(),
            zero_index: 0,
            samples: Vec::new(),
        }
    }

    pub fn time_base(mut self, time_base: &str) -> Self {
        self.time_base = time_base.to_string();
        self
    }

    pub fn zero_index(mut self, zero_index: i64) -> Self {
        self.zero_index = zero_index;
        self
    }

    pub fn samples(mut self, samples: &[f64]) -> Self {
        self.samples = samples.to_vec();
        self
    }

    pub fn build(self) -> String {
        let mut out = format!(
            "Time Base:{}\nSampling Rate:125.00MSa/s\nAmplitude:250.0mV\n\
             Amplitude resolution:0.98mV\nData Uint:mV\nData points:{}\nZero index:{}\n",
            self.time_base,
            self.samples.len(),
            self.zero_index
        );
        for sample in &self.samples {
            out.push_str(&format!("{}\n", sample));
        }
        out
    }
}

impl Default for CsvFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for a borehole directory tree
pub struct ProjectBuilder {
    dir: PathBuf,
    files: Vec<(PathBuf, String)>,
    dirs: Vec<PathBuf>,
}

impl ProjectBuilder {
    /// Project rooted at `parent/name`
    pub fn new(parent: &Path, name: &str) -> Self {
        Self {
            dir: parent.join(name),
            files: Vec::new(),
            dirs: Vec::new(),
        }
    }

    /// Measurement file whose largest sample is `max`
    pub fn measurement(self, section: &str, step: u32, name: &str, max: f64) -> Self {
        let content = CsvFileBuilder::new().samples(&[0.0, max, max / 2.0]).build();
        self.raw_file(section, step, name, &content)
    }

    /// File with arbitrary contents inside a step directory
    pub fn raw_file(mut self, section: &str, step: u32, name: &str, content: &str) -> Self {
        let path = self.dir.join(section).join(step.to_string()).join(name);
        self.files.push((path, content.to_string()));
        self
    }

    pub fn empty_step(mut self, section: &str, step: u32) -> Self {
        self.dirs.push(self.dir.join(section).join(step.to_string()));
        self
    }

    /// Write everything and return the borehole directory
    pub fn build(self) -> PathBuf {
        std::fs::create_dir_all(&self.dir).unwrap();
        for dir in &self.dirs {
            std::fs::create_dir_all(dir).unwrap();
        }
        for (path, content) in &self.files {
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }
        self.dir
    }
}

/// Name of the measurement file for a sensor/measurement pair
pub fn file_name(sensor: usize, measurement: usize) -> String {
    borehole_rs::model::naming::convention_file_name(sensor, 0, measurement).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_builder() {
        let text = CsvFileBuilder::new().samples(&[1.0, 2.5]).build();
        assert!(text.starts_with("Time Base:100.00μs\n"));
        assert!(text.contains("Data points:2\n"));
        assert!(text.ends_with("1\n2.5\n"));
    }
}
