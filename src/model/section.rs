//! Sections: named, depth-tagged groups of steps.
//!
//! A section directory holds one numeric subdirectory per step. Besides the
//! tree operations a section answers the aggregation queries of the plot
//! layer, all of which walk its steps in order.

use super::context::ModelContext;
use super::frames::MaxesFrame;
use super::id::NodeId;
use super::naming::validate_entry_name;
use super::step::Step;
use super::{list_entries, max_or_neg_inf, CorrelateReport, StepKey};
use crate::analysis::Statistics;
use crate::error::{Result, ResultExt};
use crate::measurement::XySeries;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Names of the cross-sensor statistic frames, in output order
pub const STATISTIC_FRAME_NAMES: [&str; 5] = [
    "mean",
    "median",
    "geometric_mean",
    "harmonic_mean",
    "grouped_median",
];

#[derive(Debug, Clone)]
pub struct Section {
    id: NodeId,
    name: String,
    depth: i32,
    length: f64,
    steps: Vec<Step>,
    selected: bool,
    max_value: Option<f64>,
}

impl Section {
    pub fn new(name: impl Into<String>, depth: i32, length: f64, id: Option<NodeId>) -> Self {
        Self {
            id: NodeId::or_next(id),
            name: name.into(),
            depth,
            length,
            steps: Vec::new(),
            selected: false,
            max_value: None,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn depth(&self) -> i32 {
        self.depth
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn set_depth(&mut self, depth: i32) {
        self.depth = depth;
    }

    pub fn set_length(&mut self, length: f64) {
        self.length = length;
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn path(&self, borehole_dir: &Path) -> PathBuf {
        borehole_dir.join(&self.name)
    }

    pub fn exists(&self, borehole_dir: &Path) -> bool {
        self.path(borehole_dir).is_dir()
    }

    /// Section directory for operations that create or delete on disk
    fn checked_path(&self, borehole_dir: &Path) -> Result<PathBuf> {
        validate_entry_name("section", &self.name)?;
        Ok(self.path(borehole_dir))
    }

    pub fn step(&self, key: StepKey) -> Option<&Step> {
        self.position(key).map(|i| &self.steps[i])
    }

    pub fn step_mut(&mut self, key: StepKey) -> Option<&mut Step> {
        self.position(key).map(move |i| &mut self.steps[i])
    }

    fn position(&self, key: StepKey) -> Option<usize> {
        self.steps.iter().position(|s| match key {
            StepKey::ById(id) => s.id() == id,
            StepKey::ByNumber(number) => s.number() == number,
        })
    }

    /// Add a step, creating its directory and picking up any files already
    /// in it.
    ///
    /// Returns `false` without changes when a step with the same id or
    /// number exists.
    pub fn add_step(&mut self, borehole_dir: &Path, number: u32, id: Option<NodeId>) -> Result<bool> {
        if let Some(id) = id {
            if self.steps.iter().any(|s| s.id() == id) {
                return Ok(false);
            }
        }
        if self.steps.iter().any(|s| s.number() == number) {
            tracing::debug!("Step {} already present in section {}", number, self.name);
            return Ok(false);
        }

        let dir = self.checked_path(borehole_dir)?;
        let mut step = Step::new(number, id);
        let step_dir = step.path(&dir);
        if !step_dir.is_dir() {
            std::fs::create_dir_all(&step_dir)
                .with_context(|| format!("Creating step directory {:?}", step_dir))?;
        }
        step.correlate(&dir)?;

        tracing::debug!("Added step {} to section {}", number, self.name);
        self.steps.push(step);
        self.max_value = None;
        Ok(true)
    }

    /// Remove a step together with its directory
    pub fn remove_step(&mut self, borehole_dir: &Path, key: StepKey) -> Result<bool> {
        match self.position(key) {
            Some(i) => {
                self.remove_step_at(&self.checked_path(borehole_dir)?, i)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove_step_at(&mut self, section_dir: &Path, i: usize) -> Result<()> {
        let dir = self.steps[i].path(section_dir);
        if dir.is_dir() {
            std::fs::remove_dir_all(&dir).with_context(|| format!("Removing {:?}", dir))?;
        }
        let step = self.steps.remove(i);
        self.max_value = None;
        tracing::debug!("Removed step {} from section {}", step.number(), self.name);
        Ok(())
    }

    pub fn remove_all(&mut self, borehole_dir: &Path, full_clean: bool) -> Result<()> {
        let dir = self.checked_path(borehole_dir)?;
        for i in (0..self.steps.len()).rev() {
            self.remove_step_at(&dir, i)?;
        }
        if full_clean {
            if dir.is_dir() {
                std::fs::remove_dir_all(&dir).with_context(|| format!("Removing {:?}", dir))?;
            }
            std::fs::create_dir(&dir).with_context(|| format!("Creating {:?}", dir))?;
        }
        Ok(())
    }

    /// Set the inclusion flag of the section and everything below it
    pub fn select(&mut self, selected: bool) {
        self.selected = selected;
        for step in &mut self.steps {
            step.select(selected);
        }
    }

    pub fn max(&mut self, ctx: &ModelContext, borehole_dir: &Path, reload: bool) -> f64 {
        if reload || self.max_value.is_none() {
            let dir = self.path(borehole_dir);
            let value = max_or_neg_inf(self.steps.iter_mut().map(|s| s.max(ctx, &dir, reload)));
            self.max_value = Some(value);
        }
        self.max_value.unwrap_or(f64::NEG_INFINITY)
    }

    /// Match the steps against the numeric subdirectories, then correlate
    /// every surviving step
    pub fn correlate(&mut self, borehole_dir: &Path) -> Result<CorrelateReport> {
        let mut report = CorrelateReport::default();
        let dir = self.path(borehole_dir);
        if !dir.is_dir() {
            return Ok(report);
        }

        let on_disk: Vec<u32> = list_entries(&dir, |ft, name| {
            ft.is_dir() && !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit())
        })
        .with_context(|| format!("Listing {:?}", dir))?
        .into_iter()
        .filter_map(|name| match name.parse::<u32>() {
            Ok(n) if n.to_string() == name => Some(n),
            _ => {
                tracing::warn!(
                    "Step directory {:?} in section {} is not a plain step number, ignored",
                    name,
                    self.name
                );
                None
            }
        })
        .collect();

        let before = self.steps.len();
        self.steps.retain(|s| on_disk.contains(&s.number()));
        report.removed += before - self.steps.len();

        for step in &mut self.steps {
            report += step.correlate(&dir)?;
        }

        let missing: Vec<u32> = on_disk
            .into_iter()
            .filter(|n| self.steps.iter().all(|s| s.number() != *n))
            .collect();
        for number in missing {
            if self.add_step(borehole_dir, number, None)? {
                report.added += 1;
            }
        }

        if !report.is_unchanged() {
            self.max_value = None;
        }
        Ok(report)
    }

    /// Oscillograms of the selected files of every step
    pub fn xy_series(&mut self, ctx: &ModelContext, borehole_dir: &Path) -> Result<Vec<XySeries>> {
        let dir = self.path(borehole_dir);
        let mut out = Vec::new();
        for step in &mut self.steps {
            out.extend(step.xy_series(ctx, &dir)?);
        }
        Ok(out)
    }

    /// Per-step, per-sensor frames that cover the full measurement sweep
    pub fn sensor_sweep_frames(
        &mut self,
        ctx: &ModelContext,
        borehole_dir: &Path,
    ) -> Result<Vec<MaxesFrame>> {
        let dir = self.path(borehole_dir);
        let sweep = ctx.settings().measurement_number;
        let mut out = Vec::new();
        for step in &mut self.steps {
            for (sensor, maxes) in step.sensor_maxes(ctx, &dir)? {
                if maxes.len() == sweep {
                    let x = (0..maxes.len()).map(|i| i as f64).collect();
                    out.push(MaxesFrame::new(sensor.to_string(), maxes).with_x(x));
                }
            }
        }
        Ok(out)
    }

    /// One frame per configured sensor holding its maxima across all steps
    pub fn sensor_frames(&mut self, ctx: &ModelContext, borehole_dir: &Path) -> Result<Vec<MaxesFrame>> {
        let dir = self.path(borehole_dir);
        let mut per_sensor: Vec<Vec<f64>> = vec![Vec::new(); ctx.settings().sensor_amount];
        for step in &mut self.steps {
            for (sensor, maxes) in step.sensor_maxes(ctx, &dir)? {
                if let Some(values) = per_sensor.get_mut(sensor) {
                    values.extend(maxes);
                }
            }
        }
        Ok(per_sensor
            .into_iter()
            .enumerate()
            .map(|(sensor, values)| MaxesFrame::new(sensor.to_string(), values))
            .collect())
    }

    /// Maxima of the selected files, one frame per step
    pub fn maxes_frames(&mut self, ctx: &ModelContext, borehole_dir: &Path) -> Vec<MaxesFrame> {
        let dir = self.path(borehole_dir);
        self.steps
            .iter_mut()
            .map(|s| s.maxes_frame(ctx, &dir))
            .collect()
    }

    /// Largest maximum of each sensor for every step, keyed by step number
    pub fn step_sensor_maxima(
        &mut self,
        ctx: &ModelContext,
        borehole_dir: &Path,
    ) -> Result<BTreeMap<u32, BTreeMap<usize, f64>>> {
        let dir = self.path(borehole_dir);
        let mut out = BTreeMap::new();
        for step in &mut self.steps {
            let maxima: BTreeMap<usize, f64> = step
                .sensor_maxes(ctx, &dir)?
                .into_iter()
                .filter(|(_, maxes)| !maxes.is_empty())
                .map(|(sensor, maxes)| (sensor, max_or_neg_inf(maxes)))
                .collect();
            out.insert(step.number(), maxima);
        }
        Ok(out)
    }

    /// Amplitude over time: for each sensor, its maximum at every step,
    /// with the step numbers as x axis
    pub fn step_maxes_frames(&mut self, ctx: &ModelContext, borehole_dir: &Path) -> Result<Vec<MaxesFrame>> {
        let mut per_sensor: BTreeMap<usize, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
        for (number, maxima) in self.step_sensor_maxima(ctx, borehole_dir)? {
            for (sensor, max) in maxima {
                let (x, y) = per_sensor.entry(sensor).or_default();
                x.push(number as f64);
                y.push(max);
            }
        }
        Ok(per_sensor
            .into_iter()
            .map(|(sensor, (x, y))| MaxesFrame::new(sensor.to_string(), y).with_x(x))
            .collect())
    }

    /// Cross-sensor statistics at every step, one frame per statistic named
    /// after [`STATISTIC_FRAME_NAMES`].
    ///
    /// Steps where a statistic is undefined are left out of that frame.
    pub fn step_statistics_frames(
        &mut self,
        ctx: &ModelContext,
        borehole_dir: &Path,
    ) -> Result<Vec<MaxesFrame>> {
        let mut columns: [(Vec<f64>, Vec<f64>); 5] = Default::default();

        for (number, maxima) in self.step_sensor_maxima(ctx, borehole_dir)? {
            let values: Vec<f64> = maxima.into_values().collect();
            let Some(stats) = Statistics::compute(&values) else {
                continue;
            };
            let row = [
                Some(stats.mean),
                Some(stats.median),
                stats.geometric_mean,
                stats.harmonic_mean,
                Some(stats.grouped_median),
            ];
            for (column, value) in columns.iter_mut().zip(row) {
                if let Some(v) = value {
                    column.0.push(number as f64);
                    column.1.push(v);
                }
            }
        }

        Ok(STATISTIC_FRAME_NAMES
            .iter()
            .zip(columns)
            .map(|(name, (x, y))| MaxesFrame::new(*name, y).with_x(x))
            .collect())
    }
}

impl PartialEq for Section {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FileKey;

    fn write_file(dir: &Path, name: &str) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join(name), "").unwrap();
    }

    fn section_in(borehole_dir: &Path) -> Section {
        let section = Section::new("s1", 10, 8.0, None);
        std::fs::create_dir_all(section.path(borehole_dir)).unwrap();
        section
    }

    #[test]
    fn test_add_step_creates_dir_and_rejects_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let mut section = section_in(dir.path());

        assert!(section.add_step(dir.path(), 5, None).unwrap());
        assert!(!section.add_step(dir.path(), 5, None).unwrap());
        assert_eq!(section.steps().len(), 1);
        assert!(dir.path().join("s1/5").is_dir());

        let id = section.steps()[0].id();
        assert!(!section.add_step(dir.path(), 6, Some(id)).unwrap());
        assert_eq!(section.steps().len(), 1);
    }

    #[test]
    fn test_add_step_picks_up_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut section = section_in(dir.path());
        write_file(&dir.path().join("s1/2"), "DEFAULT_A_0mm_0.csv");

        section.add_step(dir.path(), 2, None).unwrap();
        let step = section.step(StepKey::ByNumber(2)).unwrap();
        assert!(step.file(&FileKey::name("DEFAULT_A_0mm_0.csv")).is_some());
    }

    #[test]
    fn test_remove_step_deletes_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut section = section_in(dir.path());
        section.add_step(dir.path(), 1, None).unwrap();
        section.add_step(dir.path(), 2, None).unwrap();

        assert!(section.remove_step(dir.path(), StepKey::ByNumber(1)).unwrap());
        assert!(!dir.path().join("s1/1").exists());
        assert!(!section.remove_step(dir.path(), StepKey::ByNumber(1)).unwrap());

        let id = section.steps()[0].id();
        assert!(section.remove_step(dir.path(), StepKey::ById(id)).unwrap());
        assert!(section.steps().is_empty());
    }

    #[test]
    fn test_correlate_numeric_dirs_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut section = section_in(dir.path());
        std::fs::create_dir_all(dir.path().join("s1/3")).unwrap();
        std::fs::create_dir_all(dir.path().join("s1/notes")).unwrap();
        write_file(&dir.path().join("s1"), "7");

        let report = section.correlate(dir.path()).unwrap();
        assert_eq!(report.added, 1);
        assert_eq!(section.steps().len(), 1);
        assert_eq!(section.steps()[0].number(), 3);
    }

    #[test]
    fn test_correlate_ignores_padded_step_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let mut section = section_in(dir.path());
        std::fs::create_dir_all(dir.path().join("s1/007")).unwrap();
        std::fs::create_dir_all(dir.path().join("s1/99999999999")).unwrap();
        std::fs::create_dir_all(dir.path().join("s1/7")).unwrap();

        let report = section.correlate(dir.path()).unwrap();
        assert_eq!(report.added, 1);
        assert_eq!(section.steps()[0].number(), 7);

        // The padded directory is left alone when step 7 is removed
        section.remove_step(dir.path(), StepKey::ByNumber(7)).unwrap();
        assert!(dir.path().join("s1/007").is_dir());
        assert!(section.correlate(dir.path()).unwrap().is_unchanged());
    }

    #[test]
    fn test_invalid_section_name_never_touches_disk() {
        let dir = tempfile::tempdir().unwrap();
        let hole = dir.path().join("hole");
        std::fs::create_dir_all(hole.join("1")).unwrap();

        for name in ["", ".", ".."] {
            let mut section = Section::new(name, 0, 8.0, None);
            assert!(section.add_step(&hole, 2, None).is_err());
            assert!(section.remove_all(&hole, true).is_err());
        }
        assert!(hole.join("1").is_dir());
        assert!(!hole.join("2").exists());
    }

    #[test]
    fn test_correlate_missing_dir_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut section = Section::new("absent", 0, 8.0, None);
        assert!(section.correlate(dir.path()).unwrap().is_unchanged());
    }

    #[test]
    fn test_select_cascades_to_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut section = section_in(dir.path());
        write_file(&dir.path().join("s1/1"), "DEFAULT_A_0mm_0.csv");
        section.correlate(dir.path()).unwrap();

        section.select(true);
        section.select(false);
        assert!(!section.is_selected());
        for step in section.steps() {
            assert!(!step.is_selected());
            assert!(step.files().iter().all(|f| !f.is_selected()));
        }
    }
}
