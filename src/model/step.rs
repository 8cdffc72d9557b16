//! A numbered step: one directory of measurement files.

use super::context::ModelContext;
use super::data_file::DataFile;
use super::frames::MaxesFrame;
use super::id::NodeId;
use super::naming::validate_entry_name;
use super::{list_entries, max_or_neg_inf, CorrelateReport, FileKey};
use crate::config::UnparseablePolicy;
use crate::error::{Result, ResultExt};
use crate::measurement::XySeries;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Measurement slots of one sensor, indexed by measurement number
pub type SensorSlots = Vec<Option<f64>>;

/// Numbered bucket of data files under a section
#[derive(Debug, Clone)]
pub struct Step {
    id: NodeId,
    number: u32,
    files: Vec<DataFile>,
    selected: bool,
    max_value: Option<f64>,
}

impl Step {
    pub fn new(number: u32, id: Option<NodeId>) -> Self {
        Self {
            id: NodeId::or_next(id),
            number,
            files: Vec::new(),
            selected: false,
            max_value: None,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn files(&self) -> &[DataFile] {
        &self.files
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Step directory: `section_dir/<number>`
    pub fn path(&self, section_dir: &Path) -> PathBuf {
        section_dir.join(self.number.to_string())
    }

    pub fn exists(&self, section_dir: &Path) -> bool {
        self.path(section_dir).is_dir()
    }

    pub fn file(&self, key: &FileKey) -> Option<&DataFile> {
        self.position(key).map(|i| &self.files[i])
    }

    pub fn file_mut(&mut self, key: &FileKey) -> Option<&mut DataFile> {
        self.position(key).map(move |i| &mut self.files[i])
    }

    fn position(&self, key: &FileKey) -> Option<usize> {
        self.files.iter().position(|f| match key {
            FileKey::ById(id) => f.id() == *id,
            FileKey::ByName(name) => f.name() == name,
        })
    }

    /// Track a file of the step directory.
    ///
    /// Returns `false` without changes when the id or name is already
    /// tracked, the name is not a plain file name or the file does not
    /// exist.
    pub fn add_file(&mut self, section_dir: &Path, name: &str, id: Option<NodeId>) -> bool {
        if let Err(e) = validate_entry_name("data file", name) {
            tracing::warn!("Step {}: {}", self.number, e);
            return false;
        }
        if let Some(id) = id {
            if self.files.iter().any(|f| f.id() == id) {
                return false;
            }
        }
        if self.files.iter().any(|f| f.name() == name) {
            tracing::debug!("File {} already tracked in step {}", name, self.number);
            return false;
        }
        if !self.path(section_dir).join(name).is_file() {
            return false;
        }

        self.files.push(DataFile::new(name, id));
        self.max_value = None;
        tracing::debug!("Added file {} to step {}", name, self.number);
        true
    }

    /// Remove a file from the step and from disk
    pub fn remove_file(&mut self, section_dir: &Path, key: &FileKey) -> Result<bool> {
        match self.position(key) {
            Some(i) => {
                self.remove_file_at(&self.path(section_dir), i)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove_file_at(&mut self, step_dir: &Path, i: usize) -> Result<()> {
        let path = self.files[i].path(step_dir);
        if path.is_file() {
            std::fs::remove_file(&path).with_context(|| format!("Removing {:?}", path))?;
        }
        let file = self.files.remove(i);
        self.max_value = None;
        tracing::debug!("Removed file {} from step {}", file.name(), self.number);
        Ok(())
    }

    /// Remove every file; `full_clean` also wipes untracked files by
    /// recreating the step directory
    pub fn remove_all(&mut self, section_dir: &Path, full_clean: bool) -> Result<()> {
        let dir = self.path(section_dir);
        for i in (0..self.files.len()).rev() {
            self.remove_file_at(&dir, i)?;
        }
        if full_clean {
            if dir.is_dir() {
                std::fs::remove_dir_all(&dir).with_context(|| format!("Removing {:?}", dir))?;
            }
            std::fs::create_dir(&dir).with_context(|| format!("Creating {:?}", dir))?;
        }
        Ok(())
    }

    /// Set the inclusion flag of the step and all its files
    pub fn select(&mut self, selected: bool) {
        self.selected = selected;
        for file in &mut self.files {
            file.select(selected);
        }
    }

    /// Largest file maximum, negative infinity for an empty step
    pub fn max(&mut self, ctx: &ModelContext, section_dir: &Path, reload: bool) -> f64 {
        if reload || self.max_value.is_none() {
            let dir = self.path(section_dir);
            let value = max_or_neg_inf(self.files.iter_mut().map(|f| f.max(ctx, &dir, reload)));
            self.max_value = Some(value);
        }
        self.max_value.unwrap_or(f64::NEG_INFINITY)
    }

    /// Per-sensor measurement slots holding each file's maximum.
    ///
    /// Files that are badly named or unreadable are skipped, or under
    /// [`UnparseablePolicy::PurgeStep`] make the whole call return nothing
    /// after every badly named file of the step has been deleted.
    pub fn sensor_slots(
        &mut self,
        ctx: &ModelContext,
        section_dir: &Path,
    ) -> Result<BTreeMap<usize, SensorSlots>> {
        let dir = self.path(section_dir);
        let slot_count = ctx.settings().measurement_number;
        let mut slots: BTreeMap<usize, SensorSlots> = BTreeMap::new();

        for i in 0..self.files.len() {
            let file = &mut self.files[i];
            let series = file.read(ctx, &dir);
            let indices = file.indices(ctx);
            match (series, indices) {
                (Some(series), Some(ix)) => {
                    slots
                        .entry(ix.sensor)
                        .or_insert_with(|| vec![None; slot_count])[ix.measurement] =
                        Some(series.max_y);
                }
                _ => {
                    if self.abort_on_bad_file(ctx, &dir)? {
                        return Ok(BTreeMap::new());
                    }
                }
            }
        }
        Ok(slots)
    }

    /// Per-sensor maxima with empty slots dropped
    pub fn sensor_maxes(
        &mut self,
        ctx: &ModelContext,
        section_dir: &Path,
    ) -> Result<BTreeMap<usize, Vec<f64>>> {
        Ok(self
            .sensor_slots(ctx, section_dir)?
            .into_iter()
            .map(|(sensor, slots)| (sensor, slots.into_iter().flatten().collect()))
            .collect())
    }

    /// One frame per sensor with data; x holds the measurement indices
    pub fn sensor_frames(
        &mut self,
        ctx: &ModelContext,
        section_dir: &Path,
    ) -> Result<Vec<MaxesFrame>> {
        let frames = self
            .sensor_slots(ctx, section_dir)?
            .into_iter()
            .filter_map(|(sensor, slots)| {
                let (x, y): (Vec<f64>, Vec<f64>) = slots
                    .into_iter()
                    .enumerate()
                    .filter_map(|(m, v)| v.map(|v| (m as f64, v)))
                    .unzip();
                (!y.is_empty()).then(|| MaxesFrame::new(sensor.to_string(), y).with_x(x))
            })
            .collect();
        Ok(frames)
    }

    /// Maxima of the selected, readable files
    pub fn maxes_frame(&mut self, ctx: &ModelContext, section_dir: &Path) -> MaxesFrame {
        let dir = self.path(section_dir);
        let maxes = self
            .files
            .iter_mut()
            .filter(|f| f.is_selected())
            .map(|f| f.max(ctx, &dir, false))
            .filter(|m| m.is_finite())
            .collect();
        MaxesFrame::new(format!("step={}", self.number), maxes)
    }

    /// Oscillograms of the selected, readable files
    pub fn xy_series(&mut self, ctx: &ModelContext, section_dir: &Path) -> Result<Vec<XySeries>> {
        let dir = self.path(section_dir);
        let mut out = Vec::new();

        for i in 0..self.files.len() {
            let file = &mut self.files[i];
            let selected = file.is_selected();
            match (file.read(ctx, &dir), file.indices(ctx)) {
                (Some(series), Some(_)) => {
                    if selected {
                        out.push(series);
                    }
                }
                _ => {
                    if self.abort_on_bad_file(ctx, &dir)? {
                        return Ok(Vec::new());
                    }
                }
            }
        }
        Ok(out)
    }

    /// Apply the unparseable-file policy; `true` means abort the query
    fn abort_on_bad_file(&mut self, ctx: &ModelContext, step_dir: &Path) -> Result<bool> {
        match ctx.settings().unparseable_policy {
            UnparseablePolicy::SkipFile => Ok(false),
            UnparseablePolicy::PurgeStep => {
                let mut i = 0;
                while i < self.files.len() {
                    if self.files[i].indices(ctx).is_none() {
                        self.remove_file_at(step_dir, i)?;
                    } else {
                        i += 1;
                    }
                }
                tracing::warn!("Step {} purged of badly named files", self.number);
                Ok(true)
            }
        }
    }

    /// Make the tracked files match the files in the step directory
    pub fn correlate(&mut self, section_dir: &Path) -> Result<CorrelateReport> {
        let mut report = CorrelateReport::default();
        let dir = self.path(section_dir);
        if !dir.is_dir() {
            return Ok(report);
        }

        let on_disk = list_entries(&dir, |ft, _| ft.is_file())
            .with_context(|| format!("Listing {:?}", dir))?;

        let before = self.files.len();
        self.files.retain(|f| on_disk.iter().any(|n| n == f.name()));
        report.removed = before - self.files.len();

        let untracked: Vec<&String> = on_disk
            .iter()
            .filter(|n| self.files.iter().all(|f| f.name() != n.as_str()))
            .collect();
        for name in untracked {
            if self.add_file(section_dir, name, None) {
                report.added += 1;
            }
        }

        if !report.is_unchanged() {
            self.max_value = None;
        }
        Ok(report)
    }
}

impl PartialEq for Step {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
