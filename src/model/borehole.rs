//! Borehole: root of the project tree
//!
//! A borehole owns its sections and the [`ModelContext`] shared by the whole
//! tree. Section membership is restored from the info file on
//! [`Borehole::open`]; call [`Borehole::correlate`] to pick up what changed
//! on disk since.
//!
//! Edits are persisted only by [`Borehole::save_info`] or
//! [`Borehole::close`]. Dropping a borehole with unsaved edits loses them
//! and logs a warning.

use super::context::ModelContext;
use super::frames::{DepthCell, DepthResponse, MaxesFrame};
use super::id::NodeId;
use super::info_file::{self, BoreholeInfo, SectionInfo};
use super::naming::validate_entry_name;
use super::section::Section;
use super::{list_entries, max_or_neg_inf, CorrelateReport, SectionKey};
use crate::error::{Result, ResultExt};
use crate::measurement::XySeries;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub struct Borehole {
    id: NodeId,
    name: String,
    parent: PathBuf,
    sections: Vec<Section>,
    ctx: ModelContext,
    dirty: bool,
}

impl Borehole {
    /// Open (or create) the borehole directory `parent/name` and restore
    /// its sections from the info file.
    pub fn open(name: impl Into<String>, parent: impl Into<PathBuf>, ctx: ModelContext) -> Result<Self> {
        let name = name.into();
        validate_entry_name("borehole", &name)?;
        let mut borehole = Self {
            id: NodeId::next(),
            name,
            parent: parent.into(),
            sections: Vec::new(),
            ctx,
            dirty: false,
        };

        let dir = borehole.path();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Creating borehole directory {:?}", dir))?;
        borehole.load_info()?;
        Ok(borehole)
    }

    /// Open the borehole stored at `dir`
    pub fn open_dir(dir: &Path, ctx: ModelContext) -> Result<Self> {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| crate::error::BoreholeError::NotFound(format!("{:?} has no name", dir)))?;
        let parent = dir.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::open(name, parent, ctx)
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> &Path {
        &self.parent
    }

    pub fn context(&self) -> &ModelContext {
        &self.ctx
    }

    /// `true` when there are edits not yet written to the info file
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn path(&self) -> PathBuf {
        self.parent.join(&self.name)
    }

    pub fn exists(&self) -> bool {
        self.path().is_dir()
    }

    pub fn info_path(&self) -> PathBuf {
        self.path().join(&self.ctx.settings().info_filename)
    }

    /// Point the borehole at a new parent directory; nothing moves on disk
    pub fn relocate(&mut self, new_parent: impl Into<PathBuf>) {
        self.parent = new_parent.into();
        tracing::info!("Borehole {} relocated to {:?}", self.name, self.path());
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, key: &SectionKey) -> Option<&Section> {
        self.position(key).map(|i| &self.sections[i])
    }

    /// Mutable access marks the borehole as edited
    pub fn section_mut(&mut self, key: &SectionKey) -> Option<&mut Section> {
        let i = self.position(key)?;
        self.dirty = true;
        Some(&mut self.sections[i])
    }

    fn position(&self, key: &SectionKey) -> Option<usize> {
        self.sections.iter().position(|s| match key {
            SectionKey::ById(id) => s.id() == *id,
            SectionKey::ByName(name) => s.name() == name,
        })
    }

    /// Add a section, creating its directory and picking up any steps
    /// already in it.
    ///
    /// Returns `false` without changes when a section with the same id or
    /// name exists, and an error when `name` is not a plain directory name.
    pub fn add_section(
        &mut self,
        name: &str,
        depth: i32,
        length: f64,
        id: Option<NodeId>,
    ) -> Result<bool> {
        validate_entry_name("section", name)?;
        if let Some(id) = id {
            if self.sections.iter().any(|s| s.id() == id) {
                return Ok(false);
            }
        }
        if self.sections.iter().any(|s| s.name() == name) {
            tracing::debug!("Section {} already present in {}", name, self.name);
            return Ok(false);
        }

        let dir = self.path();
        let mut section = Section::new(name, depth, length, id);
        let section_dir = section.path(&dir);
        if !section_dir.is_dir() {
            std::fs::create_dir_all(&section_dir)
                .with_context(|| format!("Creating section directory {:?}", section_dir))?;
        }
        section.correlate(&dir)?;

        tracing::debug!("Added section {} (depth {}) to {}", name, depth, self.name);
        self.sections.push(section);
        self.dirty = true;
        Ok(true)
    }

    /// Remove a section together with its directory
    pub fn remove_section(&mut self, key: &SectionKey) -> Result<bool> {
        match self.position(key) {
            Some(i) => {
                self.remove_section_at(i)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove_section_at(&mut self, i: usize) -> Result<()> {
        validate_entry_name("section", self.sections[i].name())?;
        let dir = self.sections[i].path(&self.path());
        if dir.is_dir() {
            std::fs::remove_dir_all(&dir).with_context(|| format!("Removing {:?}", dir))?;
        }
        let section = self.sections.remove(i);
        self.dirty = true;
        tracing::debug!("Removed section {} from {}", section.name(), self.name);
        Ok(())
    }

    /// Remove every section; `full_clean` also wipes untracked content,
    /// including the info file
    pub fn remove_all(&mut self, full_clean: bool) -> Result<()> {
        for i in (0..self.sections.len()).rev() {
            self.remove_section_at(i)?;
        }
        if full_clean {
            let dir = self.path();
            if dir.is_dir() {
                std::fs::remove_dir_all(&dir).with_context(|| format!("Removing {:?}", dir))?;
            }
            std::fs::create_dir(&dir).with_context(|| format!("Creating {:?}", dir))?;
        }
        Ok(())
    }

    /// Set the inclusion flag of one section and everything below it
    pub fn select_section(&mut self, key: &SectionKey, selected: bool) -> bool {
        match self.position(key) {
            Some(i) => {
                self.sections[i].select(selected);
                true
            }
            None => false,
        }
    }

    pub fn select_all(&mut self, selected: bool) {
        for section in &mut self.sections {
            section.select(selected);
        }
    }

    pub fn max(&mut self, reload: bool) -> f64 {
        let dir = self.path();
        let ctx = &self.ctx;
        max_or_neg_inf(self.sections.iter_mut().map(|s| s.max(ctx, &dir, reload)))
    }

    /// Match the sections against the subdirectories, recursing into every
    /// surviving section.
    ///
    /// Newly discovered sections get depth 0 and the default section length.
    pub fn correlate(&mut self) -> Result<CorrelateReport> {
        let mut report = CorrelateReport::default();
        let dir = self.path();
        if !dir.is_dir() {
            tracing::warn!("Borehole directory {:?} is missing", dir);
            return Ok(report);
        }

        let on_disk = list_entries(&dir, |ft, _| ft.is_dir())
            .with_context(|| format!("Listing {:?}", dir))?;

        let before = self.sections.len();
        self.sections
            .retain(|s| on_disk.iter().any(|name| name == s.name()));
        report.removed += before - self.sections.len();

        for section in &mut self.sections {
            report += section.correlate(&dir)?;
        }

        let default_length = self.ctx.settings().default_section_length;
        let missing: Vec<String> = on_disk
            .into_iter()
            .filter(|name| self.sections.iter().all(|s| s.name() != name))
            .filter(|name| match validate_entry_name("section", name) {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!("Skipping directory in {:?}: {}", dir, e);
                    false
                }
            })
            .collect();
        for name in missing {
            if self.add_section(&name, 0, default_length, None)? {
                report.added += 1;
            }
        }

        if !report.is_unchanged() {
            self.dirty = true;
        }
        tracing::info!(
            "Correlated {}: {} added, {} removed",
            self.name,
            report.added,
            report.removed
        );
        Ok(report)
    }

    /// Relocate, then correlate against the new location
    pub fn correlate_at(&mut self, new_parent: impl Into<PathBuf>) -> Result<CorrelateReport> {
        self.relocate(new_parent);
        self.correlate()
    }

    /// Oscillograms of the selected files, per section
    pub fn xy_series_map(&mut self) -> Result<BTreeMap<String, Vec<XySeries>>> {
        self.collect_map(|s, ctx, dir| s.xy_series(ctx, dir))
    }

    /// Full-sweep sensor frames, only for sections that have any
    pub fn sensor_sweep_map(&mut self) -> Result<BTreeMap<String, Vec<MaxesFrame>>> {
        let mut map = self.collect_map(|s, ctx, dir| s.sensor_sweep_frames(ctx, dir))?;
        map.retain(|_, frames| !frames.is_empty());
        Ok(map)
    }

    /// Per-sensor maxima across steps, only for sections that have any
    pub fn sensor_map(&mut self) -> Result<BTreeMap<String, Vec<MaxesFrame>>> {
        let mut map = self.collect_map(|s, ctx, dir| s.sensor_frames(ctx, dir))?;
        map.retain(|_, frames| frames.iter().any(|f| !f.is_empty()));
        Ok(map)
    }

    /// Selected-file maxima per step, per section
    pub fn maxes_map(&mut self) -> BTreeMap<String, Vec<MaxesFrame>> {
        let dir = self.path();
        let ctx = &self.ctx;
        self.sections
            .iter_mut()
            .map(|s| (s.name().to_string(), s.maxes_frames(ctx, &dir)))
            .collect()
    }

    /// Sensor maxima over step numbers, per section
    pub fn step_maxes_map(&mut self) -> Result<BTreeMap<String, Vec<MaxesFrame>>> {
        self.collect_map(|s, ctx, dir| s.step_maxes_frames(ctx, dir))
    }

    /// Cross-sensor statistics over step numbers, per section
    pub fn step_statistics_map(&mut self) -> Result<BTreeMap<String, Vec<MaxesFrame>>> {
        self.collect_map(|s, ctx, dir| s.step_statistics_frames(ctx, dir))
    }

    fn collect_map<T>(
        &mut self,
        mut query: impl FnMut(&mut Section, &ModelContext, &Path) -> Result<T>,
    ) -> Result<BTreeMap<String, T>> {
        let dir = self.path();
        let mut map = BTreeMap::new();
        for section in &mut self.sections {
            let value = query(section, &self.ctx, &dir)?;
            map.insert(section.name().to_string(), value);
        }
        Ok(map)
    }

    /// Step × depth table of sensor maxima over all sections
    pub fn depth_response(&mut self) -> Result<DepthResponse> {
        let dir = self.path();
        let mut cells = Vec::new();
        for section in &mut self.sections {
            for (step, maxima) in section.step_sensor_maxima(&self.ctx, &dir)? {
                if maxima.is_empty() {
                    continue;
                }
                cells.push(DepthCell::new(
                    section.name(),
                    section.depth(),
                    step,
                    maxima.into_values().collect(),
                ));
            }
        }
        Ok(DepthResponse::from_cells(cells))
    }

    fn info(&self) -> BoreholeInfo {
        BoreholeInfo {
            name: self.name.clone(),
            sections: self
                .sections
                .iter()
                .map(|s| SectionInfo {
                    name: s.name().to_string(),
                    depth: s.depth(),
                    length: s.length(),
                })
                .collect(),
        }
    }

    /// Write the info file into the borehole directory
    pub fn save_info(&mut self) -> Result<()> {
        let filename = self.ctx.settings().info_filename.clone();
        self.save_info_as(&filename)
    }

    pub fn save_info_as(&mut self, filename: &str) -> Result<()> {
        let path = self.path().join(filename);
        std::fs::write(&path, info_file::write(&self.info()))
            .with_context(|| format!("Writing info file {:?}", path))?;
        self.dirty = false;
        tracing::info!("Saved {} sections of {} to {:?}", self.sections.len(), self.name, path);
        Ok(())
    }

    /// Restore sections from the info file.
    ///
    /// Returns `false` when there is no usable info file. Sections already
    /// present are kept.
    pub fn load_info(&mut self) -> Result<bool> {
        let filename = self.ctx.settings().info_filename.clone();
        self.load_info_from(&filename)
    }

    pub fn load_info_from(&mut self, filename: &str) -> Result<bool> {
        let path = self.path().join(filename);
        if !path.is_file() {
            return Ok(false);
        }
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Reading info file {:?}", path))?;

        let Some(info) = info_file::parse(&text).with_context(|| format!("{:?}", path))? else {
            tracing::warn!("{:?} does not start with a borehole name, ignored", path);
            return Ok(false);
        };
        if info.name != self.name {
            tracing::warn!(
                "Info file names borehole {:?} but directory is {:?}, keeping the directory name",
                info.name,
                self.name
            );
        }

        let was_dirty = self.dirty;
        for section in info.sections {
            if let Err(e) = validate_entry_name("section", &section.name) {
                tracing::warn!("{:?}: {}, section skipped", path, e);
                continue;
            }
            self.add_section(&section.name, section.depth, section.length, None)?;
        }
        self.dirty = was_dirty;
        tracing::info!("Loaded {} sections from {:?}", self.sections.len(), path);
        Ok(true)
    }

    /// Save the info file and release the borehole
    pub fn close(mut self) -> Result<()> {
        self.save_info()
    }
}

impl Drop for Borehole {
    fn drop(&mut self) {
        if self.dirty {
            tracing::warn!("Borehole {} dropped with unsaved changes", self.name);
        }
    }
}

impl PartialEq for Borehole {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl std::fmt::Debug for Borehole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Borehole")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("sections", &self.sections)
            .field("dirty", &self.dirty)
            .finish()
    }
}
