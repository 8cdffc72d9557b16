//! A single measurement file inside a step directory.

use super::context::ModelContext;
use super::id::NodeId;
use super::naming::FileIndices;
use crate::measurement::{XySeries, WRONG_FILENAME_WARNING_TITLE};
use std::path::{Path, PathBuf};

/// One physical measurement file
///
/// The maximum amplitude is read lazily and cached; a failed read clears
/// the cache and the file contributes negative infinity to every maximum.
#[derive(Debug, Clone)]
pub struct DataFile {
    id: NodeId,
    name: String,
    selected: bool,
    max_value: Option<f64>,
}

impl DataFile {
    pub fn new(name: impl Into<String>, id: Option<NodeId>) -> Self {
        Self {
            id: NodeId::or_next(id),
            name: name.into(),
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

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Full path given the owning step directory
    pub fn path(&self, step_dir: &Path) -> PathBuf {
        step_dir.join(&self.name)
    }

    pub fn exists(&self, step_dir: &Path) -> bool {
        self.path(step_dir).is_file()
    }

    pub fn select(&mut self, selected: bool) {
        self.selected = selected;
    }

    /// Sensor and measurement index, re-decoded from the current name
    pub fn indices(&self, ctx: &ModelContext) -> Option<FileIndices> {
        ctx.indices(&self.name)
    }

    /// Cached maximum without touching the disk
    pub fn cached_max(&self) -> Option<f64> {
        self.max_value
    }

    /// Drop the cached maximum so the next [`DataFile::max`] reads the file
    pub fn invalidate(&mut self) {
        self.max_value = None;
    }

    /// Maximum amplitude, reading the file on a cache miss or when `reload`
    pub fn max(&mut self, ctx: &ModelContext, step_dir: &Path, reload: bool) -> f64 {
        if reload || self.max_value.is_none() {
            if self.read(ctx, step_dir).is_none() {
                return f64::NEG_INFINITY;
            }
        }
        self.max_value.unwrap_or(f64::NEG_INFINITY)
    }

    /// Read the file, refreshing the cached maximum.
    ///
    /// Badly named or unreadable files warn through the context and yield
    /// `None` with the cache cleared.
    pub fn read(&mut self, ctx: &ModelContext, step_dir: &Path) -> Option<XySeries> {
        if self.indices(ctx).is_none() {
            ctx.warn(
                WRONG_FILENAME_WARNING_TITLE,
                &format!("{} - does not follow the naming convention", self.name),
            );
            self.invalidate();
            return None;
        }

        match ctx.read(&self.path(step_dir)) {
            Ok(series) => {
                self.max_value = Some(series.max_y);
                Some(series)
            }
            Err(e) => {
                tracing::debug!("Measurement {} unusable: {}", self.name, e);
                ctx.warn(e.title(), &e.to_string());
                self.invalidate();
                None
            }
        }
    }
}

impl PartialEq for DataFile {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelSettings;
    use crate::measurement::{MeasurementError, MeasurementHeader, MockMeasurementSource};
    use crate::notify::CollectingNotifier;
    use std::sync::Arc;

    fn context(source: MockMeasurementSource) -> (ModelContext, Arc<CollectingNotifier>) {
        let notifier = Arc::new(CollectingNotifier::new());
        let ctx = ModelContext::new(ModelSettings::default(), Arc::new(source), notifier.clone());
        (ctx, notifier)
    }

    fn series(path: &Path, y: Vec<f64>) -> XySeries {
        XySeries::new(path, MeasurementHeader::default(), y)
    }

    #[test]
    fn test_max_is_cached() {
        let mut source = MockMeasurementSource::new();
        source
            .expect_read()
            .times(1)
            .returning(|p| Ok(series(p, vec![1.0, 7.5, 3.0])));
        let (ctx, _) = context(source);

        let mut file = DataFile::new("DEFAULT_A_0mm_3.csv", None);
        let dir = Path::new("/project/hole/s1/1");
        assert_eq!(file.max(&ctx, dir, false), 7.5);
        assert_eq!(file.max(&ctx, dir, false), 7.5);
        assert_eq!(file.cached_max(), Some(7.5));
    }

    #[test]
    fn test_reload_rereads() {
        let mut source = MockMeasurementSource::new();
        source
            .expect_read()
            .times(2)
            .returning(|p| Ok(series(p, vec![2.0])));
        let (ctx, _) = context(source);

        let mut file = DataFile::new("DEFAULT_A_0mm_3.csv", None);
        let dir = Path::new("/d");
        file.max(&ctx, dir, false);
        file.max(&ctx, dir, true);
    }

    #[test]
    fn test_invalidate_forces_next_read() {
        let mut source = MockMeasurementSource::new();
        source
            .expect_read()
            .times(2)
            .returning(|p| Ok(series(p, vec![5.0])));
        let (ctx, _) = context(source);

        let mut file = DataFile::new("DEFAULT_A_0mm_3.csv", None);
        let dir = Path::new("/d");
        file.max(&ctx, dir, false);
        file.invalidate();
        assert_eq!(file.cached_max(), None);
        assert_eq!(file.max(&ctx, dir, false), 5.0);
    }

    #[test]
    fn test_bad_name_warns_and_skips_read() {
        let mut source = MockMeasurementSource::new();
        source.expect_read().never();
        let (ctx, notifier) = context(source);

        let mut file = DataFile::new("notes.csv", None);
        assert_eq!(file.max(&ctx, Path::new("/d"), false), f64::NEG_INFINITY);
        assert_eq!(file.cached_max(), None);

        let warnings = notifier.drain();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].title, WRONG_FILENAME_WARNING_TITLE);
    }

    #[test]
    fn test_read_failure_clears_cache() {
        let mut source = MockMeasurementSource::new();
        let mut calls = 0;
        source.expect_read().times(2).returning(move |p| {
            calls += 1;
            if calls == 1 {
                Ok(series(p, vec![4.0]))
            } else {
                Err(MeasurementError::NoSamples(p.to_path_buf()))
            }
        });
        let (ctx, notifier) = context(source);

        let mut file = DataFile::new("DEFAULT_B_0mm_1.csv", None);
        let dir = Path::new("/d");
        assert_eq!(file.max(&ctx, dir, false), 4.0);
        assert_eq!(file.max(&ctx, dir, true), f64::NEG_INFINITY);
        assert_eq!(file.cached_max(), None);
        assert_eq!(notifier.len(), 1);
    }

    #[test]
    fn test_path_and_selection() {
        let mut file = DataFile::new("DEFAULT_A_0mm_0.csv", Some(NodeId(7)));
        assert_eq!(file.id(), NodeId(7));
        assert!(!file.is_selected());
        file.select(true);
        assert!(file.is_selected());
        assert_eq!(
            file.path(Path::new("/a/b")),
            PathBuf::from("/a/b/DEFAULT_A_0mm_0.csv")
        );
    }
}
