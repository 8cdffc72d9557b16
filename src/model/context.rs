//! Collaborators shared by every node of a borehole tree.

use crate::config::ModelSettings;
use crate::measurement::{CsvMeasurementSource, MeasurementError, MeasurementSource, XySeries};
use crate::model::naming::{parse_indices, FileIndices};
use crate::notify::{Notifier, TracingNotifier};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Settings plus the measurement reader and warning sink used by the model
#[derive(Clone)]
pub struct ModelContext {
    settings: ModelSettings,
    source: Arc<dyn MeasurementSource>,
    notifier: Arc<dyn Notifier>,
}

impl ModelContext {
    pub fn new(
        settings: ModelSettings,
        source: Arc<dyn MeasurementSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            settings,
            source,
            notifier,
        }
    }

    /// CSV reader and logging notifier configured from `settings`
    pub fn with_settings(settings: ModelSettings) -> Self {
        let source = Arc::new(CsvMeasurementSource::new(settings.csv_header_size));
        Self::new(settings, source, Arc::new(TracingNotifier))
    }

    /// Replace the warning sink
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    pub fn read(&self, path: &Path) -> Result<XySeries, MeasurementError> {
        self.source.read(path)
    }

    pub fn warn(&self, title: &str, message: &str) {
        self.notifier.warn(title, message);
    }

    /// Decode a data file name with the configured convention
    pub fn indices(&self, name: &str) -> Option<FileIndices> {
        parse_indices(
            name,
            &self.settings.filename,
            self.settings.sensor_amount,
            self.settings.measurement_number,
        )
    }
}

impl Default for ModelContext {
    fn default() -> Self {
        Self::with_settings(ModelSettings::default())
    }
}

impl fmt::Debug for ModelContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelContext")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
