//! Error handling for the borehole project model
//!
//! This module defines the crate-wide error type and a Result alias.
//! Per-file measurement problems use
//! [`MeasurementError`](crate::measurement::MeasurementError) and are
//! absorbed at the data file level, so they never show up here.

use thiserror::Error;

/// Main error type for borehole operations
#[derive(Error, Debug)]
pub enum BoreholeError {
    /// Errors related to settings or application state loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to the borehole info file
    #[error("Info file error: {0}")]
    InfoFile(String),

    /// A node name that cannot be a single directory entry
    #[error("Invalid {kind} name {name:?}")]
    InvalidName { kind: &'static str, name: String },

    /// A referenced node or path is missing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Raw oscilloscope export could not be converted
    #[error("Conversion error: {0}")]
    Convert(String),

    /// Errors related to background jobs
    #[error("Job error: {0}")]
    Job(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<BoreholeError>,
    },
}

impl BoreholeError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        BoreholeError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Result type alias for borehole operations
pub type Result<T> = std::result::Result<T, BoreholeError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| BoreholeError::Io(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| BoreholeError::Io(e).with_context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BoreholeError::InfoFile("missing BOREHOLE_NAME".to_string());
        assert_eq!(err.to_string(), "Info file error: missing BOREHOLE_NAME");
    }

    #[test]
    fn test_error_with_context() {
        let err = BoreholeError::NotFound("section_1".to_string());
        let with_ctx = err.with_context("Failed to remove section");
        assert!(with_ctx.to_string().contains("Failed to remove section"));
        assert!(with_ctx.to_string().contains("section_1"));
    }

    #[test]
    fn test_invalid_name_error() {
        let err = BoreholeError::InvalidName {
            kind: "section",
            name: "..".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid section name \"..\"");
    }

    #[test]
    fn test_io_result_context() {
        let res: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "gone",
        ));
        let err = res.context("Reading step directory").unwrap_err();
        assert!(err.to_string().starts_with("Reading step directory"));
    }
}
