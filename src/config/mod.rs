//! Configuration module for borehole-rs
//!
//! This module handles configuration including:
//! - Application state persistence (recent projects, last opened project)
//! - Model settings that describe the measurement setup
//!
//! # App Data Location
//!
//! Application state is stored in the platform-appropriate location:
//! - **Linux**: `~/.local/share/dev.borehole-rs/`
//! - **macOS**: `~/Library/Application Support/dev.borehole-rs/`
//! - **Windows**: `%APPDATA%\dev.borehole-rs\`
//!
//! The state is an explicit value: nothing reads or writes it behind the
//! caller's back. Load it once, pass it to whoever needs the last opened
//! project, and save it when the caller decides.
//!
//! # Example
//!
//! ```ignore
//! use borehole_rs::config::AppState;
//!
//! let mut state = AppState::load_or_default();
//! if let Some(project) = state.get_last_project() {
//!     println!("Reopening {}", project.display());
//! }
//! state.add_recent_project("/data/projects/Borehole_1", "Borehole_1");
//! state.save()?;
//! ```

pub mod settings;

pub use settings::*;

use crate::error::{BoreholeError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for data directories
pub const APP_ID: &str = "dev.borehole-rs";

/// App state filename
pub const APP_STATE_FILE: &str = "app_state.json";

/// Default name for a freshly created project
pub const DEFAULT_PROJECT_NAME: &str = "Avellon_Project";

/// Maximum number of recent projects to remember
pub const MAX_RECENT_PROJECTS: usize = 10;

// ==================== App Data Directory ====================

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Ensure the app data directory exists
pub fn ensure_app_data_dir() -> Result<PathBuf> {
    let dir = app_data_dir().ok_or_else(|| {
        BoreholeError::Config("Could not determine app data directory".to_string())
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| {
            BoreholeError::Config(format!("Failed to create app data directory: {}", e))
        })?;
    }

    Ok(dir)
}

/// Get the path to the app state file
pub fn app_state_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(APP_STATE_FILE))
}

/// Get the path to the model settings used when none is given explicitly
pub fn settings_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(SETTINGS_FILENAME))
}

// ==================== Recent Project Entry ====================

/// Information about a recently opened borehole project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentProject {
    /// Path to the borehole directory
    pub path: PathBuf,

    /// Borehole name
    pub name: String,

    /// When the project was last opened
    pub last_opened: DateTime<Utc>,
}

impl RecentProject {
    /// Create a new recent project entry
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            last_opened: Utc::now(),
        }
    }

    /// Update the last opened timestamp
    pub fn touch(&mut self) {
        self.last_opened = Utc::now();
    }

    /// Check if the project directory still exists
    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }
}

// ==================== App State ====================

/// Persistent application state
///
/// Holds the project history that survives across runs, separate from the
/// project directories themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppState {
    /// Version for future migration support
    #[serde(default = "default_app_state_version")]
    pub version: u32,

    /// Recently opened projects, most recent first
    #[serde(default)]
    pub recent_projects: Vec<RecentProject>,

    /// Path to the last opened project
    #[serde(default)]
    pub last_project_path: Option<PathBuf>,

    /// Directory new projects are created in
    #[serde(default)]
    pub default_project_dir: Option<PathBuf>,
}

fn default_app_state_version() -> u32 {
    1
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            version: 1,
            recent_projects: Vec::new(),
            last_project_path: None,
            default_project_dir: None,
        }
    }
}

impl AppState {
    /// Load app state from the default location
    pub fn load() -> Result<Self> {
        let path = app_state_path().ok_or_else(|| {
            BoreholeError::Config("Could not determine app state path".to_string())
        })?;
        Self::load_from(path)
    }

    /// Load app state from an explicit file; a missing file yields defaults
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| BoreholeError::Config(format!("Failed to read app state: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| BoreholeError::Config(format!("Failed to parse app state: {}", e)))
    }

    /// Load app state, returning defaults on any error
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("Failed to load app state, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save app state to the default location
    pub fn save(&self) -> Result<()> {
        let dir = ensure_app_data_dir()?;
        self.save_to(dir.join(APP_STATE_FILE))
    }

    /// Save app state to an explicit file
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                BoreholeError::Config(format!("Failed to create app state directory: {}", e))
            })?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| BoreholeError::Config(format!("Failed to serialize app state: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| BoreholeError::Config(format!("Failed to write app state: {}", e)))
    }

    /// Add or update a recent project and make it the last opened one
    pub fn add_recent_project(&mut self, path: impl AsRef<Path>, name: &str) {
        let path = path.as_ref().to_path_buf();

        self.recent_projects.retain(|p| p.path != path);
        self.recent_projects
            .insert(0, RecentProject::new(path.clone(), name));
        self.recent_projects.truncate(MAX_RECENT_PROJECTS);

        self.last_project_path = Some(path);
    }

    /// Remove a project from recents (e.g., if the directory was deleted)
    pub fn remove_recent_project(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        self.recent_projects.retain(|p| p.path != path);

        if self.last_project_path.as_deref() == Some(path) {
            self.last_project_path = None;
        }
    }

    /// Clean up recent projects that no longer exist
    pub fn cleanup_missing_projects(&mut self) {
        self.recent_projects.retain(|p| p.exists());

        if let Some(ref last) = self.last_project_path {
            if !last.is_dir() {
                self.last_project_path = None;
            }
        }
    }

    /// Where `init` creates a project when no directory is given
    pub fn new_project_dir(&self) -> Option<PathBuf> {
        self.default_project_dir
            .as_ref()
            .map(|dir| dir.join(DEFAULT_PROJECT_NAME))
    }

    /// Get the most recent project path if it still exists
    pub fn get_last_project(&self) -> Option<&Path> {
        self.last_project_path
            .as_deref()
            .filter(|p| p.is_dir())
    }
}

// ==================== Tests ====================
