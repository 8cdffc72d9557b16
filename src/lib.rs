//! # Borehole-RS: acoustic-emission borehole project model
//!
//! Keeps a `Borehole → Section → Step → DataFile` tree in sync with a project
//! directory, reads oscilloscope measurement files and aggregates their
//! amplitude maxima for plotting.
//!
//! ## Architecture
//!
//! - **Model**: The project tree, its filesystem synchronization and the
//!   aggregation queries
//! - **Measurement**: Reading measurement CSV files behind a trait
//! - **Analysis**: Cross-sensor statistics and smoothing filters
//! - **Convert**: Turning raw oscilloscope exports into named measurement files
//! - **Jobs**: Single background worker with results over crossbeam channels
//!
//! ## Configuration
//!
//! Model settings live in a TOML file next to the projects. Application
//! state (recent projects) is stored in the platform data directory under
//! `dev.borehole-rs`:
//!
//! - **Linux**: `~/.local/share/dev.borehole-rs/`
//! - **macOS**: `~/Library/Application Support/dev.borehole-rs/`
//! - **Windows**: `%APPDATA%\dev.borehole-rs\`
//!
//! ## Example
//!
//! ```no_run
//! use borehole_rs::{Borehole, ModelContext};
//!
//! fn main() -> borehole_rs::Result<()> {
//!     let mut borehole = Borehole::open("Hole-7", "/data/projects", ModelContext::default())?;
//!     borehole.correlate()?;
//!     borehole.add_section("upper", 120, 8.0, None)?;
//!
//!     let response = borehole.depth_response()?;
//!     println!("{} depths, {} steps", response.depths.len(), response.steps.len());
//!
//!     borehole.close()
//! }
//! ```

pub mod analysis;
pub mod config;
pub mod convert;
pub mod error;
pub mod jobs;
pub mod measurement;
pub mod model;
pub mod notify;

// Re-export commonly used types
pub use config::{AppState, ModelSettings, UnparseablePolicy};
pub use error::{BoreholeError, Result};
pub use measurement::{CsvMeasurementSource, MeasurementError, MeasurementSource, XySeries};
pub use model::{
    Borehole, DataFile, DepthResponse, FileKey, MaxesFrame, ModelContext, NodeId, Section,
    SectionKey, Step, StepKey,
};
pub use notify::{CollectingNotifier, Notifier, TracingNotifier};
