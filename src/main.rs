//! Borehole project tool - Main Entry Point
//!
//! Command-line front end for the borehole project model: create and
//! synchronize project trees, inspect aggregated amplitudes and convert raw
//! oscilloscope exports.
//!
//! # Usage
//!
//! ```bash
//! borehole init ./Hole-7
//! borehole add-section ./Hole-7 upper --depth 120
//! borehole summary ./Hole-7
//! borehole convert --sensor 1 --depth 40 --start 0 raw/*.csv
//! ```

use anyhow::{Context, Result};
use borehole_rs::{
    analysis::SeriesFilter,
    config::{settings_path, AppState},
    convert,
    jobs::{BackgroundWorker, JobEvent},
    Borehole, DepthResponse, MaxesFrame, ModelContext, ModelSettings, SectionKey,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "borehole")]
#[command(about = "Borehole acoustic-emission project tool", long_about = None)]
struct Cli {
    /// Model settings file (TOML)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Application state file; defaults to the platform data directory
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or open a borehole directory and sync it with disk
    Init {
        /// Borehole directory; defaults to a new project in the default
        /// project directory
        dir: Option<PathBuf>,
    },

    /// Add a section to a borehole
    AddSection {
        dir: PathBuf,
        name: String,
        /// Section depth
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        depth: i32,
        /// Section length; defaults to the configured section length
        #[arg(long)]
        length: Option<f64>,
    },

    /// Remove a section and its directory
    RemoveSection { dir: PathBuf, name: String },

    /// Reconcile the borehole tree with the files on disk
    Correlate { dir: PathBuf },

    /// Print aggregated maxima of every section as JSON
    Summary {
        dir: PathBuf,
        /// Smooth the amplitude-over-time series before printing
        #[arg(long)]
        smooth: bool,
    },

    /// Print the step × depth response table as JSON
    Depth { dir: PathBuf },

    /// Convert raw oscilloscope exports into measurement files
    Convert {
        /// Sensor index (0 = A)
        #[arg(long)]
        sensor: usize,
        /// Crack depth in millimetres
        #[arg(long, default_value_t = 0)]
        depth: u32,
        /// Measurement index of the first file
        #[arg(long, default_value_t = 0)]
        start: usize,
        /// Raw export files, in measurement order
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// List recently opened projects
    Recent,
}

/// Aggregated view of a borehole printed by `summary`
#[derive(Serialize)]
struct Summary {
    borehole: String,
    max: f64,
    maxes: BTreeMap<String, Vec<MaxesFrame>>,
    sensors: BTreeMap<String, Vec<MaxesFrame>>,
    sensor_sweeps: BTreeMap<String, Vec<MaxesFrame>>,
    step_maxes: BTreeMap<String, Vec<MaxesFrame>>,
    step_statistics: BTreeMap<String, Vec<MaxesFrame>>,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,borehole_rs=debug")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let settings = match &cli.settings {
        Some(path) => ModelSettings::load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => settings_path()
            .map(|path| ModelSettings::load_or_default(path))
            .unwrap_or_default(),
    };

    let mut app_state = match &cli.state {
        Some(path) => AppState::load_from(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load app state, using defaults: {}", e);
            AppState::default()
        }),
        None => AppState::load_or_default(),
    };
    app_state.cleanup_missing_projects();

    match cli.command {
        Commands::Init { dir } => {
            let Some(dir) = dir.or_else(|| app_state.new_project_dir()) else {
                anyhow::bail!("No borehole directory given and no default project directory set");
            };
            let mut borehole = open(&dir, &settings)?;
            let report = borehole.correlate()?;
            println!(
                "{}: {} sections ({} added, {} removed)",
                borehole.name(),
                borehole.sections().len(),
                report.added,
                report.removed
            );
            if app_state.default_project_dir.is_none() {
                app_state.default_project_dir = Some(borehole.parent().to_path_buf());
            }
            remember(&mut app_state, cli.state.as_deref(), &borehole);
            borehole.close()?;
        }
        Commands::AddSection {
            dir,
            name,
            depth,
            length,
        } => {
            let mut borehole = open(&dir, &settings)?;
            let length = length.unwrap_or(settings.default_section_length);
            if !borehole.add_section(&name, depth, length, None)? {
                println!("Section {} already exists", name);
            }
            remember(&mut app_state, cli.state.as_deref(), &borehole);
            borehole.close()?;
        }
        Commands::RemoveSection { dir, name } => {
            let mut borehole = open(&dir, &settings)?;
            if !borehole.remove_section(&SectionKey::name(name.as_str()))? {
                println!("No section named {}", name);
            }
            borehole.close()?;
        }
        Commands::Correlate { dir } => {
            let mut borehole = open(&dir, &settings)?;
            let report = borehole.correlate()?;
            println!("{} added, {} removed", report.added, report.removed);
            borehole.close()?;
        }
        Commands::Summary { dir, smooth } => {
            let borehole = open(&dir, &settings)?;
            remember(&mut app_state, cli.state.as_deref(), &borehole);
            let filter = smooth.then(SeriesFilter::normalise);
            let summary = run_in_background("Summary", move || summarize(borehole, filter))?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Depth { dir } => {
            let mut borehole = open(&dir, &settings)?;
            let table: DepthResponse = run_in_background("Depth response", move || {
                borehole.correlate()?;
                let table = borehole.depth_response()?;
                borehole.close()?;
                Ok(table)
            })?;
            println!("{}", serde_json::to_string_pretty(&table)?);
        }
        Commands::Convert {
            sensor,
            depth,
            start,
            files,
        } => {
            let converted = convert::convert_batch(&files, sensor, depth, start)?;
            for path in converted {
                println!("{}", path.display());
            }
        }
        Commands::Recent => {
            for project in &app_state.recent_projects {
                println!(
                    "{}\t{}\t{}",
                    project.last_opened.format("%Y-%m-%d %H:%M"),
                    project.name,
                    project.path.display()
                );
            }
        }
    }

    Ok(())
}

/// Open the borehole stored at `dir`, creating it when missing
fn open(dir: &Path, settings: &ModelSettings) -> Result<Borehole> {
    let dir = if dir.exists() {
        dir.canonicalize()
            .with_context(|| format!("Failed to resolve {}", dir.display()))?
    } else {
        dir.to_path_buf()
    };
    Borehole::open_dir(&dir, ModelContext::with_settings(settings.clone()))
        .with_context(|| format!("Failed to open borehole at {}", dir.display()))
}

/// Record the borehole as the last opened project
fn remember(app_state: &mut AppState, state_path: Option<&Path>, borehole: &Borehole) {
    app_state.add_recent_project(borehole.path(), borehole.name());
    let saved = match state_path {
        Some(path) => app_state.save_to(path),
        None => app_state.save(),
    };
    if let Err(e) = saved {
        tracing::warn!("Failed to save app state: {}", e);
    }
}

fn summarize(mut borehole: Borehole, filter: Option<SeriesFilter>) -> borehole_rs::Result<Summary> {
    borehole.correlate()?;
    borehole.select_all(true);
    let mut summary = Summary {
        borehole: borehole.name().to_string(),
        max: borehole.max(false),
        maxes: borehole.maxes_map(),
        sensors: borehole.sensor_map()?,
        sensor_sweeps: borehole.sensor_sweep_map()?,
        step_maxes: borehole.step_maxes_map()?,
        step_statistics: borehole.step_statistics_map()?,
    };
    borehole.close()?;

    if let Some(filter) = filter {
        for frames in summary.step_maxes.values_mut() {
            for frame in frames.iter_mut() {
                let smoothed = filter.apply(&frame.y);
                *frame = MaxesFrame::new(frame.name.clone(), smoothed).with_x(frame.x.clone());
            }
        }
    }
    Ok(summary)
}

/// Run a query on the background worker, logging while it is busy
fn run_in_background<T, F>(title: &str, job: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> borehole_rs::Result<T> + Send + 'static,
{
    let worker = BackgroundWorker::new();
    worker.submit(title, job)?;
    loop {
        match worker.wait(Duration::from_millis(250)) {
            Some(JobEvent::Finished(value)) => return Ok(value),
            Some(JobEvent::Failed(failure)) => {
                anyhow::bail!("{}: {}", failure.title, failure.message)
            }
            None => tracing::debug!("{} still running", title),
        }
    }
}
