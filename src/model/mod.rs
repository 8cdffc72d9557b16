//! Borehole project model
//!
//! The project is a four level tree mirrored on disk:
//!
//! ```text
//! <borehole_name>/
//!   info.txt                   borehole/section metadata
//!   <section_name>/
//!     <step_number>/
//!       <data_file_name>.csv   one measurement
//! ```
//!
//! Nodes own their children exclusively and never point back at their
//! parent. Every operation that touches the disk takes the parent directory
//! as an argument, so a node's path is always `parent_dir/<key>`.
//!
//! # Main Types
//!
//! - [`Borehole`] - Root; persists itself to the info file
//! - [`Section`] - Named, depth/length-tagged group of steps
//! - [`Step`] - Numbered group of data files
//! - [`DataFile`] - One measurement with a lazily read maximum
//!
//! # Synchronization
//!
//! `correlate` makes a node's children match the directory one level down:
//! entries only on disk become new nodes, nodes without an entry are
//! dropped. Deleting a node through the API also deletes it on disk.

pub mod borehole;
pub mod context;
pub mod data_file;
pub mod frames;
pub mod id;
pub mod info_file;
pub mod naming;
pub mod section;
pub mod step;

pub use borehole::Borehole;
pub use context::ModelContext;
pub use data_file::DataFile;
pub use frames::{DepthCell, DepthResponse, MaxesFrame};
pub use id::NodeId;
pub use naming::FileIndices;
pub use section::Section;
pub use step::Step;

use std::ops::AddAssign;

/// Selects a data file inside a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileKey {
    ById(NodeId),
    ByName(String),
}

/// Selects a step inside a section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKey {
    ById(NodeId),
    ByNumber(u32),
}

/// Selects a section inside a borehole
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionKey {
    ById(NodeId),
    ByName(String),
}

impl FileKey {
    pub fn name(name: impl Into<String>) -> Self {
        FileKey::ByName(name.into())
    }
}

impl SectionKey {
    pub fn name(name: impl Into<String>) -> Self {
        SectionKey::ByName(name.into())
    }
}

/// Counts of nodes a correlate pass added and removed, over the whole subtree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorrelateReport {
    pub added: usize,
    pub removed: usize,
}

impl CorrelateReport {
    pub fn is_unchanged(&self) -> bool {
        self.added == 0 && self.removed == 0
    }
}

impl AddAssign for CorrelateReport {
    fn add_assign(&mut self, rhs: Self) {
        self.added += rhs.added;
        self.removed += rhs.removed;
    }
}

/// Largest of `values`, negative infinity when empty
pub(crate) fn max_or_neg_inf(values: impl IntoIterator<Item = f64>) -> f64 {
    values.into_iter().fold(f64::NEG_INFINITY, f64::max)
}

/// Names of the entries of `dir` accepted by `keep`, sorted
pub(crate) fn list_entries(
    dir: &std::path::Path,
    keep: impl Fn(&std::fs::FileType, &str) -> bool,
) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let Ok(name) = entry.file_name().into_string() else {
            tracing::warn!("Skipping non UTF-8 entry in {:?}", dir);
            continue;
        };
        if keep(&file_type, &name) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}
