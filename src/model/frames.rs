//! Result containers handed to plot consumers.
//!
//! - [`MaxesFrame`] - A named series of maxima with an x axis and values
//!   relative to the series maximum
//! - [`DepthResponse`] - Step × depth cross table for depth response plots

use crate::analysis::Statistics;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Named series of amplitude maxima
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaxesFrame {
    pub name: String,
    /// X axis (measurement index, step number or depth); may be empty
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    /// `y` divided by the reference maximum
    pub ry: Vec<f64>,
}

impl MaxesFrame {
    /// Build a frame whose relative values use its own maximum
    pub fn new(name: impl Into<String>, y: Vec<f64>) -> Self {
        let mut frame = Self {
            name: name.into(),
            x: Vec::new(),
            y,
            ry: Vec::new(),
        };
        frame.compute_relative(None);
        frame
    }

    /// Set the x axis
    pub fn with_x(mut self, x: Vec<f64>) -> Self {
        self.x = x;
        self
    }

    /// Recompute relative values against an external maximum
    pub fn with_reference_max(mut self, reference: f64) -> Self {
        self.compute_relative(Some(reference));
        self
    }

    /// Largest value, `None` for an empty frame
    pub fn max(&self) -> Option<f64> {
        self.y.iter().copied().reduce(f64::max)
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// A zero or non-finite reference yields zeros.
    fn compute_relative(&mut self, reference: Option<f64>) {
        let reference = reference.or_else(|| self.max());
        self.ry = match reference {
            Some(r) if r.is_finite() && r != 0.0 => self.y.iter().map(|v| v / r).collect(),
            _ => vec![0.0; self.y.len()],
        };
    }
}

/// One step/depth cell of a depth response table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthCell {
    /// Sections at this depth that contributed to the cell
    pub sections: Vec<String>,
    pub depth: i32,
    pub step: u32,
    /// Maximum amplitude per sensor, section by section in sensor order
    pub sensor_maxes: Vec<f64>,
    /// Largest of `sensor_maxes`
    pub max: f64,
    /// Cross-sensor statistics of `sensor_maxes`
    pub stats: Option<Statistics>,
    /// `max` divided by the largest `max` seen at the same depth
    pub ratio: f64,
}

impl DepthCell {
    /// Cell of one section's sensor maxima at one step
    pub fn new(section: impl Into<String>, depth: i32, step: u32, sensor_maxes: Vec<f64>) -> Self {
        Self {
            sections: vec![section.into()],
            depth,
            step,
            max: sensor_maxes.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            stats: Statistics::compute(&sensor_maxes),
            sensor_maxes,
            ratio: 0.0,
        }
    }

    /// Fold another section's cell at the same step and depth into this one
    fn merge(&mut self, other: DepthCell) {
        self.sections.extend(other.sections);
        self.sensor_maxes.extend(other.sensor_maxes);
        self.max = self.max.max(other.max);
        self.stats = Statistics::compute(&self.sensor_maxes);
    }
}

/// Step × depth cross table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DepthResponse {
    /// Distinct section depths, ascending
    pub depths: Vec<i32>,
    /// Distinct step numbers, ascending
    pub steps: Vec<u32>,
    pub cells: Vec<DepthCell>,
}

impl DepthResponse {
    /// Assemble a table from raw cells, filling axes and ratios.
    ///
    /// Cells sharing a step and depth (sections at the same depth) are
    /// merged into one.
    pub fn from_cells(raw: Vec<DepthCell>) -> Self {
        let mut merged: BTreeMap<(u32, i32), DepthCell> = BTreeMap::new();
        for cell in raw {
            match merged.entry((cell.step, cell.depth)) {
                Entry::Vacant(slot) => {
                    slot.insert(cell);
                }
                Entry::Occupied(mut slot) => slot.get_mut().merge(cell),
            }
        }
        let mut cells: Vec<DepthCell> = merged.into_values().collect();

        let mut depths: Vec<i32> = cells.iter().map(|c| c.depth).collect();
        depths.sort_unstable();
        depths.dedup();

        let mut steps: Vec<u32> = cells.iter().map(|c| c.step).collect();
        steps.sort_unstable();
        steps.dedup();

        for depth in &depths {
            let depth_max = cells
                .iter()
                .filter(|c| c.depth == *depth)
                .map(|c| c.max)
                .fold(f64::NEG_INFINITY, f64::max);
            for cell in cells.iter_mut().filter(|c| c.depth == *depth) {
                cell.ratio = if depth_max.is_finite() && depth_max != 0.0 {
                    cell.max / depth_max
                } else {
                    0.0
                };
            }
        }

        Self {
            depths,
            steps,
            cells,
        }
    }

    pub fn cell(&self, step: u32, depth: i32) -> Option<&DepthCell> {
        self.cells.iter().find(|c| c.step == step && c.depth == depth)
    }

    /// Maxima of one step across depths (x = depth, ry = ratio)
    pub fn step_frame(&self, step: u32) -> MaxesFrame {
        let cells: Vec<&DepthCell> = self.cells.iter().filter(|c| c.step == step).collect();
        MaxesFrame {
            name: format!("step={}", step),
            x: cells.iter().map(|c| c.depth as f64).collect(),
            y: cells.iter().map(|c| c.max).collect(),
            ry: cells.iter().map(|c| c.ratio).collect(),
        }
    }

    /// Maxima of one depth across steps (x = step, ry = ratio)
    pub fn depth_frame(&self, depth: i32) -> MaxesFrame {
        let cells: Vec<&DepthCell> = self.cells.iter().filter(|c| c.depth == depth).collect();
        MaxesFrame {
            name: format!("depth={}", depth),
            x: cells.iter().map(|c| c.step as f64).collect(),
            y: cells.iter().map(|c| c.max).collect(),
            ry: cells.iter().map(|c| c.ratio).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
