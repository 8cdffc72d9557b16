//! Analysis module for amplitude data
//!
//! This module provides the numeric tools used by the aggregation queries:
//! - Descriptive statistics across sensors (mean, median, geometric/harmonic mean)
//! - Smoothing filters for series shown on plots

pub mod filter;
pub mod stats;

pub use filter::SeriesFilter;
pub use stats::Statistics;
