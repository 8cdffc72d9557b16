//! Smoothing filters for amplitude series
//!
//! Applied to oscillogram samples or maxima series before they are plotted.
//! Every filter returns a new vector of the same length as its input.

use super::stats::median_grouped;
use serde::{Deserialize, Serialize};

/// Filter type with its parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SeriesFilter {
    /// Centered moving average over `buffer_size` samples
    ArithmeticMean { buffer_size: usize },
    /// Running grouped median over the last `buffer_size` samples
    Median { buffer_size: usize },
    /// Exponential smoothing that reacts faster to jumps larger than `d`
    ExpEasyMean { s_k: f64, max_k: f64, d: f64 },
    /// Median filter followed by exponential smoothing
    Normalise {
        buffer_size: usize,
        s_k: f64,
        max_k: f64,
        d: f64,
    },
}

impl SeriesFilter {
    pub fn arithmetic_mean() -> Self {
        SeriesFilter::ArithmeticMean { buffer_size: 10 }
    }

    pub fn median() -> Self {
        SeriesFilter::Median { buffer_size: 7 }
    }

    pub fn exp_easy_mean() -> Self {
        SeriesFilter::ExpEasyMean {
            s_k: 0.2,
            max_k: 0.9,
            d: 1.5,
        }
    }

    pub fn normalise() -> Self {
        SeriesFilter::Normalise {
            buffer_size: 7,
            s_k: 0.2,
            max_k: 0.9,
            d: 1.5,
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            SeriesFilter::ArithmeticMean { .. } => "Arithmetic mean",
            SeriesFilter::Median { .. } => "Median",
            SeriesFilter::ExpEasyMean { .. } => "Exponential",
            SeriesFilter::Normalise { .. } => "Normalise",
        }
    }

    /// Default-parameter instance of every filter
    pub fn all() -> [SeriesFilter; 4] {
        [
            Self::arithmetic_mean(),
            Self::median(),
            Self::exp_easy_mean(),
            Self::normalise(),
        ]
    }

    /// Apply the filter to a series
    pub fn apply(&self, data: &[f64]) -> Vec<f64> {
        match *self {
            SeriesFilter::ArithmeticMean { buffer_size } => arithmetic_mean(data, buffer_size),
            SeriesFilter::Median { buffer_size } => running_median(data, buffer_size),
            SeriesFilter::ExpEasyMean { s_k, max_k, d } => exp_easy_mean(data, s_k, max_k, d),
            SeriesFilter::Normalise {
                buffer_size,
                s_k,
                max_k,
                d,
            } => exp_easy_mean(&running_median(data, buffer_size), s_k, max_k, d),
        }
    }
}

/// Edges shorter than half a window keep their raw values.
fn arithmetic_mean(data: &[f64], buffer_size: usize) -> Vec<f64> {
    let mut out = data.to_vec();
    if buffer_size == 0 || data.len() < buffer_size {
        return out;
    }
    let mut sum: f64 = data[..buffer_size].iter().sum();
    let shift = buffer_size / 2;
    for i in 0..data.len() - buffer_size {
        out[i + shift] = sum / buffer_size as f64;
        sum += data[i + buffer_size] - data[i];
    }
    out
}

/// The window starts filled with the first sample.
fn running_median(data: &[f64], buffer_size: usize) -> Vec<f64> {
    let Some(&first) = data.first() else {
        return Vec::new();
    };
    if buffer_size == 0 {
        return data.to_vec();
    }
    let mut window = std::collections::VecDeque::from(vec![first; buffer_size]);
    data.iter()
        .map(|&x| {
            window.pop_front();
            window.push_back(x);
            let values: Vec<f64> = window.iter().copied().collect();
            median_grouped(&values, 1.0).unwrap_or(x)
        })
        .collect()
}

fn exp_easy_mean(data: &[f64], s_k: f64, max_k: f64, d: f64) -> Vec<f64> {
    let Some(&first) = data.first() else {
        return Vec::new();
    };
    let mut fit = first;
    data.iter()
        .map(|&x| {
            let k = if (x - fit).abs() < d { s_k } else { max_k };
            fit += (x - fit) * k;
            fit
        })
        .collect()
}
