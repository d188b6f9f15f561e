//! Descriptive statistics and frequency bins for per-interval samples
//!
//! Used for TCP interval throughput and ping round-trip times, where every line of a log
//! is one observation rather than one summary per run.

use serde::{Deserialize, Serialize};

/// Summary of a series of observations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Description {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1); absent below two observations
    pub std: Option<f64>,
    pub min: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub max: f64,
}

impl Description {
    /// Describe a series; `None` when it is empty
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;
        let std = if count > 1 {
            let var = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
            Some(var.sqrt())
        } else {
            None
        };

        Some(Self {
            count,
            mean,
            std,
            min: sorted[0],
            p25: quantile_sorted(&sorted, 0.25),
            p50: quantile_sorted(&sorted, 0.50),
            p75: quantile_sorted(&sorted, 0.75),
            max: sorted[count - 1],
        })
    }
}

/// Linear-interpolated quantile of an ascending, non-empty slice
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = (sorted.len() - 1) as f64 * q;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Observation count for one `(lo, hi]` bin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinCount {
    pub lo: f64,
    pub hi: f64,
    pub count: usize,
}

/// `n` evenly spaced points from `start` to `end`, both included
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// Count observations per bin
///
/// Bins are `(edges[i], edges[i + 1]]`, except that the first bin also takes values equal
/// to its lower edge. Values outside `[edges[0], edges[last]]` are not counted.
pub fn frequency_bins(values: &[f64], edges: &[f64]) -> Vec<BinCount> {
    let mut bins: Vec<BinCount> = edges
        .windows(2)
        .map(|w| BinCount {
            lo: w[0],
            hi: w[1],
            count: 0,
        })
        .collect();

    if bins.is_empty() {
        return bins;
    }

    for &value in values {
        if value == bins[0].lo {
            bins[0].count += 1;
            continue;
        }
        if let Some(bin) = bins.iter_mut().find(|b| b.lo < value && value <= b.hi) {
            bin.count += 1;
        }
    }

    bins
}

/// Keep values within `[lo, hi]`
pub fn filter_range(values: &[f64], lo: f64, hi: f64) -> Vec<f64> {
    values.iter().copied().filter(|v| (lo..=hi).contains(v)).collect()
}
