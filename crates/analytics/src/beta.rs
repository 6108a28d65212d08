use crate::stats::{covariance, mean, variance};
use core_types::ReturnSeries;
use std::cmp::Ordering;

/// Fewest overlapping returns a regression is attempted on.
pub const DEFAULT_MIN_SAMPLES: usize = 10;

/// Estimates the beta of an asset against a benchmark:
/// `β = Cov(asset, bench) / Var(bench)` over their shared trailing window.
///
/// Numeric degeneracy is never an error. A window shorter than
/// `min_samples`, a flat benchmark or a flat asset all yield `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BetaEstimator {
    min_samples: usize,
}

impl BetaEstimator {
    pub const fn new(min_samples: usize) -> Self {
        Self { min_samples }
    }

    /// Regresses `asset` on `bench`.
    ///
    /// Both inputs are aligned from their ends, so callers must make sure the
    /// last element of each refers to the same day.
    pub fn estimate(&self, asset: &[f64], bench: &[f64]) -> Option<f64> {
        let n = asset.len().min(bench.len());
        if n < self.min_samples.max(2) {
            return None;
        }
        let asset = &asset[asset.len() - n..];
        let bench = &bench[bench.len() - n..];

        let var_bench = variance(bench).ok()?;
        if is_flat(bench, var_bench) {
            return None;
        }
        // A flat asset has no co-movement to measure.
        if is_flat(asset, variance(asset).ok()?) {
            return None;
        }

        let beta = covariance(asset, bench).ok()? / var_bench;
        beta.is_finite().then_some(beta)
    }

    /// Regresses two return series. Dated series are paired by calendar day,
    /// undated ones from their ends.
    pub fn estimate_series(&self, asset: &ReturnSeries, bench: &ReturnSeries) -> Option<f64> {
        match align_on_dates(asset, bench) {
            Some((asset, bench)) => self.estimate(&asset, &bench),
            None => self.estimate(asset.values(), bench.values()),
        }
    }
}

/// Whether a series' variance is indistinguishable from rounding noise.
///
/// Summing `(x - mean)^2` over identical values leaves a residue around
/// `EPSILON * mean^2` rather than an exact zero.
fn is_flat(values: &[f64], var: f64) -> bool {
    if !var.is_finite() {
        return true;
    }
    let m = mean(values).unwrap_or(0.0);
    var <= f64::EPSILON * (m * m).max(f64::MIN_POSITIVE)
}

/// Keeps only the days both series have a return for, in date order.
///
/// Returns `None` unless both series are dated.
pub fn align_on_dates(asset: &ReturnSeries, bench: &ReturnSeries) -> Option<(Vec<f64>, Vec<f64>)> {
    if !asset.is_dated() || !bench.is_dated() {
        return None;
    }
    let (a_dates, b_dates) = (asset.dates(), bench.dates());
    let (a_vals, b_vals) = (asset.values(), bench.values());

    let mut paired_asset = Vec::with_capacity(a_vals.len().min(b_vals.len()));
    let mut paired_bench = Vec::with_capacity(paired_asset.capacity());
    let (mut i, mut j) = (0, 0);
    while i < a_dates.len() && j < b_dates.len() {
        match a_dates[i].cmp(&b_dates[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                paired_asset.push(a_vals[i]);
                paired_bench.push(b_vals[j]);
                i += 1;
                j += 1;
            }
        }
    }
    Some((paired_asset, paired_bench))
}

impl Default for BetaEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_SAMPLES)
    }
}

/// Beta with the default sample floor.
pub fn beta(asset: &[f64], bench: &[f64]) -> Option<f64> {
    BetaEstimator::default().estimate(asset, bench)
}
