//! Speedup and efficiency of a run against its single-worker baseline.

use serde::Serialize;

use crate::runner::BenchmarkResult;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    pub baseline_median_s: f64,
    pub current_median_s: f64,
    pub speedup: f64,
    pub efficiency: f64,
}

/// `speedup = t1 / tp` and `efficiency = speedup / thread_count`.
///
/// Both fall back to `0.0` when their denominator is not positive.
pub fn compute(baseline: &BenchmarkResult, current: &BenchmarkResult, thread_count: usize) -> Metrics {
    let t1 = baseline.median;
    let tp = current.median;

    let speedup = if tp > 0.0 { t1 / tp } else { 0.0 };
    let efficiency = if thread_count > 0 {
        speedup / thread_count as f64
    } else {
        0.0
    };

    Metrics {
        baseline_median_s: t1,
        current_median_s: tp,
        speedup,
        efficiency,
    }
}
