//! Repeated timing of full kernel passes.

use serde::Serialize;
use statrs::statistics::{Data, Max, Median, Min};
use tracing::debug;

use crate::cache::{ArrayCache, MatrixTriple};
use crate::config::BenchConfig;
use crate::dispatch::run_pass;
use crate::error::Result;
use crate::planner::plan;

/// Timings of the repeated passes of one run, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkResult {
    pub times: Vec<f64>,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub repeats: usize,
}

impl BenchmarkResult {
    /// Summarizes `times`. The median of an even count is the mean of the two
    /// middle samples.
    ///
    /// # Panics
    ///
    /// Panics if `times` is empty.
    pub fn from_samples(times: Vec<f64>) -> Self {
        assert!(!times.is_empty(), "at least one timing sample is required");

        let data = Data::new(times.clone());
        Self {
            median: data.median(),
            min: data.min(),
            max: data.max(),
            repeats: times.len(),
            times,
        }
    }
}

/// Fetches the buffers for `config.matrix_size` from `cache` and measures them.
pub fn measure(cache: &ArrayCache, config: &BenchConfig) -> Result<BenchmarkResult> {
    let triple = cache.get_or_create(config.matrix_size)?;
    measure_triple(&triple, config)
}

/// Runs one untimed warm-up pass, then `config.repeats` timed passes.
///
/// The output buffer stays locked for the whole measurement, so passes of
/// concurrent runs at the same size never interleave.
pub fn measure_triple(triple: &MatrixTriple, config: &BenchConfig) -> Result<BenchmarkResult> {
    let ranges = plan(triple.n(), config.chunk_size);
    let a = triple.a().view();
    let b = triple.b().view();
    let mut out = triple.lock_out();

    // warm-up
    run_pass(a, b, out.view_mut(), &ranges, config.thread_count)?;

    let mut times = Vec::with_capacity(config.repeats);
    for _ in 0..config.repeats {
        times.push(run_pass(a, b, out.view_mut(), &ranges, config.thread_count)?);
    }

    let result = BenchmarkResult::from_samples(times);
    debug!(
        thread_count = config.thread_count,
        chunk_size = config.chunk_size,
        matrix_size = config.matrix_size,
        chunks = ranges.len(),
        median_s = result.median,
        "measured run"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel;

    fn close(x: f64, y: f64) -> bool {
        (x - y).abs() < 1e-12
    }

    #[test]
    fn test_from_samples_odd() {
        let result = BenchmarkResult::from_samples(vec![0.3, 0.1, 0.2]);
        assert!(close(result.median, 0.2));
        assert!(close(result.min, 0.1));
        assert!(close(result.max, 0.3));
        assert_eq!(result.repeats, 3);
        assert_eq!(result.times, vec![0.3, 0.1, 0.2]);
    }

    #[test]
    fn test_from_samples_even() {
        let result = BenchmarkResult::from_samples(vec![4.0, 1.0, 3.0, 2.0]);
        assert!(close(result.median, 2.5));
        assert!(close(result.min, 1.0));
        assert!(close(result.max, 4.0));
    }

    #[test]
    fn test_from_samples_single() {
        let result = BenchmarkResult::from_samples(vec![0.5]);
        assert!(close(result.median, 0.5));
        assert!(close(result.min, 0.5));
        assert!(close(result.max, 0.5));
    }

    #[test]
    #[should_panic(expected = "at least one timing sample")]
    fn test_from_samples_empty_panics() {
        BenchmarkResult::from_samples(Vec::new());
    }

    #[test]
    fn test_measure_collects_one_sample_per_repeat() {
        let cache = ArrayCache::new();
        let config = BenchConfig {
            thread_count: 2,
            chunk_size: 16,
            matrix_size: 64,
            repeats: 3,
        };

        let result = measure(&cache, &config).unwrap();

        assert_eq!(result.repeats, 3);
        assert_eq!(result.times.len(), 3);
        assert!(result.times.iter().all(|&t| t > 0.0));
        assert!(result.min <= result.median && result.median <= result.max);
        assert_eq!(cache.generations(), 1);
    }

    #[test]
    fn test_measure_fills_output_buffer() {
        let cache = ArrayCache::new();
        let config = BenchConfig {
            thread_count: 3,
            chunk_size: 5,
            matrix_size: 32,
            repeats: 1,
        };
        measure(&cache, &config).unwrap();

        let triple = cache.get_or_create(32).unwrap();
        let out = triple.snapshot_out();
        let (a, b) = (triple.a(), triple.b());
        for ((r, c), &value) in out.indexed_iter() {
            assert_eq!(value, kernel::element(a[[r, c]], b[[r, c]]));
        }
    }
}
