//! Entry points used by front-ends: run a benchmark, clear the cache.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::cache::ArrayCache;
use crate::config::BenchConfig;
use crate::error::Result;
use crate::metrics::{self, Metrics};
use crate::runner::{self, BenchmarkResult};

/// Baseline and current runs of one request with their derived metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub config: BenchConfig,
    /// Same configuration with `thread_count = 1`.
    pub baseline: BenchmarkResult,
    pub current: BenchmarkResult,
    pub metrics: Metrics,
    pub generated_at: DateTime<Utc>,
}

/// Benchmark engine bound to one [`ArrayCache`].
#[derive(Debug, Clone, Default)]
pub struct BenchEngine {
    cache: Arc<ArrayCache>,
}

impl BenchEngine {
    pub fn new(cache: Arc<ArrayCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<ArrayCache> {
        &self.cache
    }

    /// Coerces `raw` into a [`BenchConfig`] and runs it.
    ///
    /// Malformed fields never fail the call; they fall back to their defaults
    /// or are clamped into range.
    ///
    /// # Errors
    ///
    /// Returns the first execution fault of either run. No partial report is
    /// produced.
    pub fn run_benchmark(&self, raw: &Map<String, Value>) -> Result<RunReport> {
        self.run(BenchConfig::from_raw(raw))
    }

    /// Measures the single-worker baseline, then `config` itself.
    pub fn run(&self, config: BenchConfig) -> Result<RunReport> {
        let baseline = runner::measure(&self.cache, &config.with_thread_count(1))?;
        let current = runner::measure(&self.cache, &config)?;
        let metrics = metrics::compute(&baseline, &current, config.thread_count);

        info!(
            thread_count = config.thread_count,
            chunk_size = config.chunk_size,
            matrix_size = config.matrix_size,
            repeats = config.repeats,
            speedup = metrics.speedup,
            efficiency = metrics.efficiency,
            "benchmark complete"
        );

        Ok(RunReport {
            config,
            baseline,
            current,
            metrics,
            generated_at: Utc::now(),
        })
    }

    /// Empties the array cache. Idempotent.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_report_uses_clamped_config() {
        let engine = BenchEngine::default();
        let report = engine
            .run_benchmark(&raw(json!({
                "thread_count": 2,
                "chunk_size": 64,
                "matrix_size": 50,
                "repeats": 2,
            })))
            .unwrap();

        assert_eq!(report.config.matrix_size, 128);
        assert_eq!(report.baseline.repeats, 2);
        assert_eq!(report.current.repeats, 2);
        assert_eq!(report.metrics.baseline_median_s, report.baseline.median);
        assert_eq!(report.metrics.current_median_s, report.current.median);
    }

    #[test]
    fn test_baseline_and_current_share_buffers() {
        let engine = BenchEngine::default();
        engine
            .run_benchmark(&raw(json!({"thread_count": 3, "matrix_size": 128, "repeats": 1})))
            .unwrap();
        assert_eq!(engine.cache().generations(), 1);
    }

    #[test]
    fn test_clear_cache_on_fresh_engine() {
        let engine = BenchEngine::new(Arc::new(ArrayCache::new()));
        engine.clear_cache();
        assert!(engine.cache().is_empty());
    }
}
