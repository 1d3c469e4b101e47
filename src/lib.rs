//! Parallel speedup measurement for a fixed memory-bound `f32` kernel.
//!
//! A request names a worker count, a chunk size, a matrix size and a repeat
//! count. The engine times the kernel over the whole matrix once with a single
//! worker and once with the requested pool, and reports the speedup and
//! efficiency between the two medians.
//!
//! ```no_run
//! use parscale::BenchEngine;
//! use serde_json::json;
//!
//! let engine = BenchEngine::default();
//! let raw = json!({"thread_count": 8, "matrix_size": 2048});
//! let report = engine.run_benchmark(raw.as_object().unwrap())?;
//! println!("speedup {:.2}x", report.metrics.speedup);
//! # Ok::<(), parscale::error::BenchError>(())
//! ```

pub mod cache;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod kernel;
pub mod metrics;
pub mod planner;
pub mod runner;
pub mod utils;

pub use cache::{ArrayCache, MatrixTriple};
pub use config::BenchConfig;
pub use engine::{BenchEngine, RunReport};
pub use error::{BenchError, Result};
pub use runner::BenchmarkResult;

/// Seed shared by every generated matrix, whatever its size.
pub const SEED: u64 = 42;
