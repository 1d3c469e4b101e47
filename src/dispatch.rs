//! Sequential and pooled execution of one benchmark pass.
//!
//! The output buffer is split into one mutable row view per chunk with
//! `split_at`, so each task owns its rows outright and the kernel needs no
//! locking. This only works when the plan partitions the rows, which
//! [`run_pass_with`] checks before touching the buffer.
//!
//! The pooled path builds a rayon pool of `min(thread_count, chunks)` threads,
//! spawns one task per chunk in a scope and waits for all of them. The clock
//! starts right before the first task is submitted and stops once the scope
//! has joined every task. The pool is built before the clock starts, so
//! pooled samples leave out worker thread start-up and measure only
//! submission through the barrier.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use ndarray::{ArrayView2, ArrayViewMut2, Axis};
use parking_lot::Mutex;
use rayon::ThreadPoolBuilder;
use tracing::{debug, warn};

use crate::error::{invalid_plan, shape_error, task_fault, BenchError, Result};
use crate::kernel;
use crate::planner::{is_partition, ChunkRange};

/// Runs [`kernel::apply`] over every chunk and returns the elapsed seconds.
///
/// `thread_count <= 1` runs the chunks in order on the calling thread; any
/// larger value uses a bounded worker pool.
///
/// # Errors
///
/// * [`BenchError::InvalidPlan`] if `ranges` does not partition the rows of `out`.
/// * [`BenchError::ShapeError`] if `a`, `b` and `out` differ in shape.
/// * [`BenchError::WorkerPool`] if the pool cannot be built.
/// * [`BenchError::TaskFault`] for the first chunk task that fails.
pub fn run_pass(
    a: ArrayView2<'_, f32>,
    b: ArrayView2<'_, f32>,
    out: ArrayViewMut2<'_, f32>,
    ranges: &[ChunkRange],
    thread_count: usize,
) -> Result<f64> {
    run_pass_with(a, b, out, ranges, thread_count, kernel::apply)
}

/// Same as [`run_pass`] with a caller-supplied per-chunk task.
pub fn run_pass_with<F>(
    a: ArrayView2<'_, f32>,
    b: ArrayView2<'_, f32>,
    out: ArrayViewMut2<'_, f32>,
    ranges: &[ChunkRange],
    thread_count: usize,
    task: F,
) -> Result<f64>
where
    F: Fn(ArrayView2<'_, f32>, ArrayView2<'_, f32>, ArrayViewMut2<'_, f32>, ChunkRange) + Sync,
{
    if a.dim() != out.dim() || b.dim() != out.dim() {
        return Err(shape_error(format!(
            "A {:?}, B {:?} and OUT {:?} must have the same shape",
            a.dim(),
            b.dim(),
            out.dim()
        )));
    }

    let rows = out.nrows();
    if !is_partition(rows, ranges) {
        return Err(invalid_plan(
            rows,
            "chunks must be contiguous, non-empty and cover every row",
        ));
    }

    let chunks = split_rows(out, ranges);
    if chunks.is_empty() {
        return Ok(0.0);
    }

    if thread_count <= 1 {
        run_sequential(a, b, chunks, &task)
    } else {
        run_pooled(a, b, chunks, thread_count, &task)
    }
}

/// Splits `out` into one disjoint view per range. `ranges` must partition the rows.
fn split_rows<'a>(
    out: ArrayViewMut2<'a, f32>,
    ranges: &[ChunkRange],
) -> Vec<(ChunkRange, ArrayViewMut2<'a, f32>)> {
    let mut chunks = Vec::with_capacity(ranges.len());
    let mut rest = out;

    for &range in ranges {
        let (head, tail) = rest.split_at(Axis(0), range.len());
        chunks.push((range, head));
        rest = tail;
    }

    chunks
}

fn run_sequential<F>(
    a: ArrayView2<'_, f32>,
    b: ArrayView2<'_, f32>,
    chunks: Vec<(ChunkRange, ArrayViewMut2<'_, f32>)>,
    task: &F,
) -> Result<f64>
where
    F: Fn(ArrayView2<'_, f32>, ArrayView2<'_, f32>, ArrayViewMut2<'_, f32>, ChunkRange) + Sync,
{
    let started = Instant::now();
    for (range, rows) in chunks {
        run_task(task, a, b, rows, range)?;
    }
    Ok(started.elapsed().as_secs_f64())
}

fn run_pooled<F>(
    a: ArrayView2<'_, f32>,
    b: ArrayView2<'_, f32>,
    chunks: Vec<(ChunkRange, ArrayViewMut2<'_, f32>)>,
    thread_count: usize,
    task: &F,
) -> Result<f64>
where
    F: Fn(ArrayView2<'_, f32>, ArrayView2<'_, f32>, ArrayViewMut2<'_, f32>, ChunkRange) + Sync,
{
    let workers = thread_count.min(chunks.len());
    let pool = ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("parscale-worker-{i}"))
        .build()?;
    debug!(workers, chunks = chunks.len(), "built worker pool");

    let first_fault: Mutex<Option<BenchError>> = Mutex::new(None);

    let started = Instant::now();
    pool.scope(|scope| {
        for (range, rows) in chunks {
            let first_fault = &first_fault;
            scope.spawn(move |_| {
                if let Err(err) = run_task(task, a, b, rows, range) {
                    let mut slot = first_fault.lock();
                    if slot.is_none() {
                        *slot = Some(err);
                    }
                }
            });
        }
    });
    let elapsed = started.elapsed().as_secs_f64();

    match first_fault.into_inner() {
        Some(err) => Err(err),
        None => Ok(elapsed),
    }
}

fn run_task<F>(
    task: &F,
    a: ArrayView2<'_, f32>,
    b: ArrayView2<'_, f32>,
    rows: ArrayViewMut2<'_, f32>,
    range: ChunkRange,
) -> Result<()>
where
    F: Fn(ArrayView2<'_, f32>, ArrayView2<'_, f32>, ArrayViewMut2<'_, f32>, ChunkRange),
{
    panic::catch_unwind(AssertUnwindSafe(|| task(a, b, rows, range))).map_err(|payload| {
        let message = panic_message(payload.as_ref());
        warn!(start = range.start, end = range.end, %message, "chunk task faulted");
        task_fault(range.start, range.end, message)
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "chunk task panicked".to_string()
    }
}
