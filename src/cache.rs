//! Memoized benchmark buffers keyed by matrix dimension.
//!
//! Generating two `4096 x 4096` normal matrices takes far longer than a pass
//! of the kernel, so the buffers for each size are created once and reused by
//! every later benchmark at that size.
//!
//! # Locking
//!
//! The map lock is held only while looking up or inserting the per-size slot.
//! Generation happens under the slot's own lock, so two callers asking for the
//! same `n` produce a single generation while callers asking for different
//! sizes proceed independently. Triples are handed out as
//! `Arc<MatrixTriple>`, which keeps them alive for in-flight benchmarks even
//! after [`ArrayCache::clear`] drops the cache's reference.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use ndarray::Array2;
use parking_lot::{Mutex, MutexGuard};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::error::{allocation_error, Result};
use crate::utils::{try_alloc_normal_f32_vec, try_alloc_zeroed_f32_vec};
use crate::SEED;

/// The `(A, B, OUT)` buffers for one square matrix dimension.
#[derive(Debug)]
pub struct MatrixTriple {
    n: usize,
    a: Array2<f32>,
    b: Array2<f32>,
    out: Mutex<Array2<f32>>,
}

impl MatrixTriple {
    /// Generates `A` then `B` from a generator seeded with [`SEED`], and a
    /// zeroed `OUT`, all `n x n`.
    pub fn generate(n: usize) -> Result<Self> {
        let len = n
            .checked_mul(n)
            .ok_or_else(|| allocation_error(usize::MAX, "matrix size overflow"))?;

        let mut rng = StdRng::seed_from_u64(SEED);
        let a = Array2::from_shape_vec((n, n), try_alloc_normal_f32_vec(len, &mut rng)?)?;
        let b = Array2::from_shape_vec((n, n), try_alloc_normal_f32_vec(len, &mut rng)?)?;
        let out = Array2::from_shape_vec((n, n), try_alloc_zeroed_f32_vec(len)?)?;

        Ok(Self {
            n,
            a,
            b,
            out: Mutex::new(out),
        })
    }

    /// Square dimension of every buffer.
    pub fn n(&self) -> usize {
        self.n
    }

    pub fn a(&self) -> &Array2<f32> {
        &self.a
    }

    pub fn b(&self) -> &Array2<f32> {
        &self.b
    }

    /// Locks the output buffer for the duration of a measurement.
    pub fn lock_out(&self) -> MutexGuard<'_, Array2<f32>> {
        self.out.lock()
    }

    /// Copies the current output buffer.
    pub fn snapshot_out(&self) -> Array2<f32> {
        self.out.lock().clone()
    }
}

type Slot = Arc<Mutex<Option<Arc<MatrixTriple>>>>;

/// Process-lifetime cache of [`MatrixTriple`]s.
///
/// Construct one per process and share it through an `Arc`; tests build
/// isolated instances.
#[derive(Debug, Default)]
pub struct ArrayCache {
    slots: Mutex<HashMap<usize, Slot>>,
    generations: AtomicU64,
}

impl ArrayCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the triple for `n`, generating it on first use.
    ///
    /// # Errors
    ///
    /// Returns an allocation error if the buffers cannot be created. The slot
    /// reserved for `n` is removed again, so a later call retries.
    pub fn get_or_create(&self, n: usize) -> Result<Arc<MatrixTriple>> {
        let slot = {
            let mut slots = self.slots.lock();
            Arc::clone(slots.entry(n).or_default())
        };

        let mut entry = slot.lock();
        if let Some(triple) = entry.as_ref() {
            return Ok(Arc::clone(triple));
        }

        let started = Instant::now();
        let triple = match MatrixTriple::generate(n) {
            Ok(triple) => Arc::new(triple),
            Err(err) => {
                let mut slots = self.slots.lock();
                if slots.get(&n).is_some_and(|current| Arc::ptr_eq(current, &slot)) {
                    slots.remove(&n);
                }
                return Err(err);
            }
        };
        let generation = self.generations.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(
            n,
            generation,
            elapsed_ms = started.elapsed().as_secs_f64() * 1e3,
            "generated benchmark matrices"
        );

        *entry = Some(Arc::clone(&triple));
        Ok(triple)
    }

    /// Drops every cached triple. Triples already handed out stay valid.
    pub fn clear(&self) {
        let dropped = {
            let mut slots = self.slots.lock();
            let dropped = slots.len();
            slots.clear();
            dropped
        };
        debug!(dropped, "cleared array cache");
    }

    /// Number of sizes with a slot, generated or in progress.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if a generated triple for `n` is cached.
    pub fn contains(&self, n: usize) -> bool {
        let slot = self.slots.lock().get(&n).cloned();
        match slot {
            Some(slot) => {
                let generated = slot.lock().is_some();
                generated
            }
            None => false,
        }
    }

    /// Total number of matrix generations performed by this cache.
    pub fn generations(&self) -> u64 {
        self.generations.load(Ordering::Relaxed)
    }
}
