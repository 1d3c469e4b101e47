//! The fixed elementwise benchmark workload.
//!
//! For every element of a chunk's rows:
//!
//! ```text
//! OUT[r, c] = A[r, c] * B[r, c] + sin(A[r, c]) - sqrt(|B[r, c]|)
//! ```
//!
//! The kernel is branch-free and streams three buffers, so its cost grows
//! linearly with the number of rows in the chunk. It touches nothing outside
//! the output view it is given.

use ndarray::{s, Array2, ArrayView2, ArrayViewMut2, Zip};

use crate::planner::ChunkRange;

/// Evaluates the kernel for a single element pair.
#[inline(always)]
pub fn element(a: f32, b: f32) -> f32 {
    a * b + a.sin() - b.abs().sqrt()
}

/// Applies the kernel to the rows of `range`.
///
/// `out_rows` is the mutable view of exactly those rows of the output buffer,
/// so concurrent calls over disjoint ranges never alias.
///
/// # Panics
///
/// Panics if `out_rows` does not have `range.len()` rows and the column count
/// of `a` and `b`.
pub fn apply(
    a: ArrayView2<'_, f32>,
    b: ArrayView2<'_, f32>,
    mut out_rows: ArrayViewMut2<'_, f32>,
    range: ChunkRange,
) {
    let a_rows = a.slice(s![range.rows(), ..]);
    let b_rows = b.slice(s![range.rows(), ..]);

    Zip::from(&mut out_rows)
        .and(&a_rows)
        .and(&b_rows)
        .for_each(|o, &a, &b| *o = element(a, b));
}

/// Applies the kernel to `range` of a whole output buffer.
pub fn apply_in_place(a: &Array2<f32>, b: &Array2<f32>, out: &mut Array2<f32>, range: ChunkRange) {
    let out_rows = out.slice_mut(s![range.rows(), ..]);
    apply(a.view(), b.view(), out_rows, range);
}
