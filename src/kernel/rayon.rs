//! Rayon-parallel surface fill (feature-gated).
//!
//! Rows of the correlation surface are independent, so they are filled in
//! parallel with each worker writing its own disjoint row slice. The result
//! is bit-identical to the sequential fill.

use rayon::prelude::*;

/// Fills `scores` (row-major, `width` cells per row) across the rayon pool;
/// `fill` receives the row index and that row's slice.
pub(crate) fn fill_rows_par<F>(scores: &mut [f32], width: usize, fill: F)
where
    F: Fn(usize, &mut [f32]) + Sync + Send,
{
    scores
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| fill(y, row));
}
