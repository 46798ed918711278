//! Row iteration, parallel under the `parallel` feature.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Calls `f(y, row)` for every `row_len`-sample row of `dst`.
#[cfg(feature = "parallel")]
pub(crate) fn for_each_row<F>(dst: &mut [f32], row_len: usize, f: F)
where
    F: Fn(usize, &mut [f32]) + Sync + Send,
{
    if row_len == 0 {
        return;
    }
    dst.par_chunks_mut(row_len).enumerate().for_each(|(y, row)| f(y, row));
}

/// Calls `f(y, row)` for every `row_len`-sample row of `dst`.
#[cfg(not(feature = "parallel"))]
pub(crate) fn for_each_row<F>(dst: &mut [f32], row_len: usize, f: F)
where
    F: Fn(usize, &mut [f32]),
{
    if row_len == 0 {
        return;
    }
    dst.chunks_mut(row_len).enumerate().for_each(|(y, row)| f(y, row));
}
