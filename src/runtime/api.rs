/*!
 * Parallel Adapters
 * Bisection-based for/reduce/scan and the sample-sort entry point
 *
 * Every adapter dispatches its root onto the pool and recurses with
 * `join`. The reduction tree mirrors the bisection tree, so results are
 * deterministic for a given length and worker count even under floats.
 */

use super::pool::{join, num_workers, run_on_pool};
use crate::core::limits::{
    GRAIN_DIVISOR, MIN_GRAIN, PAR_THRESHOLD_GROUPBY, PAR_THRESHOLD_HASH, PAR_THRESHOLD_JOIN,
    PAR_THRESHOLD_MINMAX, PAR_THRESHOLD_SORT, PAR_THRESHOLD_SUM,
};
use crate::core::types::Native;
use std::ops::Range;

/// Operation kinds with distinct parallelism thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Sum,
    Min,
    Max,
    Mean,
    Hash,
    Join,
    Sort,
    GroupBy,
}

/// Minimum element count before `op` leaves the calling thread
#[must_use]
pub fn parallel_threshold(op: OpKind) -> usize {
    match op {
        OpKind::Sum | OpKind::Mean => PAR_THRESHOLD_SUM,
        OpKind::Min | OpKind::Max => PAR_THRESHOLD_MINMAX,
        OpKind::Hash => PAR_THRESHOLD_HASH,
        OpKind::Join => PAR_THRESHOLD_JOIN,
        OpKind::Sort => PAR_THRESHOLD_SORT,
        OpKind::GroupBy => PAR_THRESHOLD_GROUPBY,
    }
}

/// True when `n` elements of `op` are worth scheduling on the pool
#[must_use]
pub fn should_parallelize(op: OpKind, n: usize) -> bool {
    n >= parallel_threshold(op) && num_workers() > 1
}

fn auto_grain(n: usize, grain: Option<usize>) -> usize {
    match grain {
        Some(g) => g.max(1),
        None => (n / (GRAIN_DIVISOR * num_workers()).max(1)).max(MIN_GRAIN),
    }
}

/// Run `body` over disjoint sub-ranges of `[0, n)` in parallel.
///
/// The range is bisected until a piece is at most `grain` elements (auto:
/// n / (4 * workers)). `body` must tolerate any interleaving across
/// sub-ranges; writes it performs to disjoint data are visible after the
/// call returns.
pub fn parallel_for<F>(n: usize, grain: Option<usize>, body: F)
where
    F: Fn(Range<usize>) + Sync,
{
    if n == 0 {
        return;
    }
    let grain = auto_grain(n, grain);
    if n <= grain || num_workers() < 2 {
        body(0..n);
        return;
    }
    run_on_pool(|| bisect_for(0, n, grain, &body));
}

fn bisect_for<F>(start: usize, end: usize, grain: usize, body: &F)
where
    F: Fn(Range<usize>) + Sync,
{
    if end - start <= grain {
        body(start..end);
        return;
    }
    let mid = start + (end - start) / 2;
    join(
        || bisect_for(start, mid, grain, body),
        || bisect_for(mid, end, grain, body),
    );
}

/// Tree reduction: `leaf` folds one sub-range, `combine` merges two
/// partial results. `combine` must be associative; commutativity is not
/// required because the merge order mirrors the recursion tree.
pub fn parallel_reduce<T, L, C>(n: usize, grain: Option<usize>, init: T, leaf: L, combine: C) -> T
where
    T: Send,
    L: Fn(Range<usize>) -> T + Sync,
    C: Fn(T, T) -> T + Sync,
{
    if n == 0 {
        return init;
    }
    let grain = auto_grain(n, grain);
    if n <= grain || num_workers() < 2 {
        return leaf(0..n);
    }
    run_on_pool(|| bisect_reduce(0, n, grain, &leaf, &combine))
}

fn bisect_reduce<T, L, C>(start: usize, end: usize, grain: usize, leaf: &L, combine: &C) -> T
where
    T: Send,
    L: Fn(Range<usize>) -> T + Sync,
    C: Fn(T, T) -> T + Sync,
{
    if end - start <= grain {
        return leaf(start..end);
    }
    let mid = start + (end - start) / 2;
    let (a, b) = join(
        || bisect_reduce(start, mid, grain, leaf, combine),
        || bisect_reduce(mid, end, grain, leaf, combine),
    );
    combine(a, b)
}

/// Shared mutable pointer for disjoint-range writes from parallel bodies
pub(crate) struct SendPtr<T>(pub(crate) *mut T);

unsafe impl<T> Send for SendPtr<T> {}
unsafe impl<T> Sync for SendPtr<T> {}

impl<T> SendPtr<T> {
    #[inline]
    pub(crate) fn get(&self) -> *mut T {
        self.0
    }
}

/// Inclusive prefix sum in three phases: per-chunk local prefix, exclusive
/// scan over chunk totals, per-chunk propagation.
pub fn parallel_scan<T: Native>(input: &[T], output: &mut [T]) {
    let n = input.len();
    debug_assert_eq!(n, output.len());
    if n == 0 {
        return;
    }
    let workers = num_workers();
    if workers < 2 || n < PAR_THRESHOLD_SUM {
        sequential_scan(input, output);
        return;
    }

    let chunks = workers * GRAIN_DIVISOR;
    let chunk_len = n.div_ceil(chunks);
    let chunks = n.div_ceil(chunk_len);

    // Phase 1: independent local prefixes per chunk
    let out_ptr = SendPtr(output.as_mut_ptr());
    let totals_store = {
        let mut totals = vec![T::default(); chunks];
        let totals_ptr = SendPtr(totals.as_mut_ptr());
        parallel_for(chunks, Some(1), |r| {
            for c in r {
                let lo = c * chunk_len;
                let hi = (lo + chunk_len).min(n);
                let mut acc = T::default();
                for i in lo..hi {
                    acc = acc.add_wrap(input[i]);
                    // SAFETY: chunks write disjoint output ranges
                    unsafe { *out_ptr.get().add(i) = acc };
                }
                // SAFETY: one writer per chunk total
                unsafe { *totals_ptr.get().add(c) = acc };
            }
        });
        totals
    };

    // Phase 2: exclusive scan of the chunk totals
    let mut offsets = vec![T::default(); chunks];
    let mut running = T::default();
    for (off, total) in offsets.iter_mut().zip(&totals_store) {
        *off = running;
        running = running.add_wrap(*total);
    }

    // Phase 3: add each chunk's offset to its local prefixes
    parallel_for(chunks, Some(1), |r| {
        for c in r {
            let off = offsets[c];
            if off == T::default() {
                continue;
            }
            let lo = c * chunk_len;
            let hi = (lo + chunk_len).min(n);
            for i in lo..hi {
                // SAFETY: disjoint ranges, as in phase 1
                unsafe {
                    let p = out_ptr.get().add(i);
                    *p = (*p).add_wrap(off);
                }
            }
        }
    });
}

fn sequential_scan<T: Native>(input: &[T], output: &mut [T]) {
    let mut acc = T::default();
    for (o, &v) in output.iter_mut().zip(input) {
        acc = acc.add_wrap(v);
        *o = acc;
    }
}

/// Parallel sample sort of an f64 slice, ascending
pub fn parallel_sort_f64(data: &mut [f64]) {
    // Sort the order-preserving keys, then map back in place
    let mut keys: Vec<u64> = data.iter().map(|v| v.ordered_bits()).collect();
    crate::sort::sample_sort(&mut keys);
    for (d, k) in data.iter_mut().zip(&keys) {
        const SIGN: u64 = 0x8000_0000_0000_0000;
        *d = if k & SIGN != 0 {
            f64::from_bits(k ^ SIGN)
        } else {
            f64::from_bits(!k)
        };
    }
}
