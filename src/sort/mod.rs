/*!
 * Sort Engine
 *
 * Radix and quicksort paths over order-preserving u64 keys.
 *
 * # Module Organization
 *
 * - **radix**: stable LSD radix sort; the primary sort/argsort path
 * - **pair**: block-partition quicksort backing the sample-sort buckets
 * - **sample**: parallel sample sort for large inputs
 */

pub mod pair;
pub mod radix;
pub mod sample;

pub use pair::{quicksort, Keyed};
pub use radix::{argsort, build_pairs, radix_sort_pairs, sort_f64, sort_i64, SortPair};
pub use sample::sample_sort;

use crate::core::limits::PAR_THRESHOLD_SORT;
use crate::core::types::Native;
use crate::runtime;

/// Argsort that routes large inputs through the parallel sample sort
#[must_use]
pub fn argsort_parallel<T: Native>(data: &[T], ascending: bool) -> Vec<u32> {
    if data.len() < PAR_THRESHOLD_SORT || runtime::num_workers() < 2 {
        return argsort(data, ascending);
    }
    let mut pairs = build_pairs(data);
    sample_sort(&mut pairs);
    let mut out: Vec<u32> = pairs.into_iter().map(|p| p.idx).collect();
    if !ascending {
        out.reverse();
    }
    out
}
