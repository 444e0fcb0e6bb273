/*!
 * Parallel Sample Sort
 * Splitter-based partitioning with per-bucket parallel sequential sorts
 *
 * Oversamples the input to derive workers-1 splitters, buckets every
 * element with one counting pass, then sorts the buckets concurrently
 * with the sequential quicksort. Falls back to the sequential sort below
 * the parallel threshold or on a single-worker pool.
 */

use super::pair::{quicksort, Keyed};
use crate::core::limits::{PAR_THRESHOLD_SORT, SAMPLE_SORT_OVERSAMPLE};
use crate::runtime;

/// Sort records by key, using the worker pool for large inputs
pub fn sample_sort<T: Keyed + Send>(data: &mut [T]) {
    let workers = runtime::num_workers();
    if data.len() < PAR_THRESHOLD_SORT || workers < 2 {
        quicksort(data);
        return;
    }

    let buckets = workers;
    let sample_count = (buckets * SAMPLE_SORT_OVERSAMPLE).min(data.len());
    let stride = data.len() / sample_count;
    let mut sample: Vec<u64> = (0..sample_count).map(|i| data[i * stride].key()).collect();
    sample.sort_unstable();

    let splitters: Vec<u64> = (1..buckets)
        .map(|b| sample[b * sample_count / buckets])
        .collect();

    // Counting pass: bucket id per element, histogram, exclusive offsets
    let bucket_of: Vec<u32> = data
        .iter()
        .map(|v| splitters.partition_point(|&s| s <= v.key()) as u32)
        .collect();
    let mut counts = vec![0usize; buckets];
    for &b in &bucket_of {
        counts[b as usize] += 1;
    }
    let mut offsets = vec![0usize; buckets + 1];
    for b in 0..buckets {
        offsets[b + 1] = offsets[b] + counts[b];
    }

    // Scatter into bucket order through a scratch copy
    let mut cursor = offsets.clone();
    let scratch: Vec<T> = data.to_vec();
    for (v, &b) in scratch.iter().zip(&bucket_of) {
        data[cursor[b as usize]] = *v;
        cursor[b as usize] += 1;
    }

    sort_ranges(data, &offsets, 0);
}

/// Recursively bisect the bucket list, sorting each bucket sequentially.
/// `offsets` holds buckets+1 absolute boundaries; `base` is the absolute
/// position of `data[0]`.
fn sort_ranges<T: Keyed + Send>(data: &mut [T], offsets: &[usize], base: usize) {
    let buckets = offsets.len() - 1;
    if buckets == 1 {
        quicksort(data);
        return;
    }
    let mid = buckets / 2;
    let split = offsets[mid] - base;
    let (lo, hi) = data.split_at_mut(split);
    runtime::join(
        || sort_ranges(lo, &offsets[..=mid], base),
        || sort_ranges(hi, &offsets[mid..], offsets[mid]),
    );
}
