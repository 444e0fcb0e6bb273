/*!
 * Scatter Aggregation Kernels
 * out[group_id[i]] op= data[i] for group-by accumulation
 *
 * The write pattern is data-dependent random access, so the bodies stay
 * scalar; throughput comes from the accumulator layout (dense group arrays)
 * rather than vector lanes. Out-of-range group IDs are skipped, not errors.
 */

use crate::core::types::Native;

pub fn scatter_sum<T: Native>(group_ids: &[u32], data: &[T], out: &mut [T]) {
    debug_assert_eq!(group_ids.len(), data.len());
    let n = out.len() as u32;
    for (&g, &v) in group_ids.iter().zip(data) {
        if g < n {
            out[g as usize] = out[g as usize].add_wrap(v);
        }
    }
}

/// Min buckets must be pre-initialized to `T::MIN_IDENTITY`
pub fn scatter_min<T: Native>(group_ids: &[u32], data: &[T], out: &mut [T]) {
    debug_assert_eq!(group_ids.len(), data.len());
    let n = out.len() as u32;
    for (&g, &v) in group_ids.iter().zip(data) {
        if g < n {
            out[g as usize] = out[g as usize].min2(v);
        }
    }
}

/// Max buckets must be pre-initialized to `T::MAX_IDENTITY`
pub fn scatter_max<T: Native>(group_ids: &[u32], data: &[T], out: &mut [T]) {
    debug_assert_eq!(group_ids.len(), data.len());
    let n = out.len() as u32;
    for (&g, &v) in group_ids.iter().zip(data) {
        if g < n {
            out[g as usize] = out[g as usize].max2(v);
        }
    }
}

pub fn scatter_count(group_ids: &[u32], out: &mut [u64]) {
    let n = out.len() as u32;
    for &g in group_ids {
        if g < n {
            out[g as usize] += 1;
        }
    }
}

/// Sum and count in one pass; mean = sum / count per group afterwards
pub fn scatter_sum_count<T: Native>(
    group_ids: &[u32],
    data: &[T],
    sums: &mut [T],
    counts: &mut [u64],
) {
    debug_assert_eq!(sums.len(), counts.len());
    let n = sums.len() as u32;
    for (&g, &v) in group_ids.iter().zip(data) {
        if g < n {
            sums[g as usize] = sums[g as usize].add_wrap(v);
            counts[g as usize] += 1;
        }
    }
}

/// sum + min + max + count in a single pass over the data
pub fn scatter_multi<T: Native>(
    group_ids: &[u32],
    data: &[T],
    sums: &mut [T],
    mins: &mut [T],
    maxs: &mut [T],
    counts: &mut [u64],
) {
    let n = sums.len() as u32;
    debug_assert!(mins.len() == sums.len() && maxs.len() == sums.len() && counts.len() == sums.len());
    for (&g, &v) in group_ids.iter().zip(data) {
        if g < n {
            let gi = g as usize;
            sums[gi] = sums[gi].add_wrap(v);
            mins[gi] = mins[gi].min2(v);
            maxs[gi] = maxs[gi].max2(v);
            counts[gi] += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scatter_sum() {
        let gids = [0u32, 1, 0, 2, 1];
        let data = [1.0f64, 2.0, 3.0, 4.0, 5.0];
        let mut out = vec![0.0f64; 3];
        scatter_sum(&gids, &data, &mut out);
        assert_eq!(out, vec![4.0, 7.0, 4.0]);
    }

    #[test]
    fn test_scatter_min_max() {
        let gids = [0u32, 0, 1, 1];
        let data = [5i64, -3, 10, 2];
        let mut mins = vec![i64::MAX; 2];
        let mut maxs = vec![i64::MIN; 2];
        scatter_min(&gids, &data, &mut mins);
        scatter_max(&gids, &data, &mut maxs);
        assert_eq!(mins, vec![-3, 2]);
        assert_eq!(maxs, vec![5, 10]);
    }

    #[test]
    fn test_out_of_range_skipped() {
        let gids = [0u32, 99, 1];
        let data = [1.0f64, 2.0, 3.0];
        let mut out = vec![0.0f64; 2];
        scatter_sum(&gids, &data, &mut out);
        assert_eq!(out, vec![1.0, 3.0]);

        let mut counts = vec![0u64; 2];
        scatter_count(&gids, &mut counts);
        assert_eq!(counts, vec![1, 1]);
    }

    #[test]
    fn test_scatter_multi_single_pass() {
        let gids = [0u32, 1, 0, 1, 0];
        let data = [3.0f64, 8.0, -1.0, 2.0, 4.0];
        let mut sums = vec![0.0f64; 2];
        let mut mins = vec![f64::INFINITY; 2];
        let mut maxs = vec![f64::NEG_INFINITY; 2];
        let mut counts = vec![0u64; 2];
        scatter_multi(&gids, &data, &mut sums, &mut mins, &mut maxs, &mut counts);
        assert_eq!(sums, vec![6.0, 10.0]);
        assert_eq!(mins, vec![-1.0, 2.0]);
        assert_eq!(maxs, vec![4.0, 8.0]);
        assert_eq!(counts, vec![3, 2]);
    }
}
