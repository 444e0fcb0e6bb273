/*!
 * Group-by Engine
 *
 * Dense group-id assignment through the Swiss table, scatter aggregations
 * over the dense ids, and end-to-end paths that bundle hash, assign,
 * scatter, and key materialization into one call.
 *
 * Group ids are assigned in first-seen order and form the contiguous range
 * [0, num_groups).
 */

use crate::column::Column;
use crate::core::errors::{DataError, KernelError, Result};
use crate::core::limits::PARALLEL_SCATTER_MAX_GROUPS;
use crate::core::types::Native;
use crate::runtime::{self, OpKind};
use crate::simd::hash::{hash_slice_quality, mix64_quality};
use crate::simd::scatter;
use crate::table::SwissTable;

/// Dense ids for every input row
pub struct GroupByResult {
    pub group_ids: Vec<u32>,
    pub num_groups: usize,
}

/// Dense ids plus per-group first-row index and running count, gathered in
/// the same pass so callers skip a second scan
pub struct GroupByResultExt {
    pub group_ids: Vec<u32>,
    pub first_rows: Vec<u32>,
    pub counts: Vec<u64>,
}

impl GroupByResultExt {
    #[inline]
    #[must_use]
    pub fn num_groups(&self) -> usize {
        self.first_rows.len()
    }
}

/// Assign dense ids from pre-computed hashes alone.
///
/// Precondition: the caller guarantees equal hashes imply equal keys
/// (pre-verified or injective hashes). Collisions between distinct keys
/// are not detected on this path; use [`assign_group_ids_keyed`] when raw
/// keys are available.
#[must_use]
pub fn assign_group_ids(hashes: &[u64]) -> GroupByResult {
    let ext = assign_ids_impl(hashes, None);
    GroupByResult {
        num_groups: ext.num_groups(),
        group_ids: ext.group_ids,
    }
}

/// Hash-trusting assignment that also records first rows and counts
#[must_use]
pub fn assign_group_ids_ext(hashes: &[u64]) -> GroupByResultExt {
    assign_ids_impl(hashes, None)
}

/// Entry-point alias for hash-only dense-id assignment
#[must_use]
pub fn groupby_compute(hashes: &[u64]) -> GroupByResult {
    assign_group_ids(hashes)
}

/// Entry-point alias for the extended hash-only assignment
#[must_use]
pub fn groupby_compute_ext(hashes: &[u64]) -> GroupByResultExt {
    assign_group_ids_ext(hashes)
}

/// Assignment with raw keys; hash collisions resolve by key comparison
pub fn assign_group_ids_keyed(hashes: &[u64], keys: &[i64]) -> Result<GroupByResultExt> {
    if hashes.len() != keys.len() {
        return Err(KernelError::Data(DataError::LengthMismatch {
            left: hashes.len(),
            right: keys.len(),
        }));
    }
    Ok(assign_ids_impl(hashes, Some(keys)))
}

fn assign_ids_impl(hashes: &[u64], keys: Option<&[i64]>) -> GroupByResultExt {
    let mut table = SwissTable::with_capacity(hashes.len().min(1 << 16));
    let mut group_ids = Vec::with_capacity(hashes.len());
    let mut first_rows: Vec<u32> = Vec::new();
    let mut counts: Vec<u64> = Vec::new();

    for (row, &hash) in hashes.iter().enumerate() {
        // Without raw keys, hash equality stands in for key equality
        let key = keys.map_or(hash as i64, |k| k[row]);
        let (slot, inserted) = table.find_or_insert(hash, key);
        let gid = if inserted {
            let gid = first_rows.len() as u32;
            table.set_value(slot, gid);
            first_rows.push(row as u32);
            counts.push(1);
            gid
        } else {
            let gid = table.value(slot);
            counts[gid as usize] += 1;
            gid
        };
        group_ids.push(gid);
    }

    GroupByResultExt {
        group_ids,
        first_rows,
        counts,
    }
}

// =============================================================================
// Scatter aggregations over dense ids
// =============================================================================

/// Per-group sums; parallel above the row threshold via per-worker private
/// accumulators merged pairwise, serial otherwise (or when the group count
/// would make the replicated accumulators too expensive)
#[must_use]
pub fn scatter_sum_groups<T: Native>(group_ids: &[u32], data: &[T], num_groups: usize) -> Vec<T> {
    if runtime::should_parallelize(OpKind::GroupBy, group_ids.len())
        && num_groups <= PARALLEL_SCATTER_MAX_GROUPS
    {
        return runtime::parallel_reduce(
            group_ids.len(),
            None,
            vec![T::default(); num_groups],
            |r| {
                let mut acc = vec![T::default(); num_groups];
                scatter::scatter_sum(&group_ids[r.clone()], &data[r], &mut acc);
                acc
            },
            |mut a, b| {
                for (x, y) in a.iter_mut().zip(b) {
                    *x = x.add_wrap(y);
                }
                a
            },
        );
    }
    let mut out = vec![T::default(); num_groups];
    scatter::scatter_sum(group_ids, data, &mut out);
    out
}

#[must_use]
pub fn scatter_min_groups<T: Native>(group_ids: &[u32], data: &[T], num_groups: usize) -> Vec<T> {
    let mut out = vec![T::MIN_IDENTITY; num_groups];
    scatter::scatter_min(group_ids, data, &mut out);
    out
}

#[must_use]
pub fn scatter_max_groups<T: Native>(group_ids: &[u32], data: &[T], num_groups: usize) -> Vec<T> {
    let mut out = vec![T::MAX_IDENTITY; num_groups];
    scatter::scatter_max(group_ids, data, &mut out);
    out
}

#[must_use]
pub fn scatter_count_groups(group_ids: &[u32], num_groups: usize) -> Vec<u64> {
    let mut out = vec![0u64; num_groups];
    scatter::scatter_count(group_ids, &mut out);
    out
}

/// Per-group means from one sum+count pass
#[must_use]
pub fn scatter_mean_groups<T: Native>(group_ids: &[u32], data: &[T], num_groups: usize) -> Vec<f64> {
    let mut sums = vec![T::default(); num_groups];
    let mut counts = vec![0u64; num_groups];
    scatter::scatter_sum_count(group_ids, data, &mut sums, &mut counts);
    sums.iter()
        .zip(&counts)
        .map(|(&s, &c)| if c == 0 { f64::NAN } else { s.to_f64() / c as f64 })
        .collect()
}

// =============================================================================
// End-to-end paths
// =============================================================================

/// Materialized group-by-sum output: unique keys in first-seen order with
/// their per-group sums as parallel columns
pub struct GroupBySumResult {
    pub keys: Column,
    pub sums: Column,
}

/// Hash -> assign -> scatter-sum -> materialize, in one call
pub fn groupby_sum_e2e_i64_f64(keys: &[i64], values: &[f64]) -> Result<GroupBySumResult> {
    if keys.len() != values.len() {
        return Err(KernelError::Data(DataError::LengthMismatch {
            left: keys.len(),
            right: values.len(),
        }));
    }
    let hashes = hash_keys(keys);
    let ext = assign_group_ids_keyed(&hashes, keys)?;
    let sums = scatter_sum_groups(&ext.group_ids, values, ext.num_groups());
    let unique: Vec<i64> = ext.first_rows.iter().map(|&r| keys[r as usize]).collect();
    Ok(GroupBySumResult {
        keys: Column::from_vec(unique),
        sums: Column::from_vec(sums),
    })
}

/// Materialized multi-aggregate output; one pass over the values feeds
/// sum, min, max, and count together, mean derives from sum/count
pub struct GroupByMultiAggResult {
    pub keys: Column,
    pub sums: Column,
    pub mins: Column,
    pub maxs: Column,
    pub counts: Column,
    pub means: Column,
}

pub fn groupby_multi_agg_e2e_i64_f64(
    keys: &[i64],
    values: &[f64],
) -> Result<GroupByMultiAggResult> {
    if keys.len() != values.len() {
        return Err(KernelError::Data(DataError::LengthMismatch {
            left: keys.len(),
            right: values.len(),
        }));
    }
    let hashes = hash_keys(keys);
    let ext = assign_group_ids_keyed(&hashes, keys)?;
    let n_groups = ext.num_groups();

    let mut sums = vec![0.0f64; n_groups];
    let mut mins = vec![f64::INFINITY; n_groups];
    let mut maxs = vec![f64::NEG_INFINITY; n_groups];
    let mut counts = vec![0u64; n_groups];
    scatter::scatter_multi(&ext.group_ids, values, &mut sums, &mut mins, &mut maxs, &mut counts);

    let means: Vec<f64> = sums
        .iter()
        .zip(&counts)
        .map(|(&s, &c)| if c == 0 { f64::NAN } else { s / c as f64 })
        .collect();
    let unique: Vec<i64> = ext.first_rows.iter().map(|&r| keys[r as usize]).collect();

    Ok(GroupByMultiAggResult {
        keys: Column::from_vec(unique),
        sums: Column::from_vec(sums),
        mins: Column::from_vec(mins),
        maxs: Column::from_vec(maxs),
        counts: Column::from_vec(counts),
        means: Column::from_vec(means),
    })
}

/// Quality-mixed key hashes, parallel above the hash threshold
#[must_use]
pub fn hash_keys(keys: &[i64]) -> Vec<u64> {
    let mut out = vec![0u64; keys.len()];
    if runtime::should_parallelize(OpKind::Hash, keys.len()) {
        let ptr = crate::runtime::api::SendPtr(out.as_mut_ptr());
        runtime::parallel_for(keys.len(), None, |r| {
            for i in r {
                // SAFETY: disjoint ranges write disjoint slots
                unsafe { *ptr.get().add(i) = mix64_quality(keys[i] as u64) };
            }
        });
    } else {
        hash_slice_quality(keys, &mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dense_ids_first_seen_order() {
        let keys = [10i64, 20, 10, 30, 20];
        let hashes = hash_keys(&keys);
        let ext = assign_group_ids_keyed(&hashes, &keys).unwrap();
        assert_eq!(ext.group_ids, vec![0, 1, 0, 2, 1]);
        assert_eq!(ext.first_rows, vec![0, 1, 3]);
        assert_eq!(ext.counts, vec![2, 2, 1]);
    }

    #[test]
    fn test_hash_only_path_matches_keyed() {
        let keys: Vec<i64> = (0..10_000).map(|i| i % 257).collect();
        let hashes = hash_keys(&keys);
        let trusting = assign_group_ids(&hashes);
        let keyed = assign_group_ids_keyed(&hashes, &keys).unwrap();
        assert_eq!(trusting.group_ids, keyed.group_ids);
        assert_eq!(trusting.num_groups, 257);
    }

    #[test]
    fn test_ids_form_contiguous_range() {
        let keys: Vec<i64> = (0..5_000).map(|i| (i * 31) % 113 - 56).collect();
        let hashes = hash_keys(&keys);
        let ext = assign_group_ids_ext(&hashes);
        let n = ext.num_groups() as u32;
        assert!(ext.group_ids.iter().all(|&g| g < n));
        let mut seen = vec![false; n as usize];
        for &g in &ext.group_ids {
            seen[g as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
        // counts sum to the row count
        assert_eq!(ext.counts.iter().sum::<u64>(), keys.len() as u64);
    }

    #[test]
    fn test_scatter_groups() {
        let gids = [0u32, 1, 0, 2, 1];
        let vals = [1.0f64, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(scatter_sum_groups(&gids, &vals, 3), vec![4.0, 7.0, 4.0]);
        assert_eq!(scatter_min_groups(&gids, &vals, 3), vec![1.0, 2.0, 4.0]);
        assert_eq!(scatter_max_groups(&gids, &vals, 3), vec![3.0, 5.0, 4.0]);
        assert_eq!(scatter_count_groups(&gids, 3), vec![2, 2, 1]);
        assert_eq!(scatter_mean_groups(&gids, &vals, 3), vec![2.0, 3.5, 4.0]);
    }

    #[test]
    fn test_groupby_sum_e2e() {
        let keys = [10i64, 20, 10, 30, 20];
        let values = [1.0f64, 2.0, 3.0, 4.0, 5.0];
        let out = groupby_sum_e2e_i64_f64(&keys, &values).unwrap();
        assert_eq!(out.keys.values::<i64>().unwrap(), &[10, 20, 30]);
        assert_eq!(out.sums.values::<f64>().unwrap(), &[4.0, 7.0, 4.0]);
    }

    #[test]
    fn test_groupby_multi_agg_e2e() {
        let keys = [1i64, 2, 1, 2, 1];
        let values = [5.0f64, -1.0, 3.0, 7.0, 4.0];
        let out = groupby_multi_agg_e2e_i64_f64(&keys, &values).unwrap();
        assert_eq!(out.keys.values::<i64>().unwrap(), &[1, 2]);
        assert_eq!(out.sums.values::<f64>().unwrap(), &[12.0, 6.0]);
        assert_eq!(out.mins.values::<f64>().unwrap(), &[3.0, -1.0]);
        assert_eq!(out.maxs.values::<f64>().unwrap(), &[5.0, 7.0]);
        assert_eq!(out.counts.values::<u64>().unwrap(), &[3, 2]);
        assert_eq!(out.means.values::<f64>().unwrap(), &[4.0, 3.0]);
    }

    #[test]
    fn test_e2e_length_mismatch() {
        assert!(groupby_sum_e2e_i64_f64(&[1, 2], &[1.0]).is_err());
    }

    #[test]
    fn test_empty_input() {
        let out = groupby_sum_e2e_i64_f64(&[], &[]).unwrap();
        assert!(out.keys.is_empty());
        assert!(out.sums.is_empty());
        let r = assign_group_ids(&[]);
        assert_eq!(r.num_groups, 0);
    }

    #[test]
    #[serial_test::serial(pool)]
    fn test_parallel_scatter_matches_serial() {
        let n = 300_000usize;
        let gids: Vec<u32> = (0..n).map(|i| (i % 100) as u32).collect();
        let vals: Vec<f64> = (0..n).map(|i| (i % 13) as f64).collect();
        let parallel = scatter_sum_groups(&gids, &vals, 100);
        let mut serial = vec![0.0f64; 100];
        scatter::scatter_sum(&gids, &vals, &mut serial);
        for (p, s) in parallel.iter().zip(&serial) {
            assert!((p - s).abs() < 1e-6, "{p} vs {s}");
        }
        crate::runtime::deinit_pool();
    }
}
