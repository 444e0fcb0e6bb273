/*!
 * Group-by Engine Tests
 * Dense id assignment, scatter aggregation, and end-to-end paths
 */

use quiver_kernel::groupby::{self, hash_keys};
use quiver_kernel::{assign_group_ids_keyed, groupby_multi_agg_e2e_i64_f64, groupby_sum_e2e_i64_f64};

#[test]
fn test_groupby_sum_boundary_case() {
    let keys = [10i64, 20, 10, 30, 20];
    let values = [1.0f64, 2.0, 3.0, 4.0, 5.0];
    let out = groupby_sum_e2e_i64_f64(&keys, &values).unwrap();
    // First-seen key order with matching sums
    assert_eq!(out.keys.values::<i64>().unwrap(), &[10, 20, 30]);
    assert_eq!(out.sums.values::<f64>().unwrap(), &[4.0, 7.0, 4.0]);
}

#[test]
fn test_identical_keys_identical_ids() {
    let keys: Vec<i64> = (0..10_000).map(|i| (i * 13) % 89).collect();
    let hashes = hash_keys(&keys);
    let ext = assign_group_ids_keyed(&hashes, &keys).unwrap();

    assert_eq!(ext.num_groups(), 89);
    for (i, &gi) in ext.group_ids.iter().enumerate() {
        for (j, &gj) in ext.group_ids.iter().enumerate().skip(i + 1).take(50) {
            if keys[i] == keys[j] {
                assert_eq!(gi, gj);
            }
        }
    }
}

#[test]
fn test_group_counts_match_row_counts() {
    let keys: Vec<i64> = (0..2_000).map(|i| i % 7).collect();
    let hashes = hash_keys(&keys);
    let ext = assign_group_ids_keyed(&hashes, &keys).unwrap();
    assert_eq!(ext.num_groups(), 7);
    for g in 0..7 {
        let expected = keys.iter().filter(|&&k| k == g as i64).count() as u64;
        assert_eq!(ext.counts[g], expected);
    }
    // First rows really are the first occurrence
    for (g, &row) in ext.first_rows.iter().enumerate() {
        assert_eq!(ext.group_ids[row as usize], g as u32);
        assert!(ext.group_ids[..row as usize].iter().all(|&x| x != g as u32));
    }
}

#[test]
fn test_multi_agg_e2e() {
    let keys = [1i64, 1, 2, 2, 2];
    let values = [4.0f64, 6.0, 1.0, 5.0, 3.0];
    let out = groupby_multi_agg_e2e_i64_f64(&keys, &values).unwrap();
    assert_eq!(out.keys.values::<i64>().unwrap(), &[1, 2]);
    assert_eq!(out.sums.values::<f64>().unwrap(), &[10.0, 9.0]);
    assert_eq!(out.mins.values::<f64>().unwrap(), &[4.0, 1.0]);
    assert_eq!(out.maxs.values::<f64>().unwrap(), &[6.0, 5.0]);
    assert_eq!(out.counts.values::<u64>().unwrap(), &[2, 3]);
    assert_eq!(out.means.values::<f64>().unwrap(), &[5.0, 3.0]);
}

#[test]
fn test_groupby_matches_reference_hashmap() {
    use std::collections::HashMap;
    let keys: Vec<i64> = (0..30_000).map(|i| ((i * 31) % 997) - 400).collect();
    let values: Vec<f64> = (0..30_000).map(|i| (i % 100) as f64).collect();

    let mut reference: HashMap<i64, f64> = HashMap::new();
    for (k, v) in keys.iter().zip(&values) {
        *reference.entry(*k).or_default() += v;
    }

    let out = groupby_sum_e2e_i64_f64(&keys, &values).unwrap();
    let out_keys = out.keys.values::<i64>().unwrap();
    let out_sums = out.sums.values::<f64>().unwrap();
    assert_eq!(out_keys.len(), reference.len());
    for (k, s) in out_keys.iter().zip(out_sums) {
        let want = reference[k];
        assert!((s - want).abs() < 1e-9, "key {k}: {s} vs {want}");
    }
}

#[test]
fn test_scatter_entry_points() {
    let gids = [0u32, 1, 1, 0, 2];
    let data = [1.0f64, 10.0, 20.0, 3.0, 7.0];
    assert_eq!(
        groupby::scatter_sum_groups(&gids, &data, 3),
        vec![4.0, 30.0, 7.0]
    );
    assert_eq!(
        groupby::scatter_min_groups(&gids, &data, 3),
        vec![1.0, 10.0, 7.0]
    );
    assert_eq!(
        groupby::scatter_max_groups(&gids, &data, 3),
        vec![3.0, 20.0, 7.0]
    );
    assert_eq!(groupby::scatter_count_groups(&gids, 3), vec![2, 2, 1]);
    assert_eq!(
        groupby::scatter_mean_groups(&gids, &data, 3),
        vec![2.0, 15.0, 7.0]
    );
}
