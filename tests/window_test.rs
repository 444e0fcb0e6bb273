/*!
 * Window & Statistics Surface Tests
 * Column-level rolling, shifting, ranking, and moment computations
 */

use quiver_kernel::{Column, DType};

fn nullable(data: &[f64], null_at: &[usize]) -> Column {
    let mut bitmap = vec![0xFFu8; data.len().div_ceil(8)];
    for &i in null_at {
        bitmap[i / 8] &= !(1 << (i % 8));
    }
    Column::with_nulls(data, &bitmap).unwrap()
}

#[test]
fn test_rolling_mean_over_prices() {
    let prices = Column::from_vec(vec![10.0f64, 12.0, 11.0, 13.0, 14.0]);
    let smoothed = prices.rolling_mean::<f64>(3).unwrap();
    let v = smoothed.values::<f64>().unwrap();
    assert!(v[0].is_nan() && v[1].is_nan());
    assert_eq!(&v[2..], &[11.0, 12.0, 38.0 / 3.0]);
}

#[test]
fn test_null_handling_through_rolling_path() {
    let col = nullable(&[1.0, 2.0, 3.0, 4.0, 5.0], &[2]);
    let sums = col.rolling_sum::<f64>(2).unwrap();
    let v = sums.values::<f64>().unwrap();
    assert_eq!(v[1], 3.0);
    assert!(v[2].is_nan());
    assert!(v[3].is_nan());
    assert_eq!(v[4], 9.0);
}

#[test]
fn test_shift_diff_pct_change() {
    let col = Column::from_vec(vec![100.0f64, 110.0, 121.0]);
    let lagged = col.lag(1, f64::NAN).unwrap();
    assert!(lagged.values::<f64>().unwrap()[0].is_nan());
    assert_eq!(&lagged.values::<f64>().unwrap()[1..], &[100.0, 110.0]);

    let d = col.diff::<f64>(1).unwrap();
    assert_eq!(&d.values::<f64>().unwrap()[1..], &[10.0, 11.0]);

    let pct = col.pct_change::<f64>(1).unwrap();
    for &p in &pct.values::<f64>().unwrap()[1..] {
        assert!((p - 0.1).abs() < 1e-12);
    }
}

#[test]
fn test_fill_strategies() {
    let col = nullable(&[1.0, 0.0, 0.0, 4.0], &[1, 2]);
    let filled = col.fill_null(0.0f64).unwrap();
    assert_eq!(filled.values::<f64>().unwrap(), &[1.0, 0.0, 0.0, 4.0]);

    let ffill = col.forward_fill::<f64>().unwrap();
    assert_eq!(ffill.values::<f64>().unwrap(), &[1.0, 1.0, 1.0, 4.0]);

    let bfill = col.backward_fill::<f64>().unwrap();
    assert_eq!(bfill.values::<f64>().unwrap(), &[1.0, 4.0, 4.0, 4.0]);
}

#[test]
fn test_cumulative_and_ranks() {
    let col = Column::from_vec(vec![3i64, 1, 4, 1]);
    assert_eq!(col.cum_sum::<i64>().unwrap().values::<i64>().unwrap(), &[3, 4, 8, 9]);
    assert_eq!(col.cum_min::<i64>().unwrap().values::<i64>().unwrap(), &[3, 1, 1, 1]);
    assert_eq!(col.rank::<i64>().unwrap(), vec![3, 1, 4, 1]);
    assert_eq!(col.dense_rank::<i64>().unwrap(), vec![2, 1, 3, 1]);

    let parts = [0u32, 0, 1, 1];
    assert_eq!(col.row_number(Some(&parts)), vec![1, 2, 1, 2]);
}

#[test]
fn test_moments_and_quantiles() {
    let col = Column::from_vec(vec![2.0f64, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
    assert!((col.variance::<f64>().unwrap() - 32.0 / 7.0).abs() < 1e-12);
    assert!((col.std_dev::<f64>().unwrap() - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
    assert_eq!(col.median::<f64>().unwrap(), 4.5);
    assert_eq!(col.quantile::<f64>(0.0).unwrap(), 2.0);
    assert_eq!(col.quantile::<f64>(1.0).unwrap(), 9.0);
}

#[test]
fn test_correlation_between_columns() {
    let a = Column::from_vec(vec![1.0f64, 2.0, 3.0, 4.0]);
    let b = Column::from_vec(vec![10.0f64, 8.0, 6.0, 4.0]);
    let r = a.correlation::<f64>(&b).unwrap();
    assert!((r + 1.0).abs() < 1e-12);
}

#[test]
fn test_is_null_mask_filters_valid_rows() {
    let col = nullable(&[1.0, 2.0, 3.0], &[1]);
    let nulls = col.is_null_mask();
    assert_eq!(nulls.dtype(), DType::Bool);
    // Invert into a keep-mask
    let keep: Vec<u8> = nulls.as_mask().unwrap().iter().map(|&m| 1 - m).collect();
    let kept = col.filter(&Column::from_mask(keep)).unwrap();
    assert_eq!(kept.values::<f64>().unwrap(), &[1.0, 3.0]);
    assert!(!kept.has_nulls());
}
