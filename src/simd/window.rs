/*!
 * Window Kernels
 * Lag/lead, cumulative aggregates, rolling windows, and ranking
 *
 * Rolling sum/mean/std keep running accumulators; rolling min/max use a
 * monotonic deque so every element enters and leaves the deque once.
 */

use crate::core::types::{Float, Native};
use std::collections::VecDeque;

/// Shift forward: out[i] = data[i - periods], `fill` for the first `periods`
pub fn lag<T: Native>(data: &[T], periods: usize, fill: T, out: &mut [T]) {
    let n = data.len();
    let p = periods.min(n);
    out[..p].fill(fill);
    out[p..n].copy_from_slice(&data[..n - p]);
}

/// Shift backward: out[i] = data[i + periods], `fill` for the last `periods`
pub fn lead<T: Native>(data: &[T], periods: usize, fill: T, out: &mut [T]) {
    let n = data.len();
    let p = periods.min(n);
    out[..n - p].copy_from_slice(&data[p..]);
    out[n - p..].fill(fill);
}

pub fn cum_sum<T: Native>(data: &[T], out: &mut [T]) {
    let mut acc = T::default();
    for (o, &v) in out.iter_mut().zip(data) {
        acc = acc.add_wrap(v);
        *o = acc;
    }
}

pub fn cum_min<T: Native>(data: &[T], out: &mut [T]) {
    let mut acc = T::MIN_IDENTITY;
    for (o, &v) in out.iter_mut().zip(data) {
        acc = acc.min2(v);
        *o = acc;
    }
}

pub fn cum_max<T: Native>(data: &[T], out: &mut [T]) {
    let mut acc = T::MAX_IDENTITY;
    for (o, &v) in out.iter_mut().zip(data) {
        acc = acc.max2(v);
        *o = acc;
    }
}

/// Rolling sum over a trailing window; NaN until the window fills and NaN
/// while the window covers a NaN input. NaNs are excluded from the running
/// accumulator so they cannot poison later windows.
pub fn rolling_sum<T: Float>(data: &[T], window: usize, out: &mut [T]) {
    let n = data.len();
    if window == 0 || window > n {
        out[..n].fill(T::nan());
        return;
    }
    let mut acc = T::default();
    let mut nan_in_window = 0usize;
    for i in 0..n {
        if data[i].is_nan_value() {
            nan_in_window += 1;
        } else {
            acc = acc.add_wrap(data[i]);
        }
        if i >= window {
            let leaving = data[i - window];
            if leaving.is_nan_value() {
                nan_in_window -= 1;
            } else {
                acc = acc.sub_wrap(leaving);
            }
        }
        out[i] = if i + 1 >= window && nan_in_window == 0 {
            acc
        } else {
            T::nan()
        };
    }
}

/// Rolling mean from the running-sum accumulator
pub fn rolling_mean<T: Float>(data: &[T], window: usize, out: &mut [T]) {
    rolling_sum(data, window, out);
    let w = T::from_f64(window as f64);
    for o in out.iter_mut() {
        *o = o.div(w);
    }
}

/// Rolling sample std from running sum and sum-of-squares; NaN over
/// incomplete or NaN-containing windows
pub fn rolling_std(data: &[f64], window: usize, out: &mut [f64]) {
    let n = data.len();
    if window < 2 || window > n {
        out[..n].fill(f64::NAN);
        return;
    }
    let wf = window as f64;
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    let mut nan_in_window = 0usize;
    for i in 0..n {
        if data[i].is_nan() {
            nan_in_window += 1;
        } else {
            sum += data[i];
            sum_sq += data[i] * data[i];
        }
        if i >= window {
            let leaving = data[i - window];
            if leaving.is_nan() {
                nan_in_window -= 1;
            } else {
                sum -= leaving;
                sum_sq -= leaving * leaving;
            }
        }
        out[i] = if i + 1 >= window && nan_in_window == 0 {
            let var = (sum_sq - sum * sum / wf) / (wf - 1.0);
            // Cancellation can leave a tiny negative variance
            var.max(0.0).sqrt()
        } else {
            f64::NAN
        };
    }
}

/// Rolling min via a front-popping monotonic deque of candidate indices
pub fn rolling_min<T: Float>(data: &[T], window: usize, out: &mut [T]) {
    rolling_extreme(data, window, out, |a, b| a <= b);
}

pub fn rolling_max<T: Float>(data: &[T], window: usize, out: &mut [T]) {
    rolling_extreme(data, window, out, |a, b| a >= b);
}

fn rolling_extreme<T: Float>(data: &[T], window: usize, out: &mut [T], keep: impl Fn(T, T) -> bool) {
    let n = data.len();
    if window == 0 || window > n {
        out[..n].fill(T::nan());
        return;
    }
    let mut deque: VecDeque<usize> = VecDeque::with_capacity(window);
    let mut nan_in_window = 0usize;
    for i in 0..n {
        while deque.front().is_some_and(|&f| f + window <= i) {
            deque.pop_front();
        }
        if data[i].is_nan_value() {
            // NaN never enters the candidate deque; it only marks the
            // windows covering it
            nan_in_window += 1;
        } else {
            while deque.back().is_some_and(|&b| keep(data[i], data[b])) {
                deque.pop_back();
            }
            deque.push_back(i);
        }
        if i >= window && data[i - window].is_nan_value() {
            nan_in_window -= 1;
        }
        out[i] = if i + 1 >= window && nan_in_window == 0 {
            data[*deque.front().unwrap()]
        } else {
            T::nan()
        };
    }
}

/// out[i] = data[i] - data[i - periods]; leading slots are NaN
pub fn diff<T: Float>(data: &[T], periods: usize, out: &mut [T]) {
    let n = data.len();
    let p = periods.min(n);
    out[..p].fill(T::nan());
    for i in p..n {
        out[i] = data[i].sub_wrap(data[i - p]);
    }
}

/// Fractional change against the lagged value
pub fn pct_change<T: Float>(data: &[T], periods: usize, out: &mut [T]) {
    let n = data.len();
    let p = periods.min(n);
    out[..p].fill(T::nan());
    for i in p..n {
        out[i] = data[i].sub_wrap(data[i - p]).div(data[i - p]);
    }
}

/// 1-based rank in sort order; ties share the minimum rank
pub fn rank<T: Native>(data: &[T], out: &mut [u32]) {
    let mut order: Vec<u32> = (0..data.len() as u32).collect();
    order.sort_by(|&a, &b| {
        data[a as usize]
            .partial_cmp(&data[b as usize])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let mut i = 0usize;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len()
            && data[order[j + 1] as usize] == data[order[i] as usize]
        {
            j += 1;
        }
        for &ix in &order[i..=j] {
            out[ix as usize] = i as u32 + 1;
        }
        i = j + 1;
    }
}

/// 1-based dense rank: consecutive ranks with no gaps after ties
pub fn dense_rank<T: Native>(data: &[T], out: &mut [u32]) {
    let mut order: Vec<u32> = (0..data.len() as u32).collect();
    order.sort_by(|&a, &b| {
        data[a as usize]
            .partial_cmp(&data[b as usize])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let mut current = 0u32;
    let mut prev: Option<T> = None;
    for &ix in &order {
        let v = data[ix as usize];
        if prev != Some(v) {
            current += 1;
            prev = Some(v);
        }
        out[ix as usize] = current;
    }
}

/// 1-based position, optionally restarting per partition id
pub fn row_number(len: usize, partitions: Option<&[u32]>, out: &mut [u32]) {
    match partitions {
        None => {
            for (i, o) in out.iter_mut().enumerate().take(len) {
                *o = i as u32 + 1;
            }
        }
        Some(parts) => {
            debug_assert_eq!(parts.len(), len);
            let mut counters: Vec<u32> = Vec::new();
            for i in 0..len {
                let p = parts[i] as usize;
                if p >= counters.len() {
                    counters.resize(p + 1, 0);
                }
                counters[p] += 1;
                out[i] = counters[p];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lag_lead() {
        let data = [1.0f64, 2.0, 3.0, 4.0];
        let mut out = [0.0f64; 4];
        lag(&data, 1, f64::NAN, &mut out);
        assert!(out[0].is_nan());
        assert_eq!(&out[1..], &[1.0, 2.0, 3.0]);

        lead(&data, 2, 0.0, &mut out);
        assert_eq!(out, [3.0, 4.0, 0.0, 0.0]);
    }

    #[test]
    fn test_cumulative() {
        let data = [3i64, 1, 4, 1, 5];
        let mut out = [0i64; 5];
        cum_sum(&data, &mut out);
        assert_eq!(out, [3, 4, 8, 9, 14]);
        cum_min(&data, &mut out);
        assert_eq!(out, [3, 1, 1, 1, 1]);
        cum_max(&data, &mut out);
        assert_eq!(out, [3, 3, 4, 4, 5]);
    }

    #[test]
    fn test_rolling_sum_mean() {
        let data = [1.0f64, 2.0, 3.0, 4.0, 5.0];
        let mut out = [0.0f64; 5];
        rolling_sum(&data, 3, &mut out);
        assert!(out[0].is_nan() && out[1].is_nan());
        assert_eq!(&out[2..], &[6.0, 9.0, 12.0]);

        rolling_mean(&data, 3, &mut out);
        assert_eq!(&out[2..], &[2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_rolling_std_window_two() {
        let data = [1.0f64, 3.0, 3.0, 7.0];
        let mut out = [0.0f64; 4];
        rolling_std(&data, 2, &mut out);
        assert!(out[0].is_nan());
        // std of [1,3] with n-1 denominator is sqrt(2)
        assert!((out[1] - std::f64::consts::SQRT_2).abs() < 1e-9);
        assert_eq!(out[2], 0.0);
        assert!((out[3] - (8.0f64).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_rolling_min_max_deque() {
        let data = [3.0f64, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0];
        let mut out = [0.0f64; 7];
        rolling_min(&data, 3, &mut out);
        assert_eq!(&out[2..], &[1.0, 1.0, 1.0, 1.0, 2.0]);
        rolling_max(&data, 3, &mut out);
        assert_eq!(&out[2..], &[4.0, 4.0, 5.0, 9.0, 9.0]);
    }

    #[test]
    fn test_rolling_nan_marks_only_covering_windows() {
        let data = [1.0f64, f64::NAN, 3.0, 4.0, 5.0];
        let mut out = [0.0f64; 5];

        rolling_sum(&data, 2, &mut out);
        assert!(out[0].is_nan()); // incomplete
        assert!(out[1].is_nan()); // covers the NaN
        assert!(out[2].is_nan()); // covers the NaN
        assert_eq!(out[3], 7.0); // recovered
        assert_eq!(out[4], 9.0);

        rolling_max(&data, 2, &mut out);
        assert!(out[2].is_nan());
        assert_eq!(out[3], 4.0);
        assert_eq!(out[4], 5.0);

        rolling_std(&data, 2, &mut out);
        assert!(out[1].is_nan() && out[2].is_nan());
        assert!((out[3] - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-9);
    }

    #[test]
    fn test_rolling_window_larger_than_input() {
        let data = [1.0f64, 2.0];
        let mut out = [0.0f64; 2];
        rolling_sum(&data, 5, &mut out);
        assert!(out.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_diff_pct_change() {
        let data = [2.0f64, 4.0, 8.0];
        let mut out = [0.0f64; 3];
        diff(&data, 1, &mut out);
        assert!(out[0].is_nan());
        assert_eq!(&out[1..], &[2.0, 4.0]);

        pct_change(&data, 1, &mut out);
        assert_eq!(&out[1..], &[1.0, 1.0]);
    }

    #[test]
    fn test_rank_ties_share_min() {
        let data = [30i64, 10, 20, 10];
        let mut out = [0u32; 4];
        rank(&data, &mut out);
        assert_eq!(out, [4, 1, 3, 1]);
        dense_rank(&data, &mut out);
        assert_eq!(out, [3, 1, 2, 1]);
    }

    #[test]
    fn test_row_number_partitioned() {
        let mut out = [0u32; 5];
        row_number(5, None, &mut out);
        assert_eq!(out, [1, 2, 3, 4, 5]);

        let parts = [0u32, 1, 0, 1, 1];
        row_number(5, Some(&parts), &mut out);
        assert_eq!(out, [1, 1, 2, 2, 3]);
    }
}
