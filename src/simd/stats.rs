/*!
 * Statistics Kernels
 * Sample moments, quantiles via quickselect, and correlation
 */

use crate::core::limits::QUICKSELECT_CUTOFF;
use crate::core::types::Native;

/// Sample variance (n-1 denominator); NaN for fewer than two elements
pub fn variance<T: Native>(data: &[T]) -> f64 {
    let n = data.len();
    if n < 2 {
        return f64::NAN;
    }
    let mean = data.iter().map(|v| v.to_f64()).sum::<f64>() / n as f64;
    let ss = data
        .iter()
        .map(|v| {
            let d = v.to_f64() - mean;
            d * d
        })
        .sum::<f64>();
    ss / (n - 1) as f64
}

/// Sample standard deviation
pub fn std_dev<T: Native>(data: &[T]) -> f64 {
    variance(data).sqrt()
}

/// Sample skewness with the bias-corrected n/((n-1)(n-2)) factor
pub fn skewness<T: Native>(data: &[T]) -> f64 {
    let n = data.len();
    if n < 3 {
        return f64::NAN;
    }
    let nf = n as f64;
    let mean = data.iter().map(|v| v.to_f64()).sum::<f64>() / nf;
    let mut m2 = 0.0;
    let mut m3 = 0.0;
    for v in data {
        let d = v.to_f64() - mean;
        m2 += d * d;
        m3 += d * d * d;
    }
    let s = (m2 / (nf - 1.0)).sqrt();
    if s == 0.0 {
        return f64::NAN;
    }
    (nf / ((nf - 1.0) * (nf - 2.0))) * m3 / (s * s * s)
}

/// Excess kurtosis with the standard sample bias correction
pub fn kurtosis<T: Native>(data: &[T]) -> f64 {
    let n = data.len();
    if n < 4 {
        return f64::NAN;
    }
    let nf = n as f64;
    let mean = data.iter().map(|v| v.to_f64()).sum::<f64>() / nf;
    let mut m2 = 0.0;
    let mut m4 = 0.0;
    for v in data {
        let d = v.to_f64() - mean;
        let d2 = d * d;
        m2 += d2;
        m4 += d2 * d2;
    }
    let var = m2 / (nf - 1.0);
    if var == 0.0 {
        return f64::NAN;
    }
    let term = (nf * (nf + 1.0)) / ((nf - 1.0) * (nf - 2.0) * (nf - 3.0));
    let corr = (3.0 * (nf - 1.0) * (nf - 1.0)) / ((nf - 2.0) * (nf - 3.0));
    term * m4 / (var * var) - corr
}

fn quickselect(scratch: &mut [f64], k: usize) -> f64 {
    let mut lo = 0usize;
    let mut hi = scratch.len();
    loop {
        if hi - lo <= QUICKSELECT_CUTOFF {
            scratch[lo..hi].sort_unstable_by(|a, b| a.partial_cmp(b).unwrap());
            return scratch[k];
        }
        // Median-of-three pivot against degenerate runs
        let mid = lo + (hi - lo) / 2;
        let (a, b, c) = (scratch[lo], scratch[mid], scratch[hi - 1]);
        let pivot = if (a <= b) == (b <= c) {
            b
        } else if (b <= a) == (a <= c) {
            a
        } else {
            c
        };

        let mut i = lo;
        let mut j = hi - 1;
        loop {
            while scratch[i] < pivot {
                i += 1;
            }
            while scratch[j] > pivot {
                j -= 1;
            }
            if i >= j {
                break;
            }
            scratch.swap(i, j);
            i += 1;
            if j > 0 {
                j -= 1;
            }
        }
        if k <= j {
            hi = j + 1;
        } else {
            lo = j + 1;
        }
    }
}

/// Quantile `q` in [0,1] with linear interpolation; NaN elements are skipped
pub fn quantile<T: Native>(data: &[T], q: f64) -> f64 {
    let mut scratch: Vec<f64> = data
        .iter()
        .map(|v| v.to_f64())
        .filter(|v| !v.is_nan())
        .collect();
    if scratch.is_empty() || !(0.0..=1.0).contains(&q) {
        return f64::NAN;
    }
    let n = scratch.len();
    let pos = q * (n - 1) as f64;
    let lo_idx = pos.floor() as usize;
    let frac = pos - lo_idx as f64;
    let lo_val = quickselect(&mut scratch, lo_idx);
    if frac == 0.0 {
        return lo_val;
    }
    let hi_val = quickselect(&mut scratch, lo_idx + 1);
    lo_val + frac * (hi_val - lo_val)
}

/// Median = 0.5 quantile
pub fn median<T: Native>(data: &[T]) -> f64 {
    quantile(data, 0.5)
}

/// Pearson correlation; NaN on length mismatch or zero variance
pub fn correlation<T: Native>(a: &[T], b: &[T]) -> f64 {
    let n = a.len();
    if n < 2 || n != b.len() {
        return f64::NAN;
    }
    let nf = n as f64;
    let mean_a = a.iter().map(|v| v.to_f64()).sum::<f64>() / nf;
    let mean_b = b.iter().map(|v| v.to_f64()).sum::<f64>() / nf;
    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let dx = x.to_f64() - mean_a;
        let dy = y.to_f64() - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }
    let denom = (var_a * var_b).sqrt();
    if denom == 0.0 {
        return f64::NAN;
    }
    cov / denom
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variance_std() {
        let data = [2.0f64, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        // Known sample variance of this set is 32/7
        assert!((variance(&data) - 32.0 / 7.0).abs() < 1e-12);
        assert!((std_dev(&data) - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
        assert!(variance(&[1.0f64]).is_nan());
    }

    #[test]
    fn test_skewness_symmetric_is_zero() {
        let data = [1.0f64, 2.0, 3.0, 4.0, 5.0];
        assert!(skewness(&data).abs() < 1e-12);
        let right_tail = [1.0f64, 1.0, 1.0, 1.0, 10.0];
        assert!(skewness(&right_tail) > 0.0);
    }

    #[test]
    fn test_kurtosis_constant_is_nan() {
        assert!(kurtosis(&[3.0f64, 3.0, 3.0, 3.0]).is_nan());
        let data = [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0];
        assert!(kurtosis(&data).is_finite());
    }

    #[test]
    fn test_median_quantile() {
        let data = [3.0f64, 1.0, 4.0, 1.0, 5.0];
        assert_eq!(median(&data), 3.0);
        let even = [4.0f64, 1.0, 3.0, 2.0];
        assert_eq!(median(&even), 2.5);
        assert_eq!(quantile(&even, 0.0), 1.0);
        assert_eq!(quantile(&even, 1.0), 4.0);
    }

    #[test]
    fn test_quantile_large_input_exercises_partition() {
        let data: Vec<f64> = (0..1000).map(|i| ((i * 7919) % 1000) as f64).collect();
        // The multiplier is coprime with 1000, so values are 0..999
        assert_eq!(quantile(&data, 0.5), 499.5);
        assert_eq!(quantile(&data, 0.0), 0.0);
        assert_eq!(quantile(&data, 1.0), 999.0);
    }

    #[test]
    fn test_quantile_skips_nan() {
        let data = [1.0f64, f64::NAN, 3.0];
        assert_eq!(median(&data), 2.0);
    }

    #[test]
    fn test_correlation() {
        let a = [1.0f64, 2.0, 3.0, 4.0];
        let b = [2.0f64, 4.0, 6.0, 8.0];
        assert!((correlation(&a, &b) - 1.0).abs() < 1e-12);
        let inv: Vec<f64> = b.iter().map(|v| -v).collect();
        assert!((correlation(&a, &inv) + 1.0).abs() < 1e-12);
        assert!(correlation(&a, &[1.0, 1.0, 1.0, 1.0]).is_nan());
    }

    #[test]
    fn test_integer_stats() {
        let data = [1i64, 2, 3, 4, 5];
        assert!((variance(&data) - 2.5).abs() < 1e-12);
        assert_eq!(median(&data), 3.0);
    }
}
