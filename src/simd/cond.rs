/*!
 * Conditional Kernels
 * select, null tests, fills, and coalesce
 *
 * These operate on raw float slices where NaN stands in for null; columns
 * with explicit validity bitmaps route through the container layer instead.
 */

use crate::core::types::{Float, Native};

/// `out[i] = mask[i] != 0 ? a[i] : b[i]`
pub fn select<T: Native>(mask: &[u8], a: &[T], b: &[T], out: &mut [T]) {
    debug_assert!(mask.len() == a.len() && a.len() == b.len() && b.len() == out.len());
    for i in 0..out.len() {
        out[i] = if mask[i] != 0 { a[i] } else { b[i] };
    }
}

/// 1 where the element is NaN
pub fn is_null<T: Float>(data: &[T], out: &mut [u8]) {
    for (o, &v) in out.iter_mut().zip(data) {
        *o = v.is_nan_value() as u8;
    }
}

/// 1 where the element is not NaN
pub fn is_not_null<T: Float>(data: &[T], out: &mut [u8]) {
    for (o, &v) in out.iter_mut().zip(data) {
        *o = !v.is_nan_value() as u8;
    }
}

/// Replace NaN with `fill`
pub fn fill_null<T: Float>(data: &[T], fill: T, out: &mut [T]) {
    for (o, &v) in out.iter_mut().zip(data) {
        *o = if v.is_nan_value() { fill } else { v };
    }
}

/// Propagate the last non-null value forward; leading NaNs stay NaN
pub fn forward_fill<T: Float>(data: &[T], out: &mut [T]) {
    let mut last = T::nan();
    for (o, &v) in out.iter_mut().zip(data) {
        if !v.is_nan_value() {
            last = v;
        }
        *o = last;
    }
}

/// Propagate the next non-null value backward; trailing NaNs stay NaN
pub fn backward_fill<T: Float>(data: &[T], out: &mut [T]) {
    let mut next = T::nan();
    for (o, &v) in out.iter_mut().zip(data).rev() {
        if !v.is_nan_value() {
            next = v;
        }
        *o = next;
    }
}

/// First non-null of (a[i], b[i])
pub fn coalesce<T: Float>(a: &[T], b: &[T], out: &mut [T]) {
    debug_assert_eq!(a.len(), b.len());
    for ((o, &x), &y) in out.iter_mut().zip(a).zip(b) {
        *o = if x.is_nan_value() { y } else { x };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select() {
        let mask = [1u8, 0, 1];
        let a = [10i64, 20, 30];
        let b = [-1i64, -2, -3];
        let mut out = [0i64; 3];
        select(&mask, &a, &b, &mut out);
        assert_eq!(out, [10, -2, 30]);
    }

    #[test]
    fn test_null_tests() {
        let data = [1.0f64, f64::NAN, 3.0];
        let mut out = [9u8; 3];
        is_null(&data, &mut out);
        assert_eq!(out, [0, 1, 0]);
        is_not_null(&data, &mut out);
        assert_eq!(out, [1, 0, 1]);
    }

    #[test]
    fn test_fill_null() {
        let data = [f64::NAN, 2.0, f64::NAN];
        let mut out = [0.0f64; 3];
        fill_null(&data, -1.0, &mut out);
        assert_eq!(out, [-1.0, 2.0, -1.0]);
    }

    #[test]
    fn test_forward_backward_fill() {
        let data = [f64::NAN, 1.0, f64::NAN, f64::NAN, 4.0, f64::NAN];
        let mut out = [0.0f64; 6];

        forward_fill(&data, &mut out);
        assert!(out[0].is_nan());
        assert_eq!(&out[1..5], &[1.0, 1.0, 1.0, 4.0]);
        assert_eq!(out[5], 4.0);

        backward_fill(&data, &mut out);
        assert_eq!(&out[0..2], &[1.0, 1.0]);
        assert_eq!(&out[2..5], &[4.0, 4.0, 4.0]);
        assert!(out[5].is_nan());
    }

    #[test]
    fn test_coalesce() {
        let a = [1.0f64, f64::NAN, f64::NAN];
        let b = [9.0f64, 2.0, f64::NAN];
        let mut out = [0.0f64; 3];
        coalesce(&a, &b, &mut out);
        assert_eq!(out[0], 1.0);
        assert_eq!(out[1], 2.0);
        assert!(out[2].is_nan());
    }
}
