/*!
 * Element-wise Arithmetic Kernels
 * add/sub/mul over all dtypes, div over floats, plus scalar broadcasts
 *
 * Integer arithmetic wraps (two's complement); float division follows
 * IEEE 754 so x/0 yields an infinity or NaN rather than an error.
 */

use crate::core::types::{Float, Native};

pub fn add<T: Native>(a: &[T], b: &[T], out: &mut [T]) {
    for ((o, &x), &y) in out.iter_mut().zip(a).zip(b) {
        *o = x.add_wrap(y);
    }
}

pub fn sub<T: Native>(a: &[T], b: &[T], out: &mut [T]) {
    for ((o, &x), &y) in out.iter_mut().zip(a).zip(b) {
        *o = x.sub_wrap(y);
    }
}

pub fn mul<T: Native>(a: &[T], b: &[T], out: &mut [T]) {
    for ((o, &x), &y) in out.iter_mut().zip(a).zip(b) {
        *o = x.mul_wrap(y);
    }
}

pub fn div<T: Float>(a: &[T], b: &[T], out: &mut [T]) {
    for ((o, &x), &y) in out.iter_mut().zip(a).zip(b) {
        *o = x.div(y);
    }
}

pub fn add_scalar<T: Native>(a: &[T], rhs: T, out: &mut [T]) {
    for (o, &x) in out.iter_mut().zip(a) {
        *o = x.add_wrap(rhs);
    }
}

pub fn mul_scalar<T: Native>(a: &[T], rhs: T, out: &mut [T]) {
    for (o, &x) in out.iter_mut().zip(a) {
        *o = x.mul_wrap(rhs);
    }
}

#[cfg(target_arch = "x86_64")]
mod x86 {
    use std::arch::x86_64::*;

    macro_rules! binop_f64_avx2 {
        ($name:ident, $vop:ident, $sop:tt) => {
            #[target_feature(enable = "avx2")]
            pub unsafe fn $name(a: &[f64], b: &[f64], out: &mut [f64]) {
                let len = a.len();
                let pa = a.as_ptr();
                let pb = b.as_ptr();
                let po = out.as_mut_ptr();
                let mut i = 0;
                while i + 8 <= len {
                    let r0 = $vop(_mm256_loadu_pd(pa.add(i)), _mm256_loadu_pd(pb.add(i)));
                    let r1 = $vop(_mm256_loadu_pd(pa.add(i + 4)), _mm256_loadu_pd(pb.add(i + 4)));
                    _mm256_storeu_pd(po.add(i), r0);
                    _mm256_storeu_pd(po.add(i + 4), r1);
                    i += 8;
                }
                while i + 4 <= len {
                    let r = $vop(_mm256_loadu_pd(pa.add(i)), _mm256_loadu_pd(pb.add(i)));
                    _mm256_storeu_pd(po.add(i), r);
                    i += 4;
                }
                while i < len {
                    *po.add(i) = *pa.add(i) $sop *pb.add(i);
                    i += 1;
                }
            }
        };
    }

    binop_f64_avx2!(add_f64_avx2, _mm256_add_pd, +);
    binop_f64_avx2!(sub_f64_avx2, _mm256_sub_pd, -);
    binop_f64_avx2!(mul_f64_avx2, _mm256_mul_pd, *);
    binop_f64_avx2!(div_f64_avx2, _mm256_div_pd, /);

    macro_rules! scalar_op_f64_avx2 {
        ($name:ident, $vop:ident, $sop:tt) => {
            #[target_feature(enable = "avx2")]
            pub unsafe fn $name(a: &[f64], rhs: f64, out: &mut [f64]) {
                let len = a.len();
                let pa = a.as_ptr();
                let po = out.as_mut_ptr();
                let rv = _mm256_set1_pd(rhs);
                let mut i = 0;
                while i + 4 <= len {
                    _mm256_storeu_pd(po.add(i), $vop(_mm256_loadu_pd(pa.add(i)), rv));
                    i += 4;
                }
                while i < len {
                    *po.add(i) = *pa.add(i) $sop rhs;
                    i += 1;
                }
            }
        };
    }

    scalar_op_f64_avx2!(add_scalar_f64_avx2, _mm256_add_pd, +);
    scalar_op_f64_avx2!(mul_scalar_f64_avx2, _mm256_mul_pd, *);
}

#[cfg(target_arch = "x86_64")]
pub fn add_f64_256(a: &[f64], b: &[f64], out: &mut [f64]) {
    unsafe { x86::add_f64_avx2(a, b, out) }
}

#[cfg(target_arch = "x86_64")]
pub fn sub_f64_256(a: &[f64], b: &[f64], out: &mut [f64]) {
    unsafe { x86::sub_f64_avx2(a, b, out) }
}

#[cfg(target_arch = "x86_64")]
pub fn mul_f64_256(a: &[f64], b: &[f64], out: &mut [f64]) {
    unsafe { x86::mul_f64_avx2(a, b, out) }
}

#[cfg(target_arch = "x86_64")]
pub fn div_f64_256(a: &[f64], b: &[f64], out: &mut [f64]) {
    unsafe { x86::div_f64_avx2(a, b, out) }
}

#[cfg(target_arch = "x86_64")]
pub fn add_scalar_f64_256(a: &[f64], rhs: f64, out: &mut [f64]) {
    unsafe { x86::add_scalar_f64_avx2(a, rhs, out) }
}

#[cfg(target_arch = "x86_64")]
pub fn mul_scalar_f64_256(a: &[f64], rhs: f64, out: &mut [f64]) {
    unsafe { x86::mul_scalar_f64_avx2(a, rhs, out) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_sub_mul() {
        let a = [1.0f64, 2.0, 3.0];
        let b = [0.5f64, 0.25, -1.0];
        let mut out = [0.0f64; 3];
        add(&a, &b, &mut out);
        assert_eq!(out, [1.5, 2.25, 2.0]);
        sub(&a, &b, &mut out);
        assert_eq!(out, [0.5, 1.75, 4.0]);
        mul(&a, &b, &mut out);
        assert_eq!(out, [0.5, 0.5, -3.0]);
    }

    #[test]
    fn test_div_ieee() {
        let a = [1.0f64, -1.0, 0.0];
        let b = [0.0f64, 0.0, 0.0];
        let mut out = [0.0f64; 3];
        div(&a, &b, &mut out);
        assert_eq!(out[0], f64::INFINITY);
        assert_eq!(out[1], f64::NEG_INFINITY);
        assert!(out[2].is_nan());
    }

    #[test]
    fn test_int_wrapping() {
        let a = [i32::MAX, 1];
        let b = [1i32, 2];
        let mut out = [0i32; 2];
        add(&a, &b, &mut out);
        assert_eq!(out, [i32::MIN, 3]);
    }

    #[test]
    fn test_scalar_broadcast() {
        let a = [1i64, 2, 3];
        let mut out = [0i64; 3];
        add_scalar(&a, 10, &mut out);
        assert_eq!(out, [11, 12, 13]);
        mul_scalar(&a, -2, &mut out);
        assert_eq!(out, [-2, -4, -6]);
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn test_avx2_matches_scalar() {
        if !is_x86_feature_detected!("avx2") {
            return;
        }
        let a: Vec<f64> = (0..101).map(|i| i as f64 * 1.25).collect();
        let b: Vec<f64> = (0..101).map(|i| (i as f64) - 50.0).collect();
        let mut want = vec![0.0; a.len()];
        let mut got = vec![0.0; a.len()];

        add(&a, &b, &mut want);
        add_f64_256(&a, &b, &mut got);
        assert_eq!(want, got);

        div(&a, &b, &mut want);
        div_f64_256(&a, &b, &mut got);
        for (w, g) in want.iter().zip(&got) {
            assert!(w == g || (w.is_nan() && g.is_nan()));
        }

        mul_scalar(&a, 3.5, &mut want);
        mul_scalar_f64_256(&a, 3.5, &mut got);
        assert_eq!(want, got);
    }
}
