/*!
 * Compare Kernels
 * Element-wise comparisons producing u8 masks (1 = true, 0 = false)
 *
 * The mask layout is one byte per element so it converts to a SIMD bitmask
 * with a single movemask, and so filter can consume it without unpacking.
 */

use crate::core::types::Native;

/// Comparison operator for mask-building kernels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
}

macro_rules! scalar_cmp_loop {
    ($a:expr, $b:expr, $out:expr, $cmp:expr) => {{
        let cmp = $cmp;
        for ((o, &x), &y) in $out.iter_mut().zip($a.iter()).zip($b.iter()) {
            *o = cmp(x, y) as u8;
        }
    }};
}

/// `out[i] = a[i] <op> b[i]`
pub fn cmp_scalar<T: Native>(a: &[T], b: &[T], op: CmpOp, out: &mut [u8]) {
    debug_assert_eq!(a.len(), b.len());
    debug_assert_eq!(a.len(), out.len());
    // One loop per operator keeps each body trivially vectorizable
    match op {
        CmpOp::Gt => scalar_cmp_loop!(a, b, out, |x: T, y: T| x > y),
        CmpOp::Ge => scalar_cmp_loop!(a, b, out, |x: T, y: T| x >= y),
        CmpOp::Lt => scalar_cmp_loop!(a, b, out, |x: T, y: T| x < y),
        CmpOp::Le => scalar_cmp_loop!(a, b, out, |x: T, y: T| x <= y),
        CmpOp::Eq => scalar_cmp_loop!(a, b, out, |x: T, y: T| x == y),
        CmpOp::Ne => scalar_cmp_loop!(a, b, out, |x: T, y: T| x != y),
    }
}

/// `out[i] = a[i] <op> rhs`
pub fn cmp_const_scalar<T: Native>(a: &[T], rhs: T, op: CmpOp, out: &mut [u8]) {
    debug_assert_eq!(a.len(), out.len());
    match op {
        CmpOp::Gt => {
            for (o, &x) in out.iter_mut().zip(a) {
                *o = (x > rhs) as u8;
            }
        }
        CmpOp::Ge => {
            for (o, &x) in out.iter_mut().zip(a) {
                *o = (x >= rhs) as u8;
            }
        }
        CmpOp::Lt => {
            for (o, &x) in out.iter_mut().zip(a) {
                *o = (x < rhs) as u8;
            }
        }
        CmpOp::Le => {
            for (o, &x) in out.iter_mut().zip(a) {
                *o = (x <= rhs) as u8;
            }
        }
        CmpOp::Eq => {
            for (o, &x) in out.iter_mut().zip(a) {
                *o = (x == rhs) as u8;
            }
        }
        CmpOp::Ne => {
            for (o, &x) in out.iter_mut().zip(a) {
                *o = (x != rhs) as u8;
            }
        }
    }
}

#[cfg(target_arch = "x86_64")]
mod x86 {
    use super::CmpOp;
    use std::arch::x86_64::*;

    // Ordered, non-signaling predicates; Ne is unordered so NaN != NaN holds
    #[inline]
    #[target_feature(enable = "avx")]
    unsafe fn cmp_pd_dyn(a: __m256d, b: __m256d, op: CmpOp) -> __m256d {
        match op {
            CmpOp::Gt => _mm256_cmp_pd::<_CMP_GT_OQ>(a, b),
            CmpOp::Ge => _mm256_cmp_pd::<_CMP_GE_OQ>(a, b),
            CmpOp::Lt => _mm256_cmp_pd::<_CMP_LT_OQ>(a, b),
            CmpOp::Le => _mm256_cmp_pd::<_CMP_LE_OQ>(a, b),
            CmpOp::Eq => _mm256_cmp_pd::<_CMP_EQ_OQ>(a, b),
            CmpOp::Ne => _mm256_cmp_pd::<_CMP_NEQ_UQ>(a, b),
        }
    }

    #[inline]
    unsafe fn spread_mask4(m: u8, out: *mut u8) {
        *out = m & 1;
        *out.add(1) = (m >> 1) & 1;
        *out.add(2) = (m >> 2) & 1;
        *out.add(3) = (m >> 3) & 1;
    }

    #[target_feature(enable = "avx2")]
    pub unsafe fn cmp_f64_avx2(a: &[f64], b: &[f64], op: CmpOp, out: &mut [u8]) {
        let len = a.len();
        let pa = a.as_ptr();
        let pb = b.as_ptr();
        let po = out.as_mut_ptr();
        let mut i = 0;
        while i + 4 <= len {
            let cmp = cmp_pd_dyn(_mm256_loadu_pd(pa.add(i)), _mm256_loadu_pd(pb.add(i)), op);
            spread_mask4(_mm256_movemask_pd(cmp) as u8, po.add(i));
            i += 4;
        }
        if i < len {
            super::cmp_scalar(&a[i..], &b[i..], op, &mut out[i..]);
        }
    }

    #[target_feature(enable = "avx2")]
    pub unsafe fn cmp_const_f64_avx2(a: &[f64], rhs: f64, op: CmpOp, out: &mut [u8]) {
        let len = a.len();
        let pa = a.as_ptr();
        let po = out.as_mut_ptr();
        let rv = _mm256_set1_pd(rhs);
        let mut i = 0;
        while i + 4 <= len {
            let cmp = cmp_pd_dyn(_mm256_loadu_pd(pa.add(i)), rv, op);
            spread_mask4(_mm256_movemask_pd(cmp) as u8, po.add(i));
            i += 4;
        }
        if i < len {
            super::cmp_const_scalar(&a[i..], rhs, op, &mut out[i..]);
        }
    }

    // AVX-512 compares produce mask registers directly; one k-register
    // holds eight f64 lanes
    #[inline]
    #[target_feature(enable = "avx512f")]
    unsafe fn cmp_pd_mask512(a: __m512d, b: __m512d, op: CmpOp) -> u8 {
        match op {
            CmpOp::Gt => _mm512_cmp_pd_mask::<_CMP_GT_OQ>(a, b),
            CmpOp::Ge => _mm512_cmp_pd_mask::<_CMP_GE_OQ>(a, b),
            CmpOp::Lt => _mm512_cmp_pd_mask::<_CMP_LT_OQ>(a, b),
            CmpOp::Le => _mm512_cmp_pd_mask::<_CMP_LE_OQ>(a, b),
            CmpOp::Eq => _mm512_cmp_pd_mask::<_CMP_EQ_OQ>(a, b),
            CmpOp::Ne => _mm512_cmp_pd_mask::<_CMP_NEQ_UQ>(a, b),
        }
    }

    #[inline]
    unsafe fn spread_mask8(m: u8, out: *mut u8) {
        for lane in 0..8 {
            *out.add(lane) = (m >> lane) & 1;
        }
    }

    #[target_feature(enable = "avx512f")]
    pub unsafe fn cmp_f64_avx512(a: &[f64], b: &[f64], op: CmpOp, out: &mut [u8]) {
        let len = a.len();
        let pa = a.as_ptr();
        let pb = b.as_ptr();
        let po = out.as_mut_ptr();
        let mut i = 0;
        while i + 8 <= len {
            let m = cmp_pd_mask512(_mm512_loadu_pd(pa.add(i)), _mm512_loadu_pd(pb.add(i)), op);
            spread_mask8(m, po.add(i));
            i += 8;
        }
        if i < len {
            super::cmp_scalar(&a[i..], &b[i..], op, &mut out[i..]);
        }
    }

    #[target_feature(enable = "avx512f")]
    pub unsafe fn cmp_const_f64_avx512(a: &[f64], rhs: f64, op: CmpOp, out: &mut [u8]) {
        let len = a.len();
        let pa = a.as_ptr();
        let po = out.as_mut_ptr();
        let rv = _mm512_set1_pd(rhs);
        let mut i = 0;
        while i + 8 <= len {
            let m = cmp_pd_mask512(_mm512_loadu_pd(pa.add(i)), rv, op);
            spread_mask8(m, po.add(i));
            i += 8;
        }
        if i < len {
            super::cmp_const_scalar(&a[i..], rhs, op, &mut out[i..]);
        }
    }

    // AVX-512 i64 compares use the packed predicate form directly
    #[inline]
    #[target_feature(enable = "avx512f")]
    unsafe fn cmp_epi64_mask512(a: __m512i, b: __m512i, op: CmpOp) -> u8 {
        match op {
            CmpOp::Gt => _mm512_cmpgt_epi64_mask(a, b),
            CmpOp::Ge => _mm512_cmpge_epi64_mask(a, b),
            CmpOp::Lt => _mm512_cmplt_epi64_mask(a, b),
            CmpOp::Le => _mm512_cmple_epi64_mask(a, b),
            CmpOp::Eq => _mm512_cmpeq_epi64_mask(a, b),
            CmpOp::Ne => _mm512_cmpneq_epi64_mask(a, b),
        }
    }

    #[target_feature(enable = "avx512f")]
    pub unsafe fn cmp_i64_avx512(a: &[i64], b: &[i64], op: CmpOp, out: &mut [u8]) {
        let len = a.len();
        let pa = a.as_ptr();
        let pb = b.as_ptr();
        let po = out.as_mut_ptr();
        let mut i = 0;
        while i + 8 <= len {
            let m = cmp_epi64_mask512(
                _mm512_loadu_si512(pa.add(i) as *const __m512i),
                _mm512_loadu_si512(pb.add(i) as *const __m512i),
                op,
            );
            spread_mask8(m, po.add(i));
            i += 8;
        }
        if i < len {
            super::cmp_scalar(&a[i..], &b[i..], op, &mut out[i..]);
        }
    }

    #[target_feature(enable = "avx512f")]
    pub unsafe fn cmp_const_i64_avx512(a: &[i64], rhs: i64, op: CmpOp, out: &mut [u8]) {
        let len = a.len();
        let pa = a.as_ptr();
        let po = out.as_mut_ptr();
        let rv = _mm512_set1_epi64(rhs);
        let mut i = 0;
        while i + 8 <= len {
            let m = cmp_epi64_mask512(_mm512_loadu_si512(pa.add(i) as *const __m512i), rv, op);
            spread_mask8(m, po.add(i));
            i += 8;
        }
        if i < len {
            super::cmp_const_scalar(&a[i..], rhs, op, &mut out[i..]);
        }
    }

    // i64 compares are derived from cmpgt/cmpeq: Ge = !(b > a), Ne = !(a == b)
    #[inline]
    #[target_feature(enable = "avx2")]
    unsafe fn cmp_epi64_dyn(a: __m256i, b: __m256i, op: CmpOp) -> (__m256i, bool) {
        match op {
            CmpOp::Gt => (_mm256_cmpgt_epi64(a, b), false),
            CmpOp::Le => (_mm256_cmpgt_epi64(a, b), true),
            CmpOp::Lt => (_mm256_cmpgt_epi64(b, a), false),
            CmpOp::Ge => (_mm256_cmpgt_epi64(b, a), true),
            CmpOp::Eq => (_mm256_cmpeq_epi64(a, b), false),
            CmpOp::Ne => (_mm256_cmpeq_epi64(a, b), true),
        }
    }

    #[target_feature(enable = "avx2")]
    pub unsafe fn cmp_i64_avx2(a: &[i64], b: &[i64], op: CmpOp, out: &mut [u8]) {
        let len = a.len();
        let pa = a.as_ptr();
        let pb = b.as_ptr();
        let po = out.as_mut_ptr();
        let mut i = 0;
        while i + 4 <= len {
            let (cmp, invert) = cmp_epi64_dyn(
                _mm256_loadu_si256(pa.add(i) as *const __m256i),
                _mm256_loadu_si256(pb.add(i) as *const __m256i),
                op,
            );
            let mut m = _mm256_movemask_pd(_mm256_castsi256_pd(cmp)) as u8;
            if invert {
                m = !m & 0xF;
            }
            spread_mask4(m, po.add(i));
            i += 4;
        }
        if i < len {
            super::cmp_scalar(&a[i..], &b[i..], op, &mut out[i..]);
        }
    }

    #[target_feature(enable = "avx2")]
    pub unsafe fn cmp_const_i64_avx2(a: &[i64], rhs: i64, op: CmpOp, out: &mut [u8]) {
        let len = a.len();
        let pa = a.as_ptr();
        let po = out.as_mut_ptr();
        let rv = _mm256_set1_epi64x(rhs);
        let mut i = 0;
        while i + 4 <= len {
            let (cmp, invert) =
                cmp_epi64_dyn(_mm256_loadu_si256(pa.add(i) as *const __m256i), rv, op);
            let mut m = _mm256_movemask_pd(_mm256_castsi256_pd(cmp)) as u8;
            if invert {
                m = !m & 0xF;
            }
            spread_mask4(m, po.add(i));
            i += 4;
        }
        if i < len {
            super::cmp_const_scalar(&a[i..], rhs, op, &mut out[i..]);
        }
    }
}

// Safe wrappers bound into the dispatch table after feature detection
#[cfg(target_arch = "x86_64")]
pub fn cmp_f64_256(a: &[f64], b: &[f64], op: CmpOp, out: &mut [u8]) {
    unsafe { x86::cmp_f64_avx2(a, b, op, out) }
}

#[cfg(target_arch = "x86_64")]
pub fn cmp_f64_512(a: &[f64], b: &[f64], op: CmpOp, out: &mut [u8]) {
    unsafe { x86::cmp_f64_avx512(a, b, op, out) }
}

#[cfg(target_arch = "x86_64")]
pub fn cmp_const_f64_512(a: &[f64], rhs: f64, op: CmpOp, out: &mut [u8]) {
    unsafe { x86::cmp_const_f64_avx512(a, rhs, op, out) }
}

#[cfg(target_arch = "x86_64")]
pub fn cmp_i64_512(a: &[i64], b: &[i64], op: CmpOp, out: &mut [u8]) {
    unsafe { x86::cmp_i64_avx512(a, b, op, out) }
}

#[cfg(target_arch = "x86_64")]
pub fn cmp_const_i64_512(a: &[i64], rhs: i64, op: CmpOp, out: &mut [u8]) {
    unsafe { x86::cmp_const_i64_avx512(a, rhs, op, out) }
}

#[cfg(target_arch = "x86_64")]
pub fn cmp_const_f64_256(a: &[f64], rhs: f64, op: CmpOp, out: &mut [u8]) {
    unsafe { x86::cmp_const_f64_avx2(a, rhs, op, out) }
}

#[cfg(target_arch = "x86_64")]
pub fn cmp_i64_256(a: &[i64], b: &[i64], op: CmpOp, out: &mut [u8]) {
    unsafe { x86::cmp_i64_avx2(a, b, op, out) }
}

#[cfg(target_arch = "x86_64")]
pub fn cmp_const_i64_256(a: &[i64], rhs: i64, op: CmpOp, out: &mut [u8]) {
    unsafe { x86::cmp_const_i64_avx2(a, rhs, op, out) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_cmp_all_ops() {
        let a = [1.0f64, 2.0, 3.0, 4.0];
        let b = [2.0f64, 2.0, 2.0, 2.0];
        let mut out = [0u8; 4];

        cmp_scalar(&a, &b, CmpOp::Gt, &mut out);
        assert_eq!(out, [0, 0, 1, 1]);
        cmp_scalar(&a, &b, CmpOp::Ge, &mut out);
        assert_eq!(out, [0, 1, 1, 1]);
        cmp_scalar(&a, &b, CmpOp::Lt, &mut out);
        assert_eq!(out, [1, 0, 0, 0]);
        cmp_scalar(&a, &b, CmpOp::Le, &mut out);
        assert_eq!(out, [1, 1, 0, 0]);
        cmp_scalar(&a, &b, CmpOp::Eq, &mut out);
        assert_eq!(out, [0, 1, 0, 0]);
        cmp_scalar(&a, &b, CmpOp::Ne, &mut out);
        assert_eq!(out, [1, 0, 1, 1]);
    }

    #[test]
    fn test_cmp_const() {
        let a = [5i64, -3, 7, 0, 7];
        let mut out = [0u8; 5];
        cmp_const_scalar(&a, 7, CmpOp::Eq, &mut out);
        assert_eq!(out, [0, 0, 1, 0, 1]);
        cmp_const_scalar(&a, 0, CmpOp::Lt, &mut out);
        assert_eq!(out, [0, 1, 0, 0, 0]);
    }

    #[test]
    fn test_nan_compares_false_except_ne() {
        let a = [f64::NAN, 1.0];
        let b = [f64::NAN, f64::NAN];
        let mut out = [9u8; 2];
        cmp_scalar(&a, &b, CmpOp::Eq, &mut out);
        assert_eq!(out, [0, 0]);
        cmp_scalar(&a, &b, CmpOp::Ne, &mut out);
        assert_eq!(out, [1, 1]);
        cmp_scalar(&a, &b, CmpOp::Le, &mut out);
        assert_eq!(out, [0, 0]);
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn test_avx2_matches_scalar() {
        if !is_x86_feature_detected!("avx2") {
            return;
        }
        let a: Vec<f64> = (0..103).map(|i| ((i * 37) % 19) as f64).collect();
        let b: Vec<f64> = (0..103).map(|i| ((i * 17) % 19) as f64).collect();
        let ints_a: Vec<i64> = a.iter().map(|&v| v as i64 - 9).collect();
        let ints_b: Vec<i64> = b.iter().map(|&v| v as i64 - 9).collect();
        for op in [CmpOp::Gt, CmpOp::Ge, CmpOp::Lt, CmpOp::Le, CmpOp::Eq, CmpOp::Ne] {
            let mut want = vec![0u8; a.len()];
            let mut got = vec![0u8; a.len()];
            cmp_scalar(&a, &b, op, &mut want);
            cmp_f64_256(&a, &b, op, &mut got);
            assert_eq!(want, got, "f64 {op:?}");

            cmp_scalar(&ints_a, &ints_b, op, &mut want);
            cmp_i64_256(&ints_a, &ints_b, op, &mut got);
            assert_eq!(want, got, "i64 {op:?}");

            cmp_const_scalar(&a, 9.0, op, &mut want);
            cmp_const_f64_256(&a, 9.0, op, &mut got);
            assert_eq!(want, got, "f64 const {op:?}");

            cmp_const_scalar(&ints_a, 0, op, &mut want);
            cmp_const_i64_256(&ints_a, 0, op, &mut got);
            assert_eq!(want, got, "i64 const {op:?}");
        }
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn test_avx512_matches_scalar() {
        if !is_x86_feature_detected!("avx512f") {
            return;
        }
        let a: Vec<f64> = (0..107).map(|i| ((i * 13) % 23) as f64 - 11.0).collect();
        let b: Vec<f64> = (0..107).map(|i| ((i * 7) % 23) as f64 - 11.0).collect();
        for op in [CmpOp::Gt, CmpOp::Ge, CmpOp::Lt, CmpOp::Le, CmpOp::Eq, CmpOp::Ne] {
            let mut want = vec![0u8; a.len()];
            let mut got = vec![0u8; a.len()];
            cmp_scalar(&a, &b, op, &mut want);
            cmp_f64_512(&a, &b, op, &mut got);
            assert_eq!(want, got, "{op:?}");

            cmp_const_scalar(&a, 0.0, op, &mut want);
            cmp_const_f64_512(&a, 0.0, op, &mut got);
            assert_eq!(want, got, "const {op:?}");

            let ia: Vec<i64> = a.iter().map(|&v| v as i64).collect();
            let ib: Vec<i64> = b.iter().map(|&v| v as i64).collect();
            cmp_scalar(&ia, &ib, op, &mut want);
            cmp_i64_512(&ia, &ib, op, &mut got);
            assert_eq!(want, got, "i64 {op:?}");

            cmp_const_scalar(&ia, -3, op, &mut want);
            cmp_const_i64_512(&ia, -3, op, &mut got);
            assert_eq!(want, got, "i64 const {op:?}");
        }
    }
}
