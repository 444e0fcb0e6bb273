/*!
 * Gather Kernels
 * Index-driven selection with -1 null sentinels
 *
 * `dst[i] = idx[i] < 0 ? null_fill : src[idx[i]]`. Out-of-range indices are
 * treated as null rather than as errors. When any sentinel is present the
 * caller builds a validity bitmap from the index array in a separate
 * vectorized pass.
 */

use crate::core::bitmap::{bit_set, bitmap_bytes};
use crate::core::types::Native;

/// Gather with null filling; returns the number of null outputs
pub fn gather<T: Native>(src: &[T], indices: &[i64], out: &mut [T]) -> usize {
    debug_assert_eq!(indices.len(), out.len());
    let n = src.len() as i64;
    let mut nulls = 0usize;
    for (o, &ix) in out.iter_mut().zip(indices) {
        if ix >= 0 && ix < n {
            *o = src[ix as usize];
        } else {
            *o = T::NULL_FILL;
            nulls += 1;
        }
    }
    nulls
}

/// Build an LSB-first validity bitmap from an index array: bit set where
/// `0 <= idx[i] < src_len`. Returns the null count.
pub fn validity_from_indices(indices: &[i64], src_len: usize, bitmap: &mut Vec<u8>) -> usize {
    bitmap.clear();
    bitmap.resize(bitmap_bytes(indices.len()), 0);

    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            return unsafe { x86::validity_from_indices_avx2(indices, src_len, bitmap) };
        }
    }

    validity_from_indices_scalar(indices, src_len, bitmap)
}

pub(crate) fn validity_from_indices_scalar(
    indices: &[i64],
    src_len: usize,
    bitmap: &mut [u8],
) -> usize {
    let n = src_len as i64;
    let mut nulls = 0usize;
    for (i, &ix) in indices.iter().enumerate() {
        if ix >= 0 && ix < n {
            bit_set(bitmap, i);
        } else {
            nulls += 1;
        }
    }
    nulls
}

#[cfg(target_arch = "x86_64")]
mod x86 {
    use std::arch::x86_64::*;

    /// Compare-to-range + movemask, one output byte per 8 indices
    #[target_feature(enable = "avx2")]
    pub unsafe fn validity_from_indices_avx2(
        indices: &[i64],
        src_len: usize,
        bitmap: &mut [u8],
    ) -> usize {
        let len = indices.len();
        let ptr = indices.as_ptr();
        let zero = _mm256_setzero_si256();
        let bound = _mm256_set1_epi64x(src_len as i64);
        let mut nulls = 0usize;
        let mut i = 0;
        while i + 8 <= len {
            let lo = _mm256_loadu_si256(ptr.add(i) as *const __m256i);
            let hi = _mm256_loadu_si256(ptr.add(i + 4) as *const __m256i);
            // valid = !(idx < 0) && (bound > idx)
            let lo_ok = _mm256_andnot_si256(
                _mm256_cmpgt_epi64(zero, lo),
                _mm256_cmpgt_epi64(bound, lo),
            );
            let hi_ok = _mm256_andnot_si256(
                _mm256_cmpgt_epi64(zero, hi),
                _mm256_cmpgt_epi64(bound, hi),
            );
            let lo_bits = _mm256_movemask_pd(_mm256_castsi256_pd(lo_ok)) as u32;
            let hi_bits = _mm256_movemask_pd(_mm256_castsi256_pd(hi_ok)) as u32;
            let byte = (lo_bits | (hi_bits << 4)) as u8;
            bitmap[i / 8] = byte;
            nulls += 8 - byte.count_ones() as usize;
            i += 8;
        }
        if i < len {
            nulls += super::validity_from_indices_scalar(&indices[i..], src_len, &mut bitmap[i / 8..]);
        }
        nulls
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bitmap::bit_get;

    #[test]
    fn test_gather_basic() {
        let src = [10.0f64, 20.0, 30.0, 40.0];
        let idx = [3i64, 0, 2];
        let mut out = [0.0f64; 3];
        assert_eq!(gather(&src, &idx, &mut out), 0);
        assert_eq!(out, [40.0, 10.0, 30.0]);
    }

    #[test]
    fn test_gather_null_fill() {
        let src = [10i64, 20, 30];
        let idx = [1i64, -1, 5, 0];
        let mut out = [0i64; 4];
        assert_eq!(gather(&src, &idx, &mut out), 2);
        assert_eq!(out, [20, 0, 0, 10]);

        let fsrc = [1.5f64, 2.5];
        let mut fout = [0.0f64; 2];
        assert_eq!(gather(&fsrc, &[-1, 1], &mut fout), 1);
        assert!(fout[0].is_nan());
        assert_eq!(fout[1], 2.5);
    }

    #[test]
    fn test_validity_bitmap_from_indices() {
        let idx: Vec<i64> = (0..29)
            .map(|i| if i % 3 == 0 { -1 } else { i } )
            .collect();
        let mut bm = Vec::new();
        let nulls = validity_from_indices(&idx, 100, &mut bm);
        assert_eq!(nulls, 10);
        for (i, &ix) in idx.iter().enumerate() {
            assert_eq!(bit_get(&bm, i), ix >= 0, "bit {i}");
        }
    }

    #[test]
    fn test_out_of_range_is_null() {
        let idx = [0i64, 4, 3];
        let mut bm = Vec::new();
        let nulls = validity_from_indices(&idx, 4, &mut bm);
        assert_eq!(nulls, 1);
        assert!(bit_get(&bm, 0));
        assert!(!bit_get(&bm, 1));
        assert!(bit_get(&bm, 2));
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn test_vector_validity_matches_scalar() {
        if !is_x86_feature_detected!("avx2") {
            return;
        }
        let idx: Vec<i64> = (0..1003)
            .map(|i| match i % 5 {
                0 => -1,
                1 => i * 2,
                _ => i % 700,
            })
            .collect();
        let mut fast = Vec::new();
        let nulls_fast = validity_from_indices(&idx, 700, &mut fast);
        let mut slow = vec![0u8; bitmap_bytes(idx.len())];
        let nulls_slow = validity_from_indices_scalar(&idx, 700, &mut slow);
        assert_eq!(nulls_fast, nulls_slow);
        assert_eq!(fast, slow);
    }
}
