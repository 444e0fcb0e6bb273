/*!
 * Hash Kernels
 * Multiply-xor-shift mixing for grouping and join probing
 *
 * The fast mix is a single golden-ratio multiply folded with its own high
 * half; the quality mix adds a second multiply with a distinct secret and
 * is used on the join build/probe side where chain lengths are sensitive
 * to clustering. Floats hash their IEEE 754 bit pattern.
 */

use crate::core::limits::{HASH_SECRET, HASH_SECRET2};
use crate::core::types::Native;

/// Fast per-element mix
#[inline]
#[must_use]
pub fn mix64(x: u64) -> u64 {
    let h = x.wrapping_mul(HASH_SECRET);
    h ^ (h >> 32)
}

/// Two-multiply mix with distinct secrets; better avalanche for join keys
#[inline]
#[must_use]
pub fn mix64_quality(x: u64) -> u64 {
    let mut h = x.wrapping_mul(HASH_SECRET);
    h ^= h >> 32;
    h = h.wrapping_mul(HASH_SECRET2);
    h ^ (h >> 29)
}

/// Combine two hashes into one, folded through the fast mix
#[inline]
#[must_use]
pub fn combine(h1: u64, h2: u64) -> u64 {
    mix64(h1.wrapping_mul(HASH_SECRET) ^ h2)
}

/// Hash one value of any column scalar type
#[inline]
#[must_use]
pub fn hash_value<T: Native>(v: T) -> u64 {
    mix64(v.hash_bits())
}

/// Bulk fast mix over raw 64-bit patterns
pub fn hash_u64_scalar(keys: &[u64], out: &mut [u64]) {
    for (o, &k) in out.iter_mut().zip(keys) {
        *o = mix64(k);
    }
}

/// Bulk mix over a typed column slice
pub fn hash_slice<T: Native>(data: &[T], out: &mut [u64]) {
    for (o, &v) in out.iter_mut().zip(data) {
        *o = mix64(v.hash_bits());
    }
}

/// Bulk quality mix used by the join engines
pub fn hash_slice_quality<T: Native>(data: &[T], out: &mut [u64]) {
    for (o, &v) in out.iter_mut().zip(data) {
        *o = mix64_quality(v.hash_bits());
    }
}

#[cfg(target_arch = "x86_64")]
mod x86 {
    use crate::core::limits::HASH_SECRET;
    use std::arch::x86_64::*;

    // 64x64 low-half multiply from 32-bit partial products:
    // lo(a*k) = lo(a)*lo(k) + ((lo(a)*hi(k) + hi(a)*lo(k)) << 32)
    #[inline]
    #[target_feature(enable = "avx2")]
    unsafe fn mullo_epi64(a: __m256i, k: __m256i) -> __m256i {
        let a_hi = _mm256_srli_epi64(a, 32);
        let k_hi = _mm256_srli_epi64(k, 32);
        let lolo = _mm256_mul_epu32(a, k);
        let lohi = _mm256_mul_epu32(a, k_hi);
        let hilo = _mm256_mul_epu32(a_hi, k);
        let cross = _mm256_add_epi64(lohi, hilo);
        _mm256_add_epi64(lolo, _mm256_slli_epi64(cross, 32))
    }

    #[target_feature(enable = "avx2")]
    pub unsafe fn hash_u64_avx2(keys: &[u64], out: &mut [u64]) {
        let len = keys.len();
        let pk = keys.as_ptr();
        let po = out.as_mut_ptr();
        let secret = _mm256_set1_epi64x(HASH_SECRET as i64);
        let mut i = 0;
        while i + 4 <= len {
            let k = _mm256_loadu_si256(pk.add(i) as *const __m256i);
            let h = mullo_epi64(k, secret);
            let mixed = _mm256_xor_si256(h, _mm256_srli_epi64(h, 32));
            _mm256_storeu_si256(po.add(i) as *mut __m256i, mixed);
            i += 4;
        }
        while i < len {
            *po.add(i) = super::mix64(*pk.add(i));
            i += 1;
        }
    }
}

#[cfg(target_arch = "x86_64")]
pub fn hash_u64_256(keys: &[u64], out: &mut [u64]) {
    unsafe { x86::hash_u64_avx2(keys, out) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mix_is_deterministic_and_spreads() {
        assert_eq!(mix64(42), mix64(42));
        assert_ne!(mix64(1), mix64(2));
        // Consecutive keys should scatter across slots rather than cluster
        let mut slots: Vec<u64> = (0..256u64).map(|k| mix64(k) & 1023).collect();
        slots.sort_unstable();
        slots.dedup();
        assert!(slots.len() > 200, "only {} distinct slots", slots.len());
    }

    #[test]
    fn test_float_hash_uses_bits() {
        // 1.0 and -1.0 differ only in sign bit; hashes must differ
        assert_ne!(hash_value(1.0f64), hash_value(-1.0f64));
        // i32 and i64 with equal logical value agree
        assert_eq!(hash_value(-3i32), hash_value(-3i64));
    }

    #[test]
    fn test_quality_mix_differs_from_fast() {
        assert_ne!(mix64(7), mix64_quality(7));
    }

    #[test]
    fn test_combine_order_sensitive() {
        assert_ne!(combine(1, 2), combine(2, 1));
    }

    #[test]
    fn test_bulk_matches_single() {
        let keys: Vec<u64> = (0..133).map(|i| i * 7919).collect();
        let mut out = vec![0u64; keys.len()];
        hash_u64_scalar(&keys, &mut out);
        for (i, &k) in keys.iter().enumerate() {
            assert_eq!(out[i], mix64(k));
        }
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn test_avx2_matches_scalar() {
        if !is_x86_feature_detected!("avx2") {
            return;
        }
        let keys: Vec<u64> = (0u64..517).map(|i| i.wrapping_mul(0x0123_4567_89AB_CDEF)).collect();
        let mut want = vec![0u64; keys.len()];
        let mut got = vec![0u64; keys.len()];
        hash_u64_scalar(&keys, &mut want);
        hash_u64_256(&keys, &mut got);
        assert_eq!(want, got);
    }
}
