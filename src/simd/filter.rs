/*!
 * Filter Kernels
 * Mask counting, mask-to-indices, and fused compare-and-collect
 *
 * Masks are u8 arrays holding 0 or 1. The fused filter_gt path skips the
 * intermediate mask entirely and writes matching row indices directly.
 */

/// Count set entries in a 0/1 mask
#[must_use]
pub fn count_mask(mask: &[u8]) -> usize {
    // u8 adds saturate at 255, so accumulate in chunks
    let mut total = 0usize;
    for chunk in mask.chunks(255) {
        let mut acc = 0u32;
        for &m in chunk {
            acc += u32::from(m);
        }
        total += acc as usize;
    }
    total
}

/// Collect indices of set mask entries, in order
pub fn mask_to_indices(mask: &[u8], out: &mut Vec<u32>) {
    out.clear();
    for (i, &m) in mask.iter().enumerate() {
        if m != 0 {
            out.push(i as u32);
        }
    }
}

/// Fused filter: indices of elements strictly greater than `threshold`
pub fn filter_gt_f64(data: &[f64], threshold: f64, out: &mut Vec<u32>) {
    out.clear();

    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx512f") {
            unsafe { x86::filter_gt_f64_avx512(data, threshold, out) };
            return;
        }
        if is_x86_feature_detected!("avx2") {
            unsafe { x86::filter_gt_f64_avx2(data, threshold, out) };
            return;
        }
    }

    filter_gt_f64_scalar(data, threshold, out);
}

pub(crate) fn filter_gt_f64_scalar(data: &[f64], threshold: f64, out: &mut Vec<u32>) {
    for (i, &v) in data.iter().enumerate() {
        if v > threshold {
            out.push(i as u32);
        }
    }
}

/// Fused filter over i64 data
pub fn filter_gt_i64(data: &[i64], threshold: i64, out: &mut Vec<u32>) {
    out.clear();

    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            unsafe { x86::filter_gt_i64_avx2(data, threshold, out) };
            return;
        }
    }

    for (i, &v) in data.iter().enumerate() {
        if v > threshold {
            out.push(i as u32);
        }
    }
}

#[cfg(target_arch = "x86_64")]
mod x86 {
    use std::arch::x86_64::*;

    #[target_feature(enable = "avx2")]
    pub unsafe fn filter_gt_f64_avx2(data: &[f64], threshold: f64, out: &mut Vec<u32>) {
        let len = data.len();
        let ptr = data.as_ptr();
        let tv = _mm256_set1_pd(threshold);
        let mut i = 0;
        while i + 4 <= len {
            let cmp = _mm256_cmp_pd::<_CMP_GT_OQ>(_mm256_loadu_pd(ptr.add(i)), tv);
            let mut m = _mm256_movemask_pd(cmp) as u32;
            while m != 0 {
                let lane = m.trailing_zeros();
                out.push(i as u32 + lane);
                m &= m - 1;
            }
            i += 4;
        }
        while i < len {
            if *ptr.add(i) > threshold {
                out.push(i as u32);
            }
            i += 1;
        }
    }

    #[target_feature(enable = "avx512f")]
    pub unsafe fn filter_gt_f64_avx512(data: &[f64], threshold: f64, out: &mut Vec<u32>) {
        let len = data.len();
        let ptr = data.as_ptr();
        let tv = _mm512_set1_pd(threshold);
        let mut i = 0;
        while i + 8 <= len {
            let mut m =
                _mm512_cmp_pd_mask::<_CMP_GT_OQ>(_mm512_loadu_pd(ptr.add(i)), tv) as u32;
            while m != 0 {
                let lane = m.trailing_zeros();
                out.push(i as u32 + lane);
                m &= m - 1;
            }
            i += 8;
        }
        while i < len {
            if *ptr.add(i) > threshold {
                out.push(i as u32);
            }
            i += 1;
        }
    }

    #[target_feature(enable = "avx2")]
    pub unsafe fn filter_gt_i64_avx2(data: &[i64], threshold: i64, out: &mut Vec<u32>) {
        let len = data.len();
        let ptr = data.as_ptr();
        let tv = _mm256_set1_epi64x(threshold);
        let mut i = 0;
        while i + 4 <= len {
            let v = _mm256_loadu_si256(ptr.add(i) as *const __m256i);
            let cmp = _mm256_cmpgt_epi64(v, tv);
            let mut m = _mm256_movemask_pd(_mm256_castsi256_pd(cmp)) as u32;
            while m != 0 {
                let lane = m.trailing_zeros();
                out.push(i as u32 + lane);
                m &= m - 1;
            }
            i += 4;
        }
        while i < len {
            if *ptr.add(i) > threshold {
                out.push(i as u32);
            }
            i += 1;
        }
    }
}
