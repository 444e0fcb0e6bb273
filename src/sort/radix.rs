/*!
 * LSD Radix Sort
 * Stable 8-bit-digit radix over order-preserving u64 keys
 *
 * Floats map through the sign-flip transform (negative values flip all
 * bits, positive values flip only the sign bit) so unsigned key order
 * equals value order. Eight passes ping-pong between the primary and one
 * scratch buffer; the even pass count lands the result back in the
 * primary. Descending order reverses the ascending result in place.
 */

use crate::core::types::Native;

const DIGITS: usize = 256;
const PASSES: usize = 8;

/// Invert the f64 order transform
#[inline]
fn f64_from_ordered(k: u64) -> f64 {
    const SIGN: u64 = 0x8000_0000_0000_0000;
    if k & SIGN != 0 {
        f64::from_bits(k ^ SIGN)
    } else {
        f64::from_bits(!k)
    }
}

/// Invert the i64 order transform
#[inline]
fn i64_from_ordered(k: u64) -> i64 {
    (k ^ (1u64 << 63)) as i64
}

fn radix_pass_u64(src: &[u64], dst: &mut [u64], shift: u32) {
    let mut counts = [0usize; DIGITS];
    for &k in src {
        counts[((k >> shift) & 0xFF) as usize] += 1;
    }
    let mut offsets = [0usize; DIGITS];
    let mut running = 0usize;
    for (off, &c) in offsets.iter_mut().zip(&counts) {
        *off = running;
        running += c;
    }
    for &k in src {
        let d = ((k >> shift) & 0xFF) as usize;
        dst[offsets[d]] = k;
        offsets[d] += 1;
    }
}

/// Sort raw u64 keys in place (ascending unsigned order)
pub fn radix_sort_keys(keys: &mut [u64]) {
    if keys.len() < 2 {
        return;
    }
    let mut scratch = vec![0u64; keys.len()];
    for pass in 0..PASSES {
        let shift = (pass * 8) as u32;
        if pass % 2 == 0 {
            radix_pass_u64(keys, &mut scratch, shift);
        } else {
            radix_pass_u64(&scratch, keys, shift);
        }
    }
}

/// Sorted copy of an f64 slice; stable for equal keys
#[must_use]
pub fn sort_f64(data: &[f64], ascending: bool) -> Vec<f64> {
    let mut keys: Vec<u64> = data.iter().map(|v| v.ordered_bits()).collect();
    radix_sort_keys(&mut keys);
    let mut out: Vec<f64> = keys.into_iter().map(f64_from_ordered).collect();
    if !ascending {
        out.reverse();
    }
    out
}

/// Sorted copy of an i64 slice
#[must_use]
pub fn sort_i64(data: &[i64], ascending: bool) -> Vec<i64> {
    let mut keys: Vec<u64> = data.iter().map(|v| v.ordered_bits()).collect();
    radix_sort_keys(&mut keys);
    let mut out: Vec<i64> = keys.into_iter().map(i64_from_ordered).collect();
    if !ascending {
        out.reverse();
    }
    out
}

/// (key, original index) record; radix passes move whole records so the
/// index rides along with its key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct SortPair {
    pub key: u64,
    pub idx: u32,
}

fn radix_pass_pairs(src: &[SortPair], dst: &mut [SortPair], shift: u32) {
    let mut counts = [0usize; DIGITS];
    for p in src {
        counts[((p.key >> shift) & 0xFF) as usize] += 1;
    }
    let mut offsets = [0usize; DIGITS];
    let mut running = 0usize;
    for (off, &c) in offsets.iter_mut().zip(&counts) {
        *off = running;
        running += c;
    }
    for &p in src {
        let d = ((p.key >> shift) & 0xFF) as usize;
        dst[offsets[d]] = p;
        offsets[d] += 1;
    }
}

/// Stable in-place (via scratch) radix sort of pair records by key
pub fn radix_sort_pairs(pairs: &mut [SortPair]) {
    if pairs.len() < 2 {
        return;
    }
    let mut scratch = vec![SortPair { key: 0, idx: 0 }; pairs.len()];
    for pass in 0..PASSES {
        let shift = (pass * 8) as u32;
        if pass % 2 == 0 {
            radix_pass_pairs(pairs, &mut scratch, shift);
        } else {
            radix_pass_pairs(&scratch, pairs, shift);
        }
    }
}

/// Build (ordered key, index) pairs for any scalar type
#[must_use]
pub fn build_pairs<T: Native>(data: &[T]) -> Vec<SortPair> {
    data.iter()
        .enumerate()
        .map(|(i, v)| SortPair {
            key: v.ordered_bits(),
            idx: i as u32,
        })
        .collect()
}

/// Index permutation that sorts `data`; stable in the ascending direction
#[must_use]
pub fn argsort<T: Native>(data: &[T], ascending: bool) -> Vec<u32> {
    let mut pairs = build_pairs(data);
    radix_sort_pairs(&mut pairs);
    let mut out: Vec<u32> = pairs.into_iter().map(|p| p.idx).collect();
    if !ascending {
        out.reverse();
    }
    out
}
