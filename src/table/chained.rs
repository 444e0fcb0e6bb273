/*!
 * Chained Hash Table
 * Head/next row-index chains for join builds
 *
 * `heads[hash & mask]` holds the first build row for a slot, `next[row]`
 * the rest of the chain; -1 terminates. Table size comes from a sampled
 * cardinality estimate: mostly-distinct keys get a 4x slot multiplier,
 * medium duplication 6x, heavy duplication 8x, rounded up to a power of
 * two and capped.
 */

use crate::core::limits::{CHAINED_TABLE_MAX_SLOTS, JOIN_SAMPLE_KEYS};
use crate::simd::hash::mix64_quality;

/// Sentinel terminating a chain
pub const CHAIN_END: i32 = -1;

pub struct ChainedTable {
    heads: Vec<i32>,
    next: Vec<i32>,
    mask: u64,
}

/// Slot count for `n` build rows from a quick duplicate-rate sample
#[must_use]
pub fn estimate_slots(keys: &[i64]) -> usize {
    let n = keys.len().max(1);
    let sample_n = JOIN_SAMPLE_KEYS.min(keys.len());
    let mut dups = 0usize;
    if sample_n > 1 {
        let stride = keys.len() / sample_n;
        let mut sample: Vec<i64> = (0..sample_n).map(|i| keys[i * stride]).collect();
        sample.sort_unstable();
        dups = sample.windows(2).filter(|w| w[0] == w[1]).count();
    }
    // Heavier duplication -> longer chains -> spread the heads wider
    let multiplier = if dups * 8 <= sample_n {
        4
    } else if dups * 2 <= sample_n {
        6
    } else {
        8
    };
    (n * multiplier)
        .next_power_of_two()
        .min(CHAINED_TABLE_MAX_SLOTS)
}

impl ChainedTable {
    /// Build over all rows of `keys`, chains in reverse row order (probe
    /// walks emit later build rows first)
    #[must_use]
    pub fn build(keys: &[i64]) -> Self {
        let slots = estimate_slots(keys);
        let mut table = Self {
            heads: vec![CHAIN_END; slots],
            next: vec![CHAIN_END; keys.len()],
            mask: (slots - 1) as u64,
        };
        for (row, &key) in keys.iter().enumerate() {
            let slot = (mix64_quality(key as u64) & table.mask) as usize;
            table.next[row] = table.heads[slot];
            table.heads[slot] = row as i32;
        }
        table
    }

    /// First candidate row for a hash, or CHAIN_END
    #[inline]
    #[must_use]
    pub fn head(&self, hash: u64) -> i32 {
        self.heads[(hash & self.mask) as usize]
    }

    /// Next row in the chain after `row`, or CHAIN_END
    #[inline]
    #[must_use]
    pub fn next(&self, row: i32) -> i32 {
        self.next[row as usize]
    }

    #[inline]
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.heads.len()
    }

    /// Pull the head slot for `hash` toward L1 ahead of the chain walk
    #[inline]
    pub fn prefetch(&self, hash: u64) {
        #[cfg(target_arch = "x86_64")]
        {
            let slot = (hash & self.mask) as usize;
            // SAFETY: in-bounds address; prefetch has no observable effect
            unsafe {
                use std::arch::x86_64::{_mm_prefetch, _MM_HINT_T0};
                _mm_prefetch(self.heads.as_ptr().add(slot) as *const i8, _MM_HINT_T0);
            }
        }
        #[cfg(not(target_arch = "x86_64"))]
        {
            let _ = hash;
        }
    }
}
