/*!
 * Join Engine
 *
 * Hash-based equi-joins over i64 keys: build a chained table on the right
 * side, probe the left with 4-key interleaved batching. Variants: parallel
 * range-partitioned probe, a lock-free pre-partitioned build (the radix
 * path), a Swiss-table probe, a sort-merge path, and end-to-end entry
 * points that also materialize every payload column.
 */

use crate::column::Column;
use crate::core::errors::{DataError, KernelError, Result};
use crate::core::limits::{JOIN_PROBE_BATCH, PARTITIONED_JOIN_BUILD_THRESHOLD};
use crate::runtime::{self, OpKind};
use crate::simd::hash::mix64_quality;
use crate::table::{ChainedTable, SwissTable, CHAIN_END};
use std::ops::Range;

/// Matched row pairs; `right_indices[i] == -1` marks an unmatched left row
/// in a left join
pub struct JoinResult {
    pub left_indices: Vec<i64>,
    pub right_indices: Vec<i64>,
}

impl JoinResult {
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.left_indices.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.left_indices.is_empty()
    }
}

/// Walk one chain, emitting every key match
#[inline]
fn emit_matches(
    table: &ChainedTable,
    right_keys: &[i64],
    key: i64,
    hash: u64,
    probe_row: usize,
    out_l: &mut Vec<i64>,
    out_r: &mut Vec<i64>,
) {
    let mut row = table.head(hash);
    while row != CHAIN_END {
        if right_keys[row as usize] == key {
            out_l.push(probe_row as i64);
            out_r.push(i64::from(row));
        }
        row = table.next(row);
    }
}

/// Probe a contiguous range of the left side. Four keys are hashed and
/// their slots prefetched before any chain walk starts, so the walks hit
/// warm lines.
fn probe_range(
    table: &ChainedTable,
    left_keys: &[i64],
    right_keys: &[i64],
    // Declared by the probe ABI; the chain walk never reads it
    _build_len: usize,
    range: Range<usize>,
    left_join: bool,
    out_l: &mut Vec<i64>,
    out_r: &mut Vec<i64>,
) {
    let mut i = range.start;
    let mut hashes = [0u64; JOIN_PROBE_BATCH];
    while i + JOIN_PROBE_BATCH <= range.end {
        for (j, h) in hashes.iter_mut().enumerate() {
            *h = mix64_quality(left_keys[i + j] as u64);
            table.prefetch(*h);
        }
        for (j, &h) in hashes.iter().enumerate() {
            let row = i + j;
            let before = out_l.len();
            emit_matches(table, right_keys, left_keys[row], h, row, out_l, out_r);
            if left_join && out_l.len() == before {
                out_l.push(row as i64);
                out_r.push(-1);
            }
        }
        i += JOIN_PROBE_BATCH;
    }
    for row in i..range.end {
        let h = mix64_quality(left_keys[row] as u64);
        let before = out_l.len();
        emit_matches(table, right_keys, left_keys[row], h, row, out_l, out_r);
        if left_join && out_l.len() == before {
            out_l.push(row as i64);
            out_r.push(-1);
        }
    }
}

fn hash_join(left_keys: &[i64], right_keys: &[i64], left_join: bool) -> JoinResult {
    let table = ChainedTable::build(right_keys);
    let mut out_l = Vec::new();
    let mut out_r = Vec::new();
    probe_range(
        &table,
        left_keys,
        right_keys,
        right_keys.len(),
        0..left_keys.len(),
        left_join,
        &mut out_l,
        &mut out_r,
    );
    JoinResult {
        left_indices: out_l,
        right_indices: out_r,
    }
}

/// Inner equi-join: every (l, r) with `left_keys[l] == right_keys[r]`
#[must_use]
pub fn inner_join_i64(left_keys: &[i64], right_keys: &[i64]) -> JoinResult {
    hash_join(left_keys, right_keys, false)
}

/// Left join: unmatched left rows appear once with right index -1
#[must_use]
pub fn left_join_i64(left_keys: &[i64], right_keys: &[i64]) -> JoinResult {
    hash_join(left_keys, right_keys, true)
}

/// Serial build, probe partitioned into equal contiguous ranges across the
/// pool; per-range buffers concatenate in range order so the output is
/// identical to the serial probe
fn parallel_hash_join(left_keys: &[i64], right_keys: &[i64], left_join: bool) -> JoinResult {
    if !runtime::should_parallelize(OpKind::Join, left_keys.len()) {
        return hash_join(left_keys, right_keys, left_join);
    }
    let table = ChainedTable::build(right_keys);
    let workers = runtime::num_workers();
    let chunk = left_keys.len().div_ceil(workers).max(1);

    let (out_l, out_r) = runtime::parallel_reduce(
        left_keys.len(),
        Some(chunk),
        (Vec::new(), Vec::new()),
        |r| {
            let mut l = Vec::new();
            let mut rr = Vec::new();
            probe_range(&table, left_keys, right_keys, right_keys.len(), r, left_join, &mut l, &mut rr);
            (l, rr)
        },
        |(mut al, mut ar), (bl, br)| {
            al.extend_from_slice(&bl);
            ar.extend_from_slice(&br);
            (al, ar)
        },
    );
    JoinResult {
        left_indices: out_l,
        right_indices: out_r,
    }
}

#[must_use]
pub fn parallel_inner_join_i64(left_keys: &[i64], right_keys: &[i64]) -> JoinResult {
    parallel_hash_join(left_keys, right_keys, false)
}

#[must_use]
pub fn parallel_left_join_i64(left_keys: &[i64], right_keys: &[i64]) -> JoinResult {
    parallel_hash_join(left_keys, right_keys, true)
}

// =============================================================================
// Swiss-table variant
// =============================================================================

/// Inner join probing a Swiss table instead of the chained slots; the
/// build chains duplicate build rows through a `next` array hung off the
/// slot's head value
#[must_use]
pub fn inner_join_i64_swiss(left_keys: &[i64], right_keys: &[i64]) -> JoinResult {
    let mut table = SwissTable::with_capacity(right_keys.len());
    let mut next = vec![CHAIN_END; right_keys.len()];
    for (row, &key) in right_keys.iter().enumerate() {
        let hash = mix64_quality(key as u64);
        let (slot, inserted) = table.find_or_insert(hash, key);
        if inserted {
            table.set_value(slot, row as u32);
        } else {
            next[row] = table.value(slot) as i32;
            table.set_value(slot, row as u32);
        }
    }

    let mut out_l = Vec::new();
    let mut out_r = Vec::new();
    for (probe_row, &key) in left_keys.iter().enumerate() {
        let hash = mix64_quality(key as u64);
        if let Some(slot) = table.find(hash, key) {
            let mut row = table.value(slot) as i32;
            while row != CHAIN_END {
                out_l.push(probe_row as i64);
                out_r.push(i64::from(row));
                row = next[row as usize];
            }
        }
    }
    JoinResult {
        left_indices: out_l,
        right_indices: out_r,
    }
}

// =============================================================================
// Lock-free pre-partitioned variant (radix path)
// =============================================================================

struct Partition {
    keys: Vec<i64>,
    rows: Vec<u32>,
    table: ChainedTable,
}

/// Build side pre-partitioned by `hash & (P-1)` in one pass; each probe
/// row touches exactly one partition, so neither phase shares any mutable
/// state across workers
pub struct PartitionedJoinTable {
    partitions: Vec<Partition>,
    mask: u64,
}

impl PartitionedJoinTable {
    #[must_use]
    pub fn build(right_keys: &[i64]) -> Self {
        let p = runtime::num_workers().next_power_of_two().max(2);
        let mask = (p - 1) as u64;
        let mut keys: Vec<Vec<i64>> = vec![Vec::new(); p];
        let mut rows: Vec<Vec<u32>> = vec![Vec::new(); p];
        for (row, &key) in right_keys.iter().enumerate() {
            let part = (mix64_quality(key as u64) & mask) as usize;
            keys[part].push(key);
            rows[part].push(row as u32);
        }
        let partitions = keys
            .into_iter()
            .zip(rows)
            .map(|(keys, rows)| Partition {
                table: ChainedTable::build(&keys),
                keys,
                rows,
            })
            .collect();
        Self { partitions, mask }
    }

    fn emit(&self, key: i64, hash: u64, probe_row: usize, out_l: &mut Vec<i64>, out_r: &mut Vec<i64>) {
        let part = &self.partitions[(hash & self.mask) as usize];
        let mut local = part.table.head(hash);
        while local != CHAIN_END {
            if part.keys[local as usize] == key {
                out_l.push(probe_row as i64);
                out_r.push(i64::from(part.rows[local as usize]));
            }
            local = part.table.next(local);
        }
    }
}

/// Pre-partitioned inner join, preferred above the build-size threshold.
/// The probe fans out over contiguous left ranges with no synchronization:
/// every partition is read-only after the build and each probe row reads
/// exactly one of them.
#[must_use]
pub fn partitioned_inner_join_i64(left_keys: &[i64], right_keys: &[i64]) -> JoinResult {
    let table = PartitionedJoinTable::build(right_keys);

    if !runtime::should_parallelize(OpKind::Join, left_keys.len()) {
        let mut out_l = Vec::new();
        let mut out_r = Vec::new();
        for (row, &key) in left_keys.iter().enumerate() {
            let hash = mix64_quality(key as u64);
            table.emit(key, hash, row, &mut out_l, &mut out_r);
        }
        return JoinResult {
            left_indices: out_l,
            right_indices: out_r,
        };
    }

    let workers = runtime::num_workers();
    let chunk = left_keys.len().div_ceil(workers).max(1);
    let (out_l, out_r) = runtime::parallel_reduce(
        left_keys.len(),
        Some(chunk),
        (Vec::new(), Vec::new()),
        |range| {
            let mut l = Vec::new();
            let mut r = Vec::new();
            for row in range {
                let key = left_keys[row];
                let hash = mix64_quality(key as u64);
                table.emit(key, hash, row, &mut l, &mut r);
            }
            (l, r)
        },
        |(mut al, mut ar), (bl, br)| {
            al.extend_from_slice(&bl);
            ar.extend_from_slice(&br);
            (al, ar)
        },
    );
    JoinResult {
        left_indices: out_l,
        right_indices: out_r,
    }
}

/// Radix-style alias used by the polymorphic entry points: partitioned
/// when the build side is large, chained otherwise
#[must_use]
pub fn inner_join_i64_radix(left_keys: &[i64], right_keys: &[i64]) -> JoinResult {
    if right_keys.len() >= PARTITIONED_JOIN_BUILD_THRESHOLD {
        partitioned_inner_join_i64(left_keys, right_keys)
    } else {
        parallel_inner_join_i64(left_keys, right_keys)
    }
}

// =============================================================================
// Sort-merge variant
// =============================================================================

/// Sort both key arrays, then merge equal runs pairwise. Output order
/// follows key order rather than probe order.
#[must_use]
pub fn sort_merge_inner_join_i64(left_keys: &[i64], right_keys: &[i64]) -> JoinResult {
    let lperm = crate::sort::argsort(left_keys, true);
    let rperm = crate::sort::argsort(right_keys, true);
    let mut out_l = Vec::new();
    let mut out_r = Vec::new();

    let mut li = 0usize;
    let mut ri = 0usize;
    while li < lperm.len() && ri < rperm.len() {
        let lk = left_keys[lperm[li] as usize];
        let rk = right_keys[rperm[ri] as usize];
        if lk < rk {
            li += 1;
        } else if lk > rk {
            ri += 1;
        } else {
            let lrun_end = (li..lperm.len())
                .find(|&i| left_keys[lperm[i] as usize] != lk)
                .unwrap_or(lperm.len());
            let rrun_end = (ri..rperm.len())
                .find(|&i| right_keys[rperm[i] as usize] != rk)
                .unwrap_or(rperm.len());
            for l in li..lrun_end {
                for r in ri..rrun_end {
                    out_l.push(i64::from(lperm[l]));
                    out_r.push(i64::from(rperm[r]));
                }
            }
            li = lrun_end;
            ri = rrun_end;
        }
    }
    JoinResult {
        left_indices: out_l,
        right_indices: out_r,
    }
}

// =============================================================================
// End-to-end materialization
// =============================================================================

/// Fully materialized join output: payload columns gathered at the match
/// indices for both sides
pub struct JoinedColumns {
    pub left: Vec<Column>,
    pub right: Vec<Column>,
    pub matches: JoinResult,
}

fn join_full(
    left_keys: &[i64],
    right_keys: &[i64],
    left_cols: &[&Column],
    right_cols: &[&Column],
    left_join: bool,
) -> Result<JoinedColumns> {
    for col in left_cols {
        if col.len() != left_keys.len() {
            return Err(KernelError::Data(DataError::LengthMismatch {
                left: left_keys.len(),
                right: col.len(),
            }));
        }
    }
    for col in right_cols {
        if col.len() != right_keys.len() {
            return Err(KernelError::Data(DataError::LengthMismatch {
                left: right_keys.len(),
                right: col.len(),
            }));
        }
    }

    let matches = parallel_hash_join(left_keys, right_keys, left_join);

    // One gather per payload column; right-side -1 indices null-fill on
    // left joins
    let left = left_cols
        .iter()
        .map(|c| c.gather(&matches.left_indices))
        .collect::<Result<Vec<_>>>()?;
    let right = right_cols
        .iter()
        .map(|c| c.gather(&matches.right_indices))
        .collect::<Result<Vec<_>>>()?;

    Ok(JoinedColumns {
        left,
        right,
        matches,
    })
}

/// Inner join plus materialization of every payload column in one call
pub fn arrow_inner_join_full(
    left_keys: &[i64],
    right_keys: &[i64],
    left_cols: &[&Column],
    right_cols: &[&Column],
) -> Result<JoinedColumns> {
    join_full(left_keys, right_keys, left_cols, right_cols, false)
}

/// Left join plus materialization; right payloads are null where unmatched
pub fn arrow_left_join_full(
    left_keys: &[i64],
    right_keys: &[i64],
    left_cols: &[&Column],
    right_cols: &[&Column],
) -> Result<JoinedColumns> {
    join_full(left_keys, right_keys, left_cols, right_cols, true)
}
