/*!
 * Kernel Limits and Constants
 *
 * Centralized location for all thresholds, cutoffs, and magic numbers.
 * Organized by domain for maintainability and discoverability.
 *
 * ## Design Philosophy
 * - All values include rationale comments explaining WHY they exist
 * - Performance-critical constants are marked with [PERF]
 */

use std::time::Duration;

// =============================================================================
// MEMORY & LAYOUT
// =============================================================================

/// Size of a cache line in bytes (typical for modern x86-64 CPUs)
pub const CACHE_LINE_SIZE: usize = 64;

/// Alignment for copy-constructed column buffers
/// [PERF] 64-byte alignment keeps every SIMD load level (128/256/512-bit)
/// aligned and avoids cache-line splits
pub const COLUMN_BUFFER_ALIGN: usize = 64;

// =============================================================================
// PARALLEL THRESHOLDS
// =============================================================================
// Minimum element counts below which an operation runs on the calling
// thread. Bandwidth-bound ops (sum/min/max) need more elements before the
// pool pays for itself; compute-dense ops (hash, sort) parallelize earlier.

/// [PERF] Sum/mean are pure bandwidth; fan-out below this loses to cache
/// contention
pub const PAR_THRESHOLD_SUM: usize = 262_144;

/// [PERF] Min/max carry one compare per element, same bandwidth profile as
/// sum
pub const PAR_THRESHOLD_MINMAX: usize = 262_144;

/// [PERF] Hashing does two multiplies per element
pub const PAR_THRESHOLD_HASH: usize = 131_072;

/// [PERF] Probe-side rows before a join probe is split across workers
pub const PAR_THRESHOLD_JOIN: usize = 65_536;

/// Build-side rows before the pre-partitioned (lock-free) join variant is
/// preferred over the single shared table
pub const PARTITIONED_JOIN_BUILD_THRESHOLD: usize = 1_048_576;

/// [PERF] Sort moves every element several times; parallel sample sort wins
/// earlier than the bandwidth-bound reductions
pub const PAR_THRESHOLD_SORT: usize = 131_072;

/// [PERF] Group-by rows before dense-id assignment + scatter go parallel
pub const PAR_THRESHOLD_GROUPBY: usize = 131_072;

/// Group-count cap for the private-accumulator parallel scatter.
/// Memory cost is workers * num_groups; past this the serial scatter is
/// cheaper than the replicated accumulators.
pub const PARALLEL_SCATTER_MAX_GROUPS: usize = 16_384;

// =============================================================================
// RUNTIME (worker pool)
// =============================================================================

/// Heartbeat period. Promotion of queued jobs to thieves happens at most
/// once per tick per worker, bounding the steal-protocol overhead on the
/// inline fast path.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_micros(100);

/// Idle workers re-check the injector and shutdown flag at this cadence
/// while parked on a steal request
pub const WORKER_IDLE_WAIT: Duration = Duration::from_millis(1);

/// parallel_for auto grain: grain = n / (GRAIN_DIVISOR * workers)
pub const GRAIN_DIVISOR: usize = 4;

/// Smallest auto-chosen grain; below this the recursion overhead dominates
pub const MIN_GRAIN: usize = 1_024;

/// Queued jobs a worker must hold before its heartbeat tick hands one to a
/// thief (keeps at least one job for the owner's own pop)
pub const STEAL_MIN_QUEUED: usize = 2;

// =============================================================================
// SORT ENGINE
// =============================================================================

/// Insertion-sort cutoff for the pair quicksort
/// [PERF] Below ~24 records the quadratic sort beats partitioning
pub const INSERTION_SORT_CUTOFF: usize = 24;

/// Radix digit width in bits (8 passes over 64-bit keys)
pub const RADIX_BITS: usize = 8;

/// Keys sampled per worker when deriving sample-sort splitters
pub const SAMPLE_SORT_OVERSAMPLE: usize = 100;

// =============================================================================
// HASH TABLES
// =============================================================================

/// Swiss table maximum load: 7/8 = 87.5%
/// [PERF] Past this, probe sequences lengthen faster than memory is saved
pub const SWISS_LOAD_NUM: usize = 7;
pub const SWISS_LOAD_DEN: usize = 8;

/// Control-byte group width (one SSE2 register of control bytes)
pub const SWISS_GROUP: usize = 16;

/// Keys sampled for the chained-table cardinality estimate
pub const JOIN_SAMPLE_KEYS: usize = 64;

/// Chained-table slot cap (16 Mi entries)
pub const CHAINED_TABLE_MAX_SLOTS: usize = 16 * 1024 * 1024;

/// Probe keys processed per interleaved batch (hash + prefetch ahead)
/// [PERF] Four outstanding loads cover typical L2 latency
pub const JOIN_PROBE_BATCH: usize = 4;

// =============================================================================
// KERNELS
// =============================================================================

/// Elements below which quickselect falls back to a full sort
pub const QUICKSELECT_CUTOFF: usize = 32;

/// Hash mix secret: 2^64 / phi, the golden-ratio multiplier
pub const HASH_SECRET: u64 = 0x9E37_79B9_7F4A_7C15;

/// Second secret for the high-quality join-side mix
pub const HASH_SECRET2: u64 = 0xC2B2_AE3D_27D4_EB4F;
