/*!
 * SIMD Module
 *
 * Runtime CPU dispatch and the vectorized kernel families.
 *
 * # Module Organization
 *
 * - **platform**: CPU feature detection and `SimdLevel`
 * - **dispatch**: per-level function-pointer tables
 * - **reduce / arith / compare / cond**: element and reduction kernels
 * - **stats / window / fold**: statistics, window functions, row-wise folds
 * - **filter / hash / gather / scatter**: selection, hashing, movement
 */

pub mod arith;
pub mod compare;
pub mod cond;
pub mod dispatch;
pub mod filter;
pub mod fold;
pub mod gather;
pub mod hash;
pub mod platform;
pub mod reduce;
pub mod scatter;
pub mod stats;
pub mod window;

pub use compare::CmpOp;
pub use dispatch::{kernels, Kernels};
pub use platform::{detect_cpu_features, CpuFeatures, SimdLevel};

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;

/// Detected CPU capabilities, queried once
static CPU_FEATURES: OnceLock<CpuFeatures> = OnceLock::new();

/// Level override; `u8::MAX` means "use the detected best"
static LEVEL_OVERRIDE: AtomicU8 = AtomicU8::new(u8::MAX);

/// Detected CPU features, cached after the first call
pub fn cpu_features() -> &'static CpuFeatures {
    CPU_FEATURES.get_or_init(|| {
        let caps = detect_cpu_features();
        tracing::info!(
            sse2 = caps.sse2,
            avx2 = caps.avx2,
            avx512 = caps.has_avx512_full(),
            neon = caps.neon,
            level = ?caps.best_level(),
            "SIMD capabilities detected"
        );
        caps
    })
}

fn level_from_u8(v: u8) -> Option<SimdLevel> {
    match v {
        0 => Some(SimdLevel::Scalar),
        1 => Some(SimdLevel::Simd128),
        2 => Some(SimdLevel::Simd256),
        3 => Some(SimdLevel::Simd512),
        _ => None,
    }
}

const fn level_to_u8(level: SimdLevel) -> u8 {
    match level {
        SimdLevel::Scalar => 0,
        SimdLevel::Simd128 => 1,
        SimdLevel::Simd256 => 2,
        SimdLevel::Simd512 => 3,
    }
}

/// Active SIMD level: the override if set, otherwise the detected best
pub fn get_simd_level() -> SimdLevel {
    match level_from_u8(LEVEL_OVERRIDE.load(Ordering::Acquire)) {
        Some(level) => level,
        None => cpu_features().best_level(),
    }
}

/// Override the SIMD level and re-bind the dispatch table.
///
/// Requests above the detected capability are clamped down; this is how
/// tests pin the scalar or 128-bit paths on wider machines. Must not race
/// with in-flight kernel calls (documented precondition, not enforced).
pub fn set_simd_level(level: SimdLevel) -> SimdLevel {
    let clamped = if level > cpu_features().best_level() {
        cpu_features().best_level()
    } else {
        level
    };
    LEVEL_OVERRIDE.store(level_to_u8(clamped), Ordering::Release);
    dispatch::rebind(clamped);
    tracing::debug!(requested = ?level, bound = ?clamped, "SIMD level override");
    clamped
}

/// Clear any override, returning to the detected best level
pub fn reset_simd_level() {
    LEVEL_OVERRIDE.store(u8::MAX, Ordering::Release);
    dispatch::rebind(cpu_features().best_level());
}

/// Vector width in bytes of the active level
pub fn get_simd_vector_bytes() -> usize {
    get_simd_level().vector_bytes()
}
