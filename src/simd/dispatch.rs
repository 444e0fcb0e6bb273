/*!
 * Kernel Dispatch Table
 * One function-pointer table per SIMD level, published once, read lock-free
 *
 * Entries for which a level has no dedicated body point at the widest body
 * that exists for that shape (the 512 table reuses 256 integer kernels; the
 * 128 table falls back to scalar outside the f64 reductions).
 */

use super::compare::CmpOp;
use super::platform::SimdLevel;
use super::{arith, compare, hash, reduce};
use std::sync::atomic::{AtomicPtr, Ordering};

/// Function-pointer aggregate for the per-level kernel implementations
pub struct Kernels {
    pub level: SimdLevel,

    pub sum_f64: fn(&[f64]) -> f64,
    pub min_f64: fn(&[f64]) -> f64,
    pub max_f64: fn(&[f64]) -> f64,
    pub sum_f32: fn(&[f32]) -> f32,
    pub min_f32: fn(&[f32]) -> f32,
    pub max_f32: fn(&[f32]) -> f32,
    pub sum_i64: fn(&[i64]) -> i64,
    pub min_i64: fn(&[i64]) -> i64,
    pub max_i64: fn(&[i64]) -> i64,
    pub sum_i32: fn(&[i32]) -> i32,
    pub min_i32: fn(&[i32]) -> i32,
    pub max_i32: fn(&[i32]) -> i32,
    pub sum_u64: fn(&[u64]) -> u64,
    pub min_u64: fn(&[u64]) -> u64,
    pub max_u64: fn(&[u64]) -> u64,
    pub sum_u32: fn(&[u32]) -> u32,
    pub min_u32: fn(&[u32]) -> u32,
    pub max_u32: fn(&[u32]) -> u32,

    pub cmp_f64: fn(&[f64], &[f64], CmpOp, &mut [u8]),
    pub cmp_const_f64: fn(&[f64], f64, CmpOp, &mut [u8]),
    pub cmp_i64: fn(&[i64], &[i64], CmpOp, &mut [u8]),
    pub cmp_const_i64: fn(&[i64], i64, CmpOp, &mut [u8]),

    pub add_f64: fn(&[f64], &[f64], &mut [f64]),
    pub sub_f64: fn(&[f64], &[f64], &mut [f64]),
    pub mul_f64: fn(&[f64], &[f64], &mut [f64]),
    pub div_f64: fn(&[f64], &[f64], &mut [f64]),
    pub add_scalar_f64: fn(&[f64], f64, &mut [f64]),
    pub mul_scalar_f64: fn(&[f64], f64, &mut [f64]),

    pub hash_u64: fn(&[u64], &mut [u64]),
}

static SCALAR: Kernels = Kernels {
    level: SimdLevel::Scalar,
    sum_f64: reduce::sum_f64_scalar,
    min_f64: reduce::min_f64_scalar,
    max_f64: reduce::max_f64_scalar,
    sum_f32: reduce::sum_f32_scalar,
    min_f32: reduce::min_f32_scalar,
    max_f32: reduce::max_f32_scalar,
    sum_i64: reduce::sum_i64_scalar,
    min_i64: reduce::min_i64_scalar,
    max_i64: reduce::max_i64_scalar,
    sum_i32: reduce::sum_i32_scalar,
    min_i32: reduce::min_i32_scalar,
    max_i32: reduce::max_i32_scalar,
    sum_u64: reduce::sum_u64_scalar,
    min_u64: reduce::min_u64_scalar,
    max_u64: reduce::max_u64_scalar,
    sum_u32: reduce::sum_u32_scalar,
    min_u32: reduce::min_u32_scalar,
    max_u32: reduce::max_u32_scalar,
    cmp_f64: compare::cmp_scalar::<f64>,
    cmp_const_f64: compare::cmp_const_scalar::<f64>,
    cmp_i64: compare::cmp_scalar::<i64>,
    cmp_const_i64: compare::cmp_const_scalar::<i64>,
    add_f64: arith::add::<f64>,
    sub_f64: arith::sub::<f64>,
    mul_f64: arith::mul::<f64>,
    div_f64: arith::div::<f64>,
    add_scalar_f64: arith::add_scalar::<f64>,
    mul_scalar_f64: arith::mul_scalar::<f64>,
    hash_u64: hash::hash_u64_scalar,
};

/// Scalar entries at the given nominal level; the vector tables override
/// the fields they have real bodies for in a const block
const fn scalar_entries(level: SimdLevel) -> Kernels {
    Kernels {
        level,
        sum_f64: reduce::sum_f64_scalar,
        min_f64: reduce::min_f64_scalar,
        max_f64: reduce::max_f64_scalar,
        sum_f32: reduce::sum_f32_scalar,
        min_f32: reduce::min_f32_scalar,
        max_f32: reduce::max_f32_scalar,
        sum_i64: reduce::sum_i64_scalar,
        min_i64: reduce::min_i64_scalar,
        max_i64: reduce::max_i64_scalar,
        sum_i32: reduce::sum_i32_scalar,
        min_i32: reduce::min_i32_scalar,
        max_i32: reduce::max_i32_scalar,
        sum_u64: reduce::sum_u64_scalar,
        min_u64: reduce::min_u64_scalar,
        max_u64: reduce::max_u64_scalar,
        sum_u32: reduce::sum_u32_scalar,
        min_u32: reduce::min_u32_scalar,
        max_u32: reduce::max_u32_scalar,
        cmp_f64: compare::cmp_scalar::<f64>,
        cmp_const_f64: compare::cmp_const_scalar::<f64>,
        cmp_i64: compare::cmp_scalar::<i64>,
        cmp_const_i64: compare::cmp_const_scalar::<i64>,
        add_f64: arith::add::<f64>,
        sub_f64: arith::sub::<f64>,
        mul_f64: arith::mul::<f64>,
        div_f64: arith::div::<f64>,
        add_scalar_f64: arith::add_scalar::<f64>,
        mul_scalar_f64: arith::mul_scalar::<f64>,
        hash_u64: hash::hash_u64_scalar,
    }
}

#[cfg(target_arch = "x86_64")]
static SIMD128: Kernels = {
    let mut t = scalar_entries(SimdLevel::Simd128);
    t.sum_f64 = reduce::sum_f64_128;
    t.min_f64 = reduce::min_f64_128;
    t.max_f64 = reduce::max_f64_128;
    t.sum_f32 = reduce::sum_f32_128;
    t.min_f32 = reduce::min_f32_128;
    t.max_f32 = reduce::max_f32_128;
    t
};

#[cfg(target_arch = "x86_64")]
const fn avx2_entries(level: SimdLevel) -> Kernels {
    let mut t = scalar_entries(level);
    t.sum_f64 = reduce::sum_f64_256;
    t.min_f64 = reduce::min_f64_256;
    t.max_f64 = reduce::max_f64_256;
    t.sum_f32 = reduce::sum_f32_256;
    t.min_f32 = reduce::min_f32_256;
    t.max_f32 = reduce::max_f32_256;
    t.sum_i64 = reduce::sum_i64_256;
    t.min_i64 = reduce::min_i64_256;
    t.max_i64 = reduce::max_i64_256;
    t.sum_i32 = reduce::sum_i32_256;
    t.min_i32 = reduce::min_i32_256;
    t.max_i32 = reduce::max_i32_256;
    t.sum_u64 = reduce::sum_u64_256;
    t.sum_u32 = reduce::sum_u32_256;
    t.min_u32 = reduce::min_u32_256;
    t.max_u32 = reduce::max_u32_256;
    t.cmp_f64 = compare::cmp_f64_256;
    t.cmp_const_f64 = compare::cmp_const_f64_256;
    t.cmp_i64 = compare::cmp_i64_256;
    t.cmp_const_i64 = compare::cmp_const_i64_256;
    t.add_f64 = arith::add_f64_256;
    t.sub_f64 = arith::sub_f64_256;
    t.mul_f64 = arith::mul_f64_256;
    t.div_f64 = arith::div_f64_256;
    t.add_scalar_f64 = arith::add_scalar_f64_256;
    t.mul_scalar_f64 = arith::mul_scalar_f64_256;
    t.hash_u64 = hash::hash_u64_256;
    t
}

#[cfg(target_arch = "x86_64")]
static SIMD256: Kernels = avx2_entries(SimdLevel::Simd256);

// 512 widens the 64-bit reductions; narrower shapes ride the 256 bodies
#[cfg(target_arch = "x86_64")]
static SIMD512: Kernels = {
    let mut t = avx2_entries(SimdLevel::Simd512);
    t.sum_f64 = reduce::sum_f64_512;
    t.min_f64 = reduce::min_f64_512;
    t.max_f64 = reduce::max_f64_512;
    t.sum_i64 = reduce::sum_i64_512;
    t.min_i64 = reduce::min_i64_512;
    t.max_i64 = reduce::max_i64_512;
    t.sum_u64 = reduce::sum_u64_512;
    t.cmp_f64 = compare::cmp_f64_512;
    t.cmp_const_f64 = compare::cmp_const_f64_512;
    t.cmp_i64 = compare::cmp_i64_512;
    t.cmp_const_i64 = compare::cmp_const_i64_512;
    t
};

/// Currently bound table; null until first use
static ACTIVE: AtomicPtr<Kernels> = AtomicPtr::new(std::ptr::null_mut());

/// Table for a given level
pub fn table_for(level: SimdLevel) -> &'static Kernels {
    #[cfg(target_arch = "x86_64")]
    {
        match level {
            SimdLevel::Scalar => &SCALAR,
            SimdLevel::Simd128 => &SIMD128,
            SimdLevel::Simd256 => &SIMD256,
            SimdLevel::Simd512 => &SIMD512,
        }
    }
    #[cfg(not(target_arch = "x86_64"))]
    {
        let _ = level;
        &SCALAR
    }
}

/// Active kernel table, bound on first use from the detected level
#[inline]
pub fn kernels() -> &'static Kernels {
    let p = ACTIVE.load(Ordering::Acquire);
    if !p.is_null() {
        return unsafe { &*p };
    }
    bind_active()
}

#[cold]
fn bind_active() -> &'static Kernels {
    let table = table_for(super::get_simd_level());
    ACTIVE.store(table as *const Kernels as *mut Kernels, Ordering::Release);
    table
}

/// Re-bind the active table; used by `set_simd_level`
pub(crate) fn rebind(level: SimdLevel) {
    let table = table_for(level);
    ACTIVE.store(table as *const Kernels as *mut Kernels, Ordering::Release);
}

/// Per-type access to the reduction entries of a kernel table, so generic
/// code can ride the dispatched implementations
pub trait Dispatched: crate::core::types::Native {
    fn sum_kernel(k: &Kernels) -> fn(&[Self]) -> Self;
    fn min_kernel(k: &Kernels) -> fn(&[Self]) -> Self;
    fn max_kernel(k: &Kernels) -> fn(&[Self]) -> Self;
}

macro_rules! dispatched {
    ($t:ty, $sum:ident, $min:ident, $max:ident) => {
        impl Dispatched for $t {
            #[inline]
            fn sum_kernel(k: &Kernels) -> fn(&[Self]) -> Self {
                k.$sum
            }

            #[inline]
            fn min_kernel(k: &Kernels) -> fn(&[Self]) -> Self {
                k.$min
            }

            #[inline]
            fn max_kernel(k: &Kernels) -> fn(&[Self]) -> Self {
                k.$max
            }
        }
    };
}

dispatched!(f64, sum_f64, min_f64, max_f64);
dispatched!(f32, sum_f32, min_f32, max_f32);
dispatched!(i64, sum_i64, min_i64, max_i64);
dispatched!(i32, sum_i32, min_i32, max_i32);
dispatched!(u64, sum_u64, min_u64, max_u64);
dispatched!(u32, sum_u32, min_u32, max_u32);
