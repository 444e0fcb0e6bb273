/*!
 * Functional Surface
 * Typed entry points over raw slices, auto-parallelized past the
 * per-operation thresholds
 *
 * These are the flat functions a host embeds against: aggregations,
 * element-wise arithmetic, compare masks, and fused filters. Columnar
 * callers use the `Column` method surface instead.
 */

use crate::column::Column;
use crate::core::errors::{DataError, KernelError, Result};
use crate::core::types::{Float, Native};
use crate::runtime::{self, OpKind};
use crate::simd::dispatch::{kernels, Dispatched};
use crate::simd::{filter, fold, CmpOp};

/// Wrapping sum; 0 for empty input
pub fn sum<T: Dispatched>(data: &[T]) -> T {
    let f = T::sum_kernel(kernels());
    if runtime::should_parallelize(OpKind::Sum, data.len()) {
        runtime::parallel_reduce(data.len(), None, T::default(), |r| f(&data[r]), |a, b| {
            a.add_wrap(b)
        })
    } else {
        f(data)
    }
}

/// Minimum; NaN (floats) or 0 (integers) for empty input
pub fn min<T: Dispatched>(data: &[T]) -> T {
    if data.is_empty() {
        return T::NULL_FILL;
    }
    let f = T::min_kernel(kernels());
    if runtime::should_parallelize(OpKind::Min, data.len()) {
        runtime::parallel_reduce(data.len(), None, T::MIN_IDENTITY, |r| f(&data[r]), |a, b| {
            a.min2(b)
        })
    } else {
        f(data)
    }
}

/// Maximum; NaN (floats) or 0 (integers) for empty input
pub fn max<T: Dispatched>(data: &[T]) -> T {
    if data.is_empty() {
        return T::NULL_FILL;
    }
    let f = T::max_kernel(kernels());
    if runtime::should_parallelize(OpKind::Max, data.len()) {
        runtime::parallel_reduce(data.len(), None, T::MAX_IDENTITY, |r| f(&data[r]), |a, b| {
            a.max2(b)
        })
    } else {
        f(data)
    }
}

/// Mean as f64; NaN for empty input. Integer sums convert once at the end
/// (float division per the aggregation contract).
pub fn mean<T: Dispatched>(data: &[T]) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    sum(data).to_f64() / data.len() as f64
}

macro_rules! typed_aggregations {
    ($t:ty, $sum:ident, $min:ident, $max:ident, $mean:ident) => {
        pub fn $sum(data: &[$t]) -> $t {
            sum(data)
        }

        pub fn $min(data: &[$t]) -> $t {
            min(data)
        }

        pub fn $max(data: &[$t]) -> $t {
            max(data)
        }

        pub fn $mean(data: &[$t]) -> f64 {
            mean(data)
        }
    };
}

typed_aggregations!(f64, sum_f64, min_f64, max_f64, mean_f64);
typed_aggregations!(f32, sum_f32, min_f32, max_f32, mean_f32);
typed_aggregations!(i64, sum_i64, min_i64, max_i64, mean_i64);
typed_aggregations!(i32, sum_i32, min_i32, max_i32, mean_i32);
typed_aggregations!(u64, sum_u64, min_u64, max_u64, mean_u64);
typed_aggregations!(u32, sum_u32, min_u32, max_u32, mean_u32);

// =============================================================================
// Element-wise arithmetic
// =============================================================================

/// out[i] = a[i] + b[i] through the dispatched f64 kernel
pub fn add_f64(a: &[f64], b: &[f64], out: &mut [f64]) {
    (kernels().add_f64)(a, b, out);
}

pub fn sub_f64(a: &[f64], b: &[f64], out: &mut [f64]) {
    (kernels().sub_f64)(a, b, out);
}

pub fn mul_f64(a: &[f64], b: &[f64], out: &mut [f64]) {
    (kernels().mul_f64)(a, b, out);
}

pub fn div_f64(a: &[f64], b: &[f64], out: &mut [f64]) {
    (kernels().div_f64)(a, b, out);
}

pub fn add_scalar_f64(a: &[f64], rhs: f64, out: &mut [f64]) {
    (kernels().add_scalar_f64)(a, rhs, out);
}

pub fn mul_scalar_f64(a: &[f64], rhs: f64, out: &mut [f64]) {
    (kernels().mul_scalar_f64)(a, rhs, out);
}

/// Generic element-wise ops for the remaining dtypes
pub fn add<T: Native>(a: &[T], b: &[T], out: &mut [T]) {
    crate::simd::arith::add(a, b, out);
}

pub fn sub<T: Native>(a: &[T], b: &[T], out: &mut [T]) {
    crate::simd::arith::sub(a, b, out);
}

pub fn mul<T: Native>(a: &[T], b: &[T], out: &mut [T]) {
    crate::simd::arith::mul(a, b, out);
}

pub fn div<T: Float>(a: &[T], b: &[T], out: &mut [T]) {
    crate::simd::arith::div(a, b, out);
}

// =============================================================================
// Compare masks
// =============================================================================

/// out[i] = 1 where a[i] <op> b[i], through the dispatched kernel
pub fn cmp_f64(a: &[f64], b: &[f64], op: CmpOp, out: &mut [u8]) {
    (kernels().cmp_f64)(a, b, op, out);
}

pub fn cmp_scalar_f64(a: &[f64], rhs: f64, op: CmpOp, out: &mut [u8]) {
    (kernels().cmp_const_f64)(a, rhs, op, out);
}

pub fn cmp_i64(a: &[i64], b: &[i64], op: CmpOp, out: &mut [u8]) {
    (kernels().cmp_i64)(a, b, op, out);
}

pub fn cmp_scalar_i64(a: &[i64], rhs: i64, op: CmpOp, out: &mut [u8]) {
    (kernels().cmp_const_i64)(a, rhs, op, out);
}

// =============================================================================
// Filters
// =============================================================================

/// Indices of elements strictly greater than `threshold`
#[must_use]
pub fn filter_gt_f64(data: &[f64], threshold: f64) -> Vec<u32> {
    let mut out = Vec::new();
    filter::filter_gt_f64(data, threshold, &mut out);
    out
}

#[must_use]
pub fn filter_gt_i64(data: &[i64], threshold: i64) -> Vec<u32> {
    let mut out = Vec::new();
    filter::filter_gt_i64(data, threshold, &mut out);
    out
}

/// 0/1 mask of elements greater than `threshold`
pub fn filter_mask_gt_f64(data: &[f64], threshold: f64, out_mask: &mut [u8]) {
    cmp_scalar_f64(data, threshold, CmpOp::Gt, out_mask);
}

// =============================================================================
// Horizontal folds across columns
// =============================================================================

fn checked_rows(cols: &[&Column]) -> Result<usize> {
    let first = cols
        .first()
        .ok_or(KernelError::Data(DataError::MissingBuffer("columns")))?;
    for col in &cols[1..] {
        if col.len() != first.len() {
            return Err(KernelError::Data(DataError::LengthMismatch {
                left: first.len(),
                right: col.len(),
            }));
        }
    }
    Ok(first.len())
}

macro_rules! horizontal_fold {
    ($name:ident, $kernel:path) => {
        /// Row-wise fold across 2..N equal-length f64 columns
        pub fn $name(cols: &[&Column]) -> Result<Column> {
            let rows = checked_rows(cols)?;
            let slices = cols
                .iter()
                .map(|c| c.values::<f64>())
                .collect::<Result<Vec<_>>>()?;
            let mut out = vec![0.0f64; rows];
            $kernel(&slices, &mut out);
            Ok(Column::from_vec(out))
        }
    };
}

horizontal_fold!(hsum_columns_f64, fold::hsum);
horizontal_fold!(hmin_columns_f64, fold::hmin);
horizontal_fold!(hmax_columns_f64, fold::hmax);
horizontal_fold!(hproduct_columns_f64, fold::hproduct);

/// Row-wise OR over boolean mask columns
pub fn any_masks(masks: &[&Column]) -> Result<Column> {
    let rows = checked_rows(masks)?;
    let slices = masks
        .iter()
        .map(|m| m.as_mask())
        .collect::<Result<Vec<_>>>()?;
    let mut out = vec![0u8; rows];
    fold::hany(&slices, &mut out);
    Ok(Column::from_mask(out))
}

/// Row-wise AND over boolean mask columns
pub fn all_masks(masks: &[&Column]) -> Result<Column> {
    let rows = checked_rows(masks)?;
    let slices = masks
        .iter()
        .map(|m| m.as_mask())
        .collect::<Result<Vec<_>>>()?;
    let mut out = vec![0u8; rows];
    fold::hall(&slices, &mut out);
    Ok(Column::from_mask(out))
}

/// Per-row count of non-null entries across columns
pub fn count_valid_rows(cols: &[&Column]) -> Result<Vec<u32>> {
    let rows = checked_rows(cols)?;
    let validities: Vec<Option<&[u8]>> = cols.iter().map(|c| c.validity()).collect();
    let mut out = vec![0u32; rows];
    fold::hcount_valid(&validities, rows, &mut out);
    Ok(out)
}

/// Bulk key hashing with the fast mix
#[must_use]
pub fn hash_u64(keys: &[u64]) -> Vec<u64> {
    let mut out = vec![0u64; keys.len()];
    (kernels().hash_u64)(keys, &mut out);
    out
}

/// Index permutation sorting `data`; parallel above the sort threshold
#[must_use]
pub fn argsort_f64(data: &[f64], ascending: bool) -> Vec<u32> {
    crate::sort::argsort_parallel(data, ascending)
}

#[must_use]
pub fn argsort_i64(data: &[i64], ascending: bool) -> Vec<u32> {
    crate::sort::argsort_parallel(data, ascending)
}
