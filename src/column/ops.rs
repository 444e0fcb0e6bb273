/*!
 * Column Operations
 * Arithmetic, compare, aggregation, and sort surface over the kernels
 *
 * Binary operations propagate nulls uniformly: a result element is null
 * iff either input element is null. Every result is freshly owned.
 */

use super::{with_numeric_dtype, Buffer, Column};
use crate::core::bitmap::{self, bitmap_bytes};
use crate::core::errors::{DataError, KernelError, Result};
use crate::core::types::{DType, Native};
use crate::simd::dispatch::Dispatched;
use crate::simd::{arith, compare, reduce, CmpOp};
use crate::sort;

/// AND of two optional validity bitmaps over `len` elements
fn merge_validity(
    a: Option<&[u8]>,
    b: Option<&[u8]>,
    len: usize,
) -> (Option<Vec<u8>>, usize) {
    let merged = match (a, b) {
        (None, None) => return (None, 0),
        (Some(x), None) | (None, Some(x)) => x[..bitmap_bytes(len)].to_vec(),
        (Some(x), Some(y)) => x
            .iter()
            .zip(y)
            .take(bitmap_bytes(len))
            .map(|(&p, &q)| p & q)
            .collect(),
    };
    let nulls = len - bitmap::count_set_bits(&merged, len);
    if nulls == 0 {
        (None, 0)
    } else {
        (Some(merged), nulls)
    }
}

impl Column {
    fn check_binary(&self, other: &Column, op: &'static str) -> Result<()> {
        if self.dtype() != other.dtype() {
            return Err(KernelError::Data(DataError::UnsupportedDType {
                dtype: other.dtype(),
                op,
            }));
        }
        if self.len() != other.len() {
            return Err(KernelError::Data(DataError::LengthMismatch {
                left: self.len(),
                right: other.len(),
            }));
        }
        Ok(())
    }

    fn binary_arith(
        &self,
        other: &Column,
        op: &'static str,
        apply: impl Fn(&Column, &Column, &mut Buffer) -> Result<()>,
    ) -> Result<Column> {
        self.check_binary(other, op)?;
        let mut out = Buffer::allocate_aligned(self.len() * self.dtype().byte_width())?;
        apply(self, other, &mut out)?;
        let (validity, null_count) = merge_validity(self.validity(), other.validity(), self.len());
        Ok(Column::from_parts(
            out,
            validity,
            self.len(),
            null_count,
            self.dtype(),
        ))
    }

    /// Element-wise sum; null iff either input is null
    pub fn add(&self, other: &Column) -> Result<Column> {
        self.binary_arith(other, "add", |a, b, out| {
            with_numeric_dtype!(a.dtype(), "add", T => {
                arith::add(a.values::<T>()?, b.values::<T>()?, out.typed_mut::<T>());
                Ok(())
            })
        })
    }

    pub fn sub(&self, other: &Column) -> Result<Column> {
        self.binary_arith(other, "sub", |a, b, out| {
            with_numeric_dtype!(a.dtype(), "sub", T => {
                arith::sub(a.values::<T>()?, b.values::<T>()?, out.typed_mut::<T>());
                Ok(())
            })
        })
    }

    pub fn mul(&self, other: &Column) -> Result<Column> {
        self.binary_arith(other, "mul", |a, b, out| {
            with_numeric_dtype!(a.dtype(), "mul", T => {
                arith::mul(a.values::<T>()?, b.values::<T>()?, out.typed_mut::<T>());
                Ok(())
            })
        })
    }

    /// Element-wise division; floats only, IEEE semantics for zero divisors
    pub fn div(&self, other: &Column) -> Result<Column> {
        if !self.dtype().is_float() {
            return Err(KernelError::Data(DataError::UnsupportedDType {
                dtype: self.dtype(),
                op: "div",
            }));
        }
        self.binary_arith(other, "div", |a, b, out| match a.dtype() {
            DType::F64 => {
                arith::div(a.values::<f64>()?, b.values::<f64>()?, out.typed_mut::<f64>());
                Ok(())
            }
            DType::F32 => {
                arith::div(a.values::<f32>()?, b.values::<f32>()?, out.typed_mut::<f32>());
                Ok(())
            }
            _ => unreachable!("float check above"),
        })
    }

    /// Broadcast add of a scalar; nulls pass through
    pub fn add_scalar<T: Native>(&self, rhs: T) -> Result<Column> {
        let data = self.values::<T>()?;
        let mut out = Buffer::allocate_aligned(data.len() * std::mem::size_of::<T>())?;
        arith::add_scalar(data, rhs, out.typed_mut::<T>());
        Ok(Column::from_parts(
            out,
            self.validity().map(<[u8]>::to_vec),
            self.len(),
            self.null_count(),
            self.dtype(),
        ))
    }

    pub fn mul_scalar<T: Native>(&self, rhs: T) -> Result<Column> {
        let data = self.values::<T>()?;
        let mut out = Buffer::allocate_aligned(data.len() * std::mem::size_of::<T>())?;
        arith::mul_scalar(data, rhs, out.typed_mut::<T>());
        Ok(Column::from_parts(
            out,
            self.validity().map(<[u8]>::to_vec),
            self.len(),
            self.null_count(),
            self.dtype(),
        ))
    }

    /// Element-wise comparison producing a Bool column; null iff either
    /// input is null (null comparisons are not true)
    pub fn compare(&self, other: &Column, op: CmpOp) -> Result<Column> {
        self.check_binary(other, "compare")?;
        let mut mask = vec![0u8; self.len()];
        with_numeric_dtype!(self.dtype(), "compare", T => {
            compare::cmp_scalar(self.values::<T>()?, other.values::<T>()?, op, &mut mask);
        });
        let (validity, null_count) = merge_validity(self.validity(), other.validity(), self.len());
        Ok(Column::from_parts(
            Buffer::from_vec(mask),
            validity,
            self.len(),
            null_count,
            DType::Bool,
        ))
    }

    /// Comparison against a scalar; nulls pass through
    pub fn compare_scalar<T: Native>(&self, rhs: T, op: CmpOp) -> Result<Column> {
        let data = self.values::<T>()?;
        let mut mask = vec![0u8; data.len()];
        compare::cmp_const_scalar(data, rhs, op, &mut mask);
        Ok(Column::from_parts(
            Buffer::from_vec(mask),
            self.validity().map(<[u8]>::to_vec),
            self.len(),
            self.null_count(),
            DType::Bool,
        ))
    }

    // =========================================================================
    // Aggregations
    // =========================================================================

    /// Wrapping sum over valid elements; 0 when empty or all-null
    pub fn sum<T: Dispatched>(&self) -> Result<T> {
        let data = self.values::<T>()?;
        Ok(match self.validity() {
            Some(bm) => reduce::sum_with_validity(data, bm),
            None => crate::api::sum(data),
        })
    }

    /// Min over valid elements; NaN/0 when empty or all-null
    pub fn min<T: Dispatched>(&self) -> Result<T> {
        let data = self.values::<T>()?;
        Ok(match self.validity() {
            Some(bm) => reduce::min_with_validity(data, bm),
            None => crate::api::min(data),
        })
    }

    /// Max over valid elements; NaN/0 when empty or all-null
    pub fn max<T: Dispatched>(&self) -> Result<T> {
        let data = self.values::<T>()?;
        Ok(match self.validity() {
            Some(bm) => reduce::max_with_validity(data, bm),
            None => crate::api::max(data),
        })
    }

    /// Mean over valid elements as f64; NaN when empty or all-null
    pub fn mean<T: Dispatched>(&self) -> Result<f64> {
        let data = self.values::<T>()?;
        Ok(match self.validity() {
            Some(bm) => reduce::mean_with_validity(data, bm),
            None => crate::api::mean(data),
        })
    }

    // =========================================================================
    // Sorting
    // =========================================================================

    /// Sorted copy. f64 and i64 run the direct radix path; other dtypes
    /// argsort and gather. Nullable columns take the permutation path so
    /// validity rides along; null slots order by their underlying storage.
    pub fn sort(&self, ascending: bool) -> Result<Column> {
        if self.has_nulls() {
            let perm = self.argsort(ascending)?;
            let indices: Vec<i64> = perm.into_iter().map(i64::from).collect();
            return self.gather(&indices);
        }
        match self.dtype() {
            DType::F64 => Ok(Column::from_vec(sort::sort_f64(self.values::<f64>()?, ascending))),
            DType::I64 => Ok(Column::from_vec(sort::sort_i64(self.values::<i64>()?, ascending))),
            _ => {
                let perm = self.argsort(ascending)?;
                let indices: Vec<i64> = perm.into_iter().map(i64::from).collect();
                self.gather(&indices)
            }
        }
    }

    /// Index permutation that would sort the column by its stored values
    pub fn argsort(&self, ascending: bool) -> Result<Vec<u32>> {
        with_numeric_dtype!(self.dtype(), "argsort", T => {
            Ok(sort::argsort_parallel(self.values::<T>()?, ascending))
        })
    }

    /// Reorder every payload column by the sort order of this column
    pub fn sort_dataframe_full(&self, columns: &[&Column], ascending: bool) -> Result<Vec<Column>> {
        for col in columns {
            if col.len() != self.len() {
                return Err(KernelError::Data(DataError::LengthMismatch {
                    left: self.len(),
                    right: col.len(),
                }));
            }
        }
        let perm = self.argsort(ascending)?;
        let indices: Vec<i64> = perm.into_iter().map(i64::from).collect();
        columns.iter().map(|c| c.gather(&indices)).collect()
    }
}
