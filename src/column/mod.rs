/*!
 * Columnar Container
 *
 * Owned, immutable-after-construction arrays with optional validity
 * bitmaps. Every returning operation produces a freshly owned column; no
 * result borrows from its inputs.
 *
 * # Module Organization
 *
 * - **buffer**: aligned byte storage
 * - **ops**: arithmetic/compare/aggregate surface over the SIMD kernels
 * - **interop**: C data interface record for producers and consumers
 */

pub mod buffer;
pub mod interop;
pub mod ops;
pub mod window;

pub use buffer::Buffer;
pub use interop::{export_column, import_borrowed, ColumnarArray};

use crate::core::bitmap::{self, bit_get, bitmap_bytes};
use crate::core::errors::{ContractError, DataError, KernelError, Result};
use crate::core::types::{DType, Native};
use crate::simd::{filter as filter_kernels, gather as gather_kernels};

/// Dispatch a type-erased column operation to a generic body.
/// Bool columns are rejected; mask data routes through `as_mask`.
macro_rules! with_numeric_dtype {
    ($dtype:expr, $op:expr, $T:ident => $body:expr) => {
        match $dtype {
            DType::F64 => {
                type $T = f64;
                $body
            }
            DType::F32 => {
                type $T = f32;
                $body
            }
            DType::I64 => {
                type $T = i64;
                $body
            }
            DType::I32 => {
                type $T = i32;
                $body
            }
            DType::U64 => {
                type $T = u64;
                $body
            }
            DType::U32 => {
                type $T = u32;
                $body
            }
            DType::Bool => {
                return Err(KernelError::Data(DataError::UnsupportedDType {
                    dtype: DType::Bool,
                    op: $op,
                }))
            }
        }
    };
}
pub(crate) use with_numeric_dtype;

/// An owned columnar array
pub struct Column {
    data: Buffer,
    validity: Option<Vec<u8>>,
    len: usize,
    null_count: usize,
    dtype: DType,
}

impl Column {
    // =========================================================================
    // Construction
    // =========================================================================

    /// Copy a slice into a fresh 64-byte-aligned column without nulls
    pub fn from_slice<T: Native>(data: &[T]) -> Result<Self> {
        Ok(Self {
            data: Buffer::copy_from_slice(data)?,
            validity: None,
            len: data.len(),
            null_count: 0,
            dtype: T::DTYPE,
        })
    }

    /// Take ownership of a Vec without copying; keeps the Vec's alignment
    #[must_use]
    pub fn from_vec<T: Native>(data: Vec<T>) -> Self {
        let len = data.len();
        Self {
            data: Buffer::from_vec(data),
            validity: None,
            len,
            null_count: 0,
            dtype: T::DTYPE,
        }
    }

    /// Copy a slice and attach a validity bitmap (LSB-first, bit set =
    /// non-null). A bitmap shorter than the data is padded with ones.
    pub fn with_nulls<T: Native>(data: &[T], validity: &[u8]) -> Result<Self> {
        let len = data.len();
        let needed = bitmap_bytes(len);
        let mut bm = bitmap::all_set(len);
        let have = validity.len().min(needed);
        bm[..have].copy_from_slice(&validity[..have]);
        bitmap::mask_trailing(&mut bm, len);
        let null_count = len - bitmap::count_set_bits(&bm, len);
        Ok(Self {
            data: Buffer::copy_from_slice(data)?,
            validity: (null_count > 0).then_some(bm),
            len,
            null_count,
            dtype: T::DTYPE,
        })
    }

    /// Take ownership of data and bitmap without copying the data
    pub fn from_vec_with_validity<T: Native>(data: Vec<T>, validity: Vec<u8>) -> Result<Self> {
        let len = data.len();
        let needed = bitmap_bytes(len);
        if validity.len() < needed {
            return Err(KernelError::Contract(ContractError::ShortBitmap {
                needed: len,
                have: validity.len() * 8,
            }));
        }
        let mut bm = validity;
        bm.truncate(needed);
        bitmap::mask_trailing(&mut bm, len);
        let null_count = len - bitmap::count_set_bits(&bm, len);
        Ok(Self {
            data: Buffer::from_vec(data),
            validity: (null_count > 0).then_some(bm),
            len,
            null_count,
            dtype: T::DTYPE,
        })
    }

    /// Boolean mask column: one byte per element, 0 or 1
    #[must_use]
    pub fn from_mask(mask: Vec<u8>) -> Self {
        let len = mask.len();
        Self {
            data: Buffer::from_vec(mask),
            validity: None,
            len,
            null_count: 0,
            dtype: DType::Bool,
        }
    }

    /// Fresh empty column of the given dtype
    #[must_use]
    pub fn new_empty(dtype: DType) -> Self {
        Self {
            data: Buffer::empty(),
            validity: None,
            len: 0,
            null_count: 0,
            dtype,
        }
    }

    pub(crate) fn from_parts(
        data: Buffer,
        validity: Option<Vec<u8>>,
        len: usize,
        null_count: usize,
        dtype: DType,
    ) -> Self {
        Self {
            data,
            validity,
            len,
            null_count,
            dtype,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    #[must_use]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    #[inline]
    #[must_use]
    pub fn null_count(&self) -> usize {
        self.null_count
    }

    #[inline]
    #[must_use]
    pub fn has_nulls(&self) -> bool {
        self.null_count > 0
    }

    #[inline]
    #[must_use]
    pub fn validity(&self) -> Option<&[u8]> {
        self.validity.as_deref()
    }

    /// Raw pointer to the data buffer
    #[inline]
    #[must_use]
    pub fn data_ptr(&self) -> *const u8 {
        self.data.as_ptr()
    }

    /// Typed view of the data; errors if `T` does not match the dtype
    pub fn values<T: Native>(&self) -> Result<&[T]> {
        if T::DTYPE != self.dtype {
            return Err(KernelError::Data(DataError::UnsupportedDType {
                dtype: self.dtype,
                op: "typed access",
            }));
        }
        Ok(self.data.typed::<T>())
    }

    /// Mask bytes of a Bool column
    pub fn as_mask(&self) -> Result<&[u8]> {
        if self.dtype != DType::Bool {
            return Err(KernelError::Data(DataError::UnsupportedDType {
                dtype: self.dtype,
                op: "mask access",
            }));
        }
        Ok(self.data.bytes())
    }

    /// Element access; None when out of range or null
    pub fn get<T: Native>(&self, i: usize) -> Option<T> {
        if i >= self.len || T::DTYPE != self.dtype {
            return None;
        }
        if let Some(bm) = &self.validity {
            if !bit_get(bm, i) {
                return None;
            }
        }
        Some(self.data.typed::<T>()[i])
    }

    /// True when element `i` is valid (non-null)
    #[inline]
    #[must_use]
    pub fn is_valid(&self, i: usize) -> bool {
        i < self.len && self.validity.as_ref().is_none_or(|bm| bit_get(bm, i))
    }

    // =========================================================================
    // Slicing, filtering, gathering
    // =========================================================================

    /// Copy out `[start, end)`, clamped to the column bounds. The result's
    /// bitmap is re-aligned to offset 0 and its null count recomputed.
    pub fn slice(&self, start: usize, end: usize) -> Result<Self> {
        let start = start.min(self.len);
        let end = end.clamp(start, self.len);
        let count = end - start;
        with_numeric_dtype!(self.dtype, "slice", T => {
            let src = self.data.typed::<T>();
            let mut out = Buffer::allocate_aligned(count * std::mem::size_of::<T>())?;
            out.typed_mut::<T>().copy_from_slice(&src[start..end]);

            let (validity, null_count) = match &self.validity {
                None => (None, 0),
                Some(bm) => {
                    let mut sliced = vec![0u8; bitmap_bytes(count)];
                    bitmap::bit_copy_shifted(&mut sliced, bm, start, count);
                    let nulls = count - bitmap::count_set_bits(&sliced, count);
                    ((nulls > 0).then_some(sliced), nulls)
                }
            };
            Ok(Self::from_parts(out, validity, count, null_count, self.dtype))
        })
    }

    /// Keep rows whose mask byte is nonzero. One counting pass sizes the
    /// result; selected validity bits are re-packed from offset 0.
    pub fn filter(&self, mask: &Column) -> Result<Self> {
        let mask_bytes = mask.as_mask()?;
        if mask_bytes.len() != self.len {
            return Err(KernelError::Data(DataError::LengthMismatch {
                left: self.len,
                right: mask_bytes.len(),
            }));
        }
        let keep = filter_kernels::count_mask(mask_bytes);
        with_numeric_dtype!(self.dtype, "filter", T => {
            let src = self.data.typed::<T>();
            let mut out = Buffer::allocate_aligned(keep * std::mem::size_of::<T>())?;
            {
                let dst = out.typed_mut::<T>();
                let mut w = 0usize;
                for (i, &m) in mask_bytes.iter().enumerate() {
                    if m != 0 {
                        dst[w] = src[i];
                        w += 1;
                    }
                }
                debug_assert_eq!(w, keep);
            }

            let (validity, null_count) = match &self.validity {
                None => (None, 0),
                Some(bm) => {
                    let mut packed = vec![0u8; bitmap_bytes(keep)];
                    let mut w = 0usize;
                    for (i, &m) in mask_bytes.iter().enumerate() {
                        if m != 0 {
                            if bit_get(bm, i) {
                                bitmap::bit_set(&mut packed, w);
                            }
                            w += 1;
                        }
                    }
                    let nulls = keep - bitmap::count_set_bits(&packed, keep);
                    ((nulls > 0).then_some(packed), nulls)
                }
            };
            Ok(Self::from_parts(out, validity, keep, null_count, self.dtype))
        })
    }

    /// Select by index; -1 and out-of-range indices produce nulls. Source
    /// nulls propagate through valid indices.
    pub fn gather(&self, indices: &[i64]) -> Result<Self> {
        with_numeric_dtype!(self.dtype, "gather", T => {
            let src = self.data.typed::<T>();
            let mut out = Buffer::allocate_aligned(indices.len() * std::mem::size_of::<T>())?;
            let sentinel_nulls = gather_kernels::gather(src, indices, out.typed_mut::<T>());

            let needs_bitmap = sentinel_nulls > 0 || self.has_nulls();
            let (validity, null_count) = if needs_bitmap {
                let mut bm = Vec::new();
                gather_kernels::validity_from_indices(indices, src.len(), &mut bm);
                // Propagate source nulls through in-range indices
                if let Some(src_bm) = &self.validity {
                    for (i, &ix) in indices.iter().enumerate() {
                        if ix >= 0 && (ix as usize) < src.len() && !bit_get(src_bm, ix as usize) {
                            bitmap::bit_clear(&mut bm, i);
                        }
                    }
                }
                let nulls = indices.len() - bitmap::count_set_bits(&bm, indices.len());
                if nulls > 0 {
                    // Null-fill slots shadowed by source nulls
                    let dst = out.typed_mut::<T>();
                    for (i, slot) in dst.iter_mut().enumerate() {
                        if !bit_get(&bm, i) {
                            *slot = T::NULL_FILL;
                        }
                    }
                    (Some(bm), nulls)
                } else {
                    (None, 0)
                }
            } else {
                (None, 0)
            };
            Ok(Self::from_parts(out, validity, indices.len(), null_count, self.dtype))
        })
    }
}

impl std::fmt::Debug for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Column")
            .field("dtype", &self.dtype)
            .field("len", &self.len)
            .field("null_count", &self.null_count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_slice_value_equivalent() {
        let data = [1.5f64, 2.5, 3.5];
        let col = Column::from_slice(&data).unwrap();
        assert_eq!(col.len(), 3);
        assert_eq!(col.dtype(), DType::F64);
        assert!(!col.has_nulls());
        assert_eq!(col.values::<f64>().unwrap(), &data);
        assert_eq!(col.data_ptr() as usize % 64, 0);
    }

    #[test]
    fn test_from_vec_preserves_pointer() {
        let data = vec![1i64, 2, 3];
        let ptr = data.as_ptr() as usize;
        let col = Column::from_vec(data);
        assert_eq!(col.data_ptr() as usize, ptr);
    }

    #[test]
    fn test_with_nulls_counts() {
        let data = [1.0f64, 2.0, 3.0, 4.0, 5.0];
        let col = Column::with_nulls(&data, &[0b0001_1011]).unwrap();
        assert_eq!(col.null_count(), 1);
        assert_eq!(col.get::<f64>(1), Some(2.0));
        assert_eq!(col.get::<f64>(2), None);
        assert_eq!(col.get::<f64>(9), None);
    }

    #[test]
    fn test_short_bitmap_padded_with_ones() {
        let data: Vec<i32> = (0..12).collect();
        // Only one byte supplied for 12 elements; the tail defaults valid
        let col = Column::with_nulls(&data, &[0b1111_1110]).unwrap();
        assert_eq!(col.null_count(), 1);
        assert!(!col.is_valid(0));
        assert!(col.is_valid(8));
        assert!(col.is_valid(11));
    }

    #[test]
    fn test_wrong_type_access() {
        let col = Column::from_vec(vec![1i64, 2]);
        assert!(col.values::<f64>().is_err());
        assert_eq!(col.get::<f64>(0), None);
    }

    #[test]
    fn test_slice_realigns_bitmap() {
        let data: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let mut bm = bitmap::all_set(20);
        bitmap::bit_clear(&mut bm, 5);
        bitmap::bit_clear(&mut bm, 13);
        let col = Column::with_nulls(&data, &bm).unwrap();

        let sliced = col.slice(4, 15).unwrap();
        assert_eq!(sliced.len(), 11);
        assert_eq!(sliced.null_count(), 2);
        assert_eq!(sliced.get::<f64>(0), Some(4.0));
        assert_eq!(sliced.get::<f64>(1), None); // source index 5
        assert_eq!(sliced.get::<f64>(9), None); // source index 13
        assert_eq!(sliced.get::<f64>(10), Some(14.0));
    }

    #[test]
    fn test_slice_clamps() {
        let col = Column::from_vec(vec![1u32, 2, 3]);
        let s = col.slice(1, 99).unwrap();
        assert_eq!(s.values::<u32>().unwrap(), &[2, 3]);
        let empty = col.slice(5, 9).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_full_slice_is_value_equivalent() {
        let data: Vec<i64> = (0..9).collect();
        let col = Column::from_slice(&data).unwrap();
        let s = col.slice(0, col.len()).unwrap();
        assert_eq!(s.values::<i64>().unwrap(), data.as_slice());
        assert_ne!(s.data_ptr(), col.data_ptr());
    }

    #[test]
    fn test_filter_basic() {
        let col = Column::from_vec(vec![10.0f64, 20.0, 30.0, 40.0]);
        let mask = Column::from_mask(vec![1, 0, 1, 0]);
        let out = col.filter(&mask).unwrap();
        assert_eq!(out.values::<f64>().unwrap(), &[10.0, 30.0]);
    }

    #[test]
    fn test_filter_carries_nulls() {
        let data = [1.0f64, 2.0, 3.0, 4.0];
        let col = Column::with_nulls(&data, &[0b0000_0111]).unwrap(); // null at 3
        let mask = Column::from_mask(vec![0, 1, 1, 1]);
        let out = col.filter(&mask).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out.null_count(), 1);
        assert_eq!(out.get::<f64>(0), Some(2.0));
        assert_eq!(out.get::<f64>(2), None);
    }

    #[test]
    fn test_filter_all_true_fresh_ownership() {
        let col = Column::from_vec(vec![7i32, 8, 9]);
        let mask = Column::from_mask(vec![1, 1, 1]);
        let out = col.filter(&mask).unwrap();
        assert_eq!(out.values::<i32>().unwrap(), &[7, 8, 9]);
        assert_ne!(out.data_ptr(), col.data_ptr());
    }

    #[test]
    fn test_filter_length_mismatch() {
        let col = Column::from_vec(vec![1i64]);
        let mask = Column::from_mask(vec![1, 0]);
        assert!(col.filter(&mask).is_err());
    }

    #[test]
    fn test_gather_with_sentinels() {
        let col = Column::from_vec(vec![10i64, 20, 30]);
        let out = col.gather(&[2, -1, 0, 7]).unwrap();
        assert_eq!(out.len(), 4);
        assert_eq!(out.null_count(), 2);
        assert_eq!(out.get::<i64>(0), Some(30));
        assert_eq!(out.get::<i64>(1), None);
        assert_eq!(out.get::<i64>(2), Some(10));
        assert_eq!(out.get::<i64>(3), None);
    }

    #[test]
    fn test_gather_no_sentinels_no_bitmap() {
        let col = Column::from_vec(vec![1.0f64, 2.0, 3.0]);
        let out = col.gather(&[1, 1, 2]).unwrap();
        assert!(!out.has_nulls());
        assert_eq!(out.values::<f64>().unwrap(), &[2.0, 2.0, 3.0]);
    }

    #[test]
    fn test_gather_propagates_source_nulls() {
        let data = [1.0f64, 2.0, 3.0];
        let col = Column::with_nulls(&data, &[0b0000_0101]).unwrap(); // null at 1
        let out = col.gather(&[1, 0]).unwrap();
        assert_eq!(out.get::<f64>(0), None);
        assert_eq!(out.get::<f64>(1), Some(1.0));
    }

    #[test]
    fn test_empty_column_ops() {
        let col = Column::new_empty(DType::F64);
        assert!(col.is_empty());
        let mask = Column::from_mask(vec![]);
        assert!(col.filter(&mask).unwrap().is_empty());
        assert!(col.gather(&[]).unwrap().is_empty());
        assert!(col.slice(0, 0).unwrap().is_empty());
    }

    #[test]
    fn test_bool_column_rejected_for_numeric_ops() {
        let mask = Column::from_mask(vec![1, 0]);
        assert!(mask.slice(0, 1).is_err());
    }
}
