/*!
 * Columnar Interop Record
 * C-data-interface struct for exchanging arrays with a host process
 *
 * The record mirrors the standard columnar ABI: length, null count,
 * offset, buffer pointers (validity first, then data), and an optional
 * release callback. Imports copy into an owned column so nothing in the
 * core ever aliases producer memory; the release callback belongs to the
 * producer and fires only through `release_record`.
 */

use super::Column;
use crate::core::bitmap::{self, bitmap_bytes};
use crate::core::errors::{ContractError, DataError, KernelError, Result};
use crate::core::types::Native;
use std::ffi::c_void;

/// Borrowed columnar array record, laid out for C interop
#[repr(C)]
pub struct ColumnarArray {
    pub length: i64,
    pub null_count: i64,
    pub offset: i64,
    pub n_buffers: i64,
    /// buffers[0] = validity bitmap (LSB-first, may be null),
    /// buffers[1] = data
    pub buffers: [*const u8; 2],
    pub release: Option<unsafe extern "C" fn(*mut ColumnarArray)>,
    pub private_data: *mut c_void,
}

impl ColumnarArray {
    /// Record over an owned column, borrowed: no release callback, valid
    /// only while the column lives
    #[must_use]
    pub fn from_column(col: &Column) -> Self {
        let validity_ptr = col.validity().map_or(std::ptr::null(), <[u8]>::as_ptr);
        Self {
            length: col.len() as i64,
            null_count: col.null_count() as i64,
            offset: 0,
            n_buffers: 2,
            buffers: [validity_ptr, col.data_ptr()],
            release: None,
            private_data: std::ptr::null_mut(),
        }
    }
}

/// Borrowed export of an owned column
#[must_use]
pub fn export_column(col: &Column) -> ColumnarArray {
    ColumnarArray::from_column(col)
}

/// Copy a producer's record into an owned column, honoring `offset` and
/// re-aligning the validity bitmap to offset 0.
///
/// # Safety
/// The record's buffer pointers must be valid for `offset + length`
/// elements (and matching validity bits) of type `T`.
pub unsafe fn import_borrowed<T: Native>(record: &ColumnarArray) -> Result<Column> {
    if record.length < 0 || record.offset < 0 {
        return Err(KernelError::Contract(ContractError::IndexOutOfRange {
            index: record.offset.unsigned_abs() as usize,
            len: record.length.unsigned_abs() as usize,
        }));
    }
    let len = record.length as usize;
    let offset = record.offset as usize;
    if len == 0 {
        return Ok(Column::new_empty(T::DTYPE));
    }
    let data_ptr = record.buffers[1];
    if data_ptr.is_null() {
        return Err(KernelError::Data(DataError::MissingBuffer("data")));
    }

    let data: &[T] = std::slice::from_raw_parts(data_ptr.cast::<T>().add(offset), len);

    let validity_ptr = record.buffers[0];
    if validity_ptr.is_null() || record.null_count == 0 {
        return Column::from_slice(data);
    }

    // Bits [offset, offset + len) re-packed from bit 0
    let src_bits = std::slice::from_raw_parts(validity_ptr, bitmap_bytes(offset + len));
    let mut packed = vec![0u8; bitmap_bytes(len)];
    bitmap::bit_copy_shifted(&mut packed, src_bits, offset, len);
    Column::with_nulls(data, &packed)
}

/// Invoke the producer's release callback, if any
pub fn release_record(record: &mut ColumnarArray) {
    if let Some(release) = record.release.take() {
        // SAFETY: the producer's callback contract: called once, with its
        // own record
        unsafe { release(record) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bitmap::bit_clear;

    #[test]
    fn test_export_layout() {
        let col = Column::from_slice(&[1.0f64, 2.0, 3.0]).unwrap();
        let rec = export_column(&col);
        assert_eq!(rec.length, 3);
        assert_eq!(rec.null_count, 0);
        assert_eq!(rec.n_buffers, 2);
        assert!(rec.buffers[0].is_null());
        assert_eq!(rec.buffers[1], col.data_ptr());
        assert!(rec.release.is_none());
    }

    #[test]
    fn test_import_copies() {
        let data = [10i64, 20, 30, 40];
        let rec = ColumnarArray {
            length: 4,
            null_count: 0,
            offset: 0,
            n_buffers: 2,
            buffers: [std::ptr::null(), data.as_ptr() as *const u8],
            release: None,
            private_data: std::ptr::null_mut(),
        };
        let col = unsafe { import_borrowed::<i64>(&rec) }.unwrap();
        assert_eq!(col.values::<i64>().unwrap(), &data);
        assert_ne!(col.data_ptr(), data.as_ptr() as *const u8);
    }

    #[test]
    fn test_import_with_offset_and_validity() {
        let data = [0.0f64, 1.0, 2.0, 3.0, 4.0, 5.0];
        let mut bm = bitmap::all_set(6);
        bit_clear(&mut bm, 3);
        let rec = ColumnarArray {
            length: 4,
            null_count: 1,
            offset: 2,
            n_buffers: 2,
            buffers: [bm.as_ptr(), data.as_ptr() as *const u8],
            release: None,
            private_data: std::ptr::null_mut(),
        };
        let col = unsafe { import_borrowed::<f64>(&rec) }.unwrap();
        assert_eq!(col.len(), 4);
        assert_eq!(col.null_count(), 1);
        assert_eq!(col.get::<f64>(0), Some(2.0));
        assert_eq!(col.get::<f64>(1), None); // source element 3
        assert_eq!(col.get::<f64>(3), Some(5.0));
    }

    #[test]
    fn test_import_missing_data_buffer() {
        let rec = ColumnarArray {
            length: 2,
            null_count: 0,
            offset: 0,
            n_buffers: 2,
            buffers: [std::ptr::null(), std::ptr::null()],
            release: None,
            private_data: std::ptr::null_mut(),
        };
        assert!(unsafe { import_borrowed::<f64>(&rec) }.is_err());
    }

    #[test]
    fn test_release_called_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        unsafe extern "C" fn rel(_rec: *mut ColumnarArray) {
            CALLS.fetch_add(1, Ordering::SeqCst);
        }
        let mut rec = ColumnarArray {
            length: 0,
            null_count: 0,
            offset: 0,
            n_buffers: 2,
            buffers: [std::ptr::null(), std::ptr::null()],
            release: Some(rel),
            private_data: std::ptr::null_mut(),
        };
        release_record(&mut rec);
        release_record(&mut rec);
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }
}
