/*!
 * Owned Byte Buffer
 * Cache-aligned allocation backing column data
 *
 * Copy-construction paths allocate at 64-byte alignment so every SIMD load
 * width stays split-free. Zero-copy construction adopts a Vec's allocation
 * as-is, keeping the element type's natural alignment, and records the
 * original layout so Drop releases it exactly as Vec would have.
 */

use crate::core::errors::{KernelError, ResourceError, Result};
use crate::core::limits::COLUMN_BUFFER_ALIGN;
use crate::core::types::Native;
use std::alloc::{alloc, dealloc, Layout};
use std::ptr::NonNull;

pub struct Buffer {
    ptr: NonNull<u8>,
    len_bytes: usize,
    cap_bytes: usize,
    align: usize,
}

// The buffer uniquely owns its allocation and is never aliased mutably
// after construction
unsafe impl Send for Buffer {}
unsafe impl Sync for Buffer {}

/// A non-null, non-dereferenced pointer aligned to `align` (a power of two),
/// for zero-length buffers that still need to satisfy slice validity rules
#[inline]
fn dangling_aligned(align: usize) -> NonNull<u8> {
    // SAFETY: `align` is a power of two and thus never zero
    unsafe { NonNull::new_unchecked(align as *mut u8) }
}

impl Buffer {
    /// Empty buffer with no allocation
    #[must_use]
    pub fn empty() -> Self {
        Self {
            ptr: dangling_aligned(COLUMN_BUFFER_ALIGN),
            len_bytes: 0,
            cap_bytes: 0,
            align: COLUMN_BUFFER_ALIGN,
        }
    }

    /// Allocate `len_bytes` of uninitialized storage at 64-byte alignment;
    /// the caller fills it before any read
    pub fn allocate_aligned(len_bytes: usize) -> Result<Self> {
        if len_bytes == 0 {
            return Ok(Self::empty());
        }
        let layout = Layout::from_size_align(len_bytes, COLUMN_BUFFER_ALIGN)
            .map_err(|_| KernelError::Resource(ResourceError::AllocationFailed { bytes: len_bytes }))?;
        // SAFETY: layout has non-zero size
        let raw = unsafe { alloc(layout) };
        let ptr = NonNull::new(raw)
            .ok_or(KernelError::Resource(ResourceError::AllocationFailed { bytes: len_bytes }))?;
        Ok(Self {
            ptr,
            len_bytes,
            cap_bytes: len_bytes,
            align: COLUMN_BUFFER_ALIGN,
        })
    }

    /// Copy a typed slice into a fresh 64-byte-aligned buffer
    pub fn copy_from_slice<T: Copy>(data: &[T]) -> Result<Self> {
        let bytes = std::mem::size_of_val(data);
        let buf = Self::allocate_aligned(bytes)?;
        // SAFETY: freshly allocated, sized for exactly these bytes
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr() as *const u8, buf.ptr.as_ptr(), bytes);
        }
        Ok(buf)
    }

    /// Adopt a Vec's allocation without copying
    #[must_use]
    pub fn from_vec<T: Copy>(vec: Vec<T>) -> Self {
        let elem = std::mem::size_of::<T>();
        let mut vec = std::mem::ManuallyDrop::new(vec);
        let len_bytes = vec.len() * elem;
        let cap_bytes = vec.capacity() * elem;
        let ptr = if cap_bytes == 0 {
            dangling_aligned(std::mem::align_of::<T>())
        } else {
            // SAFETY: a non-empty Vec's pointer is non-null
            unsafe { NonNull::new_unchecked(vec.as_mut_ptr() as *mut u8) }
        };
        Self {
            ptr,
            len_bytes,
            cap_bytes,
            align: std::mem::align_of::<T>(),
        }
    }

    #[inline]
    #[must_use]
    pub fn len_bytes(&self) -> usize {
        self.len_bytes
    }

    #[inline]
    #[must_use]
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    #[inline]
    #[must_use]
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    /// View as a typed slice. The element count is `len_bytes / size_of::<T>`.
    #[inline]
    #[must_use]
    pub fn typed<T: Native>(&self) -> &[T] {
        let n = self.len_bytes / std::mem::size_of::<T>();
        // SAFETY: the buffer was constructed from T elements (or aligned
        // beyond T's requirement) and outlives the borrow
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr() as *const T, n) }
    }

    /// Mutable typed view, only used during construction
    #[inline]
    pub fn typed_mut<T: Native>(&mut self) -> &mut [T] {
        let n = self.len_bytes / std::mem::size_of::<T>();
        // SAFETY: unique ownership, see `typed`
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr() as *mut T, n) }
    }

    /// Raw byte view
    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        // SAFETY: len_bytes bytes are owned and initialized
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len_bytes) }
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if self.cap_bytes != 0 {
            // SAFETY: matches the layout the buffer was allocated with
            unsafe {
                let layout = Layout::from_size_align_unchecked(self.cap_bytes, self.align);
                dealloc(self.ptr.as_ptr(), layout);
            }
        }
    }
}
