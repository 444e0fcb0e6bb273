/*!
 * Horizontal Fold Kernels
 * Row-wise reductions across 2..N equal-length columns
 */

use crate::core::bitmap::bit_get;
use crate::core::types::Native;

fn fold_rows<T: Native>(cols: &[&[T]], init: T, f: impl Fn(T, T) -> T, out: &mut [T]) {
    debug_assert!(!cols.is_empty());
    debug_assert!(cols.iter().all(|c| c.len() == out.len()));
    for (i, o) in out.iter_mut().enumerate() {
        let mut acc = init;
        for col in cols {
            acc = f(acc, col[i]);
        }
        *o = acc;
    }
}

/// out[i] = sum over columns of col[i]
pub fn hsum<T: Native>(cols: &[&[T]], out: &mut [T]) {
    fold_rows(cols, T::default(), |a, v| a.add_wrap(v), out);
}

pub fn hmin<T: Native>(cols: &[&[T]], out: &mut [T]) {
    fold_rows(cols, T::MIN_IDENTITY, |a, v| a.min2(v), out);
}

pub fn hmax<T: Native>(cols: &[&[T]], out: &mut [T]) {
    fold_rows(cols, T::MAX_IDENTITY, |a, v| a.max2(v), out);
}

pub fn hproduct<T: Native>(cols: &[&[T]], out: &mut [T]) {
    let one = T::from_f64(1.0);
    fold_rows(cols, one, |a, v| a.mul_wrap(v), out);
}

/// out[i] = 1 if any mask has a nonzero entry at row i
pub fn hany(masks: &[&[u8]], out: &mut [u8]) {
    for (i, o) in out.iter_mut().enumerate() {
        *o = masks.iter().any(|m| m[i] != 0) as u8;
    }
}

/// out[i] = 1 if every mask has a nonzero entry at row i
pub fn hall(masks: &[&[u8]], out: &mut [u8]) {
    for (i, o) in out.iter_mut().enumerate() {
        *o = masks.iter().all(|m| m[i] != 0) as u8;
    }
}

/// Per-row count of non-null entries across columns, given each column's
/// optional validity bitmap (None = no nulls)
pub fn hcount_valid(validities: &[Option<&[u8]>], len: usize, out: &mut [u32]) {
    for (i, o) in out.iter_mut().enumerate().take(len) {
        let mut count = 0u32;
        for v in validities {
            match v {
                None => count += 1,
                Some(bm) => {
                    if bit_get(bm, i) {
                        count += 1;
                    }
                }
            }
        }
        *o = count;
    }
}
