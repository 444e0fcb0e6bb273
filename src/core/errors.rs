/*!
 * Error Types
 * Centralized error handling with thiserror
 */

use crate::core::types::DType;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    #[error("Required buffer missing: {0}")]
    MissingBuffer(&'static str),

    #[error("Length mismatch: left {left} elements, right {right} elements")]
    LengthMismatch { left: usize, right: usize },

    #[error("Unsupported dtype {dtype:?} for {op}")]
    UnsupportedDType { dtype: DType, op: &'static str },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    #[error("Allocation failed: requested {bytes} bytes")]
    AllocationFailed { bytes: usize },

    #[error("Thread spawn failed: {0}")]
    ThreadSpawnFailed(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    #[error("Index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Validity bitmap too short: need {needed} bits, have {have}")]
    ShortBitmap { needed: usize, have: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    #[error("Contract error: {0}")]
    Contract(#[from] ContractError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for kernel operations
pub type Result<T> = std::result::Result<T, KernelError>;
