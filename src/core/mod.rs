/*!
 * Core Module
 *
 * Fundamental types, error handling, limits, and bit-level primitives.
 *
 * # Module Organization
 *
 * - **errors**: Error taxonomy and the crate-wide `Result` alias
 * - **types**: `DType` tags and the `Native` scalar trait
 * - **limits**: System-wide thresholds and constants
 * - **bitmap**: LSB-first validity bitmap arithmetic
 */

pub mod bitmap;
pub mod errors;
pub mod limits;
pub mod types;

// Re-export core abstractions
pub use errors::{ContractError, DataError, KernelError, ResourceError, Result};
pub use types::{DType, Float, Native};
