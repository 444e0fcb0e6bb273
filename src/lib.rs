/*!
 * Quiver Kernel
 * Columnar SIMD analytics kernels for embedding in a dataframe engine
 *
 * The crate operates on flat, cache-aligned numeric buffers and owned
 * columnar arrays with validity bitmaps. It provides vectorized
 * aggregations and arithmetic, boolean masks and filters, hashing,
 * equi-join probes, group-by aggregation, radix/sample sorting, window
 * computations, and a heartbeat-scheduled work-stealing runtime that the
 * larger operations fan out onto.
 */

pub mod api;
pub mod column;
pub mod core;
pub mod groupby;
pub mod join;
pub mod runtime;
pub mod simd;
pub mod sort;
pub mod table;

// Core abstractions
pub use crate::core::errors::{ContractError, DataError, KernelError, ResourceError, Result};
pub use crate::core::types::{DType, Float, Native};

// Columnar container and interop
pub use column::{export_column, import_borrowed, Column, ColumnarArray};

// Flat functional surface
pub use api::{
    add_f64, add_scalar_f64, all_masks, any_masks, argsort_f64, argsort_i64, cmp_f64, cmp_i64,
    cmp_scalar_f64, cmp_scalar_i64, count_valid_rows, div_f64, filter_gt_f64, filter_gt_i64,
    filter_mask_gt_f64, hash_u64, hmax_columns_f64, hmin_columns_f64, hproduct_columns_f64,
    hsum_columns_f64, max_f64, max_i64, mean_f64, mean_i64, min_f64, min_i64, mul_f64,
    mul_scalar_f64, sub_f64, sum_f64, sum_i64,
};

// Group-by engine
pub use groupby::{
    assign_group_ids, assign_group_ids_ext, assign_group_ids_keyed, groupby_compute,
    groupby_compute_ext, groupby_multi_agg_e2e_i64_f64, groupby_sum_e2e_i64_f64,
    GroupByMultiAggResult, GroupByResult, GroupByResultExt, GroupBySumResult,
};

// Join engine
pub use join::{
    arrow_inner_join_full, arrow_left_join_full, inner_join_i64, inner_join_i64_radix,
    inner_join_i64_swiss, left_join_i64, parallel_inner_join_i64, parallel_left_join_i64,
    partitioned_inner_join_i64, sort_merge_inner_join_i64, JoinResult, JoinedColumns,
};

// SIMD configuration
pub use simd::{
    cpu_features, get_simd_level, get_simd_vector_bytes, reset_simd_level, set_simd_level, CmpOp,
    SimdLevel,
};

// Runtime configuration
pub use runtime::{
    deinit_pool, get_max_threads, init_pool, is_threads_auto_detected, join as parallel_join,
    num_workers, parallel_for, parallel_reduce, parallel_scan, parallel_sort_f64, set_max_threads,
};
