/*!
 * Parallel Runtime
 *
 * Heartbeat-scheduled work-stealing executor and its adapters.
 *
 * # Module Organization
 *
 * - **job**: three-state job records and the sentinel-head worker deque
 * - **pool**: worker threads, steal handoff, singleton lifecycle, `join`
 * - **api**: parallel_for / parallel_reduce / parallel_scan / parallel_sort
 *   plus the per-operation threshold table
 */

pub mod api;
pub mod job;
pub mod pool;

pub use api::{
    parallel_for, parallel_reduce, parallel_scan, parallel_sort_f64, parallel_threshold,
    should_parallelize, OpKind,
};
pub use pool::{
    deinit_pool, get_max_threads, init_pool, is_threads_auto_detected, join, num_workers,
    set_max_threads,
};
pub(crate) use pool::run_on_pool;
