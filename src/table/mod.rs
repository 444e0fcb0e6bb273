/*!
 * Hash Tables
 *
 * The two table shapes behind group-by and joins.
 *
 * # Module Organization
 *
 * - **swiss**: open-addressing table with SIMD control-byte probing
 * - **chained**: head/next row chains for join builds
 */

pub mod chained;
pub mod swiss;

pub use chained::{estimate_slots, ChainedTable, CHAIN_END};
pub use swiss::SwissTable;
