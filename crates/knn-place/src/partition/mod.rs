//! n-th order Voronoi partitions as labelled half-space cells.
//!
//! Purpose
//! - Build cells whose every point has the same n nearest sites, so any one
//!   point of a cell is a valid kNN query for that neighbour set.
//! - Order 1 comes straight from the Voronoi diagram (`build`); order n is
//!   grown from order n−1 by combination and LP pruning (`combine`).
//!
//! Layout
//! - `cell.rs` (value type), `build.rs` (order 1), `combine.rs` (worklist),
//!   `level.rs` (output level, dedup, records), `error.rs`.
//!
//! Code cross-refs: `geom2::{voronoi_boundaries, from_segment, from_ray, FeasibilitySolver}`.

mod build;
mod cell;
mod combine;
mod error;
mod level;

pub use build::{first_order_cells, validate_sites};
pub use cell::VoronoiCell;
pub use combine::{next_order_cells, nth_order_partition, PartitionCfg};
pub use error::PartitionError;
pub use level::{NeighbourRecord, PartitionLevel};

#[cfg(test)]
mod tests;
