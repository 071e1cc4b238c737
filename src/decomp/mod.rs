//! Domain decomposition.
//!
//! A run partitions the global cell set across ranks with a graph
//! partitioner applied to the dual graph of cells, then derives owned + halo
//! index ranges for cells, edges, and vertices. Edge and vertex ownership
//! follows the first-valid-adjoining-cell rule, so every entity is owned by
//! exactly one rank and appears in the local set of that rank.
//!
//! The decomposition is built once at initialization and is immutable for
//! the life of the run.

mod build;
mod partition;

pub use build::{Decomp, EntityRange};
pub use partition::{ContiguousPartitioner, Partitioner, RegionGrowingPartitioner};
