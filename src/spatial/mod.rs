//! Spatial indexing.
//!
//! - [`grid`]: uniform-cell grid rebuilt on every connectivity pass
//! - [`rtree`]: R-tree index for pointer hit testing

mod grid;
mod rtree;

pub use grid::SpatialGrid;
pub use rtree::{NodePoint, SpatialIndex};
