//! # mapclean algorithms
//!
//! Spatial indexing and neighbor-density filtering for 3D point clouds.
//!
//! [`KdTree`] answers fixed-radius neighbor queries; [`DensityFilter`] uses
//! it to drop points at the origin and points with too few neighbors.

pub mod filtering;
pub mod nearest_neighbor;

// Re-export commonly used items
pub use filtering::*;
pub use nearest_neighbor::*;
