//! Core data structures and traits for mapclean
//!
//! This crate provides the point types, the point cloud container, the
//! radius-search abstraction and the error type shared by the other
//! mapclean crates.

pub mod point;
pub mod point_cloud;
pub mod traits;
pub mod error;

pub use point::*;
pub use point_cloud::*;
pub use traits::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::Point3;
