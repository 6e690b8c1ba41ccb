//! # mapclean
//!
//! Neighbor-density cleaning of 3D map point clouds.
//!
//! This is the umbrella crate that provides convenient access to all mapclean
//! functionality. Use the individual crates for more granular control over
//! dependencies.
//!
//! ## Features
//!
//! - **Core**: point types, `PointCloud`, the `RadiusSearch` trait and errors
//! - **Algorithms**: the k-d tree and the neighbor-density filter
//! - **I/O**: PLY loading and saving that keeps every vertex property
//!
//! ## Quick Start
//!
//! ```rust
//! use mapclean::prelude::*;
//!
//! let cloud = PointCloud::from_points(vec![
//!     Point3f::new(0.0, 0.0, 0.0),
//!     Point3f::new(1.0, 0.0, 0.0),
//!     Point3f::new(1.01, 0.0, 0.0),
//!     Point3f::new(5.0, 5.0, 5.0),
//! ]);
//!
//! let cleaned = density_filter(&cloud, 2, 0.07).unwrap();
//! assert_eq!(cleaned.len(), 2);
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: Enables algorithms and io
//! - `algorithms`: Spatial index and density filter
//! - `io`: PLY support

// Re-export core functionality
pub use mapclean_core::*;

// Re-export sub-crates
#[cfg(feature = "algorithms")]
pub use mapclean_algorithms as algorithms;

#[cfg(feature = "io")]
pub use mapclean_io as io;

/// Convenient imports for common use cases
pub mod prelude {
    pub use mapclean_core::*;

    #[cfg(feature = "algorithms")]
    pub use mapclean_algorithms::*;

    #[cfg(feature = "io")]
    pub use mapclean_io::*;
}
