//! Core traits for mapclean

use crate::error::{Error, Result};
use crate::point::Point3d;

/// Fixed-radius neighbor lookup over an indexed point set.
///
/// Indices refer to positions in the sequence the structure was built from.
/// A point at distance exactly `radius` is a neighbor, and a query at an
/// indexed position finds that point itself.
pub trait RadiusSearch: Send + Sync {
    /// Number of indexed points
    fn len(&self) -> usize;

    /// Whether no points are indexed
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Indices of all points within `radius` of `query`, in no particular order
    fn query_radius(&self, query: &Point3d, radius: f64) -> Result<Vec<usize>>;

    /// Number of points within `radius` of `query`
    fn count_within(&self, query: &Point3d, radius: f64) -> Result<usize> {
        self.query_radius(query, radius).map(|found| found.len())
    }
}

/// Reject negative, NaN and infinite search radii
pub fn validate_radius(radius: f64) -> Result<()> {
    if !radius.is_finite() || radius < 0.0 {
        return Err(Error::InvalidParameter(format!(
            "radius must be a finite non-negative number, got {}",
            radius
        )));
    }
    Ok(())
}
