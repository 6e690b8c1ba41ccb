//! Point cloud container

use crate::error::{Error, Result};
use crate::point::*;
use std::ops::Index;

/// An ordered sequence of points.
///
/// Order carries no meaning for the filters, but every operation that
/// produces a new cloud keeps the relative order of the points it retains.
#[derive(Debug, Clone, PartialEq)]
pub struct PointCloud<T> {
    pub points: Vec<T>,
}

/// A point cloud of untyped numeric rows
pub type RecordCloud = PointCloud<PointRecord>;

impl<T> PointCloud<T> {
    /// Create a new empty point cloud
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Create a new point cloud with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    /// Create a point cloud from a vector of points
    pub fn from_points(points: Vec<T>) -> Self {
        Self { points }
    }

    /// Get the number of points in the cloud
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the point cloud is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Add a point to the cloud
    pub fn push(&mut self, point: T) {
        self.points.push(point);
    }

    /// Get an iterator over the points
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.points.iter()
    }

    /// Build a new cloud from the points selected by `mask`, in order.
    ///
    /// # Panics
    /// Panics if `mask.len() != self.len()`.
    pub fn select_by_mask(&self, mask: &[bool]) -> Self
    where
        T: Clone,
    {
        assert_eq!(mask.len(), self.points.len(), "mask length must match cloud length");
        self.points
            .iter()
            .zip(mask)
            .filter(|(_, &keep)| keep)
            .map(|(point, _)| point.clone())
            .collect()
    }
}

impl<T: Spatial> PointCloud<T> {
    /// The x, y, z coordinates of every point, in cloud order
    pub fn positions(&self) -> Vec<Point3d> {
        self.points.iter().map(Spatial::position).collect()
    }

    /// Fail on the first point with a NaN or infinite coordinate
    pub fn validate_finite(&self) -> Result<()> {
        match self.points.iter().position(|p| !p.has_finite_position()) {
            Some(index) => Err(Error::InvalidData(format!(
                "point {} has a non-finite coordinate",
                index
            ))),
            None => Ok(()),
        }
    }
}

impl PointCloud<PointRecord> {
    /// Shared record length, or `None` for an empty cloud
    pub fn dimension(&self) -> Option<usize> {
        self.points.first().map(PointRecord::dimension)
    }

    /// Check that every record has the same length and at least x, y, z.
    ///
    /// Returns the shared dimension (0 for an empty cloud).
    pub fn validate_dimension(&self) -> Result<usize> {
        let Some(expected) = self.dimension() else {
            return Ok(0);
        };
        if expected < 3 {
            return Err(Error::InvalidData(format!(
                "points need at least 3 values (x, y, z), found {}",
                expected
            )));
        }
        for (index, record) in self.points.iter().enumerate() {
            if record.dimension() != expected {
                return Err(Error::DimensionMismatch {
                    index,
                    expected,
                    found: record.dimension(),
                });
            }
        }
        Ok(expected)
    }
}

impl<T> Default for PointCloud<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<usize> for PointCloud<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl<T> IntoIterator for PointCloud<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a PointCloud<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl<T> Extend<T> for PointCloud<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.points.extend(iter);
    }
}

impl<T> FromIterator<T> for PointCloud<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            points: Vec::from_iter(iter),
        }
    }
}
