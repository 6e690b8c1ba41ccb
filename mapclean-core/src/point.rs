//! Point types and related functionality

use nalgebra::Point3;

/// A 3D point with single precision coordinates
pub type Point3f = Point3<f32>;

/// A 3D point with double precision coordinates
pub type Point3d = Point3<f64>;

/// Access to the spatial (x, y, z) part of a point.
///
/// Everything beyond the position is payload that filters carry through
/// untouched. Positions are exposed in double precision so that neighbor
/// distances never lose accuracy relative to the stored coordinates.
pub trait Spatial {
    /// The x, y, z coordinates of this point
    fn position(&self) -> Point3d;

    /// Whether the position is the all-zero sentinel.
    ///
    /// Uses float equality, so `-0.0` counts as zero.
    fn is_origin(&self) -> bool {
        let p = self.position();
        p.x == 0.0 && p.y == 0.0 && p.z == 0.0
    }

    /// Whether all three coordinates are finite
    fn has_finite_position(&self) -> bool {
        let p = self.position();
        p.x.is_finite() && p.y.is_finite() && p.z.is_finite()
    }
}

impl Spatial for Point3f {
    fn position(&self) -> Point3d {
        Point3d::new(self.x.into(), self.y.into(), self.z.into())
    }
}

impl Spatial for Point3d {
    fn position(&self) -> Point3d {
        *self
    }
}

/// A point with color information
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColoredPoint3f {
    pub position: Point3f,
    pub color: [u8; 3],
}

impl Default for ColoredPoint3f {
    fn default() -> Self {
        Self {
            position: Point3f::origin(),
            color: [255, 255, 255],
        }
    }
}

impl Spatial for ColoredPoint3f {
    fn position(&self) -> Point3d {
        self.position.position()
    }
}

/// A row of numeric values whose first three entries are x, y, z.
///
/// This is what a format-agnostic loader produces when it does not know
/// the meaning of the extra columns (color, intensity, timestamps, ids).
/// Values are kept as `f64`, which holds every 8, 16 and 32 bit integer and
/// every `f32`/`f64` exactly, so a loader can write them back bit for bit.
/// Records in one cloud must all have the same length, see
/// [`PointCloud::validate_dimension`](crate::PointCloud::validate_dimension).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointRecord {
    pub values: Vec<f64>,
}

impl PointRecord {
    /// Create a record from raw values
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Number of values in this record
    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    /// Values after x, y, z
    pub fn payload(&self) -> &[f64] {
        self.values.get(3..).unwrap_or(&[])
    }
}

impl From<Vec<f64>> for PointRecord {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

impl Spatial for PointRecord {
    /// Missing coordinates read as NaN so short records never pass as valid.
    fn position(&self) -> Point3d {
        let get = |i: usize| self.values.get(i).copied().unwrap_or(f64::NAN);
        Point3d::new(get(0), get(1), get(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_detection() {
        assert!(Point3f::new(0.0, 0.0, 0.0).is_origin());
        assert!(Point3f::new(-0.0, 0.0, -0.0).is_origin());
        assert!(!Point3f::new(0.0, 0.0, 1e-9).is_origin());
        assert!(!Point3d::new(0.0, 1e-300, 0.0).is_origin());
    }

    #[test]
    fn test_single_precision_widens_exactly() {
        let p = Point3f::new(1.01, -2.5, 3.0);
        let wide = p.position();
        assert_eq!(wide.x as f32, 1.01f32);
        assert_eq!(wide.y, -2.5);
    }

    #[test]
    fn test_colored_point_uses_position_only() {
        let p = ColoredPoint3f {
            position: Point3f::origin(),
            color: [10, 20, 30],
        };
        assert!(p.is_origin());
        assert_eq!(ColoredPoint3f::default().color, [255, 255, 255]);
    }

    #[test]
    fn test_record_position_and_payload() {
        let r = PointRecord::new(vec![1.0, 2.0, 3.0, 255.0, 1_700_000_000.125]);
        assert_eq!(r.position(), Point3d::new(1.0, 2.0, 3.0));
        assert_eq!(r.payload(), &[255.0, 1_700_000_000.125]);
        assert_eq!(r.dimension(), 5);
    }

    #[test]
    fn test_short_record_is_not_finite() {
        let r = PointRecord::new(vec![1.0, 2.0]);
        assert!(!r.has_finite_position());
        assert!(!r.is_origin());
        assert!(r.payload().is_empty());
    }

    #[test]
    fn test_non_finite_detection() {
        assert!(!Point3f::new(f32::NAN, 0.0, 0.0).has_finite_position());
        assert!(!Point3f::new(0.0, f32::INFINITY, 0.0).has_finite_position());
        assert!(Point3f::new(0.0, 1.0, 2.0).has_finite_position());
    }
}
