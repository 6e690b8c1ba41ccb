//! Neighbor-density filtering

use crate::nearest_neighbor::KdTree;
use log::{debug, info, log_enabled, trace, Level};
use mapclean_core::{validate_radius, Point3d, PointCloud, RadiusSearch, Result, Spatial};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Parameters for neighbor-density filtering
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DensityFilterConfig {
    /// Search radius; a point at exactly this distance is a neighbor
    pub radius: f64,
    /// Minimum neighbor count to keep a point. The point itself is counted.
    pub min_neighbors: usize,
    /// Count neighbors on the rayon thread pool
    pub parallel: bool,
}

impl Default for DensityFilterConfig {
    fn default() -> Self {
        Self {
            radius: 0.07,
            min_neighbors: 8,
            parallel: false,
        }
    }
}

impl DensityFilterConfig {
    pub fn new(min_neighbors: usize, radius: f64) -> Self {
        Self {
            radius,
            min_neighbors,
            ..Self::default()
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_radius(self.radius)
    }
}

/// What happened to the points of one filter run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterReport {
    pub input_points: usize,
    pub retained: usize,
    /// Points at the origin, whatever their neighbor count
    pub removed_sentinel: usize,
    /// Non-origin points below the neighbor threshold
    pub removed_sparse: usize,
}

impl FilterReport {
    pub fn removed(&self) -> usize {
        self.removed_sentinel + self.removed_sparse
    }
}

/// Single-pass neighbor-density filter.
///
/// A point is kept when it is not at the origin and at least `min_neighbors`
/// points of the input (itself included) lie within `radius` of it. Counts
/// are always taken against the full input, so removing a point never
/// lowers the count of another point within the same run.
#[derive(Debug, Clone)]
pub struct DensityFilter {
    config: DensityFilterConfig,
}

impl DensityFilter {
    /// Create a filter, rejecting an invalid radius up front
    pub fn new(config: DensityFilterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DensityFilterConfig {
        &self.config
    }

    /// Neighbor count of every point, in cloud order
    pub fn neighbor_counts<T: Spatial>(&self, cloud: &PointCloud<T>) -> Result<Vec<usize>> {
        if cloud.is_empty() {
            return Ok(Vec::new());
        }
        cloud.validate_finite()?;

        let positions = cloud.positions();
        let index = KdTree::build(&positions);
        debug!(
            "built kd-tree over {} points ({} nodes)",
            index.len(),
            index.node_count()
        );

        let counts = count_neighbors(&index, &positions, self.config.radius, self.config.parallel)?;
        log_count_summary(&counts);
        Ok(counts)
    }

    /// Filter `cloud`, returning the retained points in input order
    pub fn apply<T: Spatial + Clone>(&self, cloud: &PointCloud<T>) -> Result<PointCloud<T>> {
        self.apply_with_report(cloud).map(|(filtered, _)| filtered)
    }

    /// Filter `cloud` and report how many points each rule removed
    pub fn apply_with_report<T: Spatial + Clone>(
        &self,
        cloud: &PointCloud<T>,
    ) -> Result<(PointCloud<T>, FilterReport)> {
        let counts = self.neighbor_counts(cloud)?;

        let mut report = FilterReport {
            input_points: cloud.len(),
            ..FilterReport::default()
        };
        let keep: Vec<bool> = cloud
            .iter()
            .zip(&counts)
            .map(|(point, &count)| {
                if point.is_origin() {
                    report.removed_sentinel += 1;
                    false
                } else if count < self.config.min_neighbors {
                    report.removed_sparse += 1;
                    false
                } else {
                    true
                }
            })
            .collect();

        let filtered = cloud.select_by_mask(&keep);
        report.retained = filtered.len();

        info!(
            "density filter (radius {}, min_neighbors {}): kept {} of {} points, removed {} at origin and {} sparse",
            self.config.radius,
            self.config.min_neighbors,
            report.retained,
            report.input_points,
            report.removed_sentinel,
            report.removed_sparse
        );

        Ok((filtered, report))
    }
}

/// Count, for each position, the indexed points within `radius`.
///
/// The parallel path collects by index, so both paths return the same vector.
pub fn count_neighbors<S: RadiusSearch>(
    index: &S,
    positions: &[Point3d],
    radius: f64,
    parallel: bool,
) -> Result<Vec<usize>> {
    validate_radius(radius)?;
    if parallel {
        positions
            .par_iter()
            .map(|p| index.count_within(p, radius))
            .collect()
    } else {
        positions
            .iter()
            .map(|p| index.count_within(p, radius))
            .collect()
    }
}

/// Remove origin points and points with fewer than `min_neighbors` neighbors
/// (self included) within `radius`.
///
/// # Example
/// ```rust
/// use mapclean_core::{PointCloud, Point3f};
/// use mapclean_algorithms::density_filter;
///
/// fn main() -> mapclean_core::Result<()> {
///     let cloud = PointCloud::from_points(vec![
///         Point3f::new(0.0, 0.0, 0.0),  // sentinel
///         Point3f::new(1.0, 0.0, 0.0),
///         Point3f::new(1.01, 0.0, 0.0),
///         Point3f::new(5.0, 5.0, 5.0),  // isolated
///     ]);
///
///     let filtered = density_filter(&cloud, 2, 0.07)?;
///     assert_eq!(filtered.len(), 2);
///     Ok(())
/// }
/// ```
pub fn density_filter<T: Spatial + Clone>(
    cloud: &PointCloud<T>,
    min_neighbors: usize,
    radius: f64,
) -> Result<PointCloud<T>> {
    DensityFilter::new(DensityFilterConfig::new(min_neighbors, radius))?.apply(cloud)
}

/// Neighbor count of every point of `cloud` within `radius`, self included
pub fn neighbor_counts<T: Spatial>(cloud: &PointCloud<T>, radius: f64) -> Result<Vec<usize>> {
    DensityFilter::new(DensityFilterConfig::new(0, radius))?.neighbor_counts(cloud)
}

fn log_count_summary(counts: &[usize]) {
    if counts.is_empty() {
        return;
    }
    let min = counts.iter().copied().min().unwrap_or(0);
    let max = counts.iter().copied().max().unwrap_or(0);
    let mean = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
    debug!("neighbor counts: min {}, max {}, mean {:.2}", min, max, mean);
    if log_enabled!(Level::Trace) {
        trace!("neighbor counts: {:?}", counts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapclean_core::{ColoredPoint3f, Error, Point3f, PointRecord};

    fn example_cloud() -> PointCloud<Point3f> {
        PointCloud::from_points(vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(1.01, 0.0, 0.0),
            Point3f::new(5.0, 5.0, 5.0),
        ])
    }

    fn line(n: usize, spacing: f32) -> PointCloud<Point3f> {
        (0..n)
            .map(|i| Point3f::new(1.0 + i as f32 * spacing, 2.0, 3.0))
            .collect()
    }

    #[test]
    fn test_reference_example() {
        let cloud = example_cloud();
        let filtered = density_filter(&cloud, 2, 0.07).unwrap();
        assert_eq!(
            filtered.points,
            vec![Point3f::new(1.0, 0.0, 0.0), Point3f::new(1.01, 0.0, 0.0)]
        );
    }

    #[test]
    fn test_reference_example_counts() {
        let counts = neighbor_counts(&example_cloud(), 0.07).unwrap();
        assert_eq!(counts, vec![1, 2, 2, 1]);
    }

    #[test]
    fn test_report_splits_removals() {
        let filter = DensityFilter::new(DensityFilterConfig::new(2, 0.07)).unwrap();
        let (filtered, report) = filter.apply_with_report(&example_cloud()).unwrap();
        assert_eq!(filtered.len(), 2);
        assert_eq!(
            report,
            FilterReport {
                input_points: 4,
                retained: 2,
                removed_sentinel: 1,
                removed_sparse: 1,
            }
        );
        assert_eq!(report.removed(), 2);
    }

    #[test]
    fn test_empty_cloud() {
        let cloud = PointCloud::<Point3f>::new();
        let result = density_filter(&cloud, 3, 0.5);
        assert!(result.is_ok());
        assert_eq!(result.unwrap().len(), 0);
    }

    #[test]
    fn test_single_point_counts_itself() {
        let cloud = PointCloud::from_points(vec![Point3f::new(1.0, 1.0, 1.0)]);
        assert_eq!(density_filter(&cloud, 1, 0.5).unwrap().len(), 1);
        assert_eq!(density_filter(&cloud, 2, 0.5).unwrap().len(), 0);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        // Points are 0.1 apart, so interior points see themselves and two
        // neighbors while the ends see only one neighbor.
        let cloud = line(5, 0.1);
        let counts = neighbor_counts(&cloud, 0.1001).unwrap();
        assert_eq!(counts, vec![2, 3, 3, 3, 2]);

        let filtered = density_filter(&cloud, 3, 0.1001).unwrap();
        assert_eq!(filtered.len(), 3);
        assert_eq!(filtered[0], cloud[1]);
        assert_eq!(filtered[2], cloud[3]);
    }

    #[test]
    fn test_zero_min_neighbors_keeps_all_but_origin() {
        let mut cloud = line(4, 100.0);
        cloud.push(Point3f::origin());
        let filtered = density_filter(&cloud, 0, 0.01).unwrap();
        assert_eq!(filtered.len(), 4);
    }

    #[test]
    fn test_origin_removed_even_when_dense() {
        let cloud = PointCloud::from_points(vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(-0.0, 0.0, 0.0),
            Point3f::new(0.01, 0.0, 0.0),
            Point3f::new(0.0, 0.01, 0.0),
        ]);
        let filtered = density_filter(&cloud, 1, 1.0).unwrap();
        assert_eq!(
            filtered.points,
            vec![Point3f::new(0.01, 0.0, 0.0), Point3f::new(0.0, 0.01, 0.0)]
        );
    }

    #[test]
    fn test_zero_radius_counts_duplicates() {
        let cloud = PointCloud::from_points(vec![
            Point3f::new(1.0, 2.0, 3.0),
            Point3f::new(1.0, 2.0, 3.0),
            Point3f::new(1.0, 2.0, 3.5),
            Point3f::new(1.0, 2.0, 3.0),
        ]);
        let counts = neighbor_counts(&cloud, 0.0).unwrap();
        assert_eq!(counts, vec![3, 3, 1, 3]);
    }

    #[test]
    fn test_invalid_radius() {
        let cloud = example_cloud();
        assert!(matches!(
            density_filter(&cloud, 2, -0.5),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            density_filter(&cloud, 2, f64::NAN),
            Err(Error::InvalidParameter(_))
        ));
        assert!(DensityFilter::new(DensityFilterConfig::new(2, -1.0)).is_err());
    }

    #[test]
    fn test_invalid_radius_rejected_for_empty_cloud() {
        let cloud = PointCloud::<Point3f>::new();
        assert!(density_filter(&cloud, 2, -1.0).is_err());
    }

    #[test]
    fn test_non_finite_point_rejected() {
        let cloud = PointCloud::from_points(vec![
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(f32::NAN, 0.0, 0.0),
        ]);
        assert!(matches!(
            density_filter(&cloud, 1, 0.5),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn test_payload_is_preserved() {
        let cloud = PointCloud::from_points(vec![
            ColoredPoint3f {
                position: Point3f::new(1.0, 0.0, 0.0),
                color: [255, 0, 0],
            },
            ColoredPoint3f {
                position: Point3f::new(9.0, 0.0, 0.0),
                color: [0, 255, 0],
            },
            ColoredPoint3f {
                position: Point3f::new(1.02, 0.0, 0.0),
                color: [0, 0, 255],
            },
        ]);
        let filtered = density_filter(&cloud, 2, 0.07).unwrap();
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].color, [255, 0, 0]);
        assert_eq!(filtered[1].color, [0, 0, 255]);
    }

    #[test]
    fn test_records_keep_extra_columns() {
        let cloud = PointCloud::from_points(vec![
            PointRecord::new(vec![1.0, 1.0, 1.0, 0.25, 7.0]),
            PointRecord::new(vec![1.01, 1.0, 1.0, 0.5, 8.0]),
            PointRecord::new(vec![0.0, 0.0, 0.0, 0.75, 9.0]),
        ]);
        let filtered = density_filter(&cloud, 2, 0.07).unwrap();
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].payload(), &[0.25, 7.0]);
        assert_eq!(filtered[1].payload(), &[0.5, 8.0]);
    }

    #[test]
    fn test_records_keep_double_and_wide_integer_columns() {
        let cloud = PointCloud::from_points(vec![
            PointRecord::new(vec![1.0, 0.0, 0.0, 1_700_000_000.125, 16_777_217.0]),
            PointRecord::new(vec![1.01, 0.0, 0.0, 1_700_000_000.375, 16_777_219.0]),
            PointRecord::new(vec![7.0, 0.0, 0.0, 1_700_000_001.5, 4_294_967_295.0]),
        ]);
        let filtered = density_filter(&cloud, 2, 0.07).unwrap();
        assert_eq!(filtered.points, cloud.points[..2].to_vec());
    }

    #[test]
    fn test_large_coordinates_counted_in_double_precision() {
        let cloud = PointCloud::from_points(vec![
            Point3d::new(4_000_000.0, 0.0, 0.0),
            Point3d::new(4_000_000.1, 0.0, 0.0),
        ]);
        assert_eq!(neighbor_counts(&cloud, 0.07).unwrap(), vec![1, 1]);
        assert!(density_filter(&cloud, 2, 0.07).unwrap().is_empty());
    }

    #[test]
    fn test_config_and_report_serialize() {
        let config = DensityFilterConfig::new(3, 0.05).with_parallel(true);
        let json = serde_json::to_string(&config).unwrap();
        let parsed: DensityFilterConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);

        let filter = DensityFilter::new(DensityFilterConfig::new(2, 0.07)).unwrap();
        let (_, report) = filter.apply_with_report(&example_cloud()).unwrap();
        let value = serde_json::to_value(report).unwrap();
        assert_eq!(value["retained"], 2);
        assert_eq!(value["removed_sentinel"], 1);
        let parsed: FilterReport = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, report);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut points = Vec::new();
        for i in 0..20 {
            for j in 0..20 {
                let jitter = ((i * 31 + j * 17) % 7) as f32 * 0.003;
                points.push(Point3f::new(i as f32 * 0.05 + jitter, j as f32 * 0.05, jitter));
            }
        }
        points.push(Point3f::new(50.0, 50.0, 50.0));
        let cloud = PointCloud::from_points(points);

        let config = DensityFilterConfig::new(4, 0.07);
        let sequential = DensityFilter::new(config).unwrap();
        let parallel = DensityFilter::new(config.with_parallel(true)).unwrap();

        assert_eq!(
            sequential.neighbor_counts(&cloud).unwrap(),
            parallel.neighbor_counts(&cloud).unwrap()
        );
        assert_eq!(
            sequential.apply(&cloud).unwrap(),
            parallel.apply(&cloud).unwrap()
        );
    }

    #[test]
    fn test_single_pass_does_not_cascade() {
        // Ends have 2 points within reach, the middle has 3. With a threshold
        // of 3 only the middle survives, and on its own it no longer qualifies.
        let cloud = line(3, 0.05);
        let once = density_filter(&cloud, 3, 0.06).unwrap();
        assert_eq!(once.len(), 1);
        let twice = density_filter(&once, 3, 0.06).unwrap();
        assert_eq!(twice.len(), 0);
    }

    #[test]
    fn test_refilter_clean_cloud_is_noop() {
        let mut points = line(6, 0.01).points;
        points.push(Point3f::new(40.0, 40.0, 40.0));
        points.push(Point3f::origin());
        let cloud = PointCloud::from_points(points);

        let once = density_filter(&cloud, 2, 0.05).unwrap();
        assert_eq!(once.len(), 6);
        let twice = density_filter(&once, 2, 0.05).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_default_config() {
        let config = DensityFilterConfig::default();
        assert_eq!(config.min_neighbors, 8);
        approx::assert_relative_eq!(config.radius, 0.07);
        assert!(!config.parallel);
    }

    #[test]
    fn test_count_neighbors_with_custom_index() {
        let positions = example_cloud().positions();
        let brute = crate::nearest_neighbor::BruteForceSearch::new(&positions);
        let counts = count_neighbors(&brute, &positions, 0.07, false).unwrap();
        assert_eq!(counts, vec![1, 2, 2, 1]);
    }
}
