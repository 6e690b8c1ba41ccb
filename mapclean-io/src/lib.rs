//! I/O operations for point clouds
//!
//! Loads and saves the clouds filtered by mapclean. PLY (ASCII or binary on
//! input, ASCII on output) is the supported format; every vertex property is
//! carried through so extra columns survive a load/filter/save cycle.

pub mod ply;

pub use ply::{PlyCloud, PlyProperty, PlyReader, PlyScalar, PlyWriter};

use mapclean_core::{Error, Point3d, PointCloud, Result};
use std::path::Path;

/// Trait for reading point clouds from files
pub trait PointCloudReader {
    fn read_point_cloud<P: AsRef<Path>>(path: P) -> Result<PointCloud<Point3d>>;
}

/// Trait for writing point clouds to files
pub trait PointCloudWriter {
    fn write_point_cloud<P: AsRef<Path>>(cloud: &PointCloud<Point3d>, path: P) -> Result<()>;
}

fn check_extension(path: &Path) -> Result<()> {
    match path.extension().and_then(|s| s.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("ply") => Ok(()),
        other => Err(Error::UnsupportedFormat(format!(
            "Unsupported point cloud format: {:?}",
            other
        ))),
    }
}

/// Auto-detect format and read xyz positions
pub fn read_point_cloud<P: AsRef<Path>>(path: P) -> Result<PointCloud<Point3d>> {
    let path = path.as_ref();
    check_extension(path)?;
    PlyReader::read_point_cloud(path)
}

/// Auto-detect format and read full records
pub fn read_records<P: AsRef<Path>>(path: P) -> Result<PlyCloud> {
    let path = path.as_ref();
    check_extension(path)?;
    PlyReader::read_records(path)
}

/// Auto-detect format and write full records
pub fn write_records<P: AsRef<Path>>(data: &PlyCloud, path: P) -> Result<()> {
    let path = path.as_ref();
    check_extension(path)?;
    PlyWriter::write_records(data, path)
}
