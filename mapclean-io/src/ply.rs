//! PLY format support

use crate::{PointCloudReader, PointCloudWriter};
use log::debug;
use mapclean_core::{Error, Point3d, PointCloud, PointRecord, Result};
use ply_rs::{
    parser::Parser,
    ply::{
        Addable, DefaultElement, ElementDef, Ply, Property, PropertyDef, PropertyType, ScalarType,
    },
    writer::Writer,
};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

const VERTEX: &str = "vertex";

/// Scalar storage type of a PLY property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlyScalar {
    Char,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Float,
    Double,
}

impl PlyScalar {
    fn from_ply(ty: &ScalarType) -> Self {
        match ty {
            ScalarType::Char => Self::Char,
            ScalarType::UChar => Self::UChar,
            ScalarType::Short => Self::Short,
            ScalarType::UShort => Self::UShort,
            ScalarType::Int => Self::Int,
            ScalarType::UInt => Self::UInt,
            ScalarType::Float => Self::Float,
            ScalarType::Double => Self::Double,
        }
    }

    fn to_ply(self) -> ScalarType {
        match self {
            Self::Char => ScalarType::Char,
            Self::UChar => ScalarType::UChar,
            Self::Short => ScalarType::Short,
            Self::UShort => ScalarType::UShort,
            Self::Int => ScalarType::Int,
            Self::UInt => ScalarType::UInt,
            Self::Float => ScalarType::Float,
            Self::Double => ScalarType::Double,
        }
    }

    /// Convert a stored value back to this type.
    ///
    /// Values read from a property of the same type come back unchanged.
    /// Anything else is rounded and saturated for integer types.
    fn to_property(self, value: f64) -> Property {
        match self {
            Self::Char => Property::Char(value.round() as i8),
            Self::UChar => Property::UChar(value.round() as u8),
            Self::Short => Property::Short(value.round() as i16),
            Self::UShort => Property::UShort(value.round() as u16),
            Self::Int => Property::Int(value.round() as i32),
            Self::UInt => Property::UInt(value.round() as u32),
            Self::Float => Property::Float(value as f32),
            Self::Double => Property::Double(value),
        }
    }
}

/// A named vertex property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlyProperty {
    pub name: String,
    pub scalar: PlyScalar,
}

impl PlyProperty {
    pub fn new(name: impl Into<String>, scalar: PlyScalar) -> Self {
        Self {
            name: name.into(),
            scalar,
        }
    }

    /// The x, y, z float properties every cloud starts with
    pub fn xyz() -> Vec<Self> {
        Self::xyz_as(PlyScalar::Float)
    }

    /// x, y, z properties stored as `scalar`
    pub fn xyz_as(scalar: PlyScalar) -> Vec<Self> {
        ["x", "y", "z"]
            .into_iter()
            .map(|name| Self::new(name, scalar))
            .collect()
    }
}

/// Vertex records together with the property layout they were read with
#[derive(Debug, Clone, PartialEq)]
pub struct PlyCloud {
    pub properties: Vec<PlyProperty>,
    pub cloud: PointCloud<PointRecord>,
}

impl PlyCloud {
    /// Pair records with a property layout, checking that they agree
    pub fn new(properties: Vec<PlyProperty>, cloud: PointCloud<PointRecord>) -> Result<Self> {
        check_xyz_prefix(properties.iter().map(|p| p.name.as_str()))?;
        let dimension = cloud.validate_dimension()?;
        if !cloud.is_empty() && dimension != properties.len() {
            return Err(Error::DimensionMismatch {
                index: 0,
                expected: properties.len(),
                found: dimension,
            });
        }
        Ok(Self { properties, cloud })
    }

    /// Same layout, different records (e.g. after filtering)
    pub fn with_cloud(&self, cloud: PointCloud<PointRecord>) -> Result<Self> {
        Self::new(self.properties.clone(), cloud)
    }
}

pub struct PlyReader;
pub struct PlyWriter;

impl PlyReader {
    /// Read every scalar vertex property, in header order
    pub fn read_records<P: AsRef<Path>>(path: P) -> Result<PlyCloud> {
        let file = File::open(path.as_ref())?;
        let mut reader = BufReader::new(file);
        let cloud = Self::read_records_from(&mut reader)?;
        debug!(
            "read {} vertices with {} properties from {}",
            cloud.cloud.len(),
            cloud.properties.len(),
            path.as_ref().display()
        );
        Ok(cloud)
    }

    /// Same as [`read_records`](Self::read_records) for any buffered source
    pub fn read_records_from<R: BufRead>(reader: &mut R) -> Result<PlyCloud> {
        let parser = Parser::<DefaultElement>::new();
        let ply = parser.read_ply(reader)?;

        let Some(vertex_def) = ply.header.elements.get(VERTEX) else {
            return PlyCloud::new(PlyProperty::xyz(), PointCloud::new());
        };

        let mut properties = Vec::with_capacity(vertex_def.properties.len());
        for def in vertex_def.properties.values() {
            match &def.data_type {
                PropertyType::Scalar(ty) => {
                    properties.push(PlyProperty::new(def.name.clone(), PlyScalar::from_ply(ty)))
                }
                PropertyType::List(_, _) => {
                    return Err(Error::InvalidData(format!(
                        "list property '{}' on vertex element is not supported",
                        def.name
                    )))
                }
            }
        }
        check_xyz_prefix(properties.iter().map(|p| p.name.as_str()))?;

        let vertices = ply.payload.get(VERTEX).map(Vec::as_slice).unwrap_or(&[]);
        let mut cloud = PointCloud::with_capacity(vertices.len());
        for vertex in vertices {
            let values = properties
                .iter()
                .map(|prop| extract_property_value(vertex, &prop.name))
                .collect::<Result<Vec<f64>>>()?;
            cloud.push(PointRecord::new(values));
        }

        PlyCloud::new(properties, cloud)
    }
}

impl PlyWriter {
    /// Write records as ASCII PLY with their original property layout
    pub fn write_records<P: AsRef<Path>>(data: &PlyCloud, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        Self::write_records_to(data, &mut writer)?;
        writer.flush()?;
        debug!(
            "wrote {} vertices to {}",
            data.cloud.len(),
            path.as_ref().display()
        );
        Ok(())
    }

    /// Same as [`write_records`](Self::write_records) for any sink
    pub fn write_records_to<W: Write>(data: &PlyCloud, writer: &mut W) -> Result<()> {
        // Header::new() defaults to ASCII encoding
        let mut ply = Ply::<DefaultElement>::new();

        let mut vertex_element = ElementDef::new(VERTEX.to_string());
        vertex_element.count = data.cloud.len();
        for prop in &data.properties {
            vertex_element.properties.add(PropertyDef::new(
                prop.name.clone(),
                PropertyType::Scalar(prop.scalar.to_ply()),
            ));
        }
        ply.header.elements.add(vertex_element);

        let mut vertices = Vec::with_capacity(data.cloud.len());
        for record in &data.cloud {
            let mut vertex = DefaultElement::new();
            for (prop, &value) in data.properties.iter().zip(&record.values) {
                vertex.insert(prop.name.clone(), prop.scalar.to_property(value));
            }
            vertices.push(vertex);
        }
        ply.payload.insert(VERTEX.to_string(), vertices);

        Writer::new().write_ply(writer, &mut ply)?;
        Ok(())
    }
}

impl PointCloudReader for PlyReader {
    fn read_point_cloud<P: AsRef<Path>>(path: P) -> Result<PointCloud<Point3d>> {
        let data = Self::read_records(path)?;
        Ok(data.cloud.positions().into_iter().collect())
    }
}

impl PointCloudWriter for PlyWriter {
    fn write_point_cloud<P: AsRef<Path>>(cloud: &PointCloud<Point3d>, path: P) -> Result<()> {
        let records = cloud
            .iter()
            .map(|p| PointRecord::new(vec![p.x, p.y, p.z]))
            .collect();
        Self::write_records(&PlyCloud::new(PlyProperty::xyz_as(PlyScalar::Double), records)?, path)
    }
}

fn check_xyz_prefix<'a>(mut names: impl Iterator<Item = &'a str>) -> Result<()> {
    for expected in ["x", "y", "z"] {
        match names.next() {
            Some(name) if name == expected => {}
            found => {
                return Err(Error::InvalidData(format!(
                    "vertex properties must start with x, y, z; expected '{}', found {:?}",
                    expected, found
                )))
            }
        }
    }
    Ok(())
}

/// Extract a property value from a PLY element, widened losslessly to f64
fn extract_property_value(element: &DefaultElement, name: &str) -> Result<f64> {
    match element.get(name) {
        Some(Property::Char(val)) => Ok(f64::from(*val)),
        Some(Property::UChar(val)) => Ok(f64::from(*val)),
        Some(Property::Short(val)) => Ok(f64::from(*val)),
        Some(Property::UShort(val)) => Ok(f64::from(*val)),
        Some(Property::Int(val)) => Ok(f64::from(*val)),
        Some(Property::UInt(val)) => Ok(f64::from(*val)),
        Some(Property::Float(val)) => Ok(f64::from(*val)),
        Some(Property::Double(val)) => Ok(*val),
        _ => Err(Error::InvalidData(format!(
            "Property '{}' not found or invalid type",
            name
        ))),
    }
}
