//! Reader for ESRI shapefile geometry
//!
//! Only the main `.shp` file is needed for the mesh. Its 100-byte header and
//! the record headers are big-endian while everything else is little-endian,
//! which is a bincode configuration choice either way.
//!
//! | Shape type                | Canonical mesh                          |
//! | ------------------------- | --------------------------------------- |
//! | Point, MultiPoint         | nodes                                   |
//! | PolyLine                  | nodes only                              |
//! | Polygon                   | nodes, one face per ring                |
//!
//! The Z and M variants of each are read the same way, with z kept when
//! present. Coordinates shared between shapes become a single node.

// internal modules
use crate::grid::{Connectivity, MeshFormat, Nodes};
use crate::readers::{expect_path, FormatPopulator, Population, PopulatorInput};
use crate::utils::f;

// standard library
use std::collections::HashMap;
use std::path::Path;

// external crates
use anyhow::{bail, Context, Result};
use bincode::Options;
use itertools::Itertools;
use log::{debug, trace, warn};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Magic number at the start of every shapefile
const FILE_CODE: i32 = 9994;

/// Big-endian part of the main file header
#[derive(Debug, Deserialize)]
struct FileHeader {
    file_code: i32,
    _unused: [i32; 5],
    /// In 16-bit words, including the header
    file_length: i32,
}

/// Little-endian part of the main file header
#[derive(Debug, Deserialize)]
struct ShapeHeader {
    version: i32,
    shape_type: i32,
    _bounding_box: [f64; 8],
}

/// Big-endian header of each record
#[derive(Debug, Deserialize)]
struct RecordHeader {
    number: i32,
    /// In 16-bit words
    content_length: i32,
}

/// Geometry families, ignoring the Z/M distinction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Null,
    Point,
    MultiPoint,
    PolyLine,
    Polygon,
}

/// Family of a shape type code, and whether it carries z values
fn shape_kind(shape_type: i32) -> Option<(Shape, bool)> {
    let kind = match shape_type {
        0 => (Shape::Null, false),
        1 | 21 => (Shape::Point, false),
        11 => (Shape::Point, true),
        3 | 23 => (Shape::PolyLine, false),
        13 => (Shape::PolyLine, true),
        5 | 25 => (Shape::Polygon, false),
        15 => (Shape::Polygon, true),
        8 | 28 => (Shape::MultiPoint, false),
        18 => (Shape::MultiPoint, true),
        _ => return None,
    };
    Some(kind)
}

/// A reader for the main file of an ESRI shapefile
///
/// Example:
/// ```ignore
///     let reader = ShapefileReader::new();
///     let population = reader.parse(Path::new("coast.shp"))?;
/// ```
#[derive(Debug, Default)]
pub struct ShapefileReader {}

impl ShapefileReader {
    /// Just calls Default::default(), nothing special to be initialised
    pub fn new() -> Self {
        Default::default()
    }

    pub fn parse(&self, path: &Path) -> Result<Population> {
        let bytes = std::fs::read(path).with_context(|| f!("Could not read {}", path.display()))?;
        let mut cursor: &[u8] = &bytes;

        let header: FileHeader = read_be(&mut cursor).context("Failed to read file header")?;
        if header.file_code != FILE_CODE {
            bail!(
                "Expected file code {FILE_CODE}, found {}",
                header.file_code
            );
        }
        let shape_header: ShapeHeader = read_le(&mut cursor)?;
        debug!(
            "Shapefile version {}, shape type {}, {} bytes",
            shape_header.version,
            shape_header.shape_type,
            2 * header.file_length
        );

        let Some((shape, has_z)) = shape_kind(shape_header.shape_type) else {
            bail!("Unsupported shape type {}", shape_header.shape_type);
        };
        let mut builder = MeshBuilder::new(shape, has_z);

        while !cursor.is_empty() {
            let record: RecordHeader = read_be(&mut cursor).context("Failed to read record header")?;
            let length = 2 * usize::try_from(record.content_length)?;
            if length > cursor.len() {
                bail!("Record {} runs past the end of the file", record.number);
            }
            let (content, rest) = cursor.split_at(length);
            cursor = rest;
            builder
                .record(content)
                .with_context(|| f!("Failed to read record {}", record.number))?;
        }

        Ok(builder.finish())
    }
}

impl FormatPopulator for ShapefileReader {
    fn format(&self) -> MeshFormat {
        MeshFormat::Shapefile
    }

    fn populate(&self, input: PopulatorInput) -> Result<Population> {
        self.parse(expect_path(input, self.format())?)
    }
}

/// Collects unique nodes and polygon rings across all records
///
/// Every non-null record must match the shape type of the file header.
struct MeshBuilder {
    shape: Shape,
    has_z: bool,
    nodes: Nodes,
    face_nodes: Connectivity,
    lookup: HashMap<[u64; 3], usize>,
}

impl MeshBuilder {
    fn new(shape: Shape, has_z: bool) -> Self {
        let nodes = match has_z {
            true => Nodes::with_z(Vec::new(), Vec::new(), Vec::new()),
            false => Nodes::default(),
        };
        Self {
            shape,
            has_z,
            nodes,
            face_nodes: Connectivity::new(),
            lookup: HashMap::new(),
        }
    }

    /// Index of the node at these coordinates, adding it if new
    fn node(&mut self, x: f64, y: f64, z: Option<f64>) -> usize {
        let key = [x.to_bits(), y.to_bits(), z.unwrap_or(0.0).to_bits()];
        let nodes = &mut self.nodes;
        *self.lookup.entry(key).or_insert_with(|| {
            nodes.push(x, y, z);
            nodes.len() - 1
        })
    }

    fn record(&mut self, mut content: &[u8]) -> Result<()> {
        let shape_type: i32 = read_le(&mut content)?;
        let Some((shape, has_z)) = shape_kind(shape_type) else {
            bail!("Unsupported shape type {shape_type}");
        };
        trace!("{shape:?} record");
        if shape != Shape::Null && (shape, has_z) != (self.shape, self.has_z) {
            bail!(
                "Shape type {shape_type} does not match the file, expected {:?}{}",
                self.shape,
                if self.has_z { " with z" } else { "" }
            );
        }

        match shape {
            Shape::Null => {}
            Shape::Point => {
                let [x, y]: [f64; 2] = read_le(&mut content)?;
                let z = match has_z {
                    true => Some(read_le::<f64>(&mut content)?),
                    false => None,
                };
                self.node(x, y, z);
            }
            Shape::MultiPoint => {
                let _bounding_box: [f64; 4] = read_le(&mut content)?;
                let n_points = read_count(&mut content)?;
                let points = read_points(&mut content, n_points, has_z)?;
                for (x, y, z) in points {
                    self.node(x, y, z);
                }
            }
            Shape::PolyLine | Shape::Polygon => {
                let _bounding_box: [f64; 4] = read_le(&mut content)?;
                let n_parts = read_count(&mut content)?;
                let n_points = read_count(&mut content)?;
                let mut parts = (0..n_parts)
                    .map(|_| read_count(&mut content))
                    .collect::<Result<Vec<usize>>>()?;
                parts.push(n_points);
                let points = read_points(&mut content, n_points, has_z)?;
                let ids = points
                    .into_iter()
                    .map(|(x, y, z)| self.node(x, y, z))
                    .collect::<Vec<usize>>();

                if shape == Shape::Polygon {
                    for (start, end) in parts.iter().tuple_windows() {
                        let ring = ids.get(*start..*end).context("Bad part index")?;
                        self.ring(ring);
                    }
                }
            }
        }
        Ok(())
    }

    /// Add a polygon ring as a face, without the closing vertex
    fn ring(&mut self, ring: &[usize]) {
        let mut row: Vec<usize> = ring.iter().copied().dedup().collect();
        if row.len() > 1 && row.first() == row.last() {
            row.pop();
        }
        match row.len() {
            0..=2 => warn!("Skipping degenerate ring of {} nodes", row.len()),
            _ => self.face_nodes.push_row(row),
        }
    }

    fn finish(self) -> Population {
        debug!(
            "{} unique nodes, {} faces",
            self.nodes.len(),
            self.face_nodes.len()
        );
        Population {
            nodes: self.nodes,
            face_nodes: self.face_nodes,
            topology: None,
        }
    }
}

/// Read a big-endian value and advance the cursor
fn read_be<T: DeserializeOwned>(cursor: &mut &[u8]) -> Result<T> {
    let options = bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_big_endian();
    Ok(options.deserialize_from(cursor)?)
}

/// Read a little-endian value and advance the cursor
fn read_le<T: DeserializeOwned>(cursor: &mut &[u8]) -> Result<T> {
    Ok(bincode::deserialize_from(cursor)?)
}

fn read_count(cursor: &mut &[u8]) -> Result<usize> {
    let count: i32 = read_le(cursor)?;
    usize::try_from(count).with_context(|| f!("Negative count {count}"))
}

/// Points followed by the z range and values when present
fn read_points(
    cursor: &mut &[u8],
    n_points: usize,
    has_z: bool,
) -> Result<Vec<(f64, f64, Option<f64>)>> {
    let xy = (0..n_points)
        .map(|_| read_le::<[f64; 2]>(cursor))
        .collect::<Result<Vec<[f64; 2]>>>()?;

    if !has_z {
        return Ok(xy.into_iter().map(|[x, y]| (x, y, None)).collect());
    }

    let _z_range: [f64; 2] = read_le(cursor)?;
    xy.into_iter()
        .map(|[x, y]| Ok((x, y, Some(read_le::<f64>(cursor)?))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polygons_share_nodes() {
        let population = ShapefileReader::new()
            .parse(Path::new("./data/squares.shp"))
            .unwrap();
        assert_eq!(population.nodes.len(), 6);
        assert_eq!(population.face_nodes.len(), 2);
        assert_eq!(population.face_nodes.max_row_len(), 4);
        assert!(population.nodes.z.is_none());
    }

    #[test]
    fn ring_closing_vertex_dropped() {
        let mut builder = MeshBuilder::new(Shape::Polygon, false);
        builder.ring(&[0, 1, 2, 3, 0]);
        builder.ring(&[4, 4, 5]);
        let population = builder.finish();
        assert_eq!(population.face_nodes.len(), 1);
        assert_eq!(population.face_nodes.row(0), &[0, 1, 2, 3]);
    }

    #[test]
    fn point_records() {
        let mut builder = MeshBuilder::new(Shape::Point, false);
        let mut content = 1i32.to_le_bytes().to_vec();
        content.extend(2.0f64.to_le_bytes());
        content.extend(3.0f64.to_le_bytes());
        builder.record(&content).unwrap();
        builder.record(&content).unwrap();
        let population = builder.finish();
        assert_eq!(population.nodes.x, vec![2.0]);
        assert_eq!(population.nodes.y, vec![3.0]);
    }

    #[test]
    fn records_must_match_the_file() {
        let mut point = 1i32.to_le_bytes().to_vec();
        point.extend(2.0f64.to_le_bytes());
        point.extend(3.0f64.to_le_bytes());

        // a plain point in a PointZ file would leave z short
        let mut builder = MeshBuilder::new(Shape::Point, true);
        assert!(builder.record(&point).is_err());

        let mut builder = MeshBuilder::new(Shape::Polygon, false);
        assert!(builder.record(&point).is_err());

        // null records are allowed anywhere
        assert!(builder.record(&0i32.to_le_bytes()).is_ok());
        assert!(builder.finish().nodes.is_empty());
    }

    #[test]
    fn unknown_shape_type() {
        assert!(shape_kind(31).is_none());
        let mut builder = MeshBuilder::new(Shape::Point, false);
        assert!(builder.record(&31i32.to_le_bytes()).is_err());
    }
}
