//! Readers for AFLR3 unstructured grid files
//!
//! Both variants share one record layout:
//!
//! | Record      | Count     | Content                                   |
//! | ----------- | --------- | ----------------------------------------- |
//! | header      | 1         | nnodes ntri nquad ntet npyr nprz nhex     |
//! | nodes       | nnodes    | x y z                                     |
//! | triangles   | ntri      | 3 node ids, 1-based                       |
//! | quads       | nquad     | 4 node ids, 1-based                       |
//!
//! Anything after the surface quads (surface ids, volume elements) is not
//! needed for the 2D mesh and is never read. The `.ugrid` variant is ASCII,
//! the legacy `.ug` variant is little-endian binary with `i32` integers and
//! `f64` coordinates.

// internal modules
use crate::grid::{Connectivity, MeshFormat, Nodes};
use crate::readers::{expect_path, parsers, FormatPopulator, Population, PopulatorInput};
use crate::utils::f;

// standard library
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

// external crates
use anyhow::{anyhow, bail, Context, Result};
use bincode::deserialize_from;
use kdam::{Bar, BarBuilder, BarExt};
use log::{debug, trace};
use serde::Deserialize;

/// Element counts from the header record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UGridCounts {
    pub nodes: usize,
    pub triangles: usize,
    pub quads: usize,
    pub tetrahedra: usize,
    pub pyramids: usize,
    pub prisms: usize,
    pub hexahedra: usize,
}

impl From<[usize; 7]> for UGridCounts {
    fn from(c: [usize; 7]) -> Self {
        Self {
            nodes: c[0],
            triangles: c[1],
            quads: c[2],
            tetrahedra: c[3],
            pyramids: c[4],
            prisms: c[5],
            hexahedra: c[6],
        }
    }
}

impl UGridCounts {
    fn log(&self) {
        debug!(
            "{} nodes, {} triangles, {} quads",
            self.nodes, self.triangles, self.quads
        );
        trace!(
            "Volume elements not read: {} tet, {} pyr, {} prz, {} hex",
            self.tetrahedra,
            self.pyramids,
            self.prisms,
            self.hexahedra
        );
    }

    /// Records that make up the 2D mesh
    fn surface_records(&self) -> Result<usize> {
        self.nodes
            .checked_add(self.triangles)
            .and_then(|n| n.checked_add(self.quads))
            .ok_or_else(|| anyhow!("Header counts overflow: {self:?}"))
    }
}

/// A reader for ASCII AFLR3 `.ugrid` files
///
/// Example:
/// ```ignore
///     let mut reader = UGridReader::new();
///     reader.disable_progress();
///     let population = reader.parse(Path::new("mesh.ugrid"))?;
/// ```
#[derive(Debug, Default)]
pub struct UGridReader {
    /// Disable progress bar?
    disable_progress: bool,
}

impl UGridReader {
    /// Just calls Default::default(), nothing special to be initialised
    pub fn new() -> Self {
        Default::default()
    }

    /// Do not print the tqdm progress indicators
    pub fn disable_progress(&mut self) {
        debug!("Progress bar disabled");
        self.disable_progress = true;
    }

    /// Read the surface mesh from a `.ugrid` file
    pub fn parse(&self, path: &Path) -> Result<Population> {
        let text = std::fs::read_to_string(path)
            .with_context(|| f!("Could not read {}", path.display()))?;

        let (header, body) = text.split_once('\n').unwrap_or((text.as_str(), ""));
        let (_, counts) = parsers::ugrid_header(header)
            .map_err(|_| anyhow!("Failed to parse ugrid header from:\n \"{header}\""))?;
        let counts = UGridCounts::from(counts);
        counts.log();

        let mut progress_bar = self.init_progress_bar(counts.surface_records()?)?;
        let mut tokens = body.split_whitespace();

        // a node record is at least "x y z", so the body bounds the real count
        let capacity = counts.nodes.min(body.len() / 6);
        let mut nodes = Nodes::with_z(
            Vec::with_capacity(capacity),
            Vec::with_capacity(capacity),
            Vec::with_capacity(capacity),
        );
        for _ in 0..counts.nodes {
            let [x, y, z] = next_values::<3, f64>(&mut tokens, "node")?;
            nodes.push(x, y, Some(z));
            progress_bar.update(1)?;
        }

        let mut face_nodes = Connectivity::new();
        for (n, size) in [(counts.triangles, 3), (counts.quads, 4)] {
            for _ in 0..n {
                let ids = match size {
                    3 => next_values::<3, i64>(&mut tokens, "triangle")?.to_vec(),
                    _ => next_values::<4, i64>(&mut tokens, "quad")?.to_vec(),
                };
                face_nodes.push_row(to_indices(&ids, counts.nodes)?);
                progress_bar.update(1)?;
            }
        }
        progress_bar.refresh()?;

        Ok(Population {
            nodes,
            face_nodes,
            topology: None,
        })
    }

    fn init_progress_bar(&self, total: usize) -> Result<Bar> {
        BarBuilder::default()
            .total(total)
            .delay(0.0)
            .unit(" records")
            .unit_scale(true)
            .disable(self.disable_progress)
            .build()
            .map_err(|e| anyhow!(e))
    }
}

impl FormatPopulator for UGridReader {
    fn format(&self) -> MeshFormat {
        MeshFormat::UGrid
    }

    fn populate(&self, input: PopulatorInput) -> Result<Population> {
        self.parse(expect_path(input, self.format())?)
    }
}

/// A reader for the legacy binary `.ug` files
#[derive(Debug, Default)]
pub struct UGridLegacyReader {}

impl UGridLegacyReader {
    /// Just calls Default::default(), nothing special to be initialised
    pub fn new() -> Self {
        Default::default()
    }

    /// Read the surface mesh from a `.ug` file
    pub fn parse(&self, path: &Path) -> Result<Population> {
        let mut reader = Self::init_reader(path)?;

        let header: [i32; 7] = deserialize_from(&mut reader).context("Failed to read header")?;
        let counts: [usize; 7] = header
            .iter()
            .map(|&c| usize::try_from(c).map_err(|_| anyhow!("Negative count {c} in header")))
            .collect::<Result<Vec<usize>>>()?
            .try_into()
            .map_err(|_| anyhow!("Header must have 7 counts"))?;
        let counts = UGridCounts::from(counts);
        counts.log();

        let mut nodes = Nodes::with_z(Vec::new(), Vec::new(), Vec::new());
        for i in 0..counts.nodes {
            let [x, y, z] = read_record::<[f64; 3], _>(&mut reader, "node", i)?;
            nodes.push(x, y, Some(z));
        }

        let mut face_nodes = Connectivity::new();
        for i in 0..counts.triangles {
            let ids = read_record::<[i32; 3], _>(&mut reader, "triangle", i)?;
            face_nodes.push_row(to_indices(&ids.map(i64::from), counts.nodes)?);
        }
        for i in 0..counts.quads {
            let ids = read_record::<[i32; 4], _>(&mut reader, "quad", i)?;
            face_nodes.push_row(to_indices(&ids.map(i64::from), counts.nodes)?);
        }

        Ok(Population {
            nodes,
            face_nodes,
            topology: None,
        })
    }

    fn init_reader(path: &Path) -> Result<BufReader<File>> {
        let file = File::open(path).with_context(|| f!("Could not open {}", path.display()))?;
        Ok(BufReader::new(file))
    }
}

impl FormatPopulator for UGridLegacyReader {
    fn format(&self) -> MeshFormat {
        MeshFormat::UGridLegacy
    }

    fn populate(&self, input: PopulatorInput) -> Result<Population> {
        self.parse(expect_path(input, self.format())?)
    }
}

/// Deserialise one fixed-size binary record
fn read_record<T, R>(reader: &mut R, what: &str, index: usize) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
    R: Read,
{
    deserialize_from(reader).with_context(|| f!("Failed to read {what} {index}"))
}

/// Parse the next `N` whitespace separated values
fn next_values<'a, const N: usize, T: std::str::FromStr>(
    tokens: &mut impl Iterator<Item = &'a str>,
    what: &str,
) -> Result<[T; N]> {
    let mut values = Vec::with_capacity(N);
    for _ in 0..N {
        let Some(token) = tokens.next() else {
            bail!("Unexpected end of file reading {what} record");
        };
        match token.parse::<T>() {
            Ok(v) => values.push(v),
            Err(_) => bail!("Bad value \"{token}\" in {what} record"),
        }
    }
    values
        .try_into()
        .map_err(|_| anyhow!("Expected {N} values for {what} record"))
}

/// Convert 1-based node ids, checking they exist
fn to_indices(ids: &[i64], n_nodes: usize) -> Result<Vec<usize>> {
    ids.iter()
        .map(|&id| match usize::try_from(id) {
            Ok(id) if (1..=n_nodes).contains(&id) => Ok(id - 1),
            _ => bail!("Node id {id} outside 1..={n_nodes}"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_ugrid() {
        let mut reader = UGridReader::new();
        reader.disable_progress();
        let population = reader.parse(Path::new("./data/mesh.ugrid")).unwrap();
        assert_eq!(population.nodes.len(), 6);
        assert_eq!(population.nodes.dimension(), 3);
        assert_eq!(population.face_nodes.len(), 3);
        assert_eq!(population.face_nodes.row(0), &[0, 1, 4]);
        assert_eq!(population.face_nodes.row(2), &[1, 2, 3, 4]);
    }

    #[test]
    fn legacy_ug() {
        let population = UGridLegacyReader::new()
            .parse(Path::new("./data/legacy.ug"))
            .unwrap();
        assert_eq!(population.nodes.len(), 4);
        assert_eq!(population.nodes.x, vec![0.0, 1.0, 1.0, 0.0]);
        assert_eq!(population.face_nodes.len(), 2);
        assert_eq!(population.face_nodes.row(1), &[0, 2, 3]);
    }

    #[test]
    fn values_and_indices() {
        let mut tokens = "1 2.5 x".split_whitespace();
        assert_eq!(next_values::<2, f64>(&mut tokens, "node").unwrap(), [1.0, 2.5]);
        assert!(next_values::<1, f64>(&mut tokens, "node").is_err());
        assert!(next_values::<1, f64>(&mut tokens, "node").is_err());

        assert_eq!(to_indices(&[1, 3], 3).unwrap(), vec![0, 2]);
        assert!(to_indices(&[0], 3).is_err());
        assert!(to_indices(&[4], 3).is_err());
    }

    #[test]
    fn huge_header_counts() {
        let path = std::env::temp_dir().join(f!("uxgrid_{}_huge.ugrid", std::process::id()));
        std::fs::write(&path, "4000000000000000000 0 0 0 0 0 0\n0 0 0\n").unwrap();
        let mut reader = UGridReader::new();
        reader.disable_progress();
        let result = reader.parse(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(result.is_err());

        let counts = UGridCounts::from([usize::MAX, 1, 0, 0, 0, 0, 0]);
        assert!(counts.surface_records().is_err());
        let counts = UGridCounts::from([4, 1, 2, 0, 0, 0, 0]);
        assert_eq!(counts.surface_records().unwrap(), 7);
    }

    #[test]
    fn dataset_input_is_rejected() {
        let dataset = crate::dataset::Dataset::new("not a path");
        let input = PopulatorInput::Dataset(&dataset);
        assert!(UGridLegacyReader::new().populate(input).is_err());
    }
}
