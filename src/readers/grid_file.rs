//! Construction of a [Grid] from any source
//!
//! Ties detection, population and promotion to the native convention
//! together.

// internal modules
use crate::dataset::{DataType, Dataset, Values, Variable};
use crate::error::GridError;
use crate::grid::{Grid, GridSource, MeshFormat, MeshTopology, TOPOLOGY_VARIABLE};
use crate::readers::{classify, populator_for, Population, PopulatorInput, ProbeResolution};
use crate::utils::f;

// standard library
use std::path::Path;

// external crates
use anyhow::{Context, Result};
use log::{debug, info};

/// Fill value of the native face connectivity padding
const FACE_FILL: i64 = -1;

/// A configurable reader for grids of any supported convention
///
/// The reader operates in three stages:
///     - Classify the file from its marker variables or extension
///     - Hand the dataset or path to the populator for that convention
///     - Promote foreign datasets to the native `Mesh2` variables
///
/// Example:
/// ```rust
/// # use uxgrid::readers::{GridReader, ProbeResolution};
/// # use uxgrid::grid::MeshFormat;
/// let mut reader = GridReader::new();
/// reader.set_resolution(ProbeResolution::FirstMatch);
/// reader.disable_progress();
///
/// let grid = reader.open("./data/mixed_markers.cdl").unwrap();
/// assert_eq!(grid.format(), MeshFormat::Exodus1);
/// ```
#[derive(Debug, Default)]
pub struct GridReader {
    /// How datasets matching several markers are settled
    resolution: ProbeResolution,
    /// Disable progress bar?
    disable_progress: bool,
}

impl GridReader {
    /// Just calls Default::default(), nothing special to be initialised
    pub fn new() -> Self {
        Default::default()
    }

    /// Setter for the probe resolution policy
    pub fn set_resolution(&mut self, resolution: ProbeResolution) {
        self.resolution = resolution;
    }

    /// Do not print the tqdm progress indicators
    pub fn disable_progress(&mut self) {
        debug!("Progress bar disabled");
        self.disable_progress = true;
    }

    /// Read a grid file
    pub fn open<P: AsRef<Path>>(&self, path: P) -> Result<Grid> {
        self.read(GridSource::from(path.as_ref()))
    }

    /// Construct a grid from any source
    ///
    /// Vertex and spec sources are only recorded, and keep the `Unknown`
    /// format with no mesh fields set.
    pub fn read(&self, source: GridSource) -> Result<Grid> {
        let path = match &source {
            GridSource::FilePath(path) => path.clone(),
            GridSource::Vertices(v) => {
                debug!("Recorded {} vertices, faces are not derived", v.len());
                return Ok(Grid::empty(source));
            }
            GridSource::Spec(s) => {
                debug!("Recorded grid spec \"{s}\"");
                return Ok(Grid::empty(source));
            }
        };

        let classification = classify(&path, self.resolution)?;
        let format = classification.format;
        let mut dataset = classification.dataset;
        info!("Reading {} as {format}", path.display());

        // exodus carries no topology attributes of its own, and any native
        // block alongside it describes a different mesh
        if format == MeshFormat::Exodus2 {
            if let Some(dataset) = &mut dataset {
                if dataset.has_variable(TOPOLOGY_VARIABLE) {
                    debug!("Replacing the existing {TOPOLOGY_VARIABLE} topology");
                }
                debug!("Seeding {TOPOLOGY_VARIABLE} topology for exodus2");
                dataset.insert_variable(MeshTopology::default().to_variable());
            }
        }

        let populator = populator_for(format, !self.disable_progress)
            .ok_or_else(|| GridError::UnsupportedFormat(path.display().to_string()))?;
        debug!("Dispatching to the {} populator", populator.format());

        let input = match &dataset {
            Some(dataset) => PopulatorInput::Dataset(dataset),
            None => PopulatorInput::Path(&path),
        };
        let mut population = populator
            .populate(input)
            .with_context(|| f!("Failed to read {format} grid from {}", path.display()))?;

        if let Some(dataset) = &mut dataset {
            if format != MeshFormat::UXNative {
                promote_to_native(dataset, &mut population);
            }
        }

        let mut grid = Grid::empty(source);
        grid.format = format;
        grid.dataset = dataset;
        grid.nodes = Some(population.nodes);
        grid.face_nodes = Some(population.face_nodes);
        grid.topology = population.topology;
        debug!("Populated {} nodes and {} faces", grid.n_nodes(), grid.n_faces());
        Ok(grid)
    }
}

/// Add the native node, face and topology variables to a foreign dataset
///
/// Faces are padded to the longest row with -1. The topology keeps any
/// values already seeded, otherwise the sentinel defaults are used.
fn promote_to_native(dataset: &mut Dataset, population: &mut Population) {
    let topology = population.topology.get_or_insert_with(MeshTopology::default);
    let nodes = &population.nodes;
    let faces = &population.face_nodes;

    let node_dim = topology.node_dimension.clone();
    let face_dim = topology.face_dimension.clone();
    let max_dim = "nMaxMesh2_face_nodes";
    dataset.add_dimension(&node_dim, nodes.len());
    dataset.add_dimension(&face_dim, faces.len());
    dataset.add_dimension(max_dim, faces.max_row_len());

    let names = ["Mesh2_node_x", "Mesh2_node_y", "Mesh2_node_z"];
    let axes = [Some(&nodes.x), Some(&nodes.y), nodes.z.as_ref()];
    for (name, axis) in names.iter().zip(axes) {
        let Some(axis) = axis else {
            // a stale axis would no longer match the node dimension
            dataset.remove_variable(name);
            continue;
        };
        dataset.insert_variable(Variable::new(
            name,
            DataType::Double,
            &[node_dim.as_str()],
            Values::Double(axis.clone()),
        ));
    }

    let width = faces.max_row_len();
    let mut padded = Vec::with_capacity(faces.len() * width);
    for row in faces.rows() {
        padded.extend(row.iter().map(|&n| n as i64));
        padded.extend(std::iter::repeat(FACE_FILL).take(width - row.len()));
    }
    dataset.insert_variable(
        Variable::new(
            &topology.face_node_connectivity,
            DataType::Int,
            &[face_dim.as_str(), max_dim],
            Values::Integer(padded),
        )
        .with_attribute("_FillValue", Values::Integer(vec![FACE_FILL]))
        .with_attribute("start_index", Values::Integer(vec![0])),
    );

    // node coordinates now name the promoted variables
    topology.node_coordinates = match nodes.z {
        Some(_) => names.join(" "),
        None => names[..2].join(" "),
    };
    dataset.insert_variable(topology.to_variable());
    debug!("Promoted dataset \"{}\" to native variables", dataset.name);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Connectivity, Nodes};

    #[test]
    fn promotion_pads_faces() {
        let mut dataset = Dataset::new("foreign");
        let mut population = Population {
            nodes: Nodes::new(vec![0.0, 1.0, 1.0, 0.0], vec![0.0, 0.0, 1.0, 1.0]),
            face_nodes: Connectivity::from_rows(vec![vec![0, 1, 2, 3], vec![0, 1, 2]]),
            topology: None,
        };
        promote_to_native(&mut dataset, &mut population);

        assert_eq!(
            dataset.integers("Mesh2_face_nodes").unwrap(),
            &[0, 1, 2, 3, 0, 1, 2, -1]
        );
        assert_eq!(dataset.shape("Mesh2_face_nodes").unwrap(), vec![2, 4]);
        assert!(!dataset.has_variable("Mesh2_node_z"));

        let topology = population.topology.unwrap();
        assert_eq!(topology.topology_dimension, -1);
        let stored = MeshTopology::from_variable(dataset.variable("Mesh2").unwrap());
        assert_eq!(stored, topology);
    }

    #[test]
    fn stub_sources() {
        let reader = GridReader::new();
        let grid = reader.read(GridSource::Spec("ne30np4".into())).unwrap();
        assert_eq!(grid.format(), MeshFormat::Unknown);
        assert!(grid.nodes().is_none());

        let grid = reader.read(vec![[0.0, 0.0], [1.0, 0.0]].into()).unwrap();
        assert_eq!(grid.format(), MeshFormat::Unknown);
        assert!(!grid.is_populated());
    }
}
