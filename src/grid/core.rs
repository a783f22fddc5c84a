// internal modules
use crate::dataset::Dataset;
use crate::error::GridError;
use crate::grid::builders;
use crate::grid::{Connectivity, FaceBounds, GridSource, MeshFormat, MeshTopology, Nodes};
use crate::readers::GridReader;
use crate::utils::*;

// standard library
use std::path::{Path, PathBuf};

// external crates
use anyhow::Result;
use log::{debug, trace, warn};
use serde::Serialize;

/// Canonical unstructured mesh
///
/// Every supported file convention is normalised into this one structure.
/// The source and detected format are fixed at construction, the nodes and
/// face-node connectivity are filled by the format populator, and everything
/// else is built on demand by the lifecycle methods.
///
/// ```rust
/// # use uxgrid::grid::{Grid, MeshFormat};
/// let mut grid = Grid::open("./data/exodus1.cdl").unwrap();
/// assert_eq!(grid.format(), MeshFormat::Exodus1);
///
/// grid.build_edge_face_connectivity().unwrap();
/// grid.validate().unwrap();
/// ```
#[derive(Debug)]
pub struct Grid {
    /// What the grid was constructed from
    pub(crate) source: GridSource,
    /// Convention detected at construction
    pub(crate) format: MeshFormat,
    /// Generic dataset, only for formats loaded through it
    pub(crate) dataset: Option<Dataset>,
    /// Node coordinates
    pub(crate) nodes: Option<Nodes>,
    /// Face -> node connectivity
    pub(crate) face_nodes: Option<Connectivity>,
    /// Topology metadata of the native representation
    pub(crate) topology: Option<MeshTopology>,
    /// Node -> face connectivity, built on demand
    node_faces: Option<Connectivity>,
    /// Edge -> node connectivity, built alongside the edge faces
    edge_nodes: Option<Connectivity>,
    /// Edge -> face connectivity, built on demand
    edge_faces: Option<Connectivity>,
    /// Per-face bounds, built on demand
    latlon_bounds: Option<Vec<FaceBounds>>,
    /// Total face area, calculated on demand
    total_face_area: Option<f64>,
    /// Are the node coordinates longitude/latitude?
    pub is_latlon: Option<bool>,
    /// Are any faces concave?
    pub concave: Option<bool>,
}

/// Construction
impl Grid {
    /// Grid from any source, with the default reader settings
    ///
    /// Vertex and spec sources are recorded only. File sources go through
    /// detection and are populated by the matching format reader.
    pub fn new<S: Into<GridSource>>(source: S) -> Result<Self> {
        GridReader::new().read(source.into())
    }

    /// Grid from a file on disk
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(path.as_ref())
    }

    /// Grid from a string that may be a file path or a spec identifier
    pub fn from_arg(arg: &str) -> Result<Self> {
        GridReader::new().read(GridSource::infer(arg))
    }

    /// Unpopulated grid in the pre-detection state
    pub(crate) fn empty(source: GridSource) -> Self {
        Self {
            source,
            format: MeshFormat::Unknown,
            dataset: None,
            nodes: None,
            face_nodes: None,
            topology: None,
            node_faces: None,
            edge_nodes: None,
            edge_faces: None,
            latlon_bounds: None,
            total_face_area: None,
            is_latlon: None,
            concave: None,
        }
    }
}

/// Accessors
impl Grid {
    pub fn source(&self) -> &GridSource {
        &self.source
    }

    /// Detected convention, `Unknown` for vertex and spec sources
    pub fn format(&self) -> MeshFormat {
        self.format
    }

    /// Path of the grid file, if read from one
    pub fn file_path(&self) -> Option<&Path> {
        self.source.file_path()
    }

    /// The loaded dataset, absent for formats with their own readers
    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn nodes(&self) -> Option<&Nodes> {
        self.nodes.as_ref()
    }

    pub fn face_nodes(&self) -> Option<&Connectivity> {
        self.face_nodes.as_ref()
    }

    pub fn topology(&self) -> Option<&MeshTopology> {
        self.topology.as_ref()
    }

    pub fn node_faces(&self) -> Option<&Connectivity> {
        self.node_faces.as_ref()
    }

    pub fn edge_nodes(&self) -> Option<&Connectivity> {
        self.edge_nodes.as_ref()
    }

    pub fn edge_faces(&self) -> Option<&Connectivity> {
        self.edge_faces.as_ref()
    }

    pub fn latlon_bounds(&self) -> Option<&[FaceBounds]> {
        self.latlon_bounds.as_deref()
    }

    /// Result of the last [Grid::calculate_total_face_area]
    pub fn total_face_area(&self) -> Option<f64> {
        self.total_face_area
    }

    /// Nodes and faces are both available
    pub fn is_populated(&self) -> bool {
        self.nodes.is_some() && self.face_nodes.is_some()
    }

    /// Number of nodes, zero if unpopulated
    pub fn n_nodes(&self) -> usize {
        self.nodes.as_ref().map_or(0, Nodes::len)
    }

    /// Number of faces, zero if unpopulated
    pub fn n_faces(&self) -> usize {
        self.face_nodes.as_ref().map_or(0, Connectivity::len)
    }

    /// Serializable overview of the grid
    pub fn summary(&self) -> GridSummary {
        GridSummary {
            source: self.source.to_string(),
            format: self.format,
            has_dataset: self.dataset.is_some(),
            n_nodes: self.n_nodes(),
            n_faces: self.n_faces(),
            n_edges: self.edge_nodes.as_ref().map(Connectivity::len),
            max_face_nodes: self.face_nodes.as_ref().map(Connectivity::max_row_len),
            topology_dimension: self.topology.as_ref().map(|t| t.topology_dimension),
            total_face_area: self.total_face_area,
        }
    }

    /// Both nodes and faces, or [GridError::NotPopulated]
    fn mesh(&self) -> Result<(&Nodes, &Connectivity), GridError> {
        let nodes = self.nodes.as_ref().ok_or(GridError::NotPopulated("nodes"))?;
        let faces = self
            .face_nodes
            .as_ref()
            .ok_or(GridError::NotPopulated("face connectivity"))?;
        Ok((nodes, faces))
    }
}

/// Mesh lifecycle operations
///
/// All of these need a populated grid, and recompute from scratch on every
/// call so that calling twice gives the same result.
impl Grid {
    /// Calculate the planar area of all faces
    pub fn calculate_total_face_area(&mut self) -> Result<f64> {
        let (nodes, faces) = self.mesh()?;
        builders::check_node_ids(nodes.len(), faces)?;
        let area = builders::total_face_area(nodes, faces);
        debug!("Total face area: {}", area.sci(5, 2));
        self.total_face_area = Some(area);
        Ok(area)
    }

    /// Build the node-face connectivity
    pub fn build_node_face_connectivity(&mut self) -> Result<&Connectivity> {
        let (nodes, faces) = self.mesh()?;
        let node_faces = builders::node_faces(nodes.len(), faces);
        trace!("Built node-face connectivity for {} nodes", node_faces.len());
        Ok(&*self.node_faces.insert(node_faces))
    }

    /// Build the edge-face connectivity, and the edges themselves
    pub fn build_edge_face_connectivity(&mut self) -> Result<&Connectivity> {
        let (_, faces) = self.mesh()?;
        let (edge_nodes, edge_faces) = builders::edges(faces);
        trace!("Built edge-face connectivity for {} edges", edge_nodes.len());
        self.edge_nodes = Some(edge_nodes);
        Ok(&*self.edge_faces.insert(edge_faces))
    }

    /// Build the latitude-longitude bounding box of every face
    pub fn build_latlon_bounds(&mut self) -> Result<&[FaceBounds]> {
        let (nodes, faces) = self.mesh()?;
        builders::check_face_nodes(nodes.len(), faces)?;
        let bounds = builders::latlon_bounds(nodes, faces);
        Ok(self.latlon_bounds.insert(bounds).as_slice())
    }

    /// Validate the grid against the native conventions
    ///
    /// Checks that there is at least one face and every face has at least
    /// three nodes. All connectivity built so far must reference existing
    /// nodes/faces, and then the topology dimension is set to 2. A topology block is synthesised first if the
    /// source format did not provide one.
    pub fn validate(&mut self) -> Result<()> {
        let (nodes, faces) = self.mesh()?;
        if faces.is_empty() {
            return Err(GridError::InvalidConnectivity(
                "no faces, so there is no 2D topology".into(),
            )
            .into());
        }
        builders::check_face_nodes(nodes.len(), faces)?;

        if let Some(node_faces) = &self.node_faces {
            if node_faces.len() != nodes.len() {
                return Err(GridError::InvalidConnectivity(f!(
                    "node-face connectivity has {} rows for {} nodes",
                    node_faces.len(),
                    nodes.len()
                ))
                .into());
            }
        }

        if let Some(edge_faces) = &self.edge_faces {
            if edge_faces.max_index().is_some_and(|f| f >= faces.len()) {
                return Err(GridError::InvalidConnectivity(
                    "edge-face connectivity references a missing face".into(),
                )
                .into());
            }
        }

        let topology = self.topology.get_or_insert_with(MeshTopology::default);
        topology.topology_dimension = 2;

        // keep the dataset in step so that writing it records the result
        if let Some(dataset) = &mut self.dataset {
            if dataset.has_variable(crate::grid::TOPOLOGY_VARIABLE) {
                dataset.insert_variable(topology.to_variable());
            }
        }

        debug!("Grid is valid");
        Ok(())
    }
}

/// File related operations
impl Grid {
    /// Change the final component of the recorded file path
    ///
    /// Only the path held by the grid changes, nothing is renamed on disk.
    pub fn rename(&mut self, filename: &str) -> Result<&Path> {
        let path = match &mut self.source {
            GridSource::FilePath(path) => path,
            _ => return Err(GridError::NoFilePath.into()),
        };
        let new_path: PathBuf = path.with_file_name(filename);
        debug!("Renamed {} to {}", path.display(), new_path.display());
        *path = new_path;
        Ok(path.as_path())
    }

    /// Write the dataset to `destination`
    ///
    /// Output is always CDL text. The `format` argument is accepted for
    /// interface compatibility but not interpreted.
    pub fn write<P: AsRef<Path>>(&self, destination: P, format: &str) -> Result<()> {
        let dataset = self.dataset.as_ref().ok_or(GridError::NoDataset)?;
        if !format.is_empty() {
            warn!("Output format \"{format}\" ignored, writing CDL");
        }
        dataset.write(destination)
    }
}

impl std::fmt::Display for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut s = "Grid {\n".to_string();
        s += &f!("    source: {}\n", self.source);
        s += &f!("    format: {}\n", self.format);
        s += &f!("    nodes: {}\n", self.n_nodes());
        s += &f!("    faces: {}\n", self.n_faces());
        if let Some(edges) = &self.edge_nodes {
            s += &f!("    edges: {}\n", edges.len());
        }
        if let Some(area) = self.total_face_area {
            s += &f!("    area: {}\n", area.sci(5, 2));
        }
        if let Some(topology) = &self.topology {
            s += &f!("    topology dimension: {}\n", topology.topology_dimension);
        }
        s += "}";
        write!(f, "{}", s)
    }
}

/// Overview of a [Grid] for reporting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridSummary {
    pub source: String,
    pub format: MeshFormat,
    pub has_dataset: bool,
    pub n_nodes: usize,
    pub n_faces: usize,
    pub n_edges: Option<usize>,
    pub max_face_nodes: Option<usize>,
    pub topology_dimension: Option<i64>,
    pub total_face_area: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_grid() -> Grid {
        let mut grid = Grid::empty(GridSource::FilePath(PathBuf::from("dir/mesh.cdl")));
        grid.format = MeshFormat::UGrid;
        grid.nodes = Some(Nodes::new(vec![0.0, 1.0, 0.0], vec![0.0, 0.0, 1.0]));
        grid.face_nodes = Some(Connectivity::from_rows(vec![vec![0, 1, 2]]));
        grid
    }

    #[test]
    fn lifecycle_needs_population() {
        let mut grid = Grid::empty(GridSource::Spec("ne30".into()));
        let error = grid.calculate_total_face_area().unwrap_err();
        assert_eq!(
            error.downcast_ref::<GridError>(),
            Some(&GridError::NotPopulated("nodes"))
        );
        assert!(grid.validate().is_err());
        assert!(grid.build_latlon_bounds().is_err());
    }

    #[test]
    fn validate_sets_topology_dimension() {
        let mut grid = triangle_grid();
        assert!(grid.topology().is_none());
        grid.validate().unwrap();
        assert_eq!(grid.topology().unwrap().topology_dimension, 2);
    }

    #[test]
    fn validate_rejects_dangling_nodes() {
        let mut grid = triangle_grid();
        grid.face_nodes = Some(Connectivity::from_rows(vec![vec![0, 1, 3]]));
        let error = grid.validate().unwrap_err();
        assert!(matches!(
            error.downcast_ref::<GridError>(),
            Some(GridError::InvalidConnectivity(_))
        ));
        assert!(grid.topology().is_none());
    }

    #[test]
    fn area_rejects_dangling_nodes() {
        let mut grid = triangle_grid();
        grid.face_nodes = Some(Connectivity::from_rows(vec![vec![0, 1, 7]]));
        let error = grid.calculate_total_face_area().unwrap_err();
        assert!(matches!(
            error.downcast_ref::<GridError>(),
            Some(GridError::InvalidConnectivity(_))
        ));
        assert_eq!(grid.total_face_area(), None);
    }

    #[test]
    fn validate_needs_faces() {
        let mut grid = triangle_grid();
        grid.face_nodes = Some(Connectivity::new());
        assert!(grid.validate().is_err());
        assert!(grid.topology().is_none());
    }

    #[test]
    fn rename_only_changes_the_record() {
        let mut grid = triangle_grid();
        let path = grid.rename("other.cdl").unwrap().to_path_buf();
        assert_eq!(path, PathBuf::from("dir/other.cdl"));
        assert_eq!(grid.file_path(), Some(Path::new("dir/other.cdl")));

        let mut grid = Grid::empty(GridSource::Spec("ne30".into()));
        let error = grid.rename("x").unwrap_err();
        assert_eq!(error.downcast_ref::<GridError>(), Some(&GridError::NoFilePath));
    }

    #[test]
    fn write_needs_a_dataset() {
        let grid = triangle_grid();
        let target = std::env::temp_dir().join("uxgrid_never_written.cdl");
        let error = grid.write(&target, "").unwrap_err();
        assert_eq!(error.downcast_ref::<GridError>(), Some(&GridError::NoDataset));
        assert!(!target.exists());
    }

    #[test]
    fn summary_counts() {
        let mut grid = triangle_grid();
        grid.build_edge_face_connectivity().unwrap();
        let summary = grid.summary();
        assert_eq!(summary.n_nodes, 3);
        assert_eq!(summary.n_faces, 1);
        assert_eq!(summary.n_edges, Some(3));
        assert_eq!(summary.max_face_nodes, Some(3));
        assert!(!summary.has_dataset);
    }
}
