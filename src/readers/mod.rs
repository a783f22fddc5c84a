//! Readers for the generic dataset container and every grid convention
//!
//! Grid files are read in two stages. The file is first classified, either
//! from the marker variables of a loaded dataset or from its extension, and
//! then handed to the [FormatPopulator] for that convention.
//!
//! ```rust
//! # use uxgrid::readers;
//! # use uxgrid::grid::MeshFormat;
//! // Load the dataset and detect the convention without building a grid
//! let dataset = readers::read_dataset("./data/exodus2.cdl").unwrap();
//! let format = readers::detect(&dataset, Default::default()).unwrap();
//! assert_eq!(format, MeshFormat::Exodus2);
//! ```

// internal modules
use crate::dataset::Dataset;
use crate::error::DatasetError;
use crate::grid::{Connectivity, Grid, MeshFormat, MeshTopology, Nodes};

// standard library
use std::path::Path;

// external crates
use anyhow::Result;

// files under the readers module
mod dataset_file;
mod detect;
mod exodus;
mod grid_file;
mod native;
pub mod parsers;
mod scrip;
mod shapefile;
mod ugrid_file;

// inline the readers for a nice API
#[doc(inline)]
pub use crate::readers::dataset_file::DatasetReader;

#[doc(inline)]
pub use crate::readers::detect::{
    classify, detect, detect_all, Classification, ProbeResolution, PROBES,
};

#[doc(inline)]
pub use crate::readers::grid_file::GridReader;

#[doc(inline)]
pub use crate::readers::exodus::{Exodus1Populator, Exodus2Populator};

#[doc(inline)]
pub use crate::readers::native::NativePopulator;

#[doc(inline)]
pub use crate::readers::scrip::ScripPopulator;

#[doc(inline)]
pub use crate::readers::shapefile::ShapefileReader;

#[doc(inline)]
pub use crate::readers::ugrid_file::{UGridLegacyReader, UGridReader};

/// Load a generic dataset from a CDL file
///
/// - `path` - Path to the dataset, can be [&str], [String], [Path], etc...
///
/// The error says whether the file is not a dataset at all, or a broken one.
pub fn read_dataset<P: AsRef<Path>>(path: P) -> Result<Dataset, DatasetError> {
    DatasetReader::new().parse(path.as_ref())
}

/// Write a dataset to a CDL file
pub fn write_dataset<P: AsRef<Path>>(dataset: &Dataset, path: P) -> Result<()> {
    dataset.write(path)
}

/// Read a grid file with the default settings
///
/// Example
/// ```rust
/// # use uxgrid::readers;
/// let grid = readers::read_grid("./data/mesh.ugrid").unwrap();
/// assert_eq!(grid.n_faces(), 3);
/// ```
pub fn read_grid<P: AsRef<Path>>(path: P) -> Result<Grid> {
    let mut reader = GridReader::new();
    reader.disable_progress();
    reader.read(path.as_ref().into())
}

/// What a populator is handed
///
/// Conventions the generic loader understands get the loaded dataset, the
/// rest get the path and do their own I/O.
#[derive(Debug, Clone, Copy)]
pub enum PopulatorInput<'a> {
    Dataset(&'a Dataset),
    Path(&'a Path),
}

/// Canonical mesh fields produced by a populator
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Population {
    pub nodes: Nodes,
    pub face_nodes: Connectivity,
    /// Only for conventions that carry or are seeded with topology metadata
    pub topology: Option<MeshTopology>,
}

/// Fills the canonical mesh fields from one file convention
pub trait FormatPopulator {
    /// The format this populator reads
    fn format(&self) -> MeshFormat;

    /// Produce the canonical nodes and faces
    fn populate(&self, input: PopulatorInput) -> Result<Population>;
}

/// The populator for a detected format
///
/// `Unknown` and `Unsupported` have no populator.
pub fn populator_for(format: MeshFormat, show_progress: bool) -> Option<Box<dyn FormatPopulator>> {
    let populator: Box<dyn FormatPopulator> = match format {
        MeshFormat::Exodus1 => Box::new(Exodus1Populator),
        MeshFormat::Exodus2 => Box::new(Exodus2Populator),
        MeshFormat::Scrip => Box::new(ScripPopulator),
        MeshFormat::UXNative => Box::new(NativePopulator),
        MeshFormat::UGrid => {
            let mut reader = UGridReader::new();
            if !show_progress {
                reader.disable_progress();
            }
            Box::new(reader)
        }
        MeshFormat::UGridLegacy => Box::new(UGridLegacyReader::new()),
        MeshFormat::Shapefile => Box::new(ShapefileReader::new()),
        MeshFormat::Unsupported | MeshFormat::Unknown => return None,
    };
    Some(populator)
}

/// Unwrap the dataset input, for populators that need one
pub(crate) fn expect_dataset<'a>(input: PopulatorInput<'a>, format: MeshFormat) -> Result<&'a Dataset> {
    match input {
        PopulatorInput::Dataset(dataset) => Ok(dataset),
        PopulatorInput::Path(path) => anyhow::bail!(
            "The {format} reader needs a loaded dataset, was given {}",
            path.display()
        ),
    }
}

/// Unwrap the path input, for populators that do their own I/O
pub(crate) fn expect_path<'a>(input: PopulatorInput<'a>, format: MeshFormat) -> Result<&'a Path> {
    match input {
        PopulatorInput::Path(path) => Ok(path),
        PopulatorInput::Dataset(dataset) => anyhow::bail!(
            "The {format} reader needs a file path, was given dataset \"{}\"",
            dataset.name
        ),
    }
}
