//! # The uxgrid crate
//!
//! Detection and normalisation of unstructured grid files
//!
//! ## Installation
//!
//! Direct install from github:
//!
//! ```shell
//! cargo install --git https://github.com/repositony/uxgrid.git
//! ```
//!
//! ## Overview
//!
//! Unstructured grids come in several conventions that do not agree on
//! anything, including how to say which convention a file follows. This crate
//! works out which one a file uses and reads it into a single common
//! [Grid](crate::grid::Grid) of nodes and faces.
//!
//! | Command line   | Description                                             |
//! | -------------- | ------------------------------------------------------- |
//! | `gridinfo`     | Detect the convention of a grid file and summarise it   |
//!
//! ### Supported conventions
//!
//! | Convention                                   | Recognised by                 |
//! | -------------------------------------------- | ----------------------------- |
//! | [MeshFormat::Exodus1](crate::grid::MeshFormat)     | `coordx` variable       |
//! | [MeshFormat::Scrip](crate::grid::MeshFormat)       | `grid_center_lon` variable |
//! | [MeshFormat::Exodus2](crate::grid::MeshFormat)     | `coord` variable        |
//! | [MeshFormat::UXNative](crate::grid::MeshFormat)    | `Mesh2` variable        |
//! | [MeshFormat::UGrid](crate::grid::MeshFormat)       | `.ugrid` extension      |
//! | [MeshFormat::UGridLegacy](crate::grid::MeshFormat) | `.ug` extension         |
//! | [MeshFormat::Shapefile](crate::grid::MeshFormat)   | `.shp` extension        |
//!
//! The marker variables are probed in the order listed, and by default the
//! last match wins. Datasets are read from their CDL text form, as produced
//! by `ncdump`. Files the dataset reader does not recognise at all fall back
//! to their extension.
//!
//! ## Advanced use
//!
//! Reading a grid is a one-liner, whatever the convention.
//!
//! ```rust
//! // import the crate
//! use uxgrid::grid::{Grid, MeshFormat};
//!
//! // read a grid from any of the supported conventions
//! let mut grid = Grid::open("./data/ux.cdl").unwrap();
//! assert_eq!(grid.format(), MeshFormat::UXNative);
//!
//! // now do whatever you want with it:
//! //  - build the edges and other connectivity,
//! //  - calculate face bounds and areas,
//! //  - validate and write it back out,
//! //  - etc...
//! grid.build_node_face_connectivity().unwrap();
//! grid.validate().unwrap();
//! ```
//!
//! As an overview:
//! - The [grid] module contains the canonical mesh model and the mesh
//! lifecycle operations.
//! - The [readers] module detects conventions and holds a populator for each
//! one.
//! - The [dataset] module is the generic container every dataset-based
//! convention is loaded through.
//! - The [error] module lists the failures callers may want to tell apart.
//!
//! In the background, the `nom` parser combinator library parses the text
//! formats, `bincode` decodes the binary ones, and `clap` is used for the
//! command line interface.

// Public facing modules
pub mod dataset;
pub mod error;
pub mod grid;
pub mod readers;
pub mod utils;

// Re-exports of useful data structures
#[doc(inline)]
pub use crate::grid::{Grid, MeshFormat};

#[doc(inline)]
pub use crate::readers::{read_dataset, read_grid};
