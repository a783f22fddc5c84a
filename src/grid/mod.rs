//! Canonical unstructured grid and its building blocks
//!
//! # Overview
//!
//! A [Grid] is constructed from a [GridSource]. For files the convention is
//! detected once, recorded as a [MeshFormat], and the matching populator
//! fills in the [Nodes] and face-node [Connectivity]. Foreign dataset-based
//! conventions are also promoted to the native `Mesh2` variables, so that the
//! in-memory dataset reads back as native once written.
//!
//! The remaining connectivity and per-face quantities are built on request
//! through the lifecycle methods on [Grid].
//!
//! ```rust
//! # use uxgrid::grid::{Grid, MeshFormat};
//! let mut grid = Grid::open("./data/scrip.cdl").unwrap();
//! assert_eq!(grid.format(), MeshFormat::Scrip);
//!
//! // Native variables were added to the dataset during construction
//! assert!(grid.dataset().unwrap().has_variable("Mesh2_face_nodes"));
//!
//! let area = grid.calculate_total_face_area().unwrap();
//! assert!(area > 0.0);
//! ```

// Split into submodules for development, but exposed as a single grid module
pub mod builders;
mod core;
mod elements;
mod format;
mod source;
mod topology;

#[doc(inline)]
pub use crate::grid::core::{Grid, GridSummary};

#[doc(inline)]
pub use crate::grid::elements::{Connectivity, FaceBounds, Nodes};

#[doc(inline)]
pub use crate::grid::format::MeshFormat;

#[doc(inline)]
pub use crate::grid::source::GridSource;

#[doc(inline)]
pub use crate::grid::topology::{MeshTopology, TOPOLOGY_VARIABLE};
