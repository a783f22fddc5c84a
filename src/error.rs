//! Typed failures for dataset loading and grid construction
//!
//! Most of the crate returns [anyhow::Result] so that context can be attached
//! freely. The variants here are the failures a caller may need to tell apart,
//! and can be recovered from an [anyhow::Error] with `downcast_ref`.
//!
//! ```rust
//! # use uxgrid::error::GridError;
//! # use uxgrid::grid::Grid;
//! let error = Grid::open("./data/unsupported.cdl").unwrap_err();
//! assert!(matches!(
//!     error.downcast_ref::<GridError>(),
//!     Some(GridError::UnsupportedFormat(_))
//! ));
//! ```

// internal modules
use crate::grid::MeshFormat;

// external crates
use thiserror::Error;

/// Failures of the generic dataset loader
///
/// The distinction matters to grid detection. A file that is simply not a
/// dataset container may still be recognised by its extension, while a
/// container that is broken inside is always fatal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DatasetError {
    /// The file could not be read, or is not a dataset container at all
    #[error("not a self-describing dataset ({0})")]
    NotADataset(String),
    /// The container header was found but the content is inconsistent
    #[error("malformed dataset ({0})")]
    Malformed(String),
}

/// Failures of grid construction and the mesh lifecycle operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GridError {
    /// The generic loader recognised the container but could not load it
    #[error("{reason}: {path}")]
    LoadFailure { reason: String, path: String },
    /// The generic loader could not open the file and the extension is unknown
    #[error("{reason}: {path}")]
    UnsupportedContainer { reason: String, path: String },
    /// No marker variable or extension identified the grid convention
    #[error("mesh file not supported: {0}")]
    UnsupportedFormat(String),
    /// More than one marker variable matched under strict detection
    #[error("conflicting format markers, matched {0:?}")]
    ProbeConflict(Vec<MeshFormat>),
    /// An operation needed a loaded dataset and there is none
    #[error("no dataset has been loaded for this grid")]
    NoDataset,
    /// An operation needed the grid to have been read from a file
    #[error("grid was not initialised from a file path")]
    NoFilePath,
    /// A required variable is absent from the dataset
    #[error("variable \"{0}\" not found in dataset")]
    MissingVariable(String),
    /// A variable exists but holds the wrong kind of data
    #[error("variable \"{name}\" does not hold {expected} data")]
    VariableType { name: String, expected: &'static str },
    /// Connectivity references nodes that do not exist, or degenerate faces
    #[error("invalid connectivity: {0}")]
    InvalidConnectivity(String),
    /// A lifecycle operation was called before nodes/faces were populated
    #[error("grid has no {0} populated")]
    NotPopulated(&'static str),
}
