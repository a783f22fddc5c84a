//! What a grid is constructed from

// standard library
use std::path::{Path, PathBuf};

/// The single source of truth for a [Grid](crate::grid::Grid)
///
/// The variant set is closed, so there is no "anything else" case to silently
/// ignore. When the caller only has a string, [GridSource::infer] decides
/// between a file and a grid specification.
#[derive(Debug, Clone, PartialEq)]
pub enum GridSource {
    /// Raw vertex coordinates, one row per vertex
    Vertices(Vec<Vec<f64>>),
    /// Path to a grid file on the local filesystem
    FilePath(PathBuf),
    /// Grid specification identifier
    Spec(String),
}

impl GridSource {
    /// A string naming an existing file is a path, anything else a spec
    ///
    /// ```rust
    /// # use uxgrid::grid::GridSource;
    /// # use std::path::PathBuf;
    /// assert_eq!(
    ///     GridSource::infer("./data/scrip.cdl"),
    ///     GridSource::FilePath(PathBuf::from("./data/scrip.cdl"))
    /// );
    /// assert_eq!(GridSource::infer("ne30np4"), GridSource::Spec("ne30np4".into()));
    /// ```
    pub fn infer(arg: &str) -> Self {
        match Path::new(arg).is_file() {
            true => Self::FilePath(PathBuf::from(arg)),
            false => Self::Spec(arg.to_string()),
        }
    }

    /// The file path, if this is a file source
    pub fn file_path(&self) -> Option<&Path> {
        match self {
            Self::FilePath(p) => Some(p),
            _ => None,
        }
    }
}

impl From<Vec<Vec<f64>>> for GridSource {
    fn from(vertices: Vec<Vec<f64>>) -> Self {
        Self::Vertices(vertices)
    }
}

impl From<Vec<[f64; 2]>> for GridSource {
    fn from(vertices: Vec<[f64; 2]>) -> Self {
        Self::Vertices(vertices.into_iter().map(|v| v.to_vec()).collect())
    }
}

impl From<PathBuf> for GridSource {
    fn from(path: PathBuf) -> Self {
        Self::FilePath(path)
    }
}

impl From<&Path> for GridSource {
    fn from(path: &Path) -> Self {
        Self::FilePath(path.to_path_buf())
    }
}

impl std::fmt::Display for GridSource {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Vertices(v) => write!(f, "{} vertices", v.len()),
            Self::FilePath(p) => write!(f, "{}", p.display()),
            Self::Spec(s) => write!(f, "spec \"{s}\""),
        }
    }
}
