//! Grid file conventions

// standard library
use std::path::Path;

// external crates
use serde::{Deserialize, Serialize};

/// Grid file convention detected for a [Grid](crate::grid::Grid)
///
/// | Variant       | Recognised by                               |
/// | ------------- | ------------------------------------------- |
/// | `Exodus1`     | `coordx` variable                           |
/// | `Scrip`       | `grid_center_lon` variable                  |
/// | `Exodus2`     | `coord` variable                            |
/// | `UXNative`    | `Mesh2` variable                            |
/// | `UGrid`       | `.ugrid` extension, not a generic dataset   |
/// | `UGridLegacy` | `.ug` extension, not a generic dataset      |
/// | `Shapefile`   | `.shp` extension, not a generic dataset     |
///
/// `Unknown` is the state before detection has run, and `Unsupported` means
/// detection ran and nothing matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MeshFormat {
    Exodus1,
    Exodus2,
    Scrip,
    UGrid,
    UGridLegacy,
    Shapefile,
    UXNative,
    Unsupported,
    #[default]
    Unknown,
}

impl MeshFormat {
    /// Classify by file extension alone
    ///
    /// Only used when the generic loader cannot open the file. Matching is
    /// exact, so `.UGRID` is not recognised.
    ///
    /// ```rust
    /// # use uxgrid::grid::MeshFormat;
    /// # use std::path::Path;
    /// assert_eq!(MeshFormat::from_extension(Path::new("a/mesh.ugrid")), Some(MeshFormat::UGrid));
    /// assert_eq!(MeshFormat::from_extension(Path::new("coast.shp")), Some(MeshFormat::Shapefile));
    /// assert_eq!(MeshFormat::from_extension(Path::new("old.ug")), Some(MeshFormat::UGridLegacy));
    /// assert_eq!(MeshFormat::from_extension(Path::new("mesh.UGRID")), None);
    /// ```
    pub fn from_extension(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "ugrid" => Some(Self::UGrid),
            "shp" => Some(Self::Shapefile),
            "ug" => Some(Self::UGridLegacy),
            _ => None,
        }
    }

    /// Whether the format is read through the generic dataset loader
    ///
    /// The others are handed the file path and do their own I/O.
    pub fn is_dataset_based(&self) -> bool {
        matches!(
            self,
            Self::Exodus1 | Self::Exodus2 | Self::Scrip | Self::UXNative
        )
    }

    /// Short label, matching the names used in log output
    pub fn label(&self) -> &'static str {
        match self {
            Self::Exodus1 => "exo1",
            Self::Exodus2 => "exo2",
            Self::Scrip => "scrip",
            Self::UGrid => "ugrid",
            Self::UGridLegacy => "ug",
            Self::Shapefile => "shp",
            Self::UXNative => "ux",
            Self::Unsupported => "unsupported",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for MeshFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
