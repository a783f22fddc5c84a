//! Classification of grid files into a [MeshFormat]
//!
//! Datasets are classified by probing for marker variables in a fixed order.
//! Files the generic loader does not recognise at all fall back to their
//! extension, and everything else is an error.

// internal modules
use crate::dataset::Dataset;
use crate::error::{DatasetError, GridError};
use crate::grid::MeshFormat;
use crate::readers::read_dataset;
use crate::utils::f;

// standard library
use std::path::Path;

// external crates
use log::{debug, trace, warn};

/// Marker variables and the format each one signals, in probe order
pub const PROBES: [(&str, MeshFormat); 4] = [
    ("coordx", MeshFormat::Exodus1),
    ("grid_center_lon", MeshFormat::Scrip),
    ("coord", MeshFormat::Exodus2),
    ("Mesh2", MeshFormat::UXNative),
];

/// How to settle a dataset that matches more than one probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeResolution {
    /// Every probe runs and the last match in probe order wins
    #[default]
    LastMatch,
    /// The first match in probe order wins
    FirstMatch,
    /// More than one match is a [GridError::ProbeConflict]
    Strict,
}

/// Outcome of classifying a file
#[derive(Debug)]
pub struct Classification {
    /// The detected format, never `Unknown` or `Unsupported`
    pub format: MeshFormat,
    /// The loaded dataset, if the generic loader opened the file
    pub dataset: Option<Dataset>,
}

/// Every format whose marker variable is present, in probe order
///
/// ```rust
/// # use uxgrid::dataset::{Dataset, DataType, Values, Variable};
/// # use uxgrid::grid::MeshFormat;
/// # use uxgrid::readers::detect_all;
/// let mut dataset = Dataset::new("mixed");
/// for name in ["Mesh2", "coordx"] {
///     dataset.insert_variable(Variable::new(name, DataType::Int, &[], Values::Integer(vec![0])));
/// }
/// assert_eq!(detect_all(&dataset), vec![MeshFormat::Exodus1, MeshFormat::UXNative]);
/// ```
pub fn detect_all(dataset: &Dataset) -> Vec<MeshFormat> {
    PROBES
        .iter()
        .filter(|(marker, _)| dataset.has_variable(marker))
        .map(|(marker, format)| {
            trace!("Marker \"{marker}\" matched {format}");
            *format
        })
        .collect()
}

/// Detect the format of a loaded dataset
///
/// Returns [GridError::UnsupportedFormat] when no probe matches, and
/// [GridError::ProbeConflict] for multiple matches under
/// [ProbeResolution::Strict].
pub fn detect(dataset: &Dataset, resolution: ProbeResolution) -> Result<MeshFormat, GridError> {
    let matched = detect_all(dataset);
    let format = match resolution {
        _ if matched.is_empty() => None,
        ProbeResolution::LastMatch => matched.last().copied(),
        ProbeResolution::FirstMatch => matched.first().copied(),
        ProbeResolution::Strict if matched.len() > 1 => {
            return Err(GridError::ProbeConflict(matched));
        }
        ProbeResolution::Strict => matched.first().copied(),
    };

    match format {
        Some(format) => {
            debug!("Detected {format} from markers {matched:?} ({resolution:?})");
            Ok(format)
        }
        None => Err(GridError::UnsupportedFormat(f!(
            "no marker variable found in dataset \"{}\"",
            dataset.name
        ))),
    }
}

/// Load and classify a grid file
///
/// The generic loader is tried first. A malformed dataset is always fatal,
/// while a file that is not a dataset at all may still be recognised from
/// its extension. Loader errors carry the path of the file.
pub fn classify(path: &Path, resolution: ProbeResolution) -> Result<Classification, GridError> {
    let display = path.display().to_string();

    let result = match read_dataset(path) {
        Ok(dataset) => detect(&dataset, resolution).map(|format| Classification {
            format,
            dataset: Some(dataset),
        }),
        Err(DatasetError::Malformed(reason)) => Err(GridError::LoadFailure {
            reason,
            path: display.clone(),
        }),
        Err(DatasetError::NotADataset(reason)) => {
            debug!("Generic load failed ({reason}), trying the file extension");
            match MeshFormat::from_extension(path) {
                Some(format) => {
                    debug!("Detected {format} from extension");
                    Ok(Classification {
                        format,
                        dataset: None,
                    })
                }
                None => Err(GridError::UnsupportedContainer {
                    reason,
                    path: display.clone(),
                }),
            }
        }
    };

    result.map_err(|e| match e {
        GridError::UnsupportedFormat(reason) => {
            warn!("Mesh file not supported: {display}");
            GridError::UnsupportedFormat(f!("{reason}: {display}"))
        }
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{DataType, Values, Variable};

    fn with_markers(markers: &[&str]) -> Dataset {
        let mut dataset = Dataset::new("markers");
        for marker in markers {
            dataset.insert_variable(Variable::new(
                marker,
                DataType::Int,
                &[],
                Values::Integer(vec![0]),
            ));
        }
        dataset
    }

    #[test]
    fn single_markers() {
        for (marker, format) in PROBES {
            let dataset = with_markers(&[marker]);
            assert_eq!(detect(&dataset, ProbeResolution::Strict), Ok(format));
        }
    }

    #[test]
    fn resolution_policies() {
        let dataset = with_markers(&["Mesh2", "coordx"]);
        assert_eq!(
            detect(&dataset, ProbeResolution::LastMatch),
            Ok(MeshFormat::UXNative)
        );
        assert_eq!(
            detect(&dataset, ProbeResolution::FirstMatch),
            Ok(MeshFormat::Exodus1)
        );
        assert_eq!(
            detect(&dataset, ProbeResolution::Strict),
            Err(GridError::ProbeConflict(vec![
                MeshFormat::Exodus1,
                MeshFormat::UXNative
            ]))
        );
    }

    #[test]
    fn no_markers() {
        let dataset = with_markers(&["grid_center_lat", "coordy"]);
        assert!(detect_all(&dataset).is_empty());
        assert!(matches!(
            detect(&dataset, ProbeResolution::LastMatch),
            Err(GridError::UnsupportedFormat(_))
        ));
    }
}
