//! Populator for datasets already in the native convention
//!
//! Nothing is transformed. The `Mesh2` topology variable names the node
//! coordinate and face connectivity variables, which are read as they are.

// internal modules
use crate::dataset::Dataset;
use crate::error::GridError;
use crate::grid::{Connectivity, MeshFormat, MeshTopology, Nodes, TOPOLOGY_VARIABLE};
use crate::readers::{expect_dataset, FormatPopulator, Population, PopulatorInput};
use crate::utils::f;

// external crates
use anyhow::{bail, Context, Result};
use log::{debug, trace};

/// Native datasets marked by a `Mesh2` topology variable
#[derive(Debug, Default, Clone, Copy)]
pub struct NativePopulator;

impl FormatPopulator for NativePopulator {
    fn format(&self) -> MeshFormat {
        MeshFormat::UXNative
    }

    fn populate(&self, input: PopulatorInput) -> Result<Population> {
        let dataset = expect_dataset(input, self.format())?;
        let topology = MeshTopology::from_variable(dataset.require(TOPOLOGY_VARIABLE)?);
        trace!("{topology:?}");

        let names = topology.node_coordinate_names();
        let (x, y) = match names[..] {
            [x, y, ..] => (dataset.doubles(x)?, dataset.doubles(y)?),
            _ => bail!(
                "Expected at least two node coordinate names, found \"{}\"",
                topology.node_coordinates
            ),
        };
        if x.len() != y.len() {
            bail!("Node coordinate arrays differ in length, {} vs {}", x.len(), y.len());
        }

        // a third coordinate is optional, as is its conventional name
        let z = match names.get(2) {
            Some(z) => Some(dataset.doubles(z)?),
            None if dataset.has_variable("Mesh2_node_z") => Some(dataset.doubles("Mesh2_node_z")?),
            None => None,
        };
        let nodes = match z {
            Some(z) if z.len() != x.len() => {
                bail!("Node z coordinate has {} values for {} nodes", z.len(), x.len())
            }
            Some(z) => Nodes::with_z(x, y, z),
            None => Nodes::new(x, y),
        };

        let face_nodes = face_rows(dataset, &topology.face_node_connectivity, nodes.len())
            .with_context(|| f!("Could not read {}", topology.face_node_connectivity))?;
        debug!("Read {} nodes and {} faces", nodes.len(), face_nodes.len());

        Ok(Population {
            nodes,
            face_nodes,
            topology: Some(topology),
        })
    }
}

/// Ragged face rows from a padded `(n_face, n_max_face_nodes)` array
///
/// A row ends at the first fill value or negative index. The `start_index`
/// attribute gives the base of the stored indices, 0 by default. Any index
/// past the last node is an error.
fn face_rows(dataset: &Dataset, name: &str, n_nodes: usize) -> Result<Connectivity> {
    let variable = dataset.require(name)?;
    let shape = dataset.shape(name)?;
    let &[_, n_max] = shape.as_slice() else {
        bail!("Expected {name} to be two dimensional, found {shape:?}");
    };

    let fill = variable.fill_value();
    let start = variable.int_attribute("start_index").unwrap_or(0);
    let ids = dataset.integers(name)?;

    let mut face_nodes = Connectivity::new();
    for (i, face) in ids.chunks_exact(n_max.max(1)).enumerate() {
        let row = face
            .iter()
            .take_while(|&&id| id as f64 != fill && id >= start)
            .map(|&id| match id.checked_sub(start).map(usize::try_from) {
                Some(Ok(node)) if node < n_nodes => Ok(node),
                _ => Err(GridError::InvalidConnectivity(f!(
                    "face {i} references node {id}, but there are only {n_nodes} nodes"
                ))),
            })
            .collect::<Result<Vec<usize>, GridError>>()?;
        face_nodes.push_row(row);
    }
    Ok(face_nodes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_rows() {
        let cdl = r#"netcdf ux {
dimensions:
    nMesh2_node = 5 ;
    nMesh2_face = 2 ;
    nMaxMesh2_face_nodes = 4 ;
variables:
    int Mesh2 ;
        Mesh2:cf_role = "mesh_topology" ;
        Mesh2:topology_dimension = 2 ;
        Mesh2:node_coordinates = "lon lat" ;
        Mesh2:face_node_connectivity = "faces" ;
    double lon(nMesh2_node) ;
    double lat(nMesh2_node) ;
    int faces(nMesh2_face, nMaxMesh2_face_nodes) ;
        faces:_FillValue = -999 ;
        faces:start_index = 1 ;
data:
 Mesh2 = 0 ;
 lon = 0, 1, 1, 0, 2 ;
 lat = 0, 0, 1, 1, 0 ;
 faces = 1, 2, 3, 4, 2, 5, 3, _ ;
}"#;
        let dataset = Dataset::from_cdl(cdl).unwrap();
        let population = NativePopulator
            .populate(PopulatorInput::Dataset(&dataset))
            .unwrap();
        assert_eq!(population.nodes.len(), 5);
        assert_eq!(population.face_nodes.row(0), &[0, 1, 2, 3]);
        assert_eq!(population.face_nodes.row(1), &[1, 4, 2]);
        assert_eq!(population.topology.unwrap().topology_dimension, 2);
    }

    /// Three nodes and one face, with extra declarations and face data given
    fn triangle(extra: &str, faces: &str) -> Dataset {
        let cdl = format!(
            r#"netcdf ux {{
dimensions:
    nMesh2_node = 3 ;
    nMesh2_face = 1 ;
    nMaxMesh2_face_nodes = 3 ;
    two = 2 ;
variables:
    int Mesh2 ;
        Mesh2:cf_role = "mesh_topology" ;
        Mesh2:node_coordinates = "Mesh2_node_x Mesh2_node_y" ;
        Mesh2:face_node_connectivity = "Mesh2_face_nodes" ;
    double Mesh2_node_x(nMesh2_node) ;
    double Mesh2_node_y(nMesh2_node) ;
    int Mesh2_face_nodes(nMesh2_face, nMaxMesh2_face_nodes) ;
{extra}
data:
 Mesh2 = 0 ;
 Mesh2_node_x = 0, 1, 0 ;
 Mesh2_node_y = 0, 0, 1 ;
 Mesh2_face_nodes = {faces} ;
}}"#
        );
        Dataset::from_cdl(&cdl).unwrap()
    }

    #[test]
    fn dangling_node_id() {
        let dataset = triangle("", "0, 1, 7");
        let error = NativePopulator
            .populate(PopulatorInput::Dataset(&dataset))
            .unwrap_err();
        assert!(matches!(
            error.root_cause().downcast_ref::<GridError>(),
            Some(GridError::InvalidConnectivity(_))
        ));

        // the last node is fine
        let dataset = triangle("", "0, 1, 2");
        assert!(NativePopulator
            .populate(PopulatorInput::Dataset(&dataset))
            .is_ok());
    }

    #[test]
    fn z_must_match_nodes() {
        let dataset = triangle("    double Mesh2_node_z(two) ;", "0, 1, 2");
        assert!(NativePopulator
            .populate(PopulatorInput::Dataset(&dataset))
            .is_err());
    }

    #[test]
    fn missing_marker() {
        let dataset = Dataset::new("empty");
        assert!(NativePopulator
            .populate(PopulatorInput::Dataset(&dataset))
            .is_err());
    }
}
