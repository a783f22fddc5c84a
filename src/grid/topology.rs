//! Mesh topology metadata of the native convention
//!
//! The native convention follows the UGRID/CF layout, where a dummy integer
//! variable named `Mesh2` carries attributes describing which other variables
//! hold the node coordinates and the face connectivity.

// internal modules
use crate::dataset::{DataType, Values, Variable};

// external crates
use serde::Serialize;

/// Name of the topology variable in native datasets
pub const TOPOLOGY_VARIABLE: &str = "Mesh2";

/// Conventional attributes of the `Mesh2` topology variable
///
/// Defaults are the values synthesised when promoting a foreign format to the
/// native representation. A `topology_dimension` of -1 means "not yet
/// determined", and is only replaced by [Grid::validate](crate::grid::Grid::validate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeshTopology {
    pub cf_role: String,
    pub long_name: String,
    pub topology_dimension: i64,
    pub node_coordinates: String,
    pub node_dimension: String,
    pub face_node_connectivity: String,
    pub face_dimension: String,
}

impl Default for MeshTopology {
    fn default() -> Self {
        Self {
            cf_role: "mesh_topology".into(),
            long_name: "Topology data of 2D unstructured mesh".into(),
            topology_dimension: -1,
            node_coordinates: "Mesh2_node_x Mesh2_node_y".into(),
            node_dimension: "nMesh2_node".into(),
            face_node_connectivity: "Mesh2_face_nodes".into(),
            face_dimension: "nMesh2_face".into(),
        }
    }
}

impl MeshTopology {
    /// Has a validation step set the dimension yet?
    pub fn is_determined(&self) -> bool {
        self.topology_dimension >= 0
    }

    /// Names of the node coordinate variables, x first
    pub fn node_coordinate_names(&self) -> Vec<&str> {
        self.node_coordinates.split_whitespace().collect()
    }

    /// Read the attributes back from a topology variable
    ///
    /// Missing attributes keep their defaults, so a bare `Mesh2` marker still
    /// points at the conventional variable names.
    pub fn from_variable(variable: &Variable) -> Self {
        let defaults = Self::default();
        let text = |name: &str, default: String| {
            variable
                .text_attribute(name)
                .map(|s| s.to_string())
                .unwrap_or(default)
        };

        Self {
            cf_role: text("cf_role", defaults.cf_role),
            long_name: text("long_name", defaults.long_name),
            topology_dimension: variable
                .int_attribute("topology_dimension")
                .unwrap_or(defaults.topology_dimension),
            node_coordinates: text("node_coordinates", defaults.node_coordinates),
            node_dimension: text("node_dimension", defaults.node_dimension),
            face_node_connectivity: text(
                "face_node_connectivity",
                defaults.face_node_connectivity,
            ),
            face_dimension: text("face_dimension", defaults.face_dimension),
        }
    }

    /// Scalar topology variable carrying these attributes
    pub fn to_variable(&self) -> Variable {
        let text = |s: &str| Values::Text(s.to_string());
        Variable::new(
            TOPOLOGY_VARIABLE,
            DataType::Int,
            &[],
            Values::Integer(vec![0]),
        )
        .with_attribute("cf_role", text(&self.cf_role))
        .with_attribute("long_name", text(&self.long_name))
        .with_attribute(
            "topology_dimension",
            Values::Integer(vec![self.topology_dimension]),
        )
        .with_attribute("node_coordinates", text(&self.node_coordinates))
        .with_attribute("node_dimension", text(&self.node_dimension))
        .with_attribute("face_node_connectivity", text(&self.face_node_connectivity))
        .with_attribute("face_dimension", text(&self.face_dimension))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_defaults() {
        let topology = MeshTopology::default();
        assert_eq!(topology.topology_dimension, -1);
        assert!(!topology.is_determined());
        assert_eq!(topology.node_coordinate_names(), vec!["Mesh2_node_x", "Mesh2_node_y"]);
    }

    #[test]
    fn variable_round_trip() {
        let mut topology = MeshTopology::default();
        topology.topology_dimension = 2;
        let variable = topology.to_variable();
        assert_eq!(variable.name, "Mesh2");
        assert_eq!(variable.text_attribute("cf_role"), Some("mesh_topology"));
        assert_eq!(MeshTopology::from_variable(&variable), topology);
    }

    #[test]
    fn bare_marker_uses_defaults() {
        let variable = Variable::new("Mesh2", DataType::Int, &[], Values::Integer(vec![0]))
            .with_attribute("face_node_connectivity", Values::Text("faces".into()));
        let topology = MeshTopology::from_variable(&variable);
        assert_eq!(topology.face_node_connectivity, "faces");
        assert_eq!(topology.node_dimension, "nMesh2_node");
    }
}
