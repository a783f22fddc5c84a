//! Derived connectivity and per-face quantities
//!
//! Everything here is a pure function of the nodes and the face-node
//! connectivity, and iterates in a fixed order so repeated calls give
//! bit-identical results.

// internal modules
use crate::error::GridError;
use crate::grid::{Connectivity, FaceBounds, Nodes};
use crate::utils::{f, f64_extent};

// standard library
use std::collections::HashMap;

// external crates
use itertools::Itertools;

/// Faces touching each node, in ascending face order
pub fn node_faces(n_nodes: usize, face_nodes: &Connectivity) -> Connectivity {
    let mut rows: Vec<Vec<usize>> = vec![Vec::new(); n_nodes];
    for (face, row) in face_nodes.rows().enumerate() {
        for &node in row.iter().unique() {
            if let Some(faces) = rows.get_mut(node) {
                faces.push(face);
            }
        }
    }
    Connectivity::from_rows(rows)
}

/// Unique undirected edges and the faces that share each of them
///
/// Edges are numbered in the order they are first met walking each face's
/// boundary. Returns (edge -> nodes, edge -> faces).
pub fn edges(face_nodes: &Connectivity) -> (Connectivity, Connectivity) {
    let mut lookup: HashMap<(usize, usize), usize> = HashMap::new();
    let mut edge_nodes: Vec<(usize, usize)> = Vec::new();
    let mut edge_faces: Vec<Vec<usize>> = Vec::new();

    for (face, row) in face_nodes.rows().enumerate() {
        if row.len() < 2 {
            continue;
        }
        for (&a, &b) in row.iter().circular_tuple_windows() {
            if a == b {
                continue;
            }
            let key = (a.min(b), a.max(b));
            let edge = *lookup.entry(key).or_insert_with(|| {
                edge_nodes.push(key);
                edge_faces.push(Vec::new());
                edge_nodes.len() - 1
            });
            // a face can only list itself once per edge
            if edge_faces[edge].last() != Some(&face) {
                edge_faces[edge].push(face);
            }
        }
    }

    (
        Connectivity::from_rows(edge_nodes.into_iter().map(|(a, b)| [a, b])),
        Connectivity::from_rows(edge_faces),
    )
}

/// Per-face latitude/longitude bounds from the node coordinates
///
/// Plain coordinate extents, so faces crossing the antimeridian or a pole are
/// not treated specially. Faces without nodes get NaN bounds.
pub fn latlon_bounds(nodes: &Nodes, face_nodes: &Connectivity) -> Vec<FaceBounds> {
    face_nodes
        .rows()
        .map(|row| {
            let lon = f64_extent(row.iter().map(|&n| nodes.x[n]));
            let lat = f64_extent(row.iter().map(|&n| nodes.y[n]));
            match (lat, lon) {
                (Some((lat_min, lat_max)), Some((lon_min, lon_max))) => FaceBounds {
                    lat_min,
                    lat_max,
                    lon_min,
                    lon_max,
                },
                _ => FaceBounds {
                    lat_min: f64::NAN,
                    lat_max: f64::NAN,
                    lon_min: f64::NAN,
                    lon_max: f64::NAN,
                },
            }
        })
        .collect()
}

/// Planar area of a single face with the shoelace formula
pub fn face_area(nodes: &Nodes, face: &[usize]) -> f64 {
    if face.len() < 3 {
        return 0.0;
    }
    let twice_area: f64 = face
        .iter()
        .circular_tuple_windows()
        .map(|(&a, &b)| {
            let (xa, ya) = nodes.xy(a);
            let (xb, yb) = nodes.xy(b);
            xa * yb - xb * ya
        })
        .sum();
    0.5 * twice_area.abs()
}

/// Sum of all planar face areas, in face order
pub fn total_face_area(nodes: &Nodes, face_nodes: &Connectivity) -> f64 {
    face_nodes.rows().map(|row| face_area(nodes, row)).sum()
}

/// Check that connectivity only references existing nodes
pub fn check_node_ids(n_nodes: usize, face_nodes: &Connectivity) -> Result<(), GridError> {
    for (face, row) in face_nodes.rows().enumerate() {
        if let Some(node) = row.iter().find(|&&n| n >= n_nodes) {
            return Err(GridError::InvalidConnectivity(f!(
                "face {face} references node {node}, but there are only {n_nodes} nodes"
            )));
        }
    }
    Ok(())
}

/// Check that connectivity only references existing nodes
///
/// Faces also need at least three nodes.
pub fn check_face_nodes(n_nodes: usize, face_nodes: &Connectivity) -> Result<(), GridError> {
    for (face, row) in face_nodes.rows().enumerate() {
        if row.len() < 3 {
            return Err(GridError::InvalidConnectivity(f!(
                "face {face} has {} nodes, expected at least 3",
                row.len()
            )));
        }
    }
    check_node_ids(n_nodes, face_nodes)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two unit squares side by side
    ///
    /// ```text
    /// 3---4---5
    /// | 0 | 1 |
    /// 0---1---2
    /// ```
    fn two_squares() -> (Nodes, Connectivity) {
        let nodes = Nodes::new(
            vec![0.0, 1.0, 2.0, 0.0, 1.0, 2.0],
            vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0],
        );
        let faces = Connectivity::from_rows(vec![vec![0, 1, 4, 3], vec![1, 2, 5, 4]]);
        (nodes, faces)
    }

    #[test]
    fn node_faces_are_ascending() {
        let (nodes, faces) = two_squares();
        let nf = node_faces(nodes.len(), &faces);
        assert_eq!(nf.len(), 6);
        assert_eq!(nf.row(0), &[0]);
        assert_eq!(nf.row(1), &[0, 1]);
        assert_eq!(nf.row(4), &[0, 1]);
        assert_eq!(nf.row(5), &[1]);
    }

    #[test]
    fn shared_edge_has_two_faces() {
        let (_, faces) = two_squares();
        let (edge_nodes, edge_faces) = edges(&faces);
        assert_eq!(edge_nodes.len(), 7);
        let shared = edge_nodes.rows().position(|e| e == [1, 4]).unwrap();
        assert_eq!(edge_faces.row(shared), &[0, 1]);
        assert_eq!(edge_faces.rows().filter(|f| f.len() == 1).count(), 6);
    }

    #[test]
    fn bounds_and_area() {
        let (nodes, faces) = two_squares();
        let bounds = latlon_bounds(&nodes, &faces);
        assert_eq!(
            bounds[1],
            FaceBounds {
                lat_min: 0.0,
                lat_max: 1.0,
                lon_min: 1.0,
                lon_max: 2.0
            }
        );
        assert_eq!(face_area(&nodes, faces.row(0)), 1.0);
        assert_eq!(total_face_area(&nodes, &faces), 2.0);
    }

    #[test]
    fn invalid_connectivity() {
        let (nodes, _) = two_squares();
        let faces = Connectivity::from_rows(vec![vec![0, 1, 9]]);
        assert!(check_face_nodes(nodes.len(), &faces).is_err());
        let faces = Connectivity::from_rows(vec![vec![0, 1]]);
        assert!(check_face_nodes(nodes.len(), &faces).is_err());
        // too few nodes for a face, but every id exists
        assert!(check_node_ids(nodes.len(), &faces).is_ok());
    }
}
