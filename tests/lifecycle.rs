//! Mesh lifecycle operations on grids read from the sample files

use std::path::PathBuf;

use rstest::{fixture, rstest};
use uxgrid::error::GridError;
use uxgrid::grid::{Grid, MeshFormat};

#[fixture]
fn exodus1() -> Grid {
    Grid::open("./data/exodus1.cdl").unwrap()
}

/// Unique path in the temp directory, removed if it already exists
fn scratch(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("uxgrid_{}_{name}", std::process::id()));
    let _ = std::fs::remove_file(&path);
    path
}

#[rstest]
#[case("./data/exodus1.cdl")]
#[case("./data/scrip.cdl")]
#[case("./data/ux.cdl")]
#[case("./data/squares.shp")]
fn builders_are_idempotent(#[case] path: &str) {
    let mut grid = Grid::open(path).unwrap();

    let area = grid.calculate_total_face_area().unwrap();
    assert_eq!(
        grid.calculate_total_face_area().unwrap().to_bits(),
        area.to_bits()
    );

    let node_faces = grid.build_node_face_connectivity().unwrap().clone();
    assert_eq!(grid.build_node_face_connectivity().unwrap(), &node_faces);

    let edge_faces = grid.build_edge_face_connectivity().unwrap().clone();
    assert_eq!(grid.build_edge_face_connectivity().unwrap(), &edge_faces);

    let bounds = grid.build_latlon_bounds().unwrap().to_vec();
    assert_eq!(grid.build_latlon_bounds().unwrap(), bounds.as_slice());

    grid.validate().unwrap();
    grid.validate().unwrap();
}

#[rstest]
fn connectivity_matches_nodes(mut exodus1: Grid) {
    let n_nodes = exodus1.n_nodes();
    let n_faces = exodus1.n_faces();

    let node_faces = exodus1.build_node_face_connectivity().unwrap();
    assert_eq!(node_faces.len(), n_nodes);
    assert!(node_faces.max_index().unwrap() < n_faces);

    // 2 triangles + 1 quad, with two shared edges
    let edge_faces = exodus1.build_edge_face_connectivity().unwrap();
    assert_eq!(edge_faces.len(), 8);
    assert_eq!(edge_faces.rows().filter(|f| f.len() == 2).count(), 2);
    assert!(exodus1.edge_nodes().unwrap().max_index().unwrap() < n_nodes);
}

#[rstest]
fn area_and_bounds(mut exodus1: Grid) {
    assert_eq!(exodus1.calculate_total_face_area().unwrap(), 2.0);
    assert_eq!(exodus1.total_face_area(), Some(2.0));

    let bounds = exodus1.build_latlon_bounds().unwrap();
    assert_eq!(bounds.len(), 3);
    assert_eq!(bounds[2].lon_min, 1.0);
    assert_eq!(bounds[2].lon_max, 2.0);
    assert_eq!(bounds[2].lat_max, 1.0);
}

#[rstest]
fn validate_sets_dimension(mut exodus1: Grid) {
    assert_eq!(exodus1.topology().unwrap().topology_dimension, -1);
    exodus1.validate().unwrap();
    assert_eq!(exodus1.topology().unwrap().topology_dimension, 2);

    // the dataset records the result too
    let mesh2 = exodus1.dataset().unwrap().variable("Mesh2").unwrap();
    assert_eq!(mesh2.int_attribute("topology_dimension"), Some(2));
}

#[test]
fn lifecycle_on_stub_grid() {
    let mut grid = Grid::from_arg("ne30np4").unwrap();
    let error = grid.build_edge_face_connectivity().unwrap_err();
    assert!(matches!(
        error.downcast_ref::<GridError>(),
        Some(GridError::NotPopulated(_))
    ));
}

#[rstest]
fn rename_does_no_io(mut exodus1: Grid) {
    let old = PathBuf::from("./data/exodus1.cdl");
    let new = exodus1.rename("renamed_exodus1.cdl").unwrap().to_path_buf();

    assert_eq!(new, PathBuf::from("./data/renamed_exodus1.cdl"));
    assert_eq!(exodus1.file_path(), Some(new.as_path()));
    assert!(old.exists());
    assert!(!new.exists());
    assert_eq!(exodus1.format(), MeshFormat::Exodus1);
    assert_eq!(exodus1.n_nodes(), 6);
}

#[test]
fn dangling_native_node_is_rejected() {
    let text = std::fs::read_to_string("./data/mixed_markers.cdl")
        .unwrap()
        .replace(" Mesh2_face_nodes = 0, 1, 2, 0, 2, 3 ;", " Mesh2_face_nodes = 0, 1, 7, 0, 2, 3 ;");
    let target = scratch("dangling.cdl");
    std::fs::write(&target, text).unwrap();

    let result = Grid::open(&target);
    std::fs::remove_file(&target).unwrap();

    let error = result.unwrap_err();
    assert!(matches!(
        error.downcast_ref::<GridError>(),
        Some(GridError::InvalidConnectivity(_))
    ));
}

#[test]
fn validate_needs_faces() {
    let mut grid = Grid::open("./data/scrip_centers.cdl").unwrap();
    assert_eq!(grid.n_faces(), 0);
    let error = grid.validate().unwrap_err();
    assert!(matches!(
        error.downcast_ref::<GridError>(),
        Some(GridError::InvalidConnectivity(_))
    ));
}

#[test]
fn huge_ugrid_header_is_an_error() {
    let target = scratch("huge.ugrid");
    std::fs::write(&target, "4000000000000000000 0 0 0 0 0 0\n").unwrap();
    let result = Grid::open(&target);
    std::fs::remove_file(&target).unwrap();
    assert!(result.is_err());
}

#[test]
fn write_without_dataset() {
    let grid = Grid::open("./data/mesh.ugrid").unwrap();
    let target = scratch("no_dataset.cdl");

    let error = grid.write(&target, "netcdf").unwrap_err();
    assert_eq!(
        error.downcast_ref::<GridError>(),
        Some(&GridError::NoDataset)
    );
    assert!(!target.exists());
}

#[rstest]
#[case("./data/exodus1.cdl")]
#[case("./data/exodus2.cdl")]
#[case("./data/scrip.cdl")]
fn promoted_grids_read_back_as_native(#[case] path: &str) {
    let mut grid = Grid::open(path).unwrap();
    grid.validate().unwrap();

    let target = scratch(&format!(
        "native_{}",
        PathBuf::from(path).file_name().unwrap().to_string_lossy()
    ));
    grid.write(&target, "").unwrap();

    let native = Grid::open(&target).unwrap();
    std::fs::remove_file(&target).unwrap();

    assert_eq!(native.format(), MeshFormat::UXNative);
    assert_eq!(native.nodes(), grid.nodes());
    assert_eq!(native.face_nodes(), grid.face_nodes());
    assert_eq!(native.topology().unwrap().topology_dimension, 2);
}

#[test]
fn native_round_trip() {
    let grid = Grid::open("./data/ux.cdl").unwrap();
    let target = scratch("ux_round_trip.cdl");
    grid.write(&target, "").unwrap();

    let again = Grid::open(&target).unwrap();
    std::fs::remove_file(&target).unwrap();
    assert_eq!(again.dataset(), grid.dataset());
}

#[test]
fn summary_serialises() {
    let mut grid = Grid::open("./data/scrip.cdl").unwrap();
    grid.build_edge_face_connectivity().unwrap();
    let json = serde_json::to_value(grid.summary()).unwrap();
    assert_eq!(json["format"], "Scrip");
    assert_eq!(json["n_nodes"], 9);
    assert_eq!(json["n_edges"], 12);
}
