//! Populator for SCRIP remapping grid datasets
//!
//! SCRIP describes every cell independently by its center and corner
//! coordinates, so shared corners are repeated between neighbouring cells.
//! The canonical nodes are the unique corners, in the order first seen.

// internal modules
use crate::grid::{Connectivity, MeshFormat, Nodes};
use crate::readers::{expect_dataset, FormatPopulator, Population, PopulatorInput};

// standard library
use std::collections::HashMap;

// external crates
use anyhow::{bail, Result};
use itertools::Itertools;
use log::debug;

/// SCRIP datasets with `grid_center_lon/lat` and optional corners
#[derive(Debug, Default, Clone, Copy)]
pub struct ScripPopulator;

impl FormatPopulator for ScripPopulator {
    fn format(&self) -> MeshFormat {
        MeshFormat::Scrip
    }

    fn populate(&self, input: PopulatorInput) -> Result<Population> {
        let dataset = expect_dataset(input, self.format())?;

        if !dataset.has_variable("grid_corner_lon") {
            // nothing to build faces from, the centers are all there is
            let x = dataset.doubles("grid_center_lon")?;
            let y = dataset.doubles("grid_center_lat")?;
            if x.len() != y.len() {
                bail!("grid_center_lon/lat lengths differ, {} vs {}", x.len(), y.len());
            }
            debug!("No corners, using {} cell centers as nodes", x.len());
            return Ok(Population {
                nodes: Nodes::new(x, y),
                face_nodes: Connectivity::new(),
                topology: None,
            });
        }

        let shape = dataset.shape("grid_corner_lon")?;
        let &[n_cells, n_corners] = shape.as_slice() else {
            bail!("Expected grid_corner_lon(grid_size, grid_corners), found {shape:?}");
        };
        let lon = dataset.doubles("grid_corner_lon")?;
        let lat = dataset.doubles("grid_corner_lat")?;
        if lon.len() != lat.len() || lon.len() != n_cells * n_corners {
            bail!(
                "Corner arrays do not match grid_size x grid_corners ({n_cells} x {n_corners})"
            );
        }

        let mut nodes = Nodes::default();
        let mut lookup: HashMap<(u64, u64), usize> = HashMap::new();
        let mut face_nodes = Connectivity::new();

        for (cell_lon, cell_lat) in lon
            .chunks_exact(n_corners.max(1))
            .zip(lat.chunks_exact(n_corners.max(1)))
        {
            let mut row: Vec<usize> = cell_lon
                .iter()
                .zip(cell_lat)
                .map(|(&x, &y)| {
                    *lookup.entry((x.to_bits(), y.to_bits())).or_insert_with(|| {
                        nodes.push(x, y, None);
                        nodes.len() - 1
                    })
                })
                .dedup()
                .collect();

            // padding often repeats the first corner to close the ring
            if row.len() > 1 && row.first() == row.last() {
                row.pop();
            }
            face_nodes.push_row(row);
        }

        debug!(
            "{} cells share {} unique corners",
            face_nodes.len(),
            nodes.len()
        );
        Ok(Population {
            nodes,
            face_nodes,
            topology: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;

    #[test]
    fn shared_corners_are_merged() {
        let cdl = r#"netcdf scrip {
dimensions:
    grid_size = 2 ;
    grid_corners = 4 ;
variables:
    double grid_center_lon(grid_size) ;
    double grid_center_lat(grid_size) ;
    double grid_corner_lon(grid_size, grid_corners) ;
    double grid_corner_lat(grid_size, grid_corners) ;
data:
 grid_center_lon = 0.5, 1.5 ;
 grid_center_lat = 0.5, 0.5 ;
 grid_corner_lon = 0, 1, 1, 0, 1, 2, 2, 2 ;
 grid_corner_lat = 0, 0, 1, 1, 0, 0, 1, 1 ;
}"#;
        let dataset = Dataset::from_cdl(cdl).unwrap();
        let population = ScripPopulator
            .populate(PopulatorInput::Dataset(&dataset))
            .unwrap();

        // second cell is a triangle padded with a repeated corner
        assert_eq!(population.nodes.len(), 6);
        assert_eq!(population.face_nodes.row(0), &[0, 1, 2, 3]);
        assert_eq!(population.face_nodes.row(1), &[1, 4, 5]);
    }

    #[test]
    fn centers_only() {
        let cdl = r#"netcdf centers {
dimensions:
    grid_size = 3 ;
variables:
    double grid_center_lon(grid_size) ;
    double grid_center_lat(grid_size) ;
data:
 grid_center_lon = 10, 20, 30 ;
 grid_center_lat = -5, 0, 5 ;
}"#;
        let dataset = Dataset::from_cdl(cdl).unwrap();
        let population = ScripPopulator
            .populate(PopulatorInput::Dataset(&dataset))
            .unwrap();
        assert_eq!(population.nodes.x, vec![10.0, 20.0, 30.0]);
        assert!(population.face_nodes.is_empty());
    }
}
