//! Populators for Exodus II datasets
//!
//! Two layouts exist in the wild. Older files store the node coordinates as
//! separate `coordx`/`coordy`/`coordz` variables, newer ones as a single
//! `coord(num_dim, num_nodes)` array. Element connectivity is the same for
//! both: blocks `connect1`, `connect2`, ... of shape
//! `(num_el_in_blk, num_nod_per_el)` with 1-based node ids.

// internal modules
use crate::dataset::Dataset;
use crate::error::GridError;
use crate::grid::{Connectivity, MeshFormat, MeshTopology, Nodes, TOPOLOGY_VARIABLE};
use crate::readers::{expect_dataset, FormatPopulator, Population, PopulatorInput};
use crate::utils::f;

// external crates
use anyhow::{bail, Context, Result};
use log::{debug, trace};

/// Exodus datasets with `coordx`, `coordy` and optional `coordz`
#[derive(Debug, Default, Clone, Copy)]
pub struct Exodus1Populator;

impl FormatPopulator for Exodus1Populator {
    fn format(&self) -> MeshFormat {
        MeshFormat::Exodus1
    }

    fn populate(&self, input: PopulatorInput) -> Result<Population> {
        let dataset = expect_dataset(input, self.format())?;

        let x = dataset.doubles("coordx")?;
        let y = dataset.doubles("coordy")?;
        if x.len() != y.len() {
            bail!("coordx has {} values but coordy has {}", x.len(), y.len());
        }

        let nodes = match dataset.has_variable("coordz") {
            true => {
                let z = dataset.doubles("coordz")?;
                if z.len() != x.len() {
                    bail!("coordz has {} values but coordx has {}", z.len(), x.len());
                }
                Nodes::with_z(x, y, z)
            }
            false => Nodes::new(x, y),
        };

        let face_nodes = element_blocks(dataset, nodes.len())?;
        Ok(Population {
            nodes,
            face_nodes,
            topology: None,
        })
    }
}

/// Exodus datasets with a combined `coord` array
///
/// The `Mesh2` topology variable must already be in the dataset, and is read
/// back into the population.
#[derive(Debug, Default, Clone, Copy)]
pub struct Exodus2Populator;

impl FormatPopulator for Exodus2Populator {
    fn format(&self) -> MeshFormat {
        MeshFormat::Exodus2
    }

    fn populate(&self, input: PopulatorInput) -> Result<Population> {
        let dataset = expect_dataset(input, self.format())?;

        let topology = dataset
            .variable(TOPOLOGY_VARIABLE)
            .map(MeshTopology::from_variable)
            .context("Exodus2 topology must be seeded before population")?;

        let shape = dataset.shape("coord")?;
        let (n_dim, n_nodes) = match shape.as_slice() {
            &[n_dim, n_nodes] if (2..=3).contains(&n_dim) => (n_dim, n_nodes),
            _ => bail!("Expected coord(num_dim, num_nodes) with 2 or 3 dimensions, found {shape:?}"),
        };
        trace!("coord is {n_dim} x {n_nodes}");

        let coord = dataset.doubles("coord")?;
        let mut axes = coord.chunks_exact(n_nodes.max(1)).map(|c| c.to_vec());
        let x = axes.next().unwrap_or_default();
        let y = axes.next().unwrap_or_default();
        let nodes = match n_dim {
            3 => Nodes::with_z(x, y, axes.next().unwrap_or_default()),
            _ => Nodes::new(x, y),
        };

        let face_nodes = element_blocks(dataset, nodes.len())?;
        Ok(Population {
            nodes,
            face_nodes,
            topology: Some(topology),
        })
    }
}

/// Concatenate every `connectN` block in block order as 0-based faces
fn element_blocks(dataset: &Dataset, n_nodes: usize) -> Result<Connectivity> {
    let mut face_nodes = Connectivity::new();

    let mut block = 1;
    while dataset.has_variable(&f!("connect{block}")) {
        let name = f!("connect{block}");
        let shape = dataset.shape(&name)?;
        let &[n_elements, n_per_element] = shape.as_slice() else {
            bail!("Expected {name} to be two dimensional, found {shape:?}");
        };
        debug!("Element block {name}: {n_elements} elements of {n_per_element} nodes");

        let ids = dataset.integers(&name)?;
        for element in ids.chunks_exact(n_per_element.max(1)) {
            let row = element
                .iter()
                .map(|&id| to_node_index(id, n_nodes))
                .collect::<Result<Vec<usize>, GridError>>()
                .with_context(|| f!("Bad node id in {name}"))?;
            face_nodes.push_row(row);
        }
        block += 1;
    }

    if block == 1 {
        return Err(GridError::MissingVariable("connect1".into()).into());
    }
    Ok(face_nodes)
}

/// Convert a 1-based node id, checking it exists
fn to_node_index(id: i64, n_nodes: usize) -> Result<usize, GridError> {
    match usize::try_from(id) {
        Ok(id) if (1..=n_nodes).contains(&id) => Ok(id - 1),
        _ => Err(GridError::InvalidConnectivity(f!(
            "node id {id} outside 1..={n_nodes}"
        ))),
    }
}
