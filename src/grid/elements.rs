//! Nodes and ragged connectivity
//!
//! Grid files can be large, so both types keep flat vectors rather than a
//! `Vec` per node or per face.

// external crates
use serde::Serialize;

/// Node coordinates stored as separate arrays, as in the file conventions
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Nodes {
    /// x or longitude
    pub x: Vec<f64>,
    /// y or latitude
    pub y: Vec<f64>,
    /// z, for cartesian 3D grids only
    pub z: Option<Vec<f64>>,
}

impl Nodes {
    /// 2D nodes
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Self {
        Self { x, y, z: None }
    }

    /// 3D nodes
    pub fn with_z(x: Vec<f64>, y: Vec<f64>, z: Vec<f64>) -> Self {
        Self { x, y, z: Some(z) }
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// 2 or 3
    pub fn dimension(&self) -> usize {
        match self.z {
            Some(_) => 3,
            None => 2,
        }
    }

    /// Planar (x, y) of a node
    pub fn xy(&self, index: usize) -> (f64, f64) {
        (self.x[index], self.y[index])
    }

    /// Append a node, keeping z consistent
    pub fn push(&mut self, x: f64, y: f64, z: Option<f64>) {
        self.x.push(x);
        self.y.push(y);
        if let (Some(zs), Some(z)) = (self.z.as_mut(), z) {
            zs.push(z);
        }
    }
}

/// Ragged index mapping, e.g. face -> nodes
///
/// Row `i` is `indices[offsets[i]..offsets[i + 1]]`.
///
/// ```rust
/// # use uxgrid::grid::Connectivity;
/// let faces = Connectivity::from_rows(vec![vec![0, 1, 2], vec![2, 1, 3, 4]]);
/// assert_eq!(faces.len(), 2);
/// assert_eq!(faces.row(1), &[2, 1, 3, 4]);
/// assert_eq!(faces.max_index(), Some(4));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Connectivity {
    offsets: Vec<usize>,
    indices: Vec<usize>,
}

impl Default for Connectivity {
    fn default() -> Self {
        Self {
            offsets: vec![0],
            indices: Vec::new(),
        }
    }
}

impl Connectivity {
    /// Just calls Default::default()
    pub fn new() -> Self {
        Default::default()
    }

    /// Build from any nested iterable of indices
    pub fn from_rows<I, R>(rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = usize>,
    {
        let mut connectivity = Self::new();
        for row in rows {
            connectivity.push_row(row);
        }
        connectivity
    }

    /// Append one row
    pub fn push_row<R: IntoIterator<Item = usize>>(&mut self, row: R) {
        self.indices.extend(row);
        self.offsets.push(self.indices.len());
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Indices of one row
    pub fn row(&self, index: usize) -> &[usize] {
        &self.indices[self.offsets[index]..self.offsets[index + 1]]
    }

    /// Iterate over all rows in order
    pub fn rows(&self) -> impl Iterator<Item = &[usize]> + '_ {
        self.offsets
            .windows(2)
            .map(move |w| &self.indices[w[0]..w[1]])
    }

    /// Largest row length
    pub fn max_row_len(&self) -> usize {
        self.offsets.windows(2).map(|w| w[1] - w[0]).max().unwrap_or(0)
    }

    /// Largest index referenced anywhere
    pub fn max_index(&self) -> Option<usize> {
        self.indices.iter().max().copied()
    }

    /// Total number of indices across all rows
    pub fn n_indices(&self) -> usize {
        self.indices.len()
    }
}

/// Latitude/longitude bounding box of a face
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FaceBounds {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_connectivity() {
        let c = Connectivity::new();
        assert!(c.is_empty());
        assert_eq!(c.rows().count(), 0);
        assert_eq!(c.max_index(), None);
        assert_eq!(c.max_row_len(), 0);
    }

    #[test]
    fn ragged_rows() {
        let mut c = Connectivity::new();
        c.push_row([3, 4, 5]);
        c.push_row(Vec::new());
        c.push_row([0, 1, 2, 3]);
        assert_eq!(c.len(), 3);
        assert_eq!(c.row(1), &[] as &[usize]);
        assert_eq!(c.max_row_len(), 4);
        assert_eq!(c.n_indices(), 7);
        let rows: Vec<&[usize]> = c.rows().collect();
        assert_eq!(rows[2], &[0, 1, 2, 3]);
    }

    #[test]
    fn nodes_keep_z_in_step() {
        let mut n = Nodes::with_z(vec![0.0], vec![1.0], vec![2.0]);
        n.push(3.0, 4.0, Some(5.0));
        assert_eq!(n.len(), 2);
        assert_eq!(n.dimension(), 3);
        assert_eq!(n.z, Some(vec![2.0, 5.0]));
        assert_eq!(n.xy(1), (3.0, 4.0));
    }
}
