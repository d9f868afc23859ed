//! Simplicial grids embedded in 3D space.
//!
//! Incidence relations are stored as sparsity patterns,
//! with the major dimension being the entity that owns the relation.

pub mod mortar;

pub use mortar::MortarGrid;

use crate::{
  error::{Error, Result},
  linalg::{factorial, DMatrixExt as _},
  Dim,
};

use nas::pattern::SparsityPattern;
use std::collections::{hash_map, HashMap};

pub type NodeIdx = usize;
pub type CellIdx = usize;
pub type FaceIdx = usize;

/// A simplicial grid of topological dimension `dim` in 3D.
///
/// Faces are the `(dim-1)`-simplicies. A 0-dimensional grid consists of a single
/// point cell and has no faces.
#[derive(Debug, Clone)]
pub struct Grid {
  dim: Dim,
  /// Node coordinates in the columns.
  nodes: na::Matrix3xX<f64>,
  /// ncells x nnodes
  cell_nodes: SparsityPattern,
  /// nfaces x nnodes
  face_nodes: SparsityPattern,
  /// ncells x nfaces
  cell_faces: SparsityPattern,
  /// nfaces x ncells
  face_cells: SparsityPattern,
  cell_volumes: na::DVector<f64>,
  cell_centers: na::Matrix3xX<f64>,
  face_areas: na::DVector<f64>,
  face_centers: na::Matrix3xX<f64>,
  /// Area weighted normals, pointing out of the first cell of the face.
  face_normals: na::Matrix3xX<f64>,
}

impl Grid {
  /// Builds a grid from its node coordinates and cell-node lists.
  ///
  /// `nodes` may have fewer than 3 rows, missing coordinates are zero.
  /// Faces are numbered in order of first appearance.
  pub fn from_simplices(
    dim: Dim,
    nodes: na::DMatrix<f64>,
    cells: Vec<Vec<NodeIdx>>,
  ) -> Result<Self> {
    assert!(dim <= 3, "Grids live in at most 3 dimensions.");
    assert!(nodes.nrows() <= 3, "Node coordinates are at most 3 dimensional.");
    let nnodes = nodes.ncols();
    let nodes = embed(&nodes);

    let mut cells = cells;
    for (icell, cell) in cells.iter_mut().enumerate() {
      if cell.len() != dim + 1 {
        return Err(Error::SimplexNodes {
          dim,
          expected: dim + 1,
          found: cell.len(),
        });
      }
      if let Some(&inode) = cell.iter().find(|&&inode| inode >= nnodes) {
        return Err(Error::IndexOutOfBounds {
          what: "cell node",
          index: inode,
          len: nnodes,
        });
      }
      cell.sort_unstable();
      if cell.windows(2).any(|w| w[0] == w[1]) {
        return Err(Error::DegenerateCell { cell: icell });
      }
    }

    let mut faces: Vec<Vec<NodeIdx>> = Vec::new();
    let mut face_lookup = HashMap::new();
    let mut cell_faces: Vec<Vec<FaceIdx>> = Vec::with_capacity(cells.len());
    if dim > 0 {
      for cell in &cells {
        let mut this_faces = Vec::with_capacity(dim + 1);
        for iomit in 0..cell.len() {
          let mut face = cell.clone();
          face.remove(iomit);
          let iface = match face_lookup.entry(face) {
            hash_map::Entry::Occupied(e) => *e.get(),
            hash_map::Entry::Vacant(e) => {
              faces.push(e.key().clone());
              *e.insert(faces.len() - 1)
            }
          };
          this_faces.push(iface);
        }
        this_faces.sort_unstable();
        cell_faces.push(this_faces);
      }
    } else {
      cell_faces = vec![Vec::new(); cells.len()];
    }
    let nfaces = faces.len();

    let cell_faces = pattern_from_lanes(nfaces, &cell_faces);
    let face_cells = cell_faces.transpose();

    let cell_volumes = na::DVector::from_iterator(
      cells.len(),
      cells.iter().map(|cell| simplex_volume(&nodes, cell)),
    );
    let cell_centers = centers(&nodes, &cells);
    let face_areas =
      na::DVector::from_iterator(nfaces, faces.iter().map(|face| simplex_volume(&nodes, face)));
    let face_centers = centers(&nodes, &faces);

    let mut face_normals = na::Matrix3xX::zeros(nfaces);
    for (iface, face) in faces.iter().enumerate() {
      let icell = face_cells.lane(iface)[0];
      let outward = face_centers.column(iface) - cell_centers.column(icell);
      let normal = orthogonal_to_simplex(&nodes, face, outward.into_owned());
      if let Some(unit) = normal.try_normalize(f64::EPSILON) {
        face_normals.set_column(iface, &(face_areas[iface] * unit));
      }
    }

    tracing::debug!(
      "built {dim}-grid with {} nodes, {} cells, {} faces",
      nnodes,
      cells.len(),
      nfaces
    );

    Ok(Self {
      dim,
      nodes,
      cell_nodes: pattern_from_lanes(nnodes, &cells),
      face_nodes: pattern_from_lanes(nnodes, &faces),
      cell_faces,
      face_cells,
      cell_volumes,
      cell_centers,
      face_areas,
      face_centers,
      face_normals,
    })
  }

  /// A 0-dimensional grid consisting of a single point.
  pub fn point(coord: na::Vector3<f64>) -> Self {
    let nodes = na::Matrix3xX::from_columns(&[coord]);
    let cell_nodes = pattern_from_lanes(1, &[vec![0]]);
    let cell_faces = pattern_from_lanes(0, &[vec![]]);
    Self {
      dim: 0,
      cell_centers: nodes.clone(),
      nodes,
      cell_nodes,
      face_nodes: pattern_from_lanes(1, &[]),
      face_cells: cell_faces.transpose(),
      cell_faces,
      cell_volumes: na::DVector::from_element(1, 1.0),
      face_areas: na::DVector::zeros(0),
      face_centers: na::Matrix3xX::zeros(0),
      face_normals: na::Matrix3xX::zeros(0),
    }
  }

  pub fn dim(&self) -> Dim {
    self.dim
  }
  pub fn nnodes(&self) -> usize {
    self.nodes.ncols()
  }
  pub fn ncells(&self) -> usize {
    self.cell_nodes.major_dim()
  }
  pub fn nfaces(&self) -> usize {
    self.face_nodes.major_dim()
  }

  pub fn nodes(&self) -> &na::Matrix3xX<f64> {
    &self.nodes
  }
  pub fn cell_nodes(&self) -> &SparsityPattern {
    &self.cell_nodes
  }
  pub fn face_nodes(&self) -> &SparsityPattern {
    &self.face_nodes
  }
  pub fn cell_faces(&self) -> &SparsityPattern {
    &self.cell_faces
  }
  pub fn face_cells(&self) -> &SparsityPattern {
    &self.face_cells
  }
  pub fn cell_volumes(&self) -> &na::DVector<f64> {
    &self.cell_volumes
  }
  pub fn cell_centers(&self) -> &na::Matrix3xX<f64> {
    &self.cell_centers
  }
  pub fn face_areas(&self) -> &na::DVector<f64> {
    &self.face_areas
  }
  pub fn face_centers(&self) -> &na::Matrix3xX<f64> {
    &self.face_centers
  }
  pub fn face_normals(&self) -> &na::Matrix3xX<f64> {
    &self.face_normals
  }

  /// The first (lowest index) cell adjacent to each face.
  pub fn face_cell_map(&self) -> Vec<CellIdx> {
    (0..self.nfaces())
      .map(|iface| self.face_cells.lane(iface)[0])
      .collect()
  }

  /// Boundary faces only have 1 cell as super entity.
  pub fn is_boundary_face(&self, iface: FaceIdx) -> bool {
    self.face_cells.lane(iface).len() == 1
  }

  pub fn boundary_faces(&self) -> Vec<FaceIdx> {
    (0..self.nfaces())
      .filter(|&iface| self.is_boundary_face(iface))
      .collect()
  }
}

/// Sorted lanes to a pattern.
fn pattern_from_lanes(minor_dim: usize, lanes: &[Vec<usize>]) -> SparsityPattern {
  let mut offsets = Vec::with_capacity(lanes.len() + 1);
  offsets.push(0);
  let mut indices = Vec::new();
  for lane in lanes {
    indices.extend_from_slice(lane);
    offsets.push(indices.len());
  }
  SparsityPattern::try_from_offsets_and_indices(lanes.len(), minor_dim, offsets, indices)
    .expect("lanes are sorted and unique")
}

fn embed(coords: &na::DMatrix<f64>) -> na::Matrix3xX<f64> {
  let mut embedded = na::Matrix3xX::zeros(coords.ncols());
  embedded
    .rows_mut(0, coords.nrows())
    .copy_from(coords);
  embedded
}

/// Spanning vectors $x_i - x_0$ of the simplex in the columns.
fn spanning_vectors(nodes: &na::Matrix3xX<f64>, simplex: &[NodeIdx]) -> na::DMatrix<f64> {
  let base = nodes.column(simplex[0]);
  let mut spanning = na::DMatrix::zeros(3, simplex.len() - 1);
  for (i, &inode) in simplex.iter().skip(1).enumerate() {
    spanning.set_column(i, &(nodes.column(inode) - base));
  }
  spanning
}

/// Unsigned volume of the simplex; 1 for a point.
fn simplex_volume(nodes: &na::Matrix3xX<f64>, simplex: &[NodeIdx]) -> f64 {
  let dim = simplex.len() - 1;
  if dim == 0 {
    return 1.0;
  }
  spanning_vectors(nodes, simplex).gram_det_sqrt() / factorial(dim) as f64
}

fn centers(nodes: &na::Matrix3xX<f64>, simplicies: &[Vec<NodeIdx>]) -> na::Matrix3xX<f64> {
  let mut centers = na::Matrix3xX::zeros(simplicies.len());
  for (i, simplex) in simplicies.iter().enumerate() {
    let sum = simplex
      .iter()
      .fold(na::Vector3::zeros(), |acc, &inode| acc + nodes.column(inode));
    centers.set_column(i, &(sum / simplex.len() as f64));
  }
  centers
}

/// Component of `v` orthogonal to the tangent space of the simplex.
fn orthogonal_to_simplex(
  nodes: &na::Matrix3xX<f64>,
  simplex: &[NodeIdx],
  v: na::Vector3<f64>,
) -> na::Vector3<f64> {
  if simplex.len() < 2 {
    return v;
  }
  let spanning = spanning_vectors(nodes, simplex);
  let v = na::DVector::from_column_slice(v.as_slice());
  let projection = match spanning.gramian().try_inverse() {
    Some(gram_inv) => &spanning * gram_inv * spanning.transpose() * &v,
    None => na::DVector::zeros(3),
  };
  let orthogonal = v - projection;
  na::Vector3::new(orthogonal[0], orthogonal[1], orthogonal[2])
}

#[cfg(test)]
mod test {
  use super::*;

  fn unit_square() -> Grid {
    #[rustfmt::skip]
    let nodes = na::DMatrix::from_column_slice(2, 4, &[
      0.0, 0.0,
      1.0, 0.0,
      0.0, 1.0,
      1.0, 1.0,
    ]);
    Grid::from_simplices(2, nodes, vec![vec![0, 1, 3], vec![0, 2, 3]]).unwrap()
  }

  #[test]
  fn unit_square_topology() {
    let grid = unit_square();
    assert_eq!(grid.nnodes(), 4);
    assert_eq!(grid.ncells(), 2);
    assert_eq!(grid.nfaces(), 5);
    assert_eq!(grid.boundary_faces().len(), 4);
    for icell in 0..grid.ncells() {
      assert!((grid.cell_volumes()[icell] - 0.5).abs() < 1e-14);
      assert_eq!(grid.cell_faces().lane(icell).len(), 3);
    }
    let diagonal = (0..grid.nfaces())
      .find(|&iface| !grid.is_boundary_face(iface))
      .unwrap();
    assert_eq!(grid.face_nodes().lane(diagonal), &[0, 3]);
    assert!((grid.face_areas()[diagonal] - 2f64.sqrt()).abs() < 1e-14);
  }

  #[test]
  fn boundary_normals_point_outward() {
    let grid = unit_square();
    let center = na::Vector3::new(0.5, 0.5, 0.0);
    for iface in grid.boundary_faces() {
      let outward = grid.face_centers().column(iface) - center;
      let normal = grid.face_normals().column(iface);
      assert!(normal.dot(&outward) > 0.0);
      assert!((normal.norm() - grid.face_areas()[iface]).abs() < 1e-14);
    }
  }

  #[test]
  fn segment_faces_are_points() {
    let nodes = na::DMatrix::from_row_slice(1, 3, &[0.0, 0.5, 1.0]);
    let grid = Grid::from_simplices(1, nodes, vec![vec![0, 1], vec![1, 2]]).unwrap();
    assert_eq!(grid.nfaces(), 3);
    assert_eq!(grid.boundary_faces().len(), 2);
    assert!(grid.face_areas().iter().all(|&a| a == 1.0));
    assert_eq!(grid.face_cell_map(), vec![0, 0, 1]);
  }

  #[test]
  fn wrong_node_count_is_rejected() {
    let nodes = na::DMatrix::zeros(2, 3);
    let err = Grid::from_simplices(2, nodes, vec![vec![0, 1]]).unwrap_err();
    assert!(matches!(err, Error::SimplexNodes { expected: 3, found: 2, .. }));
  }

  #[test]
  fn point_grid() {
    let grid = Grid::point(na::Vector3::new(0.5, 0.0, 0.0));
    assert_eq!(grid.dim(), 0);
    assert_eq!(grid.nnodes(), 1);
    assert_eq!(grid.ncells(), 1);
    assert_eq!(grid.nfaces(), 0);
    assert_eq!(grid.cell_nodes().lane(0), &[0]);
  }
}
