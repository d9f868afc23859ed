//! Mapping of lower dimensional grids into their own reference frame.
//!
//! A 2-grid is rotated such that its normal becomes the z axis, a 1-grid such
//! that its tangent becomes the z axis. Grids already lying in that frame keep
//! the ambient coordinates.

use crate::{grid::Grid, Dim};

/// Relative extent below which a rotated coordinate counts as constant.
const FLATNESS_TOL: f64 = 1e-10;

/// The geometry of a grid expressed in its intrinsic frame.
#[derive(Debug, Clone)]
pub struct ReferenceFrame {
  rotation: na::Rotation3<f64>,
  active: [bool; 3],
  /// Active coordinates of the nodes, `dim x nnodes`.
  node_coords: na::DMatrix<f64>,
}

impl ReferenceFrame {
  /// Proper rotation from the ambient frame into the reference frame.
  pub fn rotation(&self) -> &na::Rotation3<f64> {
    &self.rotation
  }
  /// Which rotated coordinates span the grid.
  pub fn active(&self) -> &[bool; 3] {
    &self.active
  }
  pub fn dim(&self) -> Dim {
    self.active.iter().filter(|&&a| a).count()
  }
  pub fn node_coords(&self) -> &na::DMatrix<f64> {
    &self.node_coords
  }

  /// Rotates a tensor given in the ambient frame and keeps the active block.
  pub fn reduce_tensor(&self, tensor: &na::Matrix3<f64>) -> na::DMatrix<f64> {
    let r = self.rotation.matrix();
    let rotated = r * tensor * r.transpose();
    let active = self.active_indices();
    na::DMatrix::from_fn(active.len(), active.len(), |i, j| {
      rotated[(active[i], active[j])]
    })
  }

  /// Active coordinates of ambient points, e.g. cell or face centers.
  pub fn reduce_points(&self, points: &na::Matrix3xX<f64>) -> na::DMatrix<f64> {
    reduce_rows(&(self.rotation.matrix() * points), &self.active)
  }

  fn active_indices(&self) -> Vec<usize> {
    (0..3).filter(|&i| self.active[i]).collect()
  }
}

/// Computes the reference frame of the grid.
///
/// The active dimensions are the rotated coordinates that vary over the nodes.
/// 0-grids and 3-grids keep the ambient frame.
pub fn map_grid(grid: &Grid) -> ReferenceFrame {
  let dim = grid.dim();
  let rotation = match dim {
    1 | 2 => alignment_rotation(grid),
    _ => na::Rotation3::identity(),
  };
  debug_assert!((rotation.matrix().determinant() - 1.0).abs() < 1e-10);

  let rotated = rotation.matrix() * grid.nodes();
  let active = active_dims(&rotated, dim);
  let node_coords = reduce_rows(&rotated, &active);
  ReferenceFrame {
    rotation,
    active,
    node_coords,
  }
}

/// Minimal rotation taking the normal of a 2-grid, or the tangent of a 1-grid, onto z.
fn alignment_rotation(grid: &Grid) -> na::Rotation3<f64> {
  let Some(direction) = characteristic_direction(grid) else {
    return na::Rotation3::identity();
  };
  let direction = canonical_sign(direction);
  // never antiparallel after the sign choice
  na::Rotation3::rotation_between(&direction, &na::Vector3::z())
    .unwrap_or_else(na::Rotation3::identity)
}

/// Unit normal (2-grid) or tangent (1-grid) of the largest cell.
fn characteristic_direction(grid: &Grid) -> Option<na::Vector3<f64>> {
  let nodes = grid.nodes();
  (0..grid.ncells())
    .map(|icell| {
      let cell = grid.cell_nodes().lane(icell);
      let base = nodes.column(cell[0]);
      let tangent = nodes.column(cell[1]) - base;
      match grid.dim() {
        1 => tangent,
        _ => tangent.cross(&(nodes.column(cell[2]) - base)),
      }
    })
    .max_by(|a, b| a.norm_squared().total_cmp(&b.norm_squared()))
    .and_then(|v| v.try_normalize(f64::EPSILON))
}

/// Flips `v` such that its first nonzero component, in the order z, y, x, is positive.
fn canonical_sign(v: na::Vector3<f64>) -> na::Vector3<f64> {
  let tol = 1e-12 * v.norm();
  let leading = [2, 1, 0]
    .into_iter()
    .map(|i| v[i])
    .find(|c| c.abs() > tol)
    .unwrap_or(0.0);
  if leading < 0.0 {
    -v
  } else {
    v
  }
}

fn active_dims(rotated: &na::Matrix3xX<f64>, dim: Dim) -> [bool; 3] {
  let extents: [f64; 3] = std::array::from_fn(|i| {
    let (lo, hi) = rotated
      .row(i)
      .iter()
      .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
        (lo.min(x), hi.max(x))
      });
    hi - lo
  });
  let largest = extents.iter().copied().fold(0.0, f64::max);
  let varying = extents.map(|e| largest > 0.0 && e > FLATNESS_TOL * largest);
  let nvarying = varying.iter().filter(|&&v| v).count();
  if nvarying == dim {
    return varying;
  }

  if nvarying > dim {
    tracing::warn!("{dim}-grid is not flat, projecting it onto its reference frame");
  } else if dim > 0 {
    tracing::warn!("{dim}-grid is degenerate, its nodes span only {nvarying} dimensions");
  }
  match dim {
    0 => [false; 3],
    1 => [false, false, true],
    2 => [true, true, false],
    _ => [true; 3],
  }
}

fn reduce_rows(rotated: &na::Matrix3xX<f64>, active: &[bool; 3]) -> na::DMatrix<f64> {
  let rows: Vec<usize> = (0..3).filter(|&i| active[i]).collect();
  na::DMatrix::from_fn(rows.len(), rotated.ncols(), |i, j| rotated[(rows[i], j)])
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn tilted_segment_is_mapped_onto_line() {
    let nodes = na::DMatrix::from_row_slice(3, 3, &[0.0, 1.0, 2.0, 0.0, 1.0, 2.0, 1.0, 1.0, 1.0]);
    let grid = Grid::from_simplices(1, nodes, vec![vec![0, 1], vec![1, 2]]).unwrap();
    let frame = map_grid(&grid);
    assert_eq!(frame.dim(), 1);
    assert_eq!(frame.active(), &[false, false, true]);
    let coords = frame.node_coords();
    assert_eq!(coords.shape(), (1, 3));
    let length = (coords[2] - coords[0]).abs();
    assert!((length - 2.0 * 2f64.sqrt()).abs() < 1e-12);
  }

  #[test]
  fn tangential_tensor_is_preserved() {
    let nodes = na::DMatrix::from_row_slice(3, 3, &[0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]);
    let grid = Grid::from_simplices(2, nodes, vec![vec![0, 1, 2]]).unwrap();
    let frame = map_grid(&grid);
    let reduced = frame.reduce_tensor(&na::Matrix3::identity());
    assert!((reduced - na::DMatrix::<f64>::identity(2, 2)).norm() < 1e-12);
  }

  /// The frame of a planar grid must not depend on its aspect ratio or orientation.
  #[test]
  fn xy_grid_keeps_ambient_frame() {
    for (width, height) in [(2.0, 1.0), (1.0, 2.0)] {
      for cells in [vec![vec![0, 1, 3], vec![0, 2, 3]], vec![vec![1, 0, 3], vec![3, 2, 0]]] {
        #[rustfmt::skip]
        let nodes = na::DMatrix::from_column_slice(2, 4, &[
          0.0, 0.0,
          width, 0.0,
          0.0, height,
          width, height,
        ]);
        let grid = Grid::from_simplices(2, nodes.clone(), cells).unwrap();
        let frame = map_grid(&grid);
        assert_eq!(frame.rotation(), &na::Rotation3::identity());
        assert_eq!(frame.active(), &[true, true, false]);
        assert_eq!(frame.node_coords(), &nodes);
      }
    }
  }

  #[test]
  fn tilted_plane_gets_proper_rotation() {
    let tilt = na::Rotation3::from_euler_angles(0.3, -0.4, 0.5);
    let flat = [[0.0, 0.0], [1.0, 0.0], [0.0, 2.0], [1.0, 2.0]];
    let nodes = na::DMatrix::from_fn(3, 4, |d, inode| {
      (tilt * na::Vector3::new(flat[inode][0], flat[inode][1], 0.0))[d]
    });
    let grid = Grid::from_simplices(2, nodes, vec![vec![0, 1, 3], vec![0, 2, 3]]).unwrap();
    let frame = map_grid(&grid);

    assert!((frame.rotation().matrix().determinant() - 1.0).abs() < 1e-12);
    assert_eq!(frame.active(), &[true, true, false]);
    let normal = frame.rotation() * (tilt * na::Vector3::z());
    assert!((normal.z.abs() - 1.0).abs() < 1e-12);

    let coords = frame.node_coords();
    for (i, j) in [(0, 1), (0, 2), (0, 3), (1, 2)] {
      let reduced = (coords.column(i) - coords.column(j)).norm();
      let expected = na::Vector2::new(flat[i][0] - flat[j][0], flat[i][1] - flat[j][1]).norm();
      assert!((reduced - expected).abs() < 1e-12);
    }

    let centers = frame.reduce_points(grid.cell_centers());
    assert_eq!(centers.shape(), (2, 2));
  }

  #[test]
  fn collinear_triangle_keeps_planar_mask() {
    let nodes = na::DMatrix::from_row_slice(2, 3, &[0.0, 1.0, 2.0, 0.0, 0.0, 0.0]);
    let grid = Grid::from_simplices(2, nodes, vec![vec![0, 1, 2]]).unwrap();
    let frame = map_grid(&grid);
    assert_eq!(frame.dim(), 2);
    assert_eq!(frame.node_coords().shape(), (2, 3));
  }
}
