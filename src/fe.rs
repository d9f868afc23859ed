//! Element matrices of the P1 Lagrangian discretization.

use crate::Dim;

/// Gradients of the barycentric coordinate functions of a simplex,
/// one column per vertex.
///
/// `coords` holds the `dim + 1` vertex coordinates in its columns, expressed in
/// the `dim`-dimensional frame of the simplex.
/// Returns `None` for a degenerate simplex.
pub fn barycentric_gradients(coords: &na::DMatrix<f64>) -> Option<na::DMatrix<f64>> {
  let dim = coords.nrows();
  let nvertices = dim + 1;
  assert_eq!(coords.ncols(), nvertices, "A simplex has dim+1 vertices.");

  let mut q = na::DMatrix::from_element(nvertices, nvertices, 1.0);
  q.view_mut((0, 1), (nvertices, dim))
    .copy_from(&coords.transpose());
  let qinv = q.try_inverse()?;
  Some(qinv.rows(1, dim).into_owned())
}

/// Exact element matrix of the bilinear form $(K grad u, grad v)$.
///
/// $A = |T| nabla lambda^T K nabla lambda$
pub fn stiffness_elmat(
  perm: &na::DMatrix<f64>,
  vol: f64,
  coords: &na::DMatrix<f64>,
  dim: Dim,
) -> Option<na::DMatrix<f64>> {
  assert_eq!(perm.shape(), (dim, dim), "Permeability must be reduced to dim x dim.");
  assert_eq!(coords.nrows(), dim);
  let difbarys = barycentric_gradients(coords)?;
  Some(vol * difbarys.transpose() * perm * difbarys)
}

/// Exact element matrix of the mass bilinear form.
pub fn mass_elmat(vol: f64, dim: Dim) -> na::DMatrix<f64> {
  let nvertices = dim + 1;
  let v = vol / ((dim + 1) * (dim + 2)) as f64;
  let mut elmat = na::DMatrix::from_element(nvertices, nvertices, v);
  elmat.fill_diagonal(2.0 * v);
  elmat
}
