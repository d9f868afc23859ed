extern crate nalgebra as na;

use approx::assert_relative_eq;
use p1flow::{fe, Dim};

/// Non-degenerate, irregular simplicies with vertex coordinates in the columns.
fn irregular_simplex(dim: Dim) -> na::DMatrix<f64> {
  match dim {
    1 => na::DMatrix::from_row_slice(1, 2, &[0.3, 1.7]),
    #[rustfmt::skip]
    2 => na::DMatrix::from_row_slice(2, 3, &[
      0.0, 1.2, 0.4,
      0.1, 0.3, 1.5,
    ]),
    #[rustfmt::skip]
    3 => na::DMatrix::from_row_slice(3, 4, &[
      0.0, 1.0, 0.1, 0.2,
      0.0, 0.2, 1.0, 0.1,
      0.0, 0.0, 0.3, 1.0,
    ]),
    _ => unreachable!(),
  }
}

#[test]
fn stiffness_annihilates_constants() {
  for dim in 1..=3 {
    let perm = na::DMatrix::identity(dim, dim);
    let elmat = fe::stiffness_elmat(&perm, 0.7, &irregular_simplex(dim), dim).unwrap();
    assert_eq!(elmat.shape(), (dim + 1, dim + 1));
    for row in elmat.row_iter() {
      assert!(row.sum().abs() < 1e-12, "Row sum {} in d={dim}", row.sum());
    }
    assert_relative_eq!(elmat.clone(), elmat.transpose(), epsilon = 1e-12);
  }
}

#[test]
fn stiffness_reproduces_linear_gradient() {
  // For u = a.x the element matrix applied to nodal values gives |T| grad(lambda)^T K a.
  let dim = 2;
  let coords = irregular_simplex(dim);
  let perm = na::DMatrix::from_row_slice(2, 2, &[2.0, 0.5, 0.5, 1.0]);
  let vol = 0.5;
  let a = na::DVector::from_vec(vec![1.0, -2.0]);
  let nodal = coords.transpose() * &a;

  let elmat = fe::stiffness_elmat(&perm, vol, &coords, dim).unwrap();
  let difbarys = fe::barycentric_gradients(&coords).unwrap();
  let expected = vol * difbarys.transpose() * &perm * &a;
  assert_relative_eq!(elmat * nodal, expected, epsilon = 1e-12);
}

#[test]
fn mass_is_spd_with_consistent_row_sums() {
  for dim in 0..=3 {
    for vol in [1e-3, 0.5, 1.0, 42.0] {
      let elmat = fe::mass_elmat(vol, dim);
      assert_eq!(elmat, elmat.transpose());
      assert!(elmat.clone().cholesky().is_some(), "Not SPD in d={dim}");
      for row in elmat.row_iter() {
        assert_relative_eq!(row.sum(), vol / (dim + 1) as f64, max_relative = 1e-14);
      }
    }
  }
}
