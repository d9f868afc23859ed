use crate::error::{Error, Result};

use faer::solvers::SpSolver;

pub fn flags_to_indicies(flags: &[bool]) -> Vec<usize> {
  flags
    .iter()
    .enumerate()
    .filter_map(|(i, &flag)| flag.then_some(i))
    .collect()
}

type SparseMatrixFaer = faer::sparse::SparseColMat<usize, f64>;

pub fn nalgebra2faer(m: nas::CscMatrix<f64>) -> SparseMatrixFaer {
  let nrows = m.nrows();
  let ncols = m.ncols();
  let (col_ptrs, row_indices, values) = m.disassemble();

  let symbolic =
    faer::sparse::SymbolicSparseColMat::new_checked(nrows, ncols, col_ptrs, None, row_indices);
  faer::sparse::SparseColMat::new(symbolic, values)
}

/// Sparse direct solver.
pub struct FaerLu {
  raw: faer::sparse::linalg::solvers::Lu<usize, f64>,
}
impl FaerLu {
  pub fn new(a: nas::CscMatrix<f64>) -> Result<Self> {
    let raw = nalgebra2faer(a)
      .sp_lu()
      .map_err(|err| Error::SingularBoundarySystem(format!("{err:?}")))?;
    Ok(Self { raw })
  }

  /// Fails if the factorization produced non-finite values,
  /// which happens for numerically singular systems.
  pub fn solve(&self, b: &na::DVector<f64>) -> Result<na::DVector<f64>> {
    let b = faer::col::from_slice(b.as_slice());
    let x = na::DVector::from_vec(self.raw.solve(b).as_slice().to_vec());
    if x.iter().all(|v| v.is_finite()) {
      Ok(x)
    } else {
      Err(Error::SingularBoundarySystem(
        "solution has non-finite entries".to_string(),
      ))
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn flags_to_sorted_indicies() {
    let flags = vec![false, true, false, true, false];
    assert_eq!(flags_to_indicies(&flags), vec![1, 3]);
  }

  #[test]
  fn lu_solves_small_system() {
    let coo = nas::CooMatrix::try_from_triplets(
      2,
      2,
      vec![0, 0, 1, 1],
      vec![0, 1, 0, 1],
      vec![2.0, 1.0, 1.0, 3.0],
    )
    .unwrap();
    let lu = FaerLu::new(nas::CscMatrix::from(&coo)).unwrap();
    let x = lu.solve(&na::DVector::from_vec(vec![3.0, 4.0])).unwrap();
    assert!((x[0] - 1.0).abs() < 1e-12);
    assert!((x[1] - 1.0).abs() < 1e-12);
  }
}
