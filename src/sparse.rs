use itertools::Itertools;

pub type CsrMatrix = nas::CsrMatrix<f64>;

/// Triplet (COO) accumulator for bulk construction of sparse matrices.
///
/// Duplicate entries are summed when converting.
#[derive(Default, Debug, Clone)]
pub struct SparseMatrix {
  nrows: usize,
  ncols: usize,
  triplets: Vec<(usize, usize, f64)>,
}

impl SparseMatrix {
  pub fn zeros(nrows: usize, ncols: usize) -> Self {
    Self::new(nrows, ncols, Vec::new())
  }
  pub fn with_capacity(nrows: usize, ncols: usize, capacity: usize) -> Self {
    Self::new(nrows, ncols, Vec::with_capacity(capacity))
  }
  pub fn new(nrows: usize, ncols: usize, triplets: Vec<(usize, usize, f64)>) -> Self {
    Self {
      nrows,
      ncols,
      triplets,
    }
  }

  /// Diagonal matrix with the given entries.
  pub fn diagonal(values: &na::DVector<f64>) -> Self {
    let n = values.len();
    let mut mat = Self::with_capacity(n, n, n);
    for (i, &v) in values.iter().enumerate() {
      mat.push(i, i, v);
    }
    mat
  }

  pub fn nrows(&self) -> usize {
    self.nrows
  }
  pub fn ncols(&self) -> usize {
    self.ncols
  }
  pub fn triplets(&self) -> &[(usize, usize, f64)] {
    &self.triplets
  }

  pub fn push(&mut self, r: usize, c: usize, v: f64) {
    assert!(r < self.nrows() && c < self.ncols());
    if v != 0.0 {
      self.triplets.push((r, c, v));
    }
  }

  /// Scatters a dense local matrix into the rows `rows` and columns `cols`.
  pub fn push_block(&mut self, rows: &[usize], cols: &[usize], local: &na::DMatrix<f64>) {
    assert!(local.nrows() == rows.len() && local.ncols() == cols.len());
    for (ilocal, &iglobal) in rows.iter().enumerate() {
      for (jlocal, &jglobal) in cols.iter().enumerate() {
        self.push(iglobal, jglobal, local[(ilocal, jlocal)]);
      }
    }
  }

  /// Sum of the entries in each row.
  pub fn row_sums(&self) -> na::DVector<f64> {
    let mut sums = na::DVector::zeros(self.nrows);
    for &(r, _, v) in &self.triplets {
      sums[r] += v;
    }
    sums
  }

  pub fn to_nalgebra_coo(&self) -> nas::CooMatrix<f64> {
    let (rows, cols, vals) = self.triplets.iter().copied().multiunzip();
    nas::CooMatrix::try_from_triplets(self.nrows, self.ncols, rows, cols, vals)
      .expect("triplet indices are bounds checked on push")
  }

  /// Builds the compressed matrix.
  ///
  /// Triplets are put in canonical order first, so duplicates are always summed
  /// in the same order, no matter in which order they were pushed.
  pub fn to_nalgebra_csr(&self) -> CsrMatrix {
    let (rows, cols, vals) = self
      .triplets
      .iter()
      .copied()
      .sorted_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)).then(a.2.total_cmp(&b.2)))
      .coalesce(|a, b| {
        if (a.0, a.1) == (b.0, b.1) {
          Ok((a.0, a.1, a.2 + b.2))
        } else {
          Err((a, b))
        }
      })
      .multiunzip();
    let coo = nas::CooMatrix::try_from_triplets(self.nrows, self.ncols, rows, cols, vals)
      .expect("triplet indices are bounds checked on push");
    CsrMatrix::from(&coo)
  }

  pub fn to_nalgebra_csc(&self) -> nas::CscMatrix<f64> {
    (&self.to_nalgebra_coo()).into()
  }
}

impl From<&CsrMatrix> for SparseMatrix {
  fn from(csr: &CsrMatrix) -> Self {
    let triplets = csr.triplet_iter().map(|(r, c, &v)| (r, c, v)).collect();
    Self::new(csr.nrows(), csr.ncols(), triplets)
  }
}

/// Maximum absolute row sum.
pub fn infinity_norm(matrix: &CsrMatrix) -> f64 {
  matrix
    .row_iter()
    .map(|row| row.values().iter().map(|v| v.abs()).sum::<f64>())
    .fold(0.0, f64::max)
}

/// Every column of `pattern` scaled by `weight`, as a real valued matrix.
///
/// Used to turn incidence relations into averaging operators.
pub fn weighted_pattern(pattern: &nas::pattern::SparsityPattern, weight: f64) -> CsrMatrix {
  let values = vec![weight; pattern.nnz()];
  CsrMatrix::try_from_pattern_and_values(pattern.clone(), values)
    .expect("values match the pattern size")
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn duplicates_are_summed() {
    let mut mat = SparseMatrix::zeros(2, 2);
    mat.push(0, 0, 1.0);
    mat.push(1, 0, -2.0);
    mat.push(0, 0, 2.5);
    mat.push(1, 1, 0.0);
    let csr = mat.to_nalgebra_csr();
    assert_eq!(csr.nnz(), 2);
    let dense = na::DMatrix::from(&csr);
    assert_eq!(dense, na::DMatrix::from_row_slice(2, 2, &[3.5, 0.0, -2.0, 0.0]));
  }

  #[test]
  fn infinity_norm_is_max_abs_row_sum() {
    let mut mat = SparseMatrix::zeros(2, 3);
    mat.push_block(
      &[0, 1],
      &[0, 2],
      &na::DMatrix::from_row_slice(2, 2, &[1.0, -4.0, 2.0, 2.0]),
    );
    assert_eq!(infinity_norm(&mat.to_nalgebra_csr()), 5.0);
  }
}
