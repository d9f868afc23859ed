use super::{CellIdx, FaceIdx, Grid};
use crate::{
  error::{Error, Result},
  sparse::{CsrMatrix, SparseMatrix},
  Dim,
};

/// Interface grid between a grid and a grid of one dimension less.
///
/// Only the cell volumes and the averaging operators onto the mortar cells are
/// needed by the coupling.
#[derive(Debug, Clone)]
pub struct MortarGrid {
  dim: Dim,
  cell_volumes: na::DVector<f64>,
  /// nmortar_cells x nfaces_high
  high_to_mortar: CsrMatrix,
  /// nmortar_cells x ncells_low
  low_to_mortar: CsrMatrix,
}

impl MortarGrid {
  pub fn new(
    dim: Dim,
    cell_volumes: na::DVector<f64>,
    high_to_mortar: CsrMatrix,
    low_to_mortar: CsrMatrix,
  ) -> Result<Self> {
    let ncells = cell_volumes.len();
    for (what, found) in [
      ("high to mortar rows", high_to_mortar.nrows()),
      ("low to mortar rows", low_to_mortar.nrows()),
    ] {
      if found != ncells {
        return Err(Error::DimensionMismatch {
          what,
          expected: ncells,
          found,
        });
      }
    }
    Ok(Self {
      dim,
      cell_volumes,
      high_to_mortar,
      low_to_mortar,
    })
  }

  /// Mortar grid that matches the lower dimensional grid,
  /// with one mortar cell per (higher face, lower cell) pair.
  ///
  /// A fracture cell typically appears twice, once for each side.
  pub fn from_face_cell_pairs(
    high: &Grid,
    low: &Grid,
    pairs: &[(FaceIdx, CellIdx)],
  ) -> Result<Self> {
    if high.dim() != low.dim() + 1 {
      return Err(Error::IncompatibleGrids {
        high: high.dim(),
        low: low.dim(),
      });
    }

    let ncells = pairs.len();
    let mut high_to_mortar = SparseMatrix::with_capacity(ncells, high.nfaces(), ncells);
    let mut low_to_mortar = SparseMatrix::with_capacity(ncells, low.ncells(), ncells);
    let mut cell_volumes = na::DVector::zeros(ncells);
    for (imortar, &(iface, icell)) in pairs.iter().enumerate() {
      if iface >= high.nfaces() {
        return Err(Error::IndexOutOfBounds {
          what: "higher dimensional face",
          index: iface,
          len: high.nfaces(),
        });
      }
      if icell >= low.ncells() {
        return Err(Error::IndexOutOfBounds {
          what: "lower dimensional cell",
          index: icell,
          len: low.ncells(),
        });
      }
      high_to_mortar.push(imortar, iface, 1.0);
      low_to_mortar.push(imortar, icell, 1.0);
      cell_volumes[imortar] = low.cell_volumes()[icell];
    }

    Self::new(
      low.dim(),
      cell_volumes,
      high_to_mortar.to_nalgebra_csr(),
      low_to_mortar.to_nalgebra_csr(),
    )
  }

  pub fn dim(&self) -> Dim {
    self.dim
  }
  pub fn ncells(&self) -> usize {
    self.cell_volumes.len()
  }
  pub fn cell_volumes(&self) -> &na::DVector<f64> {
    &self.cell_volumes
  }
  pub fn high_to_mortar_avg(&self) -> &CsrMatrix {
    &self.high_to_mortar
  }
  pub fn low_to_mortar_avg(&self) -> &CsrMatrix {
    &self.low_to_mortar
  }
}
