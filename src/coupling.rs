//! Coupling of two grids of adjacent dimension through a mortar grid.

use crate::{
  discretization::P1,
  error::{Error, Result},
  grid::Grid,
  params::{check_len, CouplingData, FlowData},
  sparse::{self, CsrMatrix, SparseMatrix},
};

use std::ops::Add;

/// Block index of the higher dimensional grid.
pub const HIGH: usize = 0;
/// Block index of the lower dimensional grid.
pub const LOW: usize = 1;
/// Block index of the mortar grid.
pub const MORTAR: usize = 2;

/// 3x3 block matrix over the dofs of {higher grid, lower grid, mortar grid}.
#[derive(Debug, Clone)]
pub struct BlockMatrix {
  dofs: [usize; 3],
  blocks: [[CsrMatrix; 3]; 3],
}

impl BlockMatrix {
  pub fn zeros(dofs: [usize; 3]) -> Self {
    let blocks =
      std::array::from_fn(|i| std::array::from_fn(|j| CsrMatrix::zeros(dofs[i], dofs[j])));
    Self { dofs, blocks }
  }

  pub fn dofs(&self) -> [usize; 3] {
    self.dofs
  }
  pub fn ndofs(&self) -> usize {
    self.dofs.iter().sum()
  }

  pub fn block(&self, i: usize, j: usize) -> &CsrMatrix {
    &self.blocks[i][j]
  }

  pub fn set_block(&mut self, i: usize, j: usize, block: CsrMatrix) {
    assert_eq!(
      (block.nrows(), block.ncols()),
      (self.dofs[i], self.dofs[j]),
      "Block ({i},{j}) has the wrong shape."
    );
    self.blocks[i][j] = block;
  }

  /// The whole operator as one matrix, blocks ordered by their index.
  pub fn to_global(&self) -> CsrMatrix {
    let offsets = [0, self.dofs[0], self.dofs[0] + self.dofs[1]];
    let nnz = self.blocks.iter().flatten().map(|b| b.nnz()).sum();
    let mut global = SparseMatrix::with_capacity(self.ndofs(), self.ndofs(), nnz);
    for (i, row) in self.blocks.iter().enumerate() {
      for (j, block) in row.iter().enumerate() {
        for (r, c, &v) in block.triplet_iter() {
          global.push(offsets[i] + r, offsets[j] + c, v);
        }
      }
    }
    global.to_nalgebra_csr()
  }
}

impl Add<&BlockMatrix> for &BlockMatrix {
  type Output = BlockMatrix;

  fn add(self, rhs: &BlockMatrix) -> BlockMatrix {
    assert_eq!(self.dofs, rhs.dofs, "Block matrices must have the same dofs.");
    let blocks = std::array::from_fn(|i| {
      std::array::from_fn(|j| &self.blocks[i][j] + &rhs.blocks[i][j])
    });
    BlockMatrix {
      dofs: self.dofs,
      blocks,
    }
  }
}

/// Flux continuity between two grids for the P1 discretization.
#[derive(Debug, Clone)]
pub struct P1Coupling {
  discr: P1,
}

impl P1Coupling {
  pub fn new(discr: &P1) -> Self {
    Self {
      discr: discr.clone(),
    }
  }

  /// Adds the coupling of the grid pair to `accumulator`.
  ///
  /// The accumulator is left untouched, the sum is returned.
  pub fn assemble_coupling(
    &self,
    accumulator: &BlockMatrix,
    grid_high: &Grid,
    grid_low: &Grid,
    data_high: &FlowData,
    data_low: &FlowData,
    data_edge: &CouplingData,
  ) -> Result<BlockMatrix> {
    let coupling = self.coupling_blocks(grid_high, grid_low, data_high, data_low, data_edge)?;
    Ok(accumulator + &coupling)
  }

  /// The coupling blocks of one grid pair.
  ///
  /// The mortar rows hold the jumps of the traces of both grids and
  /// the normal resistance $eta M$, with $eta = 1 / (2 k_n a)$.
  /// The grid rows are the negative transposes of the mortar rows.
  ///
  /// Fails if the data of the higher grid does not match the grid.
  pub fn coupling_blocks(
    &self,
    grid_high: &Grid,
    grid_low: &Grid,
    data_high: &FlowData,
    _data_low: &FlowData,
    data_edge: &CouplingData,
  ) -> Result<BlockMatrix> {
    if grid_high.dim() != grid_low.dim() + 1 {
      return Err(Error::IncompatibleGrids {
        high: grid_high.dim(),
        low: grid_low.dim(),
      });
    }
    let mortar = &data_edge.mortar_grid;
    check_len("mortar grid dimension", grid_low.dim(), mortar.dim())?;
    data_high.validate(grid_high)?;
    let hat_p = mortar.high_to_mortar_avg();
    let check_p = mortar.low_to_mortar_avg();
    check_len("high to mortar columns", grid_high.nfaces(), hat_p.ncols())?;
    check_len("low to mortar columns", grid_low.ncells(), check_p.ncols())?;
    check_len("normal permeability", mortar.ncells(), data_edge.kn.len())?;

    let dofs = [
      self.discr.ndof(grid_high),
      self.discr.ndof(grid_low),
      self.discr.ndof(mortar),
    ];
    let mut cc = BlockMatrix::zeros(dofs);

    // Traces: face and cell averages of the nodal values.
    let hat_p0 =
      sparse::weighted_pattern(grid_high.face_nodes(), (grid_high.dim() as f64).recip());
    let check_p0 =
      sparse::weighted_pattern(grid_low.cell_nodes(), ((grid_low.dim() + 1) as f64).recip());

    let aperture_high = data_high.aperture(grid_high.ncells());
    let face_aperture = na::DVector::from_iterator(
      grid_high.nfaces(),
      grid_high
        .face_cell_map()
        .into_iter()
        .map(|icell| aperture_high[icell]),
    );
    let mortar_aperture = hat_p * &face_aperture;

    let resistance = na::DVector::from_iterator(
      mortar.ncells(),
      (0..mortar.ncells()).map(|i| {
        let inv_k = 1.0 / (2.0 * data_edge.kn[i]);
        let eta = inv_k / mortar_aperture[i];
        eta / mortar.cell_volumes()[i]
      }),
    );

    let mortar_high = -(hat_p * &hat_p0);
    let mortar_low = check_p * &check_p0;
    cc.set_block(HIGH, MORTAR, -mortar_high.transpose());
    cc.set_block(LOW, MORTAR, -mortar_low.transpose());
    cc.set_block(MORTAR, HIGH, mortar_high);
    cc.set_block(MORTAR, LOW, mortar_low);
    cc.set_block(MORTAR, MORTAR, SparseMatrix::diagonal(&resistance).to_nalgebra_csr());

    tracing::debug!(
      "coupled {}-grid and {}-grid through {} mortar cells",
      grid_high.dim(),
      grid_low.dim(),
      mortar.ncells()
    );
    Ok(cc)
  }
}

/// P1 on every grid together with its coupling.
#[derive(Debug, Clone)]
pub struct P1MixedDim {
  pub discr: P1,
  pub coupling: P1Coupling,
}

impl P1MixedDim {
  pub fn new(physics: impl Into<String>) -> Self {
    let discr = P1::new(physics);
    let coupling = P1Coupling::new(&discr);
    Self { discr, coupling }
  }

  pub fn physics(&self) -> &str {
    self.discr.physics()
  }
}
