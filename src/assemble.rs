use crate::{
  error::{Error, Result},
  fe,
  grid::{CellIdx, FaceIdx, Grid, NodeIdx},
  sparse::{CsrMatrix, SparseMatrix},
  util::FaerLu,
};

pub type GalMat = CsrMatrix;
pub type GalVec = na::DVector<f64>;

/// Assembly algorithm for the P1 stiffness matrix.
///
/// `node_coords` are the node coordinates in the reference frame of the grid
/// (`dim x nnodes`), `cell_perm` gives the reduced `dim x dim` conductivity of a cell.
pub fn assemble_stiffness<F>(
  grid: &Grid,
  node_coords: &na::DMatrix<f64>,
  cell_perm: F,
) -> Result<GalMat>
where
  F: Fn(CellIdx) -> na::DMatrix<f64>,
{
  let dim = grid.dim();
  let nnodes = grid.nnodes();
  let nlocal = dim + 1;
  assert_eq!(node_coords.shape(), (dim, nnodes));

  let mut galmat = SparseMatrix::with_capacity(nnodes, nnodes, nlocal.pow(2) * grid.ncells());
  let mut coords = na::DMatrix::zeros(dim, nlocal);
  for icell in 0..grid.ncells() {
    let nodes = grid.cell_nodes().lane(icell);
    for (ilocal, &inode) in nodes.iter().enumerate() {
      coords.set_column(ilocal, &node_coords.column(inode));
    }

    let elmat = fe::stiffness_elmat(&cell_perm(icell), grid.cell_volumes()[icell], &coords, dim)
      .ok_or(Error::DegenerateCell { cell: icell })?;
    galmat.push_block(nodes, nodes, &elmat);
  }

  tracing::debug!(
    "assembled {nnodes}x{nnodes} stiffness from {} triplets",
    galmat.triplets().len()
  );
  Ok(galmat.to_nalgebra_csr())
}

/// Cell-wise integrated source, distributed equally onto the cell nodes.
pub fn assemble_source(grid: &Grid, source: &na::DVector<f64>) -> GalVec {
  let nlocal = (grid.dim() + 1) as f64;
  let mut galvec = na::DVector::zeros(grid.nnodes());
  for icell in 0..grid.ncells() {
    for &inode in grid.cell_nodes().lane(icell) {
      galvec[inode] += source[icell] / nlocal;
    }
  }
  galvec
}

/// Imposes essential conditions on `dirichlet_nodes`.
///
/// The rows of the nodes are cleared and `weight` is put on their diagonal,
/// which gives the constraint $w u_i = b_i$.
/// Applying this more than once has no further effect.
pub fn enforce_dirichlet(galmat: &mut GalMat, dirichlet_nodes: &[NodeIdx], weight: f64) {
  let mut missing_diagonal = Vec::new();
  for &inode in dirichlet_nodes {
    let mut row = galmat.row_mut(inode);
    row.values_mut().fill(0.0);
    match row.get_entry_mut(inode) {
      Some(nas::SparseEntryMut::NonZero(value)) => *value = weight,
      _ => missing_diagonal.push(inode),
    }
  }

  if !missing_diagonal.is_empty() {
    missing_diagonal.sort_unstable();
    missing_diagonal.dedup();
    let mut extended = SparseMatrix::from(&*galmat);
    for inode in missing_diagonal {
      extended.push(inode, inode, weight);
    }
    *galmat = extended.to_nalgebra_csr();
  }
}

/// L2 projection of face-wise Dirichlet data onto the nodes.
///
/// The face mass matrices and loads of the Dirichlet faces form a system on the
/// boundary nodes. All other rows are completed with the identity and a zero load,
/// so the projection vanishes away from the Dirichlet nodes.
pub fn project_dirichlet_data(
  grid: &Grid,
  dirichlet_faces: &[FaceIdx],
  bc_values: &na::DVector<f64>,
  weight: f64,
) -> Result<GalVec> {
  let dim = grid.dim();
  let nnodes = grid.nnodes();

  let mut mass = SparseMatrix::with_capacity(nnodes, nnodes, dim.pow(2) * dirichlet_faces.len());
  let mut load = na::DVector::zeros(nnodes);
  for &iface in dirichlet_faces {
    let nodes = grid.face_nodes().lane(iface);
    let area = grid.face_areas()[iface];

    let elmat = fe::mass_elmat(area, dim - 1);
    mass.push_block(nodes, nodes, &elmat);

    let elload = weight * area * bc_values[iface] / dim as f64;
    for &inode in nodes {
      load[inode] += elload;
    }
  }

  let row_sums = mass.row_sums();
  for (inode, &sum) in row_sums.iter().enumerate() {
    if sum == 0.0 {
      mass.push(inode, inode, 1.0);
    }
  }

  tracing::debug!(
    "projecting Dirichlet data of {} faces",
    dirichlet_faces.len()
  );
  FaerLu::new(mass.to_nalgebra_csc())?.solve(&load)
}
