//! P1 discretization of $-div(K grad p) = f$ on a single grid.

use crate::{
  assemble::{self, GalMat, GalVec},
  error::Result,
  geometry,
  grid::{Grid, MortarGrid},
  params::{BoundaryKind, FlowData},
  sparse,
};

/// The kinds of grids that carry degrees of freedom.
#[derive(Debug, Clone, Copy)]
pub enum DofGrid<'a> {
  /// One dof per node.
  Grid(&'a Grid),
  /// One dof per mortar cell.
  Mortar(&'a MortarGrid),
}

impl<'a> From<&'a Grid> for DofGrid<'a> {
  fn from(grid: &'a Grid) -> Self {
    Self::Grid(grid)
  }
}
impl<'a> From<&'a MortarGrid> for DofGrid<'a> {
  fn from(grid: &'a MortarGrid) -> Self {
    Self::Mortar(grid)
  }
}

/// Whether a part of the right-hand side was computed from given data
/// or defaulted to zero because the data was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataOrigin {
  Computed,
  DefaultedZero,
}

#[derive(Debug, Clone)]
pub struct RightHandSide {
  pub values: GalVec,
  pub source: DataOrigin,
  pub boundary: DataOrigin,
}

/// Continuous piecewise linear Lagrangian discretization.
#[derive(Debug, Clone)]
pub struct P1 {
  physics: String,
}

impl Default for P1 {
  fn default() -> Self {
    Self::new("flow")
  }
}

impl P1 {
  pub fn new(physics: impl Into<String>) -> Self {
    Self {
      physics: physics.into(),
    }
  }

  pub fn physics(&self) -> &str {
    &self.physics
  }

  pub fn ndof<'a>(&self, grid: impl Into<DofGrid<'a>>) -> usize {
    match grid.into() {
      DofGrid::Grid(grid) => grid.nnodes(),
      DofGrid::Mortar(grid) => grid.ncells(),
    }
  }

  /// Matrix with imposed essential conditions and the matching right-hand side.
  ///
  /// The infinity norm of the stiffness matrix is used as Dirichlet weight.
  pub fn assemble_matrix_and_rhs(
    &self,
    grid: &Grid,
    data: &FlowData,
  ) -> Result<(GalMat, RightHandSide)> {
    let (galmat, norm) = self.assemble_matrix(grid, data, true)?;
    let rhs = self.rhs(grid, data, norm.unwrap_or(1.0))?;
    Ok((galmat, rhs))
  }

  /// The stiffness matrix with imposed essential conditions.
  ///
  /// If `want_norm` is set, the infinity norm of the stiffness matrix is
  /// computed, returned and used as weight on the Dirichlet rows.
  /// A 0-dimensional grid gives an empty matrix and unit norm.
  pub fn assemble_matrix(
    &self,
    grid: &Grid,
    data: &FlowData,
    want_norm: bool,
  ) -> Result<(GalMat, Option<f64>)> {
    let dim = grid.dim();
    let ndofs = self.ndof(grid);
    if dim == 0 {
      return Ok((GalMat::zeros(ndofs, ndofs), want_norm.then_some(1.0)));
    }

    data.validate(grid)?;
    let boundary = data.boundary()?;

    let frame = geometry::map_grid(grid);
    let reduce_perm = !data.is_tangential && dim < 3;
    let aperture = data.aperture(grid.ncells());
    let cell_perm = |icell: usize| {
      let perm = if reduce_perm {
        frame.reduce_tensor(data.permeability.cell(icell))
      } else {
        data.permeability.tangential_block(icell, dim)
      };
      aperture[icell] * perm
    };

    let mut galmat = assemble::assemble_stiffness(grid, frame.node_coords(), cell_perm)?;
    let norm = want_norm.then(|| sparse::infinity_norm(&galmat));

    if let Some((bc, _)) = boundary {
      if bc.has_dirichlet() {
        let dirichlet_nodes = bc.dirichlet_nodes(grid);
        assemble::enforce_dirichlet(&mut galmat, &dirichlet_nodes, norm.unwrap_or(1.0));
      }
    }

    Ok((galmat, norm))
  }

  /// Right-hand side holding the source and the weighted Dirichlet data.
  ///
  /// A 0-dimensional grid always gets a zero right-hand side, its single dof is
  /// only driven through the coupling. A given source is dropped there and
  /// reported as defaulted.
  pub fn rhs(&self, grid: &Grid, data: &FlowData, bc_weight: f64) -> Result<RightHandSide> {
    let ndofs = self.ndof(grid);
    if grid.dim() == 0 {
      if data.source.as_ref().is_some_and(|s| s.iter().any(|&v| v != 0.0)) {
        tracing::warn!("source term on 0-grid is not discretized by P1 and is ignored");
      }
      return Ok(RightHandSide {
        values: GalVec::zeros(ndofs),
        source: DataOrigin::DefaultedZero,
        boundary: DataOrigin::DefaultedZero,
      });
    }

    data.validate(grid)?;
    let boundary = data.boundary()?;

    let (mut values, source) = match &data.source {
      Some(source) => (assemble::assemble_source(grid, source), DataOrigin::Computed),
      None => {
        tracing::warn!(
          "no source term given for {} on {}-grid, assuming zero",
          self.physics,
          grid.dim()
        );
        (GalVec::zeros(ndofs), DataOrigin::DefaultedZero)
      }
    };

    let Some((bc, bc_values)) = boundary else {
      tracing::warn!(
        "no boundary conditions given for {} on {}-grid, assuming zero",
        self.physics,
        grid.dim()
      );
      return Ok(RightHandSide {
        values,
        source,
        boundary: DataOrigin::DefaultedZero,
      });
    };

    let ignored_neumann = bc
      .faces_of_kind(BoundaryKind::Neumann)
      .into_iter()
      .any(|iface| bc_values[iface] != 0.0);
    if ignored_neumann {
      tracing::warn!("Neumann boundary values are not supported by P1 and are ignored");
    }

    if bc.has_dirichlet() {
      for inode in bc.dirichlet_nodes(grid) {
        values[inode] = 0.0;
      }
      let dirichlet_faces = bc.dirichlet_faces();
      values += assemble::project_dirichlet_data(grid, &dirichlet_faces, bc_values, bc_weight)?;
    }

    Ok(RightHandSide {
      values,
      source,
      boundary: DataOrigin::Computed,
    })
  }
}
