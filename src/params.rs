//! Typed problem data of the flow discretization.

use crate::{
  error::{Error, Result},
  grid::{FaceIdx, Grid, MortarGrid, NodeIdx},
  util, Dim,
};

/// Cell-wise symmetric positive definite permeability, stored as full 3x3 tensors.
#[derive(Debug, Clone)]
pub struct PermeabilityTensor {
  values: Vec<na::Matrix3<f64>>,
}
impl PermeabilityTensor {
  pub fn new(values: Vec<na::Matrix3<f64>>) -> Self {
    Self { values }
  }
  /// $K = k I$ in every cell.
  pub fn isotropic(kxx: &[f64]) -> Self {
    Self::new(kxx.iter().map(|&k| na::Matrix3::from_diagonal_element(k)).collect())
  }
  pub fn uniform(ncells: usize, tensor: na::Matrix3<f64>) -> Self {
    Self::new(vec![tensor; ncells])
  }

  pub fn ncells(&self) -> usize {
    self.values.len()
  }
  pub fn cell(&self, icell: usize) -> &na::Matrix3<f64> {
    &self.values[icell]
  }

  /// The leading `dim x dim` block, for tensors given in the tangential frame.
  pub fn tangential_block(&self, icell: usize, dim: Dim) -> na::DMatrix<f64> {
    self.values[icell].view((0, 0), (dim, dim)).into_owned()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryKind {
  Dirichlet,
  Neumann,
  Other,
}

/// Classification of the faces of a grid.
///
/// Every boundary face holds exactly one kind, interior faces hold none.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryCondition {
  kinds: Vec<Option<BoundaryKind>>,
}
impl BoundaryCondition {
  /// All boundary faces are Neumann.
  pub fn new(grid: &Grid) -> Self {
    Self::uniform(grid, BoundaryKind::Neumann)
  }

  pub fn uniform(grid: &Grid, kind: BoundaryKind) -> Self {
    let kinds = (0..grid.nfaces())
      .map(|iface| grid.is_boundary_face(iface).then_some(kind))
      .collect();
    Self { kinds }
  }

  /// Neumann everywhere except for `faces`, which get `kind`.
  pub fn with_faces(grid: &Grid, faces: &[FaceIdx], kind: BoundaryKind) -> Result<Self> {
    let mut bc = Self::new(grid);
    for &iface in faces {
      bc.set(grid, iface, kind)?;
    }
    Ok(bc)
  }

  pub fn set(&mut self, grid: &Grid, iface: FaceIdx, kind: BoundaryKind) -> Result<()> {
    if iface >= self.kinds.len() {
      return Err(Error::IndexOutOfBounds {
        what: "face",
        index: iface,
        len: self.kinds.len(),
      });
    }
    if !grid.is_boundary_face(iface) {
      return Err(Error::InteriorFace { face: iface });
    }
    self.kinds[iface] = Some(kind);
    Ok(())
  }

  pub fn nfaces(&self) -> usize {
    self.kinds.len()
  }
  pub fn kind(&self, iface: FaceIdx) -> Option<BoundaryKind> {
    self.kinds[iface]
  }
  pub fn is_dirichlet(&self, iface: FaceIdx) -> bool {
    self.kinds[iface] == Some(BoundaryKind::Dirichlet)
  }

  pub fn faces_of_kind(&self, kind: BoundaryKind) -> Vec<FaceIdx> {
    self
      .kinds
      .iter()
      .enumerate()
      .filter_map(|(iface, k)| (*k == Some(kind)).then_some(iface))
      .collect()
  }
  pub fn dirichlet_faces(&self) -> Vec<FaceIdx> {
    self.faces_of_kind(BoundaryKind::Dirichlet)
  }
  pub fn has_dirichlet(&self) -> bool {
    self.kinds.contains(&Some(BoundaryKind::Dirichlet))
  }

  /// Nodes of Dirichlet faces, sorted and without duplicates.
  pub fn dirichlet_nodes(&self, grid: &Grid) -> Vec<NodeIdx> {
    let mut flags = vec![false; grid.nnodes()];
    for iface in self.dirichlet_faces() {
      grid
        .face_nodes()
        .lane(iface)
        .iter()
        .for_each(|&inode| flags[inode] = true);
    }
    util::flags_to_indicies(&flags)
  }
}

/// Data of the flow problem on one grid.
#[derive(Debug, Clone)]
pub struct FlowData {
  pub permeability: PermeabilityTensor,
  pub bc: Option<BoundaryCondition>,
  /// Face-wise boundary values.
  pub bc_values: Option<na::DVector<f64>>,
  /// Cell-wise thickness of lower dimensional grids. Unit if not given.
  pub aperture: Option<na::DVector<f64>>,
  /// Cell-wise integrated source.
  pub source: Option<na::DVector<f64>>,
  /// The permeability is already expressed in the tangential frame of the grid.
  pub is_tangential: bool,
}

impl FlowData {
  pub fn new(permeability: PermeabilityTensor) -> Self {
    Self {
      permeability,
      bc: None,
      bc_values: None,
      aperture: None,
      source: None,
      is_tangential: false,
    }
  }

  pub fn with_bc(mut self, bc: BoundaryCondition, bc_values: na::DVector<f64>) -> Self {
    self.bc = Some(bc);
    self.bc_values = Some(bc_values);
    self
  }
  pub fn with_aperture(mut self, aperture: na::DVector<f64>) -> Self {
    self.aperture = Some(aperture);
    self
  }
  pub fn with_source(mut self, source: na::DVector<f64>) -> Self {
    self.source = Some(source);
    self
  }
  pub fn tangential(mut self) -> Self {
    self.is_tangential = true;
    self
  }

  pub fn aperture(&self, ncells: usize) -> na::DVector<f64> {
    self
      .aperture
      .clone()
      .unwrap_or_else(|| na::DVector::from_element(ncells, 1.0))
  }

  /// The boundary classification together with its values.
  ///
  /// Having only one of the two is a contract violation.
  pub fn boundary(&self) -> Result<Option<(&BoundaryCondition, &na::DVector<f64>)>> {
    match (&self.bc, &self.bc_values) {
      (Some(bc), Some(values)) => Ok(Some((bc, values))),
      (None, None) => Ok(None),
      _ => Err(Error::InconsistentBoundary),
    }
  }

  /// Checks the sizes of all given data against the grid.
  pub fn validate(&self, grid: &Grid) -> Result<()> {
    let ncells = grid.ncells();
    let nfaces = grid.nfaces();
    check_len("permeability", ncells, self.permeability.ncells())?;
    if let Some(aperture) = &self.aperture {
      check_len("aperture", ncells, aperture.len())?;
    }
    if let Some(source) = &self.source {
      check_len("source", ncells, source.len())?;
    }
    if let Some((bc, values)) = self.boundary()? {
      check_len("boundary condition", nfaces, bc.nfaces())?;
      check_len("boundary values", nfaces, values.len())?;
    }
    Ok(())
  }
}

/// Data of the interface between two grids.
#[derive(Debug, Clone)]
pub struct CouplingData {
  pub mortar_grid: MortarGrid,
  /// Normal permeability per mortar cell.
  pub kn: na::DVector<f64>,
}
impl CouplingData {
  pub fn new(mortar_grid: MortarGrid, kn: f64) -> Self {
    let kn = na::DVector::from_element(mortar_grid.ncells(), kn);
    Self { mortar_grid, kn }
  }
  pub fn with_kn(mortar_grid: MortarGrid, kn: na::DVector<f64>) -> Result<Self> {
    check_len("normal permeability", mortar_grid.ncells(), kn.len())?;
    Ok(Self { mortar_grid, kn })
  }
}

pub(crate) fn check_len(what: &'static str, expected: usize, found: usize) -> Result<()> {
  if expected == found {
    Ok(())
  } else {
    Err(Error::DimensionMismatch {
      what,
      expected,
      found,
    })
  }
}
