use crate::{grid::CellIdx, Dim};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("cell {cell} is a degenerate simplex, its barycentric system is singular")]
  DegenerateCell { cell: CellIdx },
  #[error("simplex of dimension {dim} needs {expected} node coordinates, got {found}")]
  SimplexNodes {
    dim: Dim,
    expected: usize,
    found: usize,
  },
  #[error("boundary classification and boundary values must be given together")]
  InconsistentBoundary,
  #[error("face {face} is not a boundary face and cannot carry a boundary condition")]
  InteriorFace { face: usize },
  #[error("{what} has length {found}, expected {expected}")]
  DimensionMismatch {
    what: &'static str,
    expected: usize,
    found: usize,
  },
  #[error("{what} index {index} is out of bounds for length {len}")]
  IndexOutOfBounds {
    what: &'static str,
    index: usize,
    len: usize,
  },
  #[error("restricted Dirichlet system could not be solved: {0}")]
  SingularBoundarySystem(String),
  #[error("grids of dimension {high} and {low} cannot be coupled")]
  IncompatibleGrids { high: Dim, low: Dim },
}
