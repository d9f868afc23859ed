extern crate nalgebra as na;
extern crate nalgebra_sparse as nas;

pub mod assemble;
pub mod coupling;
pub mod discretization;
pub mod error;
pub mod fe;
pub mod geometry;
pub mod grid;
pub mod linalg;
pub mod params;
pub mod sparse;
pub mod util;

pub use coupling::{BlockMatrix, P1Coupling, P1MixedDim};
pub use discretization::{DataOrigin, DofGrid, RightHandSide, P1};
pub use error::{Error, Result};

pub type Dim = usize;
