//! Mathematical utilities: linear least squares, the Levenberg–Marquardt driver,
//! and small helpers over sample vectors.

pub mod grid;
pub mod lm;
pub mod ols;

pub use grid::*;
pub use lm::*;
pub use ols::*;
