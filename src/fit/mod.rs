//! Piecewise-linear fitting.
//!
//! Responsibilities:
//!
//! - validate samples and build the initial guess
//! - run the nonlinear least-squares fit (`fitter`)
//! - derive the plotting curve and breakpoint annotation (`derive`)
//! - fit many datasets independently (`batch`)

pub mod batch;
pub mod derive;
pub mod fitter;

pub use batch::*;
pub use derive::*;
pub use fitter::*;
