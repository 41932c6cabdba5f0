//! Continuous two-segment piecewise-linear model.
//!
//! The model is implemented as small, pure functions so that the solver and the
//! renderers can share it without carrying any state.

pub mod model;

pub use model::*;
