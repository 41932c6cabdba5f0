//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - input data (`Dataset`, `SampleSet`, `ColumnLabels`)
//! - model parameters and fit outputs (`PiecewiseParams`, `FitOutcome`, `Analysis`)
//! - derived display values (`FittedCurve`, `BreakpointAnnotation`)
//! - run configuration (`FitConfig`, `SolverOptions`, `SampleSpec`)

pub mod types;

pub use types::*;
