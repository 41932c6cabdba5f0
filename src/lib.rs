//! `inflection-fit` library crate.
//!
//! Detects a single inflection (a change of slope) in x,y data by fitting a
//! continuous two-segment line. The binary (`inflect`) is a thin wrapper around
//! this library so that:
//!
//! - core logic is testable without spawning processes
//! - the fitting core can be embedded without the CLI, plots or file formats

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod logging;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
