//! Terminal reports for fitted and failed datasets.

pub mod format;

pub use format::*;
