//! Input/output helpers.
//!
//! - tabular ingest behind per-content-type decoders (`ingest`)
//! - two-column CSV export of curves and samples (`export`)
//! - analysis report JSON read/write (`report`)

pub mod export;
pub mod ingest;
pub mod report;

pub use export::*;
pub use ingest::*;
pub use report::*;
