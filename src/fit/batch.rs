//! Fit many datasets independently.
//!
//! Each dataset is fitted in its own rayon task with no shared state. A failed
//! fit is kept as that item's result; it never aborts the rest of the batch.

use rayon::prelude::*;
use tracing::{info, warn};

use crate::domain::{Analysis, Dataset, SolverOptions};
use crate::error::FitError;
use crate::fit::analyze;

/// A named dataset to fit.
#[derive(Debug, Clone)]
pub struct BatchInput {
    pub source: String,
    pub dataset: Dataset,
}

/// Per-source outcome of a batch.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub source: String,
    pub result: Result<Analysis, FitError>,
}

/// Fit every input in parallel. Output order matches input order.
pub fn analyze_batch(inputs: &[BatchInput], opts: &SolverOptions) -> Vec<BatchItem> {
    inputs
        .par_iter()
        .map(|input| {
            let result = analyze(&input.dataset, opts);
            match &result {
                Ok(a) => info!(
                    source = %input.source,
                    x0 = a.fit.params.x0,
                    y0 = a.fit.params.y0,
                    k1 = a.fit.params.k1,
                    k2 = a.fit.params.k2,
                    iterations = a.fit.iterations,
                    "breakpoint found"
                ),
                Err(e) => warn!(source = %input.source, error = %e, "no inflection detected"),
            }
            BatchItem {
                source: input.source.clone(),
                result,
            }
        })
        .collect()
}
