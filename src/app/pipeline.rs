//! Shared "fit pipeline" logic for the `fit` subcommand and the integration tests.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! decode files -> fit the batch in parallel -> per-file outcomes in input order
//!
//! The caller then focuses on presentation (printing, artifacts).

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::domain::{Analysis, Dataset, FitConfig};
use crate::fit::{BatchInput, analyze_batch};
use crate::io::load_dataset;
use crate::report::describe_fit_error;

/// Result of processing one input file.
#[derive(Debug, Clone)]
pub enum FileResult {
    Fitted { dataset: Dataset, analysis: Analysis },
    /// Decoding or fitting failed. `dataset` is set when decoding succeeded.
    Failed {
        dataset: Option<Dataset>,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub path: PathBuf,
    /// Display name (file name) used in reports and logs.
    pub source: String,
    pub result: FileResult,
}

/// Decode every input, fit the decodable ones in parallel, and return one outcome
/// per input in input order.
pub fn run_batch(config: &FitConfig) -> Vec<FileOutcome> {
    let mut slots: Vec<Option<FileOutcome>> = Vec::with_capacity(config.inputs.len());
    let mut batch = Vec::new();
    let mut batch_slots = Vec::new();

    // 1) Decode sequentially; decode failures are final outcomes.
    for path in &config.inputs {
        let source = source_name(path);
        match load_dataset(path) {
            Ok(dataset) => {
                info!(
                    source = %source,
                    rows_read = dataset.rows_read,
                    rows_used = dataset.samples.len(),
                    row_errors = dataset.row_errors.len(),
                    "decoded input"
                );
                batch_slots.push(slots.len());
                slots.push(None);
                batch.push(BatchInput { source, dataset });
            }
            Err(e) => {
                warn!(source = %source, error = %e, "failed to decode input");
                slots.push(Some(FileOutcome {
                    path: path.clone(),
                    source,
                    result: FileResult::Failed {
                        dataset: None,
                        reason: e.to_string(),
                    },
                }));
            }
        }
    }

    // 2) Fit the decoded datasets in parallel.
    let items = analyze_batch(&batch, &config.solver);

    // 3) Merge back into input order.
    for ((slot, input), item) in batch_slots.into_iter().zip(batch).zip(items) {
        let result = match item.result {
            Ok(analysis) => FileResult::Fitted {
                dataset: input.dataset,
                analysis,
            },
            Err(e) => FileResult::Failed {
                dataset: Some(input.dataset),
                reason: describe_fit_error(&e),
            },
        };
        slots[slot] = Some(FileOutcome {
            path: config.inputs[slot].clone(),
            source: item.source,
            result,
        });
    }

    slots.into_iter().flatten().collect()
}

/// File name of `path`, falling back to the full path.
pub fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// File stem used to name per-input artifacts.
pub fn artifact_stem(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "input".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_come_from_the_file_path() {
        let p = Path::new("/data/run 1/lactate.csv");
        assert_eq!(source_name(p), "lactate.csv");
        assert_eq!(artifact_stem(p), "lactate");
        assert_eq!(artifact_stem(Path::new("/")), "input");
    }
}
