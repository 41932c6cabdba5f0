//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized (important for snapshot tests)

use crate::domain::{Analysis, Dataset};
use crate::error::FitError;

/// Row errors listed before the rest are summarised as a count.
const MAX_LISTED_ROW_ERRORS: usize = 5;

/// Format the summary of one fitted dataset.
pub fn format_fit_summary(source: &str, dataset: &Dataset, analysis: &Analysis) -> String {
    let mut out = String::new();
    let labels = &analysis.labels;
    let p = &analysis.fit.params;

    out.push_str(&format!("=== {source} ===\n"));
    out.push_str(&format_rows(dataset));
    out.push_str(&format!(
        "Breakpoint: {}={:.4} | {}={:.4}\n",
        labels.x, p.x0, labels.y, p.y0
    ));
    out.push_str(&format!("Slopes: k1={:.4} (x < x0) | k2={:.4} (x >= x0)\n", p.k1, p.k2));
    out.push_str(&format!("Solver: iterations={}\n", analysis.fit.iterations));
    out.push_str(&format!(
        "Annotation: \"{}\" at ({:.3}, {:.3})\n",
        analysis.annotation.label, analysis.annotation.x, analysis.annotation.y
    ));

    out
}

/// Format a dataset that could not be fitted.
pub fn format_failure(source: &str, dataset: Option<&Dataset>, reason: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== {source} ===\n"));
    if let Some(ds) = dataset {
        out.push_str(&format_rows(ds));
    }
    out.push_str(&format!("No inflection detected: {reason}\n"));
    out
}

/// Short human description of a fit failure.
pub fn describe_fit_error(err: &FitError) -> String {
    match err {
        FitError::InsufficientData { reason } => format!("not enough data ({reason})"),
        FitError::MalformedInput { reason } => format!("malformed input ({reason})"),
        FitError::FitDivergence { reason } => format!("the fit did not converge ({reason})"),
    }
}

fn format_rows(ds: &Dataset) -> String {
    let mut out = format!(
        "Columns: x={} | y={}\nRows: read={} used={} skipped={}\n",
        ds.labels.x,
        ds.labels.y,
        ds.rows_read,
        ds.samples.len(),
        ds.rows_read.saturating_sub(ds.samples.len()),
    );
    for e in ds.row_errors.iter().take(MAX_LISTED_ROW_ERRORS) {
        out.push_str(&format!("  line {}: {}\n", e.line, e.message));
    }
    if ds.row_errors.len() > MAX_LISTED_ROW_ERRORS {
        out.push_str(&format!(
            "  ... {} more row errors\n",
            ds.row_errors.len() - MAX_LISTED_ROW_ERRORS
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ColumnLabels, RowError, SampleSet, SolverOptions};
    use crate::fit::analyze;

    fn dataset() -> Dataset {
        let x: Vec<f64> = (1..=10).map(f64::from).collect();
        let y = vec![1.0, 2.0, 3.0, 4.0, 5.0, 10.0, 15.0, 20.0, 25.0, 30.0];
        let mut ds = Dataset::new(ColumnLabels::new("Watts", "Lactate"), SampleSet::new(x, y));
        ds.rows_read = 12;
        ds.row_errors = vec![RowError {
            line: 4,
            message: "Watts value 'abc' is not a number".to_string(),
        }];
        ds
    }

    #[test]
    fn summary_lists_breakpoint_and_rows() {
        let ds = dataset();
        let analysis = analyze(&ds, &SolverOptions::default()).unwrap();
        let txt = format_fit_summary("ramp.csv", &ds, &analysis);

        assert!(txt.starts_with("=== ramp.csv ===\n"));
        assert!(txt.contains("Rows: read=12 used=10 skipped=2\n"));
        assert!(txt.contains("  line 4: Watts value 'abc' is not a number\n"));
        assert!(txt.contains("Breakpoint: Watts=5.0000 | Lactate=5.0000\n"));
        assert!(txt.contains("Annotation: \"Watts: 5.0, Lactate: 5.0\" at (3.750, 33.000)\n"));
    }

    #[test]
    fn failure_reads_as_no_inflection() {
        let err = FitError::insufficient("3 samples; at least 4 are required");
        let txt = format_failure("short.csv", None, &describe_fit_error(&err));
        assert_eq!(
            txt,
            "=== short.csv ===\nNo inflection detected: not enough data (3 samples; at least 4 are required)\n"
        );
    }
}
