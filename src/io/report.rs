//! Read/write analysis report JSON files.
//!
//! A report is the portable representation of one analysis:
//! - source file name and generation time
//! - column labels and the original samples
//! - fitted parameters (+ covariance when finite)
//! - the resampled curve and the breakpoint annotation
//!
//! The schema is defined by `domain::FitReport`.

use std::fs::File;
use std::path::Path;

use chrono::Utc;

use crate::domain::{Analysis, FitReport};
use crate::error::AppError;

/// Build a report for an in-memory analysis.
pub fn build_report(source: &str, analysis: &Analysis) -> FitReport {
    let cov = analysis.fit.covariance;
    let covariance = cov.iter().flatten().all(|v| v.is_finite()).then_some(cov);

    FitReport {
        tool: "inflect".to_string(),
        source: source.to_string(),
        generated_at: Utc::now(),
        labels: analysis.labels.clone(),
        samples: analysis.samples.clone(),
        params: analysis.fit.params,
        covariance,
        iterations: analysis.fit.iterations,
        curve: analysis.curve.clone(),
        annotation: analysis.annotation.clone(),
    }
}

/// Write a report JSON file.
pub fn write_report_json(path: &Path, report: &FitReport) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create report JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, report)
        .map_err(|e| AppError::new(2, format!("Failed to write report JSON: {e}")))?;

    Ok(())
}

/// Read a report JSON file.
pub fn read_report_json(path: &Path) -> Result<FitReport, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open report JSON '{}': {e}", path.display())))?;
    let report: FitReport =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid report JSON: {e}")))?;
    Ok(report)
}
