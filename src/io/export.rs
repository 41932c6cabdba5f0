//! Two-column CSV exports (fitted curve, generated samples).
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts:
//! two columns headed by the original column names, readable by our own ingest.

use std::path::Path;

use crate::domain::{ColumnLabels, Dataset, FittedCurve};
use crate::error::AppError;

/// Write the fitted curve to a CSV file.
pub fn write_curve_csv(path: &Path, curve: &FittedCurve, labels: &ColumnLabels) -> Result<(), AppError> {
    write_xy_csv(path, labels, curve.points())
}

/// Write a dataset's samples to a CSV file (e.g. a generated sample).
pub fn write_samples_csv(path: &Path, dataset: &Dataset) -> Result<(), AppError> {
    write_xy_csv(path, &dataset.labels, dataset.samples.points())
}

fn write_xy_csv(
    path: &Path,
    labels: &ColumnLabels,
    points: impl Iterator<Item = (f64, f64)>,
) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create CSV '{}': {e}", path.display())))?;

    writer
        .write_record([labels.x.as_str(), labels.y.as_str()])
        .map_err(|e| AppError::new(2, format!("Failed to write CSV header: {e}")))?;

    for (x, y) in points {
        writer
            .write_record([x.to_string(), y.to_string()])
            .map_err(|e| AppError::new(2, format!("Failed to write CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush CSV '{}': {e}", path.display())))?;

    Ok(())
}
