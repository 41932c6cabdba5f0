//! Values derived from a fit for display: the resampled curve, the breakpoint
//! annotation, and the bundled `Analysis` handed to renderers.

use crate::domain::{
    Analysis, BreakpointAnnotation, ColumnLabels, Dataset, FittedCurve, PiecewiseParams,
    SolverOptions,
};
use crate::error::FitError;
use crate::fit::fit_with;
use crate::math::{linspace, min_max};
use crate::models::evaluate;

/// Horizontal placement of the annotation, as a fraction of `x0`.
const ANNOTATION_X_FACTOR: f64 = 0.75;
/// Vertical placement of the annotation, as a multiple of `max(y)`.
const ANNOTATION_Y_FACTOR: f64 = 1.1;

/// `len(x)` evenly spaced points over `[min(x), max(x)]`, evaluated at `params`.
pub fn resample_curve(x: &[f64], params: &PiecewiseParams) -> FittedCurve {
    let Some((lo, hi)) = min_max(x) else {
        return FittedCurve::default();
    };
    let grid = linspace(lo, hi, x.len());
    let y = evaluate(&grid, params);
    FittedCurve { x: grid, y }
}

/// Label placed above and left of the breakpoint.
pub fn breakpoint_annotation(
    params: &PiecewiseParams,
    y: &[f64],
    labels: &ColumnLabels,
) -> BreakpointAnnotation {
    let y_max = y.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    BreakpointAnnotation {
        x: params.x0 * ANNOTATION_X_FACTOR,
        y: y_max * ANNOTATION_Y_FACTOR,
        label: format!(
            "{}: {:.1}, {}: {:.1}",
            labels.x, params.x0, labels.y, params.y0
        ),
    }
}

/// Fit a decoded dataset and derive everything a renderer needs.
pub fn analyze(dataset: &Dataset, opts: &SolverOptions) -> Result<Analysis, FitError> {
    let samples = &dataset.samples;
    let fit = fit_with(&samples.x, &samples.y, opts)?;
    let curve = resample_curve(&samples.x, &fit.params);
    let annotation = breakpoint_annotation(&fit.params, &samples.y, &dataset.labels);

    Ok(Analysis {
        labels: dataset.labels.clone(),
        samples: samples.clone(),
        fit,
        curve,
        annotation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SampleSet;

    #[test]
    fn resample_spans_range_with_input_length() {
        let x = [3.0, -1.0, 7.5, 2.0, 0.0];
        let p = PiecewiseParams::new(2.0, 1.0, 1.0, -1.0);
        let curve = resample_curve(&x, &p);

        assert_eq!(curve.len(), x.len());
        assert_eq!(curve.x[0], -1.0);
        assert_eq!(curve.x[4], 7.5);
        for w in curve.x.windows(2) {
            assert!((w[1] - w[0] - 2.125).abs() < 1e-12);
        }
        assert_eq!(curve.y, evaluate(&curve.x, &p));
    }

    #[test]
    fn resample_edge_lengths() {
        let p = PiecewiseParams::new(0.0, 0.0, 1.0, 1.0);
        assert!(resample_curve(&[], &p).is_empty());

        let single = resample_curve(&[4.0], &p);
        assert_eq!(single.x, vec![4.0]);
    }

    #[test]
    fn annotation_anchor_and_label() {
        let p = PiecewiseParams::new(5.04, 4.96, 1.0, 5.0);
        let labels = ColumnLabels::new("Dose", "Response");
        let a = breakpoint_annotation(&p, &[1.0, 30.0, 12.0], &labels);

        assert!((a.x - 3.78).abs() < 1e-12);
        assert!((a.y - 33.0).abs() < 1e-12);
        assert_eq!(a.label, "Dose: 5.0, Response: 5.0");
    }

    #[test]
    fn analyze_bundles_fit_and_derivations() {
        let x: Vec<f64> = (1..=10).map(f64::from).collect();
        let y = vec![1.0, 2.0, 3.0, 4.0, 5.0, 10.0, 15.0, 20.0, 25.0, 30.0];
        let dataset = Dataset::new(ColumnLabels::new("t", "v"), SampleSet::new(x.clone(), y));

        let analysis = analyze(&dataset, &SolverOptions::default()).unwrap();
        assert_eq!(analysis.curve.len(), 10);
        assert_eq!(analysis.samples.x, x);
        assert!(analysis.annotation.label.starts_with("t: 5.0, v: 5.0"));
    }
}
