//! Rendering collaborators.
//!
//! - deterministic terminal plot (`ascii`)
//! - SVG chart written with Plotters (`svg`)
//!
//! Both read a `ChartData` view, which can be built from a live `Analysis` or a
//! saved `FitReport`, so nothing here depends on how the fit was produced.

pub mod ascii;
pub mod svg;

pub use ascii::*;
pub use svg::*;

use crate::domain::{Analysis, BreakpointAnnotation, ColumnLabels, FitReport, FittedCurve, SampleSet};

/// Everything a chart draws.
#[derive(Debug, Clone, Copy)]
pub struct ChartData<'a> {
    pub labels: &'a ColumnLabels,
    pub samples: &'a SampleSet,
    pub curve: &'a FittedCurve,
    pub annotation: &'a BreakpointAnnotation,
    /// Breakpoint location (drawn as a vertical marker).
    pub x0: f64,
}

impl<'a> From<&'a Analysis> for ChartData<'a> {
    fn from(a: &'a Analysis) -> Self {
        Self {
            labels: &a.labels,
            samples: &a.samples,
            curve: &a.curve,
            annotation: &a.annotation,
            x0: a.fit.params.x0,
        }
    }
}

impl<'a> From<&'a FitReport> for ChartData<'a> {
    fn from(r: &'a FitReport) -> Self {
        Self {
            labels: &r.labels,
            samples: &r.samples,
            curve: &r.curve,
            annotation: &r.annotation,
            x0: r.params.x0,
        }
    }
}

impl ChartData<'_> {
    /// `(min, max)` over sample and curve x values, if the span is non-empty.
    pub fn x_range(&self) -> Option<(f64, f64)> {
        finite_range(self.samples.x.iter().chain(self.curve.x.iter()))
    }

    /// `(min, max)` over sample and curve y values, if the span is non-empty.
    pub fn y_range(&self) -> Option<(f64, f64)> {
        finite_range(self.samples.y.iter().chain(self.curve.y.iter()))
    }
}

fn finite_range<'v>(values: impl Iterator<Item = &'v f64>) -> Option<(f64, f64)> {
    let mut min_v = f64::INFINITY;
    let mut max_v = f64::NEG_INFINITY;
    for &v in values {
        min_v = min_v.min(v);
        max_v = max_v.max(v);
    }
    if min_v.is_finite() && max_v.is_finite() && max_v > min_v {
        Some((min_v, max_v))
    } else {
        None
    }
}
