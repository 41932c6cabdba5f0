//! Shared domain types.
//!
//! These types are plain values, kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - handed to renderers without leaking layout concerns back into the fitter
//! - exported to JSON/CSV and reloaded later for plotting

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Names of the x and y columns.
///
/// Only used for annotation and axis text, never in computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLabels {
    pub x: String,
    pub y: String,
}

impl ColumnLabels {
    pub fn new(x: impl Into<String>, y: impl Into<String>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
        }
    }
}

impl Default for ColumnLabels {
    fn default() -> Self {
        Self::new("x", "y")
    }
}

/// Observed `(x, y)` pairs, paired by index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleSet {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl SampleSet {
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Self {
        Self { x, y }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }
}

/// Parameters of the continuous two-segment model.
///
/// - `x0`: breakpoint location
/// - `y0`: model value at `x0`
/// - `k1`: slope for `x < x0`
/// - `k2`: slope for `x >= x0`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PiecewiseParams {
    pub x0: f64,
    pub y0: f64,
    pub k1: f64,
    pub k2: f64,
}

impl PiecewiseParams {
    /// Number of free parameters.
    pub const LEN: usize = 4;

    pub fn new(x0: f64, y0: f64, k1: f64, k2: f64) -> Self {
        Self { x0, y0, k1, k2 }
    }

    pub fn to_array(self) -> [f64; 4] {
        [self.x0, self.y0, self.k1, self.k2]
    }

    pub fn from_array(p: [f64; 4]) -> Self {
        Self::new(p[0], p[1], p[2], p[3])
    }

    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}

/// Output of a converged fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitOutcome {
    pub params: PiecewiseParams,
    /// Parameter covariance in `(x0, y0, k1, k2)` order.
    ///
    /// Entries are `+inf` when there are no residual degrees of freedom.
    pub covariance: [[f64; 4]; 4],
    /// Accepted and rejected solver steps taken.
    pub iterations: usize,
    /// Sum of squared residuals at the solution.
    pub sse: f64,
}

/// Evenly spaced model predictions for plotting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FittedCurve {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl FittedCurve {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }
}

/// Text label placed near the breakpoint.
///
/// `(x, y)` is the display anchor, not the breakpoint itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakpointAnnotation {
    pub x: f64,
    pub y: f64,
    pub label: String,
}

/// A row skipped during decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    /// 1-based line number in the source file.
    pub line: usize,
    pub message: String,
}

/// A decoded two-column table, ready for fitting.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub labels: ColumnLabels,
    pub samples: SampleSet,
    pub rows_read: usize,
    pub row_errors: Vec<RowError>,
}

impl Dataset {
    pub fn new(labels: ColumnLabels, samples: SampleSet) -> Self {
        let rows_read = samples.len();
        Self {
            labels,
            samples,
            rows_read,
            row_errors: Vec::new(),
        }
    }
}

/// Everything a renderer needs: raw samples, fit, curve and annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub labels: ColumnLabels,
    pub samples: SampleSet,
    pub fit: FitOutcome,
    pub curve: FittedCurve,
    pub annotation: BreakpointAnnotation,
}

/// A saved analysis (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitReport {
    pub tool: String,
    pub source: String,
    pub generated_at: DateTime<Utc>,
    pub labels: ColumnLabels,
    pub samples: SampleSet,
    pub params: PiecewiseParams,
    /// `None` when any entry is non-finite (JSON has no infinity).
    pub covariance: Option<[[f64; 4]; 4]>,
    pub iterations: usize,
    pub curve: FittedCurve,
    pub annotation: BreakpointAnnotation,
}

/// Stopping rules for the least-squares solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverOptions {
    /// Step budget (accepted + rejected).
    pub max_iterations: usize,
    /// Relative cost reduction below which an accepted step ends the fit.
    pub ftol: f64,
    /// Relative step length below which the fit ends.
    pub xtol: f64,
    /// Gradient infinity norm (relative to `max(1, cost)`) below which the fit ends.
    pub gtol: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            ftol: 1e-12,
            xtol: 1e-12,
            gtol: 1e-12,
        }
    }
}

/// A full `inflect fit` run's configuration, derived from CLI flags.
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub inputs: Vec<PathBuf>,
    pub solver: SolverOptions,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub svg_dir: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
    pub export_curve: Option<PathBuf>,
}

/// Recipe for a synthetic dataset.
#[derive(Debug, Clone)]
pub struct SampleSpec {
    pub n: usize,
    pub x_min: f64,
    pub x_max: f64,
    pub params: PiecewiseParams,
    /// Standard deviation of additive Gaussian noise on y.
    pub noise_sd: f64,
    pub seed: u64,
    pub labels: ColumnLabels,
}
