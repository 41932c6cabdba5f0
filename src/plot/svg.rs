//! Plotters-powered SVG chart of one analysis.
//!
//! The layout follows the interactive chart of the upload front-end:
//! - samples as markers, the regression as a line
//! - a dash-dot vertical line at `x0` from `max(y)` down to `0`
//! - the breakpoint annotation text at its display anchor
//!
//! Colours and size come from `ChartStyle`, which callers own.

use std::error::Error;
use std::path::Path;

use plotters::prelude::*;

use crate::error::AppError;
use crate::plot::ChartData;

/// Colours and canvas size for the SVG chart.
#[derive(Debug, Clone, Copy)]
pub struct ChartStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub text: RGBColor,
    pub samples: RGBColor,
    pub regression: RGBColor,
    /// Breakpoint line and annotation.
    pub accent: RGBColor,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            width: 750,
            height: 340,
            background: RGBColor(0x27, 0x2B, 0x30),
            text: RGBColor(0xaa, 0xaa, 0xaa),
            samples: RGBColor(31, 119, 180),
            regression: RGBColor(255, 127, 14),
            accent: RGBColor(98, 196, 98),
        }
    }
}

/// Number of dash + dot repetitions along the breakpoint line.
const DASH_DOT_PERIODS: usize = 12;

/// Write the chart to `path` as SVG.
pub fn write_svg_chart(path: &Path, chart: &ChartData<'_>, style: &ChartStyle) -> Result<(), AppError> {
    draw_chart(path, chart, style)
        .map_err(|e| AppError::new(4, format!("Failed to render chart '{}': {e}", path.display())))
}

fn draw_chart(path: &Path, chart: &ChartData<'_>, style: &ChartStyle) -> Result<(), Box<dyn Error>> {
    let (x_lo, x_hi, y_lo, y_hi) = chart_bounds(chart);

    let root = SVGBackend::new(path, (style.width, style.height)).into_drawing_area();
    root.fill(&style.background)?;

    let mut ctx = ChartBuilder::on(&root)
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;

    ctx.configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_desc(chart.labels.x.as_str())
        .y_desc(chart.labels.y.as_str())
        .label_style(("sans-serif", 12).into_font().color(&style.text))
        .axis_style(&style.text)
        .draw()?;

    // 1) Samples.
    ctx.draw_series(
        chart
            .samples
            .points()
            .map(|(x, y)| Circle::new((x, y), 3, style.samples.filled())),
    )?;

    // 2) Regression line.
    ctx.draw_series(LineSeries::new(
        chart.curve.points(),
        style.regression.stroke_width(2),
    ))?;

    // 3) Breakpoint marker, from the top of the data down to zero.
    let y_top = chart
        .samples
        .y
        .iter()
        .cloned()
        .fold(f64::NEG_INFINITY, f64::max);
    if chart.x0.is_finite() && y_top.is_finite() {
        ctx.draw_series(
            dash_dot_segments(chart.x0, y_top, 0.0, DASH_DOT_PERIODS)
                .into_iter()
                .map(|[a, b]| PathElement::new(vec![a, b], style.accent.stroke_width(2))),
        )?;
    }

    // 4) Annotation text.
    let a = chart.annotation;
    if a.x.is_finite() && a.y.is_finite() {
        ctx.draw_series(std::iter::once(Text::new(
            a.label.clone(),
            (a.x, a.y),
            ("sans-serif", 14).into_font().color(&style.accent),
        )))?;
    }

    root.present()?;
    Ok(())
}

/// Axis bounds covering samples, curve, the zero baseline of the breakpoint
/// marker and the annotation anchor, padded by 5%.
fn chart_bounds(chart: &ChartData<'_>) -> (f64, f64, f64, f64) {
    let (mut x_lo, mut x_hi) = chart.x_range().unwrap_or((0.0, 1.0));
    let (mut y_lo, mut y_hi) = chart.y_range().unwrap_or((0.0, 1.0));

    y_lo = y_lo.min(0.0);
    y_hi = y_hi.max(0.0);
    let a = chart.annotation;
    if a.x.is_finite() && a.y.is_finite() {
        x_lo = x_lo.min(a.x);
        x_hi = x_hi.max(a.x);
        y_lo = y_lo.min(a.y);
        y_hi = y_hi.max(a.y);
    }

    let x_pad = ((x_hi - x_lo) * 0.05).max(1e-9);
    let y_pad = ((y_hi - y_lo) * 0.05).max(1e-9);
    (x_lo - x_pad, x_hi + x_pad, y_lo - y_pad, y_hi + y_pad)
}

/// Split the vertical segment `x = x0, y ∈ [y_from, y_to]` into dash-dot pieces.
///
/// Each period is a long dash, a gap, a short dot and a gap (50/20/10/20 %).
fn dash_dot_segments(x0: f64, y_from: f64, y_to: f64, periods: usize) -> Vec<[(f64, f64); 2]> {
    let periods = periods.max(1);
    let period = (y_to - y_from) / periods as f64;
    let mut out = Vec::with_capacity(periods * 2);
    for i in 0..periods {
        let start = y_from + period * i as f64;
        out.push([(x0, start), (x0, start + period * 0.5)]);
        out.push([(x0, start + period * 0.7), (x0, start + period * 0.8)]);
    }
    out
}
