//! Command-line parsing for the inflection detector.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling/math code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "inflect",
    version,
    about = "Detect a single inflection in x,y data by piecewise-linear least squares"
)]
pub struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit one or more two-column files and report each breakpoint.
    Fit(FitArgs),
    /// Plot a previously exported report JSON.
    Plot(PlotArgs),
    /// Write a synthetic two-segment dataset to CSV.
    Sample(SampleArgs),
}

/// Options for fitting.
#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    /// Input files (.csv, .tsv, .txt, .xls, .xlsx); first row = column names, first two columns = x, y.
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Render an ASCII plot in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Write an SVG chart per input into this directory.
    #[arg(long = "svg-dir", value_name = "DIR")]
    pub svg_dir: Option<PathBuf>,

    /// Write a report JSON per input into this directory.
    #[arg(long = "export-json", value_name = "DIR")]
    pub export_json: Option<PathBuf>,

    /// Write the fitted curve CSV per input into this directory.
    #[arg(long = "export-curve", value_name = "DIR")]
    pub export_curve: Option<PathBuf>,

    /// Solver step budget.
    #[arg(long = "max-iter", default_value_t = 1000)]
    pub max_iter: usize,

    /// Relative cost-reduction tolerance.
    #[arg(long, default_value_t = 1e-12)]
    pub ftol: f64,

    /// Relative step-size tolerance.
    #[arg(long, default_value_t = 1e-12)]
    pub xtol: f64,

    /// Gradient tolerance.
    #[arg(long, default_value_t = 1e-12)]
    pub gtol: f64,
}

/// Options for plotting a saved report.
#[derive(Debug, Args)]
pub struct PlotArgs {
    /// Report JSON file produced by `inflect fit --export-json`.
    #[arg(long, value_name = "JSON")]
    pub report: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Also write the chart as SVG.
    #[arg(long, value_name = "SVG")]
    pub svg: Option<PathBuf>,
}

/// Options for generating a synthetic dataset.
#[derive(Debug, Args)]
pub struct SampleArgs {
    /// Output CSV path.
    #[arg(long, value_name = "CSV")]
    pub out: PathBuf,

    /// Number of samples.
    #[arg(short = 'n', long, default_value_t = 40)]
    pub n: usize,

    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub x_min: f64,

    #[arg(long, default_value_t = 20.0, allow_negative_numbers = true)]
    pub x_max: f64,

    /// Breakpoint location.
    #[arg(long, default_value_t = 8.0, allow_negative_numbers = true)]
    pub x0: f64,

    /// Model value at the breakpoint.
    #[arg(long, default_value_t = 4.0, allow_negative_numbers = true)]
    pub y0: f64,

    /// Slope left of the breakpoint.
    #[arg(long, default_value_t = 0.5, allow_negative_numbers = true)]
    pub k1: f64,

    /// Slope right of the breakpoint.
    #[arg(long, default_value_t = 2.0, allow_negative_numbers = true)]
    pub k2: f64,

    /// Standard deviation of Gaussian noise added to y.
    #[arg(long, default_value_t = 0.2)]
    pub noise: f64,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Header for the x column.
    #[arg(long, default_value = "x")]
    pub x_name: String,

    /// Header for the y column.
    #[arg(long, default_value = "y")]
    pub y_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_accepts_many_files_and_flags() {
        let cli = Cli::try_parse_from([
            "inflect", "fit", "a.csv", "b.tsv", "--no-plot", "--svg-dir", "out", "--max-iter", "50",
        ])
        .unwrap();
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(args.files, vec![PathBuf::from("a.csv"), PathBuf::from("b.tsv")]);
        assert!(args.no_plot);
        assert_eq!(args.svg_dir, Some(PathBuf::from("out")));
        assert_eq!(args.max_iter, 50);
        assert_eq!(args.ftol, 1e-12);
    }

    #[test]
    fn fit_requires_a_file() {
        assert!(Cli::try_parse_from(["inflect", "fit"]).is_err());
    }

    #[test]
    fn sample_accepts_negative_numbers() {
        let cli = Cli::try_parse_from([
            "inflect", "sample", "--out", "s.csv", "--x-min", "-5", "--k2", "-1.5",
        ])
        .unwrap();
        let Command::Sample(args) = cli.command else {
            panic!("expected sample");
        };
        assert_eq!(args.x_min, -5.0);
        assert_eq!(args.k2, -1.5);
        assert_eq!(args.n, 40);
    }
}
