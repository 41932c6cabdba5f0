//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - fits each input file and prints reports/plots
//! - writes optional artifacts (SVG, report JSON, curve CSV)
//! - re-renders saved reports and writes synthetic samples

use std::fs;
use std::path::Path;

use clap::Parser;
use tracing::{info, warn};

use crate::cli::{Command, FitArgs, PlotArgs, SampleArgs};
use crate::domain::{Analysis, ColumnLabels, FitConfig, PiecewiseParams, SampleSpec, SolverOptions};
use crate::error::AppError;
use crate::plot::{ChartData, ChartStyle};

pub mod pipeline;

use pipeline::{FileOutcome, FileResult};

/// Entry point for the `inflect` binary.
pub fn run() -> Result<(), AppError> {
    // A missing .env is fine.
    dotenvy::dotenv().ok();

    let cli = crate::cli::Cli::parse();
    crate::logging::init(cli.verbose);

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Plot(args) => handle_plot(args),
        Command::Sample(args) => handle_sample(args),
    }
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = fit_config_from_args(&args);
    for dir in [&config.svg_dir, &config.export_json, &config.export_curve]
        .into_iter()
        .flatten()
    {
        fs::create_dir_all(dir)
            .map_err(|e| AppError::new(2, format!("Failed to create '{}': {e}", dir.display())))?;
    }

    let outcomes = pipeline::run_batch(&config);

    let mut fitted = 0usize;
    let mut artifact_failures = 0usize;
    for outcome in &outcomes {
        match &outcome.result {
            FileResult::Fitted { dataset, analysis } => {
                fitted += 1;
                println!(
                    "{}",
                    crate::report::format_fit_summary(&outcome.source, dataset, analysis)
                );
                if config.plot {
                    let plot = crate::plot::render_ascii_plot(
                        &ChartData::from(analysis),
                        config.plot_width,
                        config.plot_height,
                    );
                    println!("{plot}");
                }
                if !emit_artifacts(&config, outcome, analysis) {
                    artifact_failures += 1;
                }
            }
            FileResult::Failed { dataset, reason } => {
                println!(
                    "{}",
                    crate::report::format_failure(&outcome.source, dataset.as_ref(), reason)
                );
            }
        }
    }

    info!(files = outcomes.len(), fitted, artifact_failures, "batch finished");
    Ok(())
}

/// Write the configured artifacts for one file. A failure is logged and does not
/// stop the batch.
fn emit_artifacts(config: &FitConfig, outcome: &FileOutcome, analysis: &Analysis) -> bool {
    match write_artifacts(config, outcome, analysis) {
        Ok(()) => true,
        Err(e) => {
            warn!(source = %outcome.source, error = %e, "failed to write artifacts");
            false
        }
    }
}

fn write_artifacts(config: &FitConfig, outcome: &FileOutcome, analysis: &Analysis) -> Result<(), AppError> {
    let stem = pipeline::artifact_stem(&outcome.path);

    if let Some(dir) = &config.svg_dir {
        let path = dir.join(format!("{stem}.svg"));
        crate::plot::write_svg_chart(&path, &ChartData::from(analysis), &ChartStyle::default())?;
        info!(path = %path.display(), "wrote SVG chart");
    }
    if let Some(dir) = &config.export_json {
        let path = dir.join(format!("{stem}.json"));
        let report = crate::io::build_report(&outcome.source, analysis);
        crate::io::write_report_json(&path, &report)?;
        info!(path = %path.display(), "wrote report JSON");
    }
    if let Some(dir) = &config.export_curve {
        let path = dir.join(format!("{stem}.curve.csv"));
        crate::io::write_curve_csv(&path, &analysis.curve, &analysis.labels)?;
        info!(path = %path.display(), "wrote curve CSV");
    }
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let report = crate::io::read_report_json(&args.report)?;
    let chart = ChartData::from(&report);

    println!("{}", crate::plot::render_ascii_plot(&chart, args.width, args.height));

    if let Some(path) = &args.svg {
        crate::plot::write_svg_chart(path, &chart, &ChartStyle::default())?;
        info!(path = %path.display(), "wrote SVG chart");
    }
    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let spec = sample_spec_from_args(&args);
    let dataset = crate::data::generate_sample(&spec)?;
    ensure_parent_dir(&args.out)?;
    crate::io::write_samples_csv(&args.out, &dataset)?;
    info!(path = %args.out.display(), n = dataset.samples.len(), "wrote sample");
    println!("Wrote {} samples to {}", dataset.samples.len(), args.out.display());
    Ok(())
}

pub fn fit_config_from_args(args: &FitArgs) -> FitConfig {
    FitConfig {
        inputs: args.files.clone(),
        solver: SolverOptions {
            max_iterations: args.max_iter,
            ftol: args.ftol,
            xtol: args.xtol,
            gtol: args.gtol,
        },
        plot: args.plot && !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        svg_dir: args.svg_dir.clone(),
        export_json: args.export_json.clone(),
        export_curve: args.export_curve.clone(),
    }
}

pub fn sample_spec_from_args(args: &SampleArgs) -> SampleSpec {
    SampleSpec {
        n: args.n,
        x_min: args.x_min,
        x_max: args.x_max,
        params: PiecewiseParams::new(args.x0, args.y0, args.k1, args.k2),
        noise_sd: args.noise,
        seed: args.seed,
        labels: ColumnLabels::new(args.x_name.clone(), args.y_name.clone()),
    }
}

fn ensure_parent_dir(path: &Path) -> Result<(), AppError> {
    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };
    fs::create_dir_all(parent)
        .map_err(|e| AppError::new(2, format!("Failed to create '{}': {e}", parent.display())))
}
