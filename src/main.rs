use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use mica_curve::{AnnotatedCurve, AnnotationFilter, ExtremaFilter, InflectionFilter};
use mica_io::{CurveReader, ResultWriter, RunName};
use mica_pica::{Basis, CancelToken, Distance, Metric, Outcome, PicaConfig};
use mica_progressive::MicaConfig;

#[derive(Parser)]
#[command(name = "mica")]
#[command(about = "Landmark-based multiple curve alignment")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,
}

/// Landmark filters applied to every input curve.
#[derive(Args, Debug, Clone)]
struct AnnotateArgs {
    /// Drop neighbouring extremum pairs whose y-difference is at most this fraction of the y-range
    #[arg(long)]
    extrema_filter: Option<f64>,

    /// Drop inflections whose slope is at most this fraction of the steepest slope
    #[arg(long)]
    inflection_filter: Option<f64>,
}

/// Pairwise alignment parameters.
#[derive(Args, Debug, Clone)]
struct AlignArgs {
    /// Distance function: mae, rms, slope-mae, or slope-rms
    #[arg(long, default_value = "mae")]
    metric: String,

    /// Number of equidistant samples for distance evaluation
    #[arg(long, default_value_t = 500)]
    samples: usize,

    /// Minimal interval length relative to the curve length
    #[arg(long, default_value_t = 0.01)]
    min_interval: f64,

    /// Maximal landmark shift relative to the curve length
    #[arg(long, default_value_t = 0.2)]
    max_shift: f64,

    /// Maximal ratio between warped and original interval length
    #[arg(long, default_value_t = 2.0)]
    max_distortion: f64,

    /// Penalty weight on warping (0 disables the penalty)
    #[arg(long, default_value_t = 0.0)]
    warp_penalty: f64,
}

#[derive(Subcommand)]
enum Command {
    /// Align all curves of a CSV file and write the warped curves
    Align {
        #[arg(long)]
        data: PathBuf,

        #[arg(long)]
        run: String,

        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        /// Index of the curve whose interval lengths stay fixed
        #[arg(long)]
        reference: Option<usize>,

        #[command(flatten)]
        annotate: AnnotateArgs,

        #[command(flatten)]
        align: AlignArgs,
    },

    /// Classify and filter landmarks without aligning
    Landmarks {
        #[arg(long)]
        data: PathBuf,

        #[arg(long)]
        run: String,

        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        #[command(flatten)]
        annotate: AnnotateArgs,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct AlignOutput {
    run: String,
    n_curves: usize,
    n_intervals: usize,
    reference: Option<String>,
    distance: Option<f64>,
    guide_tree: String,
}

#[derive(Serialize)]
struct LandmarksOutput {
    run: String,
    n_curves: usize,
    landmarks: Vec<LandmarkCount>,
}

#[derive(Serialize)]
struct LandmarkCount {
    name: String,
    total: usize,
    filtered: usize,
}

fn parse_distance(metric: &str, samples: usize) -> Result<Distance> {
    let (metric, basis) = match metric {
        "mae" => (Metric::MeanAbsolute, Basis::Value),
        "rms" => (Metric::RootMeanSquare, Basis::Value),
        "slope-mae" => (Metric::MeanAbsolute, Basis::Slope),
        "slope-rms" => (Metric::RootMeanSquare, Basis::Slope),
        other => anyhow::bail!("unknown metric: {other} (expected mae, rms, slope-mae, or slope-rms)"),
    };
    Ok(Distance::new(metric, basis, samples)?)
}

fn build_pica(args: &AlignArgs) -> Result<PicaConfig> {
    let config = PicaConfig::new(parse_distance(&args.metric, args.samples)?)
        .with_min_rel_interval_length(args.min_interval)
        .with_max_rel_x_shift(args.max_shift)
        .with_max_distortion_ratio(args.max_distortion)
        .with_warp_penalty(args.warp_penalty);
    config.validate().context("invalid alignment parameters")?;
    Ok(config)
}

/// Read curves and attach the shared filters.
fn load_curves(data: &Path, annotate: &AnnotateArgs) -> Result<Vec<Arc<AnnotatedCurve>>> {
    let dataset = CurveReader::new(data)
        .read()
        .context("failed to read input CSV")?;

    let mut filters: Vec<Arc<dyn AnnotationFilter>> = Vec::new();
    if let Some(threshold) = annotate.extrema_filter {
        filters.push(Arc::new(
            ExtremaFilter::new(threshold).context("invalid extrema filter threshold")?,
        ));
    }
    if let Some(threshold) = annotate.inflection_filter {
        filters.push(Arc::new(
            InflectionFilter::new(threshold).context("invalid inflection filter threshold")?,
        ));
    }

    let curves: Vec<_> = dataset
        .curves
        .into_iter()
        .map(|c| {
            let mut curve = AnnotatedCurve::from_curve(c);
            for filter in &filters {
                curve.add_filter(Arc::clone(filter));
            }
            Arc::new(curve)
        })
        .collect();
    info!(n_curves = curves.len(), n_filters = filters.len(), "curves annotated");
    Ok(curves)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Align {
            data,
            run,
            output_dir,
            reference,
            annotate,
            align,
        } => {
            let run_name = RunName::new(run.clone())?;
            let pica = build_pica(&align)?;

            // Read and annotate curves
            let curves = load_curves(&data, &annotate)?;
            if let Some(r) = reference {
                anyhow::ensure!(
                    r < curves.len(),
                    "reference index {r} out of range for {} curves",
                    curves.len()
                );
            }

            // Progressive alignment
            let config = MicaConfig::new(pica);
            let cancel = CancelToken::new();
            let outcome = match reference {
                Some(r) => config.align_to_reference(r, &curves, &cancel),
                None => config.align(&curves, &cancel),
            }
            .context("alignment failed")?;
            let root = match outcome {
                Outcome::Completed(root) => root,
                Outcome::Cancelled => anyhow::bail!("alignment cancelled"),
            };

            // Write JSON artifacts
            let writer = ResultWriter::new(&output_dir, run_name)?;
            writer.write_alignment(&root)?;
            writer.write_landmarks(&curves)?;

            // Build and print stdout summary
            let output = AlignOutput {
                run,
                n_curves: root.members().len(),
                n_intervals: root.consensus().size(),
                reference: reference.map(|r| curves[r].name().to_string()),
                distance: root.alignment().map(|a| a.distance()),
                guide_tree: root.guide_tree(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Landmarks {
            data,
            run,
            output_dir,
            annotate,
        } => {
            let run_name = RunName::new(run.clone())?;
            let curves = load_curves(&data, &annotate)?;

            let writer = ResultWriter::new(&output_dir, run_name)?;
            writer.write_landmarks(&curves)?;

            let output = LandmarksOutput {
                run,
                n_curves: curves.len(),
                landmarks: curves
                    .iter()
                    .map(|c| LandmarkCount {
                        name: c.name().to_string(),
                        total: c.landmarks().len(),
                        filtered: c.filtered_landmarks().len(),
                    })
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
