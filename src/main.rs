//! # freqscan
//!
//! Command-line front end for building frequency-scan and overlay reports.
//!
//! ```bash
//! # Combined report of every .out file in a directory
//! freqscan scan runs/ -o report/
//!
//! # Headerless time-domain files named through a description file
//! freqscan overlay out/*.out --inf model.inf --columns Ia,Ib
//!
//! # Just print the peaks
//! freqscan peaks runs/
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::warn;

use freqscan::config::Config;
use freqscan::data::loader::{collect_inputs, read_description};
use freqscan::data::model::PeakSet;
use freqscan::pipeline::{self, Artifacts};
use freqscan::render::{ChartRenderer, NoopRenderer, PlottersRenderer, RenderOutcome};
use freqscan::PipelineError;

/// Extension of simulator output files picked up from directories.
const OUT_EXTENSION: &str = "out";

/// freqscan - frequency-scan report generator
#[derive(Parser)]
#[command(name = "freqscan")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Load settings from a TOML config file
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Combined frequency-scan report with peaks block and overlay chart
    Scan {
        /// Output files or directories containing them
        #[arg(value_name = "INPUT", required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Also write one workbook per input file
        #[arg(long)]
        per_file: bool,

        #[command(flatten)]
        artifacts: ArtifactArgs,
    },

    /// Overlay selected columns of several files merged on their first column
    Overlay {
        /// Output files or directories containing them
        #[arg(value_name = "INPUT", required = true)]
        inputs: Vec<PathBuf>,

        /// Description file naming the columns of headerless files
        #[arg(long, value_name = "FILE")]
        inf: Option<PathBuf>,

        /// Columns to plot (default: the first three)
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,

        /// Y-axis title
        #[arg(long, default_value = "Value")]
        y_title: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        #[command(flatten)]
        artifacts: ArtifactArgs,
    },

    /// Print the detected peaks of each file
    Peaks {
        /// Output files or directories containing them
        #[arg(value_name = "INPUT", required = true)]
        inputs: Vec<PathBuf>,
    },
}

#[derive(clap::Args)]
struct ArtifactArgs {
    /// Also write the sheet as CSV
    #[arg(long)]
    csv: bool,

    /// Also write the chart description as JSON
    #[arg(long)]
    json: bool,

    /// Do not render the chart image
    #[arg(long)]
    no_image: bool,
}

impl From<&ArtifactArgs> for Artifacts {
    fn from(args: &ArtifactArgs) -> Self {
        Artifacts {
            csv: args.csv,
            json: args.json,
            image: !args.no_image,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };

    if let Err(err) = run(cli.command, &config) {
        if let Some(pipeline_err) = err.downcast_ref::<PipelineError>() {
            eprintln!("Error during {}: {pipeline_err}", pipeline_err.stage());
        }
        return Err(err);
    }
    Ok(())
}

fn run(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Scan {
            inputs,
            output,
            per_file,
            artifacts,
        } => {
            let files = collect_inputs(&inputs, OUT_EXTENSION)?;
            let renderer = renderer(config);
            let result = pipeline::run_scan(
                &files,
                config,
                &output,
                per_file,
                Artifacts::from(&artifacts),
                renderer.as_ref(),
            )?;

            for entry in &result.entries {
                print_peaks(&entry.series.name, &entry.peaks, "freq");
            }
            for path in &result.per_file {
                println!("Wrote {}", path.display());
            }
            println!("Wrote {}", result.workbook.display());
            print_extras(&result.extras);
            report_image(&result.image);
        }

        Commands::Overlay {
            inputs,
            inf,
            columns,
            y_title,
            output,
            artifacts,
        } => {
            let files = collect_inputs(&inputs, OUT_EXTENSION)?;
            let descriptions = inf.as_deref().map(read_description).transpose()?;
            let table = pipeline::load_overlay_table(&files, descriptions.as_ref(), config)?;
            println!(
                "Merged {} files: {} rows, columns: {}",
                files.len(),
                table.len(),
                table.column_names().join(", ")
            );

            let renderer = renderer(config);
            let result = pipeline::run_overlay(
                &table,
                &columns,
                &y_title,
                config,
                &output,
                Artifacts::from(&artifacts),
                renderer.as_ref(),
            )?;

            for column in &result.peaks {
                print_peaks(&column.column, &column.peaks, &table.axis_name);
            }
            println!("Wrote {}", result.workbook.display());
            print_extras(&result.extras);
            report_image(&result.image);
        }

        Commands::Peaks { inputs } => {
            let files = collect_inputs(&inputs, OUT_EXTENSION)?;
            let entries = pipeline::load_scan_entries(&files, config)?;
            for entry in &entries {
                print_peaks(&entry.series.name, &entry.peaks, "freq");
            }
        }
    }
    Ok(())
}

fn renderer(config: &Config) -> Box<dyn ChartRenderer> {
    if !config.render_enabled() {
        return Box::new(NoopRenderer);
    }
    let defaults = PlottersRenderer::default();
    Box::new(PlottersRenderer {
        width: config.render.width.unwrap_or(defaults.width),
        height: config.render.height.unwrap_or(defaults.height),
        font_path: config.render.font_path.clone(),
    })
}

fn print_peaks(name: &str, peaks: &PeakSet, axis: &str) {
    if peaks.is_empty() {
        println!("{name}: no peaks found");
        return;
    }
    println!("{name}: {} peaks", peaks.len());
    for (rank, peak) in peaks.peaks.iter().enumerate() {
        println!("  peak{} = {:.4} at {axis} {:.4}", rank + 1, peak.value, peak.x);
    }
}

fn print_extras(extras: &pipeline::ExtraFiles) {
    for path in [&extras.csv, &extras.json].into_iter().flatten() {
        println!("Wrote {}", path.display());
    }
}

fn report_image(outcome: &RenderOutcome) {
    match outcome {
        RenderOutcome::Rendered(path) => println!("Wrote {}", path.display()),
        RenderOutcome::Skipped => {}
        RenderOutcome::Failed(err) => {
            warn!("chart rasterization failed: {err}");
            eprintln!("Warning: chart image not created ({err}).");
            eprintln!(
                "The workbook is complete; the rendering prerequisite (a serif font, see render.font_path) may be missing."
            );
        }
    }
}
