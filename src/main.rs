use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use dicom_timepoints::{
    DicomMetadataReader, Dcm2NiixConverter, Pipeline, PipelineConfig, PruneOutcome,
    SliceTimingConfig, TimepointPruner,
    slice_timing::{compute_slice_timing, count_slices, write_slice_timing},
};
use tracing_subscriber::EnvFilter;

/// Prune incomplete DICOM timepoints and derive slice timing.
#[derive(Parser)]
#[command(name = "dicom-timepoints")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Delete the slices of every incomplete timepoint in a directory
    Prune {
        /// Directory holding the DICOM slices
        directory: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Prune, convert with dcm2niix and optionally write slice timing
    Run {
        /// Directory holding the DICOM slices
        #[arg(short, long)]
        input: PathBuf,

        /// Directory the converted volumes are written to
        #[arg(short, long)]
        output: PathBuf,

        /// Converter executable
        #[arg(long, default_value = "dcm2niix")]
        converter: PathBuf,

        /// Repetition time in seconds
        #[arg(long, requires = "slice_timing")]
        tr: Option<f64>,

        /// Where to write the slice timing table
        #[arg(long, requires = "tr")]
        slice_timing: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the slice timing table for a repetition time
    SliceTiming(SliceTimingArgs),

    /// Print the number of slices in a NIfTI volume
    CountSlices {
        /// Path to the .nii or .nii.gz file
        volume: PathBuf,
    },
}

#[derive(Args)]
struct SliceTimingArgs {
    /// Repetition time in seconds
    #[arg(long)]
    tr: f64,

    /// Number of slices per volume
    #[arg(long, required_unless_present = "volume", conflicts_with = "volume")]
    slices: Option<usize>,

    /// Read the number of slices from this NIfTI volume
    #[arg(long)]
    volume: Option<PathBuf>,

    /// Where to write the table
    #[arg(short, long)]
    output: PathBuf,
}

fn setup_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

// Any failed deletion makes the process exit non-zero
fn check_failures(outcome: &PruneOutcome) -> Result<()> {
    let failed = outcome.failures().len();
    if failed > 0 {
        bail!("{failed} slice files could not be removed");
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Prune { directory, json } => {
            let outcome =
                TimepointPruner::prune_incomplete_timepoints(&directory, &DicomMetadataReader)
                    .with_context(|| format!("failed to prune {}", directory.display()))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!("{outcome}");
            }
            check_failures(&outcome)?;
        }
        Commands::Run {
            input,
            output,
            converter,
            tr,
            slice_timing,
            json,
        } => {
            let config = PipelineConfig {
                input_dir: input,
                output_dir: output,
                slice_timing: tr.zip(slice_timing).map(|(repetition_time, destination)| {
                    SliceTimingConfig {
                        repetition_time,
                        destination,
                    }
                }),
            };
            let report = Pipeline::run(
                &config,
                &DicomMetadataReader,
                &Dcm2NiixConverter::new(converter),
            )?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report.prune);
                if report.converted {
                    println!("Converted volumes written to {}", config.output_dir.display());
                }
                if let Some(timing) = &report.slice_timing {
                    println!(
                        "Number of slices: {} (slice timing written to {})",
                        timing.slices,
                        timing.destination.display()
                    );
                }
            }
            check_failures(&report.prune)?;
        }
        Commands::SliceTiming(args) => {
            let slices = match &args.volume {
                Some(volume) => count_slices(volume)
                    .with_context(|| format!("failed to read {}", volume.display()))?,
                None => args.slices.context("either --slices or --volume is required")?,
            };
            let table = compute_slice_timing(args.tr, slices)?;
            write_slice_timing(&table, &args.output)?;
            println!("Wrote {} slice offsets to {}", table.len(), args.output.display());
        }
        Commands::CountSlices { volume } => {
            let slices = count_slices(&volume)
                .with_context(|| format!("failed to read {}", volume.display()))?;
            println!("Number of slices: {slices}");
        }
    }

    Ok(())
}
