//! Geoprep: object-detection datasets from georeferenced tiles and labels.
//!
//! Geoprep registers raster tiles by their geographic footprint, cuts vector
//! labels along tile edges, splits the tiles reproducibly into train, test
//! and validation sets, and writes one COCO document per split with every
//! label expressed in tile pixel coordinates.
//!
//! # Modules
//!
//! - [`tile`]: Tile registry and the world-file raster metadata reader
//! - [`label`]: Labels, fragments and GeoJSON I/O
//! - [`overlay`] / [`link`]: Label distribution onto tiles
//! - [`split`]: Deterministic dataset split
//! - [`geo`]: Coordinates, extents and the map-to-pixel transform
//! - [`coco`]: Annotation documents
//! - [`validation`]: Document validation and error reporting
//! - [`pipeline`]: End-to-end preparation driven by [`config`]
//! - [`error`]: Error types for geoprep operations

pub mod coco;
pub mod config;
pub mod error;
pub mod geo;
pub mod label;
pub mod link;
pub mod overlay;
pub mod pipeline;
pub mod split;
pub mod tile;
pub mod validation;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

pub use error::PrepError;

/// The geoprep CLI application.
#[derive(Parser)]
#[command(name = "geoprep")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Prepare the datasets listed in a configuration's conformation file.
    Prepare(PrepareArgs),
    /// Print the train/test/validation split of N tiles.
    Split(SplitArgs),
    /// Validate a written COCO document.
    Validate(ValidateArgs),
}

/// Arguments for the prepare subcommand.
#[derive(clap::Args)]
struct PrepareArgs {
    /// YAML configuration file.
    #[arg(long, env = "GEOPREP_CONFIG")]
    config: PathBuf,
}

/// Arguments for the split subcommand.
#[derive(clap::Args)]
struct SplitArgs {
    /// Number of tiles.
    #[arg(long)]
    count: usize,

    /// Seed of the permutation.
    #[arg(long)]
    seed: u32,

    /// Share of tiles in the train split.
    #[arg(long, default_value_t = 0.7)]
    train: f64,

    /// Share of tiles in the test split; validation takes the rest.
    #[arg(long, default_value_t = 0.2)]
    test: f64,

    /// Output format ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Arguments for the validate subcommand.
#[derive(clap::Args)]
struct ValidateArgs {
    /// COCO document to validate.
    input: PathBuf,

    /// Treat warnings as errors (exit non-zero if any warnings).
    #[arg(long)]
    strict: bool,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Run the geoprep CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), PrepError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Prepare(args)) => run_prepare(args),
        Some(Commands::Split(args)) => run_split(args),
        Some(Commands::Validate(args)) => run_validate(args),
        None => {
            println!("geoprep {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Object-detection datasets from georeferenced tiles and labels.");
            println!();
            println!("Run 'geoprep --help' for usage information.");
            Ok(())
        }
    }
}

fn run_prepare(args: PrepareArgs) -> Result<(), PrepError> {
    let config = config::Config::load(&args.config)?;
    let outcomes = pipeline::run_prepare(&config)?;

    for outcome in &outcomes {
        println!(
            "{}: {} tile(s), {} fragment(s), split {}/{}/{}",
            outcome.slug,
            outcome.tiles,
            outcome.fragments,
            outcome.partition.train.len(),
            outcome.partition.test.len(),
            outcome.partition.validation.len()
        );
        for document in &outcome.documents {
            println!("  {}", document.display());
        }
    }
    Ok(())
}

fn run_split(args: SplitArgs) -> Result<(), PrepError> {
    let proportions = split::SplitProportions::new(args.train, args.test)?;
    let partition = split::split(args.count, args.seed, proportions);

    match args.output.as_str() {
        "json" => print_json(&partition)?,
        _ => {
            for kind in split::SplitKind::ALL {
                let indices = partition.indices(kind);
                let listed: Vec<String> = indices.iter().map(usize::to_string).collect();
                println!("{} ({}): {}", kind, indices.len(), listed.join(" "));
            }
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct ReportSummary<'a> {
    error_count: usize,
    warning_count: usize,
    issues: &'a [validation::ValidationIssue],
}

/// Execute the validate subcommand.
fn run_validate(args: ValidateArgs) -> Result<(), PrepError> {
    let document = coco::io_coco_json::read_coco_json(&args.input)?;

    let opts = validation::ValidateOptions {
        strict: args.strict,
    };
    let report = validation::validate_document(&document);

    match args.output.as_str() {
        "json" => print_json(&ReportSummary {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            issues: &report.issues,
        })?,
        _ => print!("{}", report),
    }

    if opts.passes(&report) {
        Ok(())
    } else {
        Err(PrepError::ValidationFailed {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        })
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), PrepError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| PrepError::Io(std::io::Error::other(e)))?;
    println!("{json}");
    Ok(())
}
