//! `mesh-prep`: prepare CAD-exported STL files for CFD meshing.
//!
//! # Commands
//!
//! - `mesh-prep normalize <INPUT> [-o OUTPUT]` - rewrite binary STL as ASCII
//! - `mesh-prep snap <PRIMARY> <REFERENCE> -o OUTPUT` - close boundary gaps
//! - `mesh-prep merge -o OUTPUT --region NAME=PATH...` - build a multi-region file
//! - `mesh-prep doctor` - check the validator and OpenFOAM environment

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use mesh_prep::{DEFAULT_VALIDATOR, Region};
use mesh_snap::DEFAULT_TOLERANCE;
use owo_colors::OwoColorize;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// STL preprocessing for OpenFOAM meshing
#[derive(Parser)]
#[command(name = "mesh-prep")]
#[command(about = "Normalize, snap and merge STL surfaces for CFD meshing", long_about = None)]
#[command(version)]
struct Cli {
    /// Only print warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, default_value = "info", value_parser = parse_level)]
    log_level: Level,

    /// Program used to check written files
    #[arg(long, global = true, default_value = DEFAULT_VALIDATOR)]
    validator: String,

    /// Do not run the validator on written files
    #[arg(long, global = true)]
    no_validate: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite a binary STL file as ASCII (ASCII input is left untouched)
    Normalize {
        /// STL file to normalize
        input: PathBuf,

        /// Where to write the ASCII file (default: overwrite the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Snap the open boundary of one patch onto a neighbouring patch
    Snap {
        /// Patch whose boundary vertices move
        primary: PathBuf,

        /// Patch that stays fixed
        reference: PathBuf,

        /// Where to write the snapped patch
        #[arg(short, long)]
        output: PathBuf,

        /// Maximum snapping distance, in mesh units
        #[arg(short, long, default_value_t = DEFAULT_TOLERANCE)]
        tolerance: f64,
    },

    /// Merge named patches into one multi-region STL file
    Merge {
        /// Merged output file
        #[arg(short, long)]
        output: PathBuf,

        /// Region to add, as NAME=PATH (repeatable, kept in order)
        #[arg(long = "region", value_name = "NAME=PATH", required = true)]
        regions: Vec<Region>,
    },

    /// Check that the validator and OpenFOAM environment are available
    Doctor,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = init_logging(cli.log_level, cli.quiet).and_then(|()| commands::run(&cli));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e:#}", "✗".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn parse_level(s: &str) -> Result<Level, String> {
    s.parse::<Level>().map_err(|_| {
        format!("unknown log level `{s}` (expected trace, debug, info, warn or error)")
    })
}

fn init_logging(level: Level, quiet: bool) -> Result<()> {
    let level = if quiet { level.min(Level::WARN) } else { level };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
