//! Subcommand implementations.

use anyhow::{Context, Result};
use mesh_prep::{
    ExternalValidator, NoValidation, PreflightConfig, Preprocessor, PreprocessorOptions, Severity,
    preflight,
};
use mesh_snap::SnapParams;
use owo_colors::OwoColorize;

use crate::{Cli, Commands};

pub fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Normalize { input, output } => {
            let report = preprocessor(cli)
                .normalize_to_ascii(input, output.as_deref())
                .with_context(|| format!("normalizing {}", input.display()))?;
            summary(cli, &report);
        }
        Commands::Snap {
            primary,
            reference,
            output,
            tolerance,
        } => {
            let params = SnapParams::new().with_tolerance(*tolerance);
            let report = preprocessor(cli)
                .snap_files(primary, reference, output, &params)
                .with_context(|| format!("snapping {}", primary.display()))?;
            summary(cli, &report);
        }
        Commands::Merge { output, regions } => {
            let report = preprocessor(cli)
                .merge_region_list(regions, output)
                .with_context(|| format!("merging into {}", output.display()))?;
            summary(cli, &report);
        }
        Commands::Doctor => doctor(cli),
    }
    Ok(())
}

fn preprocessor(cli: &Cli) -> Preprocessor {
    let prep = if cli.no_validate {
        Preprocessor::new(NoValidation)
    } else {
        Preprocessor::new(ExternalValidator::new(&cli.validator))
    };
    prep.with_options(PreprocessorOptions::new().with_quiet(cli.quiet))
}

fn summary(cli: &Cli, report: &impl std::fmt::Display) {
    if !cli.quiet {
        println!("{} {report}", "✓".green().bold());
    }
}

fn doctor(cli: &Cli) {
    let config = PreflightConfig {
        validator_program: (!cli.no_validate).then(|| cli.validator.clone()),
        check_openfoam_env: true,
    };

    for diagnostic in preflight(&config) {
        match diagnostic.severity {
            Severity::Info => println!("  {} {diagnostic}", "✓".green()),
            Severity::Warning => println!("  {} {}", "⚠".yellow(), diagnostic.yellow()),
        }
    }
}
