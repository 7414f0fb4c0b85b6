//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - initializes logging
//! - runs the matching pipeline
//! - writes the store, then the optional exports, then prints the summary

use std::io::IsTerminal;

use clap::Parser;
use tracing::info;

use crate::cli::{AssignArgs, Cli, Command, LogFormatArg, MatchArgs, RunArgs};
use crate::domain::{RunConfig, TableRole};
use crate::error::AppError;
use crate::io::{CsvLoader, MappingFile, SqliteStore, load_csv, write_mapping_json, write_results_csv};
use crate::logging::{LogConfig, LogFormat, init_logging};
use crate::report::{DatasetShape, format_mapping, format_run_summary};

pub mod pipeline;

use pipeline::{Inputs, RunOutput};

/// Entry point for the `ideal` binary.
pub fn run() -> Result<(), AppError> {
    // A missing .env file is the normal case.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    init_logging(&log_config_from_cli(&cli))
        .map_err(|e| AppError::new(1, format!("Failed to initialize logging: {e}")))?;

    match cli.command {
        Command::Run(args) => handle_run(&run_config_from_args(&args)),
        Command::Match(args) => handle_match(&args),
        Command::Assign(args) => handle_assign(&args),
    }
}

fn handle_run(config: &RunConfig) -> Result<(), AppError> {
    let inputs = Inputs::load(&CsvLoader::from_config(config))?;
    let output = pipeline::run_compute(&inputs)?;
    let written = write_outputs(config, &inputs, &output)?;
    print_report(config, &inputs, &output, written);
    Ok(())
}

fn handle_match(args: &MatchArgs) -> Result<(), AppError> {
    let training = load_csv(TableRole::Training, &args.inputs.training)?;
    let ideal = load_csv(TableRole::Ideal, &args.inputs.ideal)?;
    let mapping = pipeline::run_match(&training, &ideal)?;

    println!("{}", format_mapping(&mapping, None));

    if let Some(path) = &args.export_mapping {
        let file = MappingFile::new(mapping, training.len(), ideal.series().len());
        write_mapping_json(path, &file)?;
        info!(path = %path.display(), "mapping written");
    }
    Ok(())
}

fn handle_assign(args: &AssignArgs) -> Result<(), AppError> {
    // A saved mapping is an input, so failing to read it is a load failure.
    let saved = crate::io::read_mapping_json(&args.mapping)
        .map_err(|e| AppError::new(2, format!("Failed to read mapping: {e}")))?;
    let config = RunConfig {
        training_path: args.inputs.training.clone(),
        ideal_path: args.inputs.ideal.clone(),
        test_path: args.test.clone(),
        db_path: args.output.db.clone(),
        table: args.output.table.clone(),
        export_results: args.output.export.clone(),
        export_mapping: None,
    };

    let inputs = Inputs::load(&CsvLoader::from_config(&config))?;
    let output = pipeline::run_assign(&inputs, saved.mapping)?;
    let written = write_outputs(&config, &inputs, &output)?;
    print_report(&config, &inputs, &output, written);
    Ok(())
}

/// Store first, then the optional exports, so a failed store write leaves no
/// export files behind.
fn write_outputs(config: &RunConfig, inputs: &Inputs, output: &RunOutput) -> Result<usize, AppError> {
    let mut store = SqliteStore::open(&config.db_path, &config.table)?;
    let written = pipeline::persist(&mut store, &output.records)?;

    if let Some(path) = &config.export_results {
        write_results_csv(path, &output.records)?;
    }
    if let Some(path) = &config.export_mapping {
        let file = MappingFile::new(output.mapping.clone(), inputs.training.len(), inputs.ideal.series().len());
        write_mapping_json(path, &file)?;
        info!(path = %path.display(), "mapping written");
    }
    Ok(written)
}

fn print_report(config: &RunConfig, inputs: &Inputs, output: &RunOutput, written: usize) {
    println!(
        "{}",
        format_run_summary(
            DatasetShape::of(&inputs.training),
            DatasetShape::of(&inputs.ideal),
            DatasetShape::of(&inputs.test),
            &output.mapping,
            &output.bounds,
            &output.summary,
        )
    );
    println!(
        "Inserted {written} matched test points into {} (table `{}`).",
        config.db_path.display(),
        config.table
    );
    println!("Run complete.");
}

pub fn run_config_from_args(args: &RunArgs) -> RunConfig {
    RunConfig {
        training_path: args.inputs.training.clone(),
        ideal_path: args.inputs.ideal.clone(),
        test_path: args.test.clone(),
        db_path: args.output.db.clone(),
        table: args.output.table.clone(),
        export_results: args.output.export.clone(),
        export_mapping: args.export_mapping.clone(),
    }
}

/// Explicit `-v/-q` flags win over `RUST_LOG`.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        use_env_filter: !cli.verbosity.is_present(),
        format: match cli.log_format {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Compact => LogFormat::Compact,
            LogFormatArg::Json => LogFormat::Json,
        },
        with_ansi: std::io::stderr().is_terminal(),
    }
}
