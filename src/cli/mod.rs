//! Command-line parsing for the ideal-function matcher.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! matching code. Input locations can also come from the environment (or a
//! `.env` file), which is convenient for repeated runs over the same data.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};

use crate::io::{DEFAULT_DB_PATH, DEFAULT_TABLE};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "ideal",
    version,
    about = "Match training data to ideal functions by least squares and classify test points"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Log output format.
    #[arg(long = "log-format", value_enum, default_value_t = LogFormatArg::Pretty, global = true)]
    pub log_format: LogFormatArg,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Match, assign test points, and store the accepted assignments.
    Run(RunArgs),
    /// Only select the best ideal function for each training series.
    Match(MatchArgs),
    /// Assign test points using a mapping saved by `--export-mapping`.
    Assign(AssignArgs),
}

/// Training + ideal inputs (needed by every subcommand).
#[derive(Debug, Args, Clone)]
pub struct FitInputs {
    /// Training data CSV (`x,y1,y2,...`).
    #[arg(long, env = "IDEAL_TRAINING", value_name = "CSV")]
    pub training: PathBuf,

    /// Ideal function CSV (`x,y1,...,yN`).
    #[arg(long, env = "IDEAL_IDEAL", value_name = "CSV")]
    pub ideal: PathBuf,
}

/// Result store and export options.
#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    /// SQLite database receiving the accepted assignments.
    #[arg(long, env = "IDEAL_DB", value_name = "PATH", default_value = DEFAULT_DB_PATH)]
    pub db: PathBuf,

    /// Result table name (replaced on every run).
    #[arg(long, default_value = DEFAULT_TABLE)]
    pub table: String,

    /// Also write the accepted assignments to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub inputs: FitInputs,

    /// Test data CSV (`x,y`).
    #[arg(long, env = "IDEAL_TEST", value_name = "CSV")]
    pub test: PathBuf,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Write the fit mapping to JSON.
    #[arg(long = "export-mapping", value_name = "JSON")]
    pub export_mapping: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct MatchArgs {
    #[command(flatten)]
    pub inputs: FitInputs,

    /// Write the fit mapping to JSON.
    #[arg(long = "export-mapping", value_name = "JSON")]
    pub export_mapping: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct AssignArgs {
    /// Mapping JSON produced by `ideal run|match --export-mapping`.
    #[arg(long, value_name = "JSON")]
    pub mapping: PathBuf,

    #[command(flatten)]
    pub inputs: FitInputs,

    /// Test data CSV (`x,y`).
    #[arg(long, env = "IDEAL_TEST", value_name = "CSV")]
    pub test: PathBuf,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// CLI log format choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
