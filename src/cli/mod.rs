//! Command-line parsing for the quarterly economic/opinion pipeline.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the statistics code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::domain::OpinionMode;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "econ", version, about = "Quarterly economic/opinion analysis pipeline (FRED-based)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the full pipeline: fetch, aggregate, validate, analyze, report.
    Run(RunArgs),
    /// Fetch raw series from FRED and write per-series CSVs, nothing more.
    Fetch(FetchArgs),
    /// Aggregate local raw CSVs and run the validation gate only.
    Validate(LocalArgs),
    /// Aggregate local raw CSVs, run the gate, and analyze on a PASS.
    Analyze(LocalArgs),
}

/// Common options for the full pipeline run.
#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub local: LocalArgs,

    /// Observation range start (YYYY-MM-DD). Defaults to five years back.
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Observation range end (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Skip the network and read raw CSVs from the data directory instead.
    #[arg(long)]
    pub offline: bool,
}

/// Acquisition options.
#[derive(Debug, Parser, Clone)]
pub struct FetchArgs {
    /// Directory for raw per-series CSVs.
    #[arg(long, default_value = "data/raw")]
    pub data_dir: PathBuf,

    /// Observation range start (YYYY-MM-DD). Defaults to five years back.
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Observation range end (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// How to obtain the optional public-opinion series.
    #[arg(long, value_enum, default_value_t = OpinionMode::Auto)]
    pub opinion: OpinionMode,

    /// Seed for the synthetic opinion fallback.
    #[arg(long, default_value_t = 42)]
    pub opinion_seed: u64,
}

/// Options shared by the local (non-fetching) stages.
#[derive(Debug, Parser, Clone)]
pub struct LocalArgs {
    /// Directory holding raw per-series CSVs.
    #[arg(long, default_value = "data/raw")]
    pub data_dir: PathBuf,

    /// Directory for certified quarterly CSVs (written on a PASS verdict).
    #[arg(long, default_value = "data/validated")]
    pub validated_dir: PathBuf,

    /// Directory for JSON artifacts.
    #[arg(long, default_value = "outputs")]
    pub out_dir: PathBuf,

    /// How to obtain the optional public-opinion series.
    #[arg(long, value_enum, default_value_t = OpinionMode::Auto)]
    pub opinion: OpinionMode,

    /// Seed for the synthetic opinion fallback.
    #[arg(long, default_value_t = 42)]
    pub opinion_seed: u64,
}
