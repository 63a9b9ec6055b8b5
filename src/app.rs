//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - runs the requested pipeline stages
//! - prints the terminal report
//! - maps the gate verdict to the exit code

use chrono::{Duration, Local, NaiveDate};
use clap::Parser;

use crate::cli::{Cli, Command, FetchArgs, LocalArgs, RunArgs};
use crate::domain::{OpinionMode, PipelineConfig};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `econ` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Fetch(args) => handle_fetch(args),
        Command::Validate(args) => handle_local(args, Stage::Validate),
        Command::Analyze(args) => handle_local(args, Stage::Analyze),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Validate,
    Analyze,
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let (start, end) = resolve_range(args.start, args.end)?;
    let config = PipelineConfig {
        data_dir: args.local.data_dir,
        validated_dir: args.local.validated_dir,
        out_dir: args.local.out_dir,
        start,
        end,
        offline: args.offline,
        opinion_mode: args.local.opinion,
        opinion_seed: args.local.opinion_seed,
    };

    let run = pipeline::run_full(&config)?;
    report_run(&run)
}

fn handle_fetch(args: FetchArgs) -> Result<(), AppError> {
    let (start, end) = resolve_range(args.start, args.end)?;
    let config = PipelineConfig {
        data_dir: args.data_dir.clone(),
        validated_dir: args.data_dir.clone(),
        out_dir: args.data_dir.clone(),
        start,
        end,
        offline: false,
        opinion_mode: args.opinion,
        opinion_seed: args.opinion_seed,
    };

    let raw = pipeline::run_fetch(&config)?;
    for series in &raw {
        println!(
            "fetched {}: {} observations",
            series.name,
            series.observations.len()
        );
    }
    println!("raw CSVs written to {}", config.data_dir.display());
    Ok(())
}

fn handle_local(args: LocalArgs, stage: Stage) -> Result<(), AppError> {
    // Local stages read whatever range the CSVs hold; the configured range
    // only steers the synthetic opinion sample.
    let (start, end) = resolve_range(None, None)?;
    let config = PipelineConfig {
        data_dir: args.data_dir,
        validated_dir: args.validated_dir,
        out_dir: args.out_dir,
        start,
        end,
        offline: true,
        opinion_mode: if stage == Stage::Validate {
            OpinionMode::Disabled
        } else {
            args.opinion
        },
        opinion_seed: args.opinion_seed,
    };

    let run = match stage {
        Stage::Validate => pipeline::run_validate(&config)?,
        Stage::Analyze => pipeline::run_analyze(&config)?,
    };
    report_run(&run)
}

fn report_run(run: &pipeline::RunOutput) -> Result<(), AppError> {
    for warning in &run.warnings {
        eprintln!("warning: {warning}");
    }

    println!("{}", crate::report::format_validation_summary(&run.report));

    if !run.report.passed() {
        return Err(AppError::validation(
            "Validation gate failed; analysis not run.",
        ));
    }

    if let Some(analysis) = &run.analysis {
        println!("{}", crate::report::format_analysis(analysis));
    }

    Ok(())
}

/// Resolve the observation range: explicit bounds win, otherwise the trailing
/// five years ending today.
fn resolve_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<(NaiveDate, NaiveDate), AppError> {
    let end = end.unwrap_or_else(|| Local::now().date_naive());
    let start = start.unwrap_or(end - Duration::days(5 * 365));
    if start >= end {
        return Err(AppError::usage(format!(
            "Invalid date range: start {start} is not before end {end}."
        )));
    }
    Ok((start, end))
}
