//! Shared pipeline logic used by every subcommand.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! acquire -> aggregate -> validation gate -> align -> analyze -> export
//!
//! The gate verdict is a hard barrier: on FAIL the analysis stages never run
//! and `RunOutput.analysis` stays `None`.

use chrono::Local;

use crate::align::{AggregatedSeries, aggregate};
use crate::data::opinion::{self, OpinionSource};
use crate::data::{ECONOMIC_SERIES, fred::FredClient};
use crate::domain::{AnalysisResult, PipelineConfig, QuarterlySeries, RawSeries};
use crate::error::AppError;
use crate::io::{export, ingest};
use crate::validate::{BoundsConfig, ValidationReport, run_gate};

const OPINION_FILENAME: &str = "public_opinion.csv";

/// All computed outputs of one pipeline run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub aggregated: Vec<AggregatedSeries>,
    pub report: ValidationReport,
    /// `Some` only on a PASS verdict.
    pub analysis: Option<AnalysisResult>,
    /// Non-fatal problems worth surfacing (bad rows, opinion fallbacks).
    pub warnings: Vec<String>,
}

/// Execute the full pipeline: acquisition through analysis.
pub fn run_full(config: &PipelineConfig) -> Result<RunOutput, AppError> {
    let mut warnings = Vec::new();

    let econ_raw = if config.offline {
        load_local_series(config, &mut warnings)?
    } else {
        fetch_and_persist(config)?
    };

    let (opinion_raw, opinion_warnings) = opinion::acquire(
        config.opinion_mode,
        &config.data_dir,
        config.opinion_seed,
        config.start,
        config.end,
    );
    warnings.extend(opinion_warnings);
    if let Some(metrics) = &opinion_raw {
        if !config.offline {
            export::write_opinion_csv(&config.data_dir.join(OPINION_FILENAME), metrics)?;
        }
    }

    finish(config, econ_raw, opinion_raw, warnings, true)
}

/// Gate-only run over local raw CSVs.
pub fn run_validate(config: &PipelineConfig) -> Result<RunOutput, AppError> {
    let mut warnings = Vec::new();
    let econ_raw = load_local_series(config, &mut warnings)?;
    finish(config, econ_raw, None, warnings, false)
}

/// Gate + analysis over local raw CSVs.
pub fn run_analyze(config: &PipelineConfig) -> Result<RunOutput, AppError> {
    let mut warnings = Vec::new();
    let econ_raw = load_local_series(config, &mut warnings)?;

    let (opinion_raw, opinion_warnings) = opinion::acquire(
        config.opinion_mode,
        &config.data_dir,
        config.opinion_seed,
        config.start,
        config.end,
    );
    warnings.extend(opinion_warnings);

    finish(config, econ_raw, opinion_raw, warnings, true)
}

/// Fetch-only run: write raw per-series CSVs and stop.
pub fn run_fetch(config: &PipelineConfig) -> Result<Vec<RawSeries>, AppError> {
    let raw = fetch_and_persist(config)?;

    let (opinion_raw, _) = opinion::acquire(
        config.opinion_mode,
        &config.data_dir,
        config.opinion_seed,
        config.start,
        config.end,
    );
    if let Some(metrics) = &opinion_raw {
        export::write_opinion_csv(&config.data_dir.join(OPINION_FILENAME), metrics)?;
    }

    Ok(raw)
}

fn fetch_and_persist(config: &PipelineConfig) -> Result<Vec<RawSeries>, AppError> {
    let client = FredClient::from_env()?;
    let raw = client.fetch_all(&ECONOMIC_SERIES, config.start, config.end)?;
    for (spec, series) in ECONOMIC_SERIES.iter().zip(&raw) {
        export::write_raw_csv(&config.data_dir.join(spec.raw_filename()), series)?;
    }
    Ok(raw)
}

fn load_local_series(
    config: &PipelineConfig,
    warnings: &mut Vec<String>,
) -> Result<Vec<RawSeries>, AppError> {
    let mut out = Vec::with_capacity(ECONOMIC_SERIES.len());
    for spec in &ECONOMIC_SERIES {
        let path = config.data_dir.join(spec.raw_filename());
        let ingested = ingest::load_series_csv(&path, spec.name, spec.frequency)?;
        for err in &ingested.row_errors {
            warnings.push(format!("{}:{}: {}", spec.name, err.line, err.message));
        }
        out.push(ingested.series);
    }
    Ok(out)
}

fn finish(
    config: &PipelineConfig,
    econ_raw: Vec<RawSeries>,
    opinion_raw: Option<Vec<RawSeries>>,
    mut warnings: Vec<String>,
    with_analysis: bool,
) -> Result<RunOutput, AppError> {
    let aggregated: Vec<AggregatedSeries> = econ_raw.iter().map(aggregate).collect();
    for agg in &aggregated {
        for rec in &agg.malformed {
            warnings.push(format!("{}: {} {}", rec.series, rec.date, rec.message));
        }
    }

    let report = run_gate(&aggregated, &BoundsConfig::default_economic(), Local::now());
    export::write_validation_report(&config.out_dir.join("validation_report.json"), &report)?;

    if !report.passed() {
        return Ok(RunOutput {
            aggregated,
            report,
            analysis: None,
            warnings,
        });
    }

    for agg in &aggregated {
        if let Some(spec) = crate::data::spec_for(agg.name()) {
            export::write_validated_csv(
                &config.validated_dir.join(spec.validated_filename()),
                &agg.series,
            )?;
        }
    }

    let analysis = if with_analysis {
        let opinion = match &opinion_raw {
            Some(metrics) => opinion::to_quarterly(metrics),
            None => OpinionSource::Unavailable,
        };
        let series: Vec<&QuarterlySeries> = aggregated.iter().map(|a| &a.series).collect();
        let result = crate::analysis::analyze(&series, &opinion);
        export::write_analysis_json(&config.out_dir.join("statistical_analysis.json"), &result)?;
        Some(result)
    } else {
        None
    };

    Ok(RunOutput {
        aggregated,
        report,
        analysis,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OpinionMode;
    use chrono::{Datelike, NaiveDate};
    use std::io::Write;
    use std::path::Path;

    fn write_csv(dir: &Path, name: &str, contents: &str) {
        let mut file = std::fs::File::create(dir.join(name)).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
    }

    fn quarterly_csv(quarters: &[(i32, u32)], values: &[f64]) -> String {
        let mut out = "date,value\n".to_string();
        for ((year, quarter), value) in quarters.iter().zip(values) {
            let month = (quarter - 1) * 3 + 1;
            out.push_str(&format!("{year}-{month:02}-01,{value}\n"));
        }
        out
    }

    fn monthly_csv(start_year: i32, months: usize, base: f64) -> String {
        let mut out = "date,value\n".to_string();
        let mut date = NaiveDate::from_ymd_opt(start_year, 1, 1).unwrap();
        for i in 0..months {
            out.push_str(&format!(
                "{date},{}\n",
                base + (i as f64 * 0.7).sin()
            ));
            date = if date.month() == 12 {
                NaiveDate::from_ymd_opt(date.year() + 1, 1, 1).unwrap()
            } else {
                NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1).unwrap()
            };
        }
        out
    }

    fn config(dir: &Path, opinion_mode: OpinionMode) -> PipelineConfig {
        PipelineConfig {
            data_dir: dir.join("raw"),
            validated_dir: dir.join("validated"),
            out_dir: dir.join("outputs"),
            start: NaiveDate::from_ymd_opt(2019, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
            offline: true,
            opinion_mode,
            opinion_seed: 42,
        }
    }

    fn seed_clean_data(dir: &Path) {
        std::fs::create_dir_all(dir.join("raw")).unwrap();
        let quarters: Vec<(i32, u32)> = (0..20).map(|i| (2019 + i / 4, ((i % 4) + 1) as u32)).collect();
        let gdp: Vec<f64> = (0..20).map(|t| 2.0 + (t as f64 * 0.8).sin()).collect();
        write_csv(&dir.join("raw"), "gdp_growth.csv", &quarterly_csv(&quarters, &gdp));
        write_csv(&dir.join("raw"), "unemployment.csv", &monthly_csv(2019, 60, 5.0));
        write_csv(&dir.join("raw"), "fed_funds.csv", &monthly_csv(2019, 60, 2.0));
    }

    #[test]
    fn clean_run_passes_the_gate_and_analyzes() {
        let dir = tempfile::tempdir().unwrap();
        seed_clean_data(dir.path());
        let config = config(dir.path(), OpinionMode::Disabled);

        let run = run_analyze(&config).unwrap();
        assert!(run.report.passed());

        let analysis = run.analysis.unwrap();
        assert_eq!(analysis.correlations.len(), 3);
        assert!(analysis.causality.len() + analysis.skipped.len() == 6);
        assert!(analysis.opinion_economy.is_none());

        assert!(config.out_dir.join("validation_report.json").exists());
        assert!(config.out_dir.join("statistical_analysis.json").exists());
        assert!(config.validated_dir.join("gdp_growth_quarterly.csv").exists());
    }

    #[test]
    fn gap_fails_the_gate_and_blocks_analysis() {
        let dir = tempfile::tempdir().unwrap();
        seed_clean_data(dir.path());
        // Remove 2021Q3 from the gdp series.
        let quarters: Vec<(i32, u32)> = (0..20)
            .map(|i| (2019 + i / 4, ((i % 4) + 1) as u32))
            .filter(|&(y, q)| !(y == 2021 && q == 3))
            .collect();
        let gdp: Vec<f64> = (0..19).map(|t| 2.0 + (t as f64 * 0.8).sin()).collect();
        write_csv(
            &dir.path().join("raw"),
            "gdp_growth.csv",
            &quarterly_csv(&quarters, &gdp),
        );
        let config = config(dir.path(), OpinionMode::Disabled);

        let run = run_analyze(&config).unwrap();
        assert!(!run.report.passed());
        assert!(run.analysis.is_none());
        assert!(!config.out_dir.join("statistical_analysis.json").exists());
        assert!(!config.validated_dir.join("gdp_growth_quarterly.csv").exists());

        let report = std::fs::read_to_string(config.out_dir.join("validation_report.json")).unwrap();
        assert!(report.contains("2021Q3"));
    }

    #[test]
    fn sampled_opinion_produces_the_lagged_section() {
        let dir = tempfile::tempdir().unwrap();
        seed_clean_data(dir.path());
        let config = config(dir.path(), OpinionMode::Sample);

        let run = run_analyze(&config).unwrap();
        let analysis = run.analysis.unwrap();
        let lagged = analysis.opinion_economy.unwrap();
        // 3 economic series x 4 opinion metrics.
        assert_eq!(lagged.len(), 12);
        assert!(lagged.iter().all(|r| r.lag == 1));
    }

    #[test]
    fn validate_only_never_analyzes() {
        let dir = tempfile::tempdir().unwrap();
        seed_clean_data(dir.path());
        let config = config(dir.path(), OpinionMode::Disabled);

        let run = run_validate(&config).unwrap();
        assert!(run.report.passed());
        assert!(run.analysis.is_none());
        assert!(!config.out_dir.join("statistical_analysis.json").exists());
    }

    #[test]
    fn missing_raw_file_is_a_usage_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("raw")).unwrap();
        let config = config(dir.path(), OpinionMode::Disabled);
        let err = run_validate(&config).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
