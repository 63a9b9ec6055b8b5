//! Artifact exports: per-series CSVs and JSON reports.
//!
//! The exports are meant to be easy to consume in spreadsheets or downstream
//! scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde_json::json;

use crate::domain::{AnalysisResult, QuarterlySeries, RawSeries};
use crate::error::AppError;
use crate::validate::ValidationReport;

/// Write one raw series as a `date,value` CSV.
pub fn write_raw_csv(path: &Path, series: &RawSeries) -> Result<(), AppError> {
    let mut file = create(path)?;
    writeln!(file, "date,value").map_err(|e| write_error(path, e))?;
    for obs in &series.observations {
        writeln!(file, "{},{}", obs.date, obs.value).map_err(|e| write_error(path, e))?;
    }
    Ok(())
}

/// Write the opinion metrics as one multi-column CSV, rows joined on date.
/// Dates missing from a metric leave that cell empty.
pub fn write_opinion_csv(path: &Path, metrics: &[RawSeries]) -> Result<(), AppError> {
    let mut dates: Vec<chrono::NaiveDate> = metrics
        .iter()
        .flat_map(|m| m.observations.iter().map(|o| o.date))
        .collect();
    dates.sort();
    dates.dedup();

    let mut file = create(path)?;
    let header: Vec<&str> = metrics.iter().map(|m| m.name.as_str()).collect();
    writeln!(file, "date,{}", header.join(",")).map_err(|e| write_error(path, e))?;

    for date in dates {
        let mut row = date.to_string();
        for metric in metrics {
            row.push(',');
            if let Some(obs) = metric.observations.iter().find(|o| o.date == date) {
                row.push_str(&obs.value.to_string());
            }
        }
        writeln!(file, "{row}").map_err(|e| write_error(path, e))?;
    }
    Ok(())
}

/// Write one certified quarterly series as a `quarter,value` CSV.
pub fn write_validated_csv(path: &Path, series: &QuarterlySeries) -> Result<(), AppError> {
    let mut file = create(path)?;
    writeln!(file, "quarter,value").map_err(|e| write_error(path, e))?;
    for (key, value) in &series.values {
        writeln!(file, "{key},{value}").map_err(|e| write_error(path, e))?;
    }
    Ok(())
}

/// Write the gate verdict as `validation_report.json`, one object per rule in
/// evaluation order.
pub fn write_validation_report(path: &Path, report: &ValidationReport) -> Result<(), AppError> {
    let mut checks = serde_json::Map::new();
    for check in &report.checks {
        checks.insert(
            check.rule.as_str().to_string(),
            json!({
                "passed": check.passed(),
                "issues": check.issues(),
            }),
        );
    }

    let body = json!({
        "timestamp": report.timestamp,
        "status": report.status.as_str(),
        "checks": checks,
        "summary": report.summary,
    });

    write_json(path, &body)
}

/// Write the full analysis result as `statistical_analysis.json`.
pub fn write_analysis_json(path: &Path, result: &AnalysisResult) -> Result<(), AppError> {
    let body = serde_json::to_value(result)
        .map_err(|e| AppError::data(format!("Failed to serialize analysis result: {e}")))?;
    write_json(path, &body)
}

fn write_json(path: &Path, body: &serde_json::Value) -> Result<(), AppError> {
    let file = create(path)?;
    serde_json::to_writer_pretty(file, body)
        .map_err(|e| AppError::data(format!("Failed to write JSON '{}': {e}", path.display())))
}

fn create(path: &Path) -> Result<File, AppError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            AppError::usage(format!("Failed to create directory '{}': {e}", parent.display()))
        })?;
    }
    File::create(path)
        .map_err(|e| AppError::usage(format!("Failed to create '{}': {e}", path.display())))
}

fn write_error(path: &Path, e: std::io::Error) -> AppError {
    AppError::usage(format!("Failed to write '{}': {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Frequency, Observation, QuarterKey};
    use crate::validate::{run_gate, BoundsConfig};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    #[test]
    fn raw_csv_round_trips_through_ingest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unemployment.csv");
        let series = RawSeries {
            name: "unemployment".to_string(),
            frequency: Frequency::Monthly,
            observations: vec![
                Observation {
                    date: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
                    value: 6.3,
                },
                Observation {
                    date: NaiveDate::from_ymd_opt(2021, 2, 1).unwrap(),
                    value: 6.2,
                },
            ],
        };
        write_raw_csv(&path, &series).unwrap();

        let back =
            crate::io::ingest::load_series_csv(&path, "unemployment", Frequency::Monthly).unwrap();
        assert_eq!(back.series.observations.len(), 2);
        assert_eq!(back.series.observations[1].value, 6.2);
    }

    #[test]
    fn opinion_csv_round_trips_through_the_opinion_reader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("public_opinion.csv");
        let date = |m| NaiveDate::from_ymd_opt(2021, m, 1).unwrap();
        let metrics = vec![
            RawSeries {
                name: "getting_better_pct".to_string(),
                frequency: Frequency::Monthly,
                observations: vec![
                    Observation { date: date(1), value: 40.0 },
                    Observation { date: date(2), value: 42.0 },
                ],
            },
            RawSeries {
                name: "net_sentiment".to_string(),
                frequency: Frequency::Monthly,
                observations: vec![Observation { date: date(2), value: 9.0 }],
            },
        ];
        write_opinion_csv(&path, &metrics).unwrap();

        let back = crate::io::ingest::load_opinion_csv(&path).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[0].observations.len(), 2);
        // The January hole in net_sentiment stays a hole.
        assert_eq!(back[1].observations.len(), 1);
        assert_eq!(back[1].observations[0].value, 9.0);
    }

    #[test]
    fn validated_csv_uses_quarter_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gdp_growth_quarterly.csv");
        let mut values = BTreeMap::new();
        values.insert(QuarterKey::new(2021, 3).unwrap(), 2.25);
        let series = QuarterlySeries {
            name: "gdp_growth".to_string(),
            values,
        };
        write_validated_csv(&path, &series).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "quarter,value\n2021Q3,2.25\n");
    }

    #[test]
    fn validation_report_json_has_one_object_per_rule() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("validation_report.json");

        // One series with a hole in 2021Q2 so completeness fails.
        let raw = RawSeries {
            name: "gdp_growth".to_string(),
            frequency: Frequency::Quarterly,
            observations: vec![
                Observation {
                    date: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
                    value: 2.0,
                },
                Observation {
                    date: NaiveDate::from_ymd_opt(2021, 7, 1).unwrap(),
                    value: 2.5,
                },
            ],
        };
        let aggregated = crate::align::aggregate(&raw);
        let report = run_gate(
            &[aggregated],
            &BoundsConfig::default_economic(),
            chrono::Local::now(),
        );
        write_validation_report(&path, &report).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["status"], "FAIL");
        let checks = value["checks"].as_object().unwrap();
        let keys: Vec<&String> = checks.keys().collect();
        assert_eq!(keys, ["completeness", "format", "ranges", "alignment"]);
        assert!(checks["ranges"]["passed"].as_bool().unwrap());
        assert!(value["summary"].as_str().unwrap().contains("failed"));
    }
}
