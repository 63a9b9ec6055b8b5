//! CSV ingest and normalization.
//!
//! Turns local `date,value` series files (and the multi-column opinion file)
//! into `RawSeries` that are safe to aggregate.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Unknown columns ignored** (files may carry extra metadata)
//! - **Separation of concerns**: no aggregation or validation logic here

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;

use crate::domain::{Frequency, Observation, RawSeries, OPINION_METRICS};
use crate::error::AppError;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: one normalized series + row errors.
#[derive(Debug, Clone)]
pub struct IngestedSeries {
    pub series: RawSeries,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

/// Load one `date,value` CSV as a raw series. Bad rows are skipped and
/// reported; an entirely unusable file is an error.
pub fn load_series_csv(
    path: &Path,
    name: &str,
    frequency: Frequency,
) -> Result<IngestedSeries, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::usage(format!("Failed to open CSV '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::usage(format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let date_idx = *header_map
        .get("date")
        .ok_or_else(|| AppError::usage("Missing required column: `date`"))?;
    let value_idx = *header_map
        .get("value")
        .ok_or_else(|| AppError::usage("Missing required column: `value`"))?;

    let mut observations = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header row, and CSV lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_observation(&record, date_idx, value_idx) {
            Ok(Some(obs)) => observations.push(obs),
            Ok(None) => {} // missing-value marker
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    let rows_used = observations.len();
    if rows_used == 0 {
        return Err(AppError::validation(format!(
            "No valid rows in '{}' for series {name}.",
            path.display()
        )));
    }

    Ok(IngestedSeries {
        series: RawSeries {
            name: name.to_string(),
            frequency,
            observations,
        },
        row_errors,
        rows_read,
        rows_used,
    })
}

/// Load the multi-column opinion CSV from a local path.
pub fn load_opinion_csv(path: &Path) -> Result<Vec<RawSeries>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::usage(format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_opinion_metrics(file)
}

/// Read opinion metrics from any byte source. Requires a `date` column and at
/// least one known metric column; unknown columns are ignored.
pub fn read_opinion_metrics<R: std::io::Read>(source: R) -> Result<Vec<RawSeries>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| AppError::usage(format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let date_idx = *header_map
        .get("date")
        .ok_or_else(|| AppError::usage("Missing required column: `date`"))?;

    let metric_columns: Vec<(&str, usize)> = OPINION_METRICS
        .iter()
        .filter_map(|name| header_map.get(*name).map(|&idx| (*name, idx)))
        .collect();
    if metric_columns.is_empty() {
        return Err(AppError::usage(
            "Opinion CSV has no recognized metric columns.",
        ));
    }

    let mut columns: Vec<Vec<Observation>> = vec![Vec::new(); metric_columns.len()];
    for result in reader.records() {
        let record = match result {
            Ok(r) => r,
            Err(_) => continue,
        };
        let date = match record.get(date_idx).and_then(|raw| parse_date(raw).ok()) {
            Some(d) => d,
            None => continue,
        };
        for (slot, (_, idx)) in columns.iter_mut().zip(&metric_columns) {
            if let Some(value) = record.get(*idx).and_then(parse_numeric) {
                slot.push(Observation { date, value });
            }
        }
    }

    Ok(metric_columns
        .iter()
        .zip(columns)
        .filter(|(_, observations)| !observations.is_empty())
        .map(|((name, _), observations)| RawSeries {
            name: (*name).to_string(),
            frequency: Frequency::Monthly,
            observations,
        })
        .collect())
}

fn parse_observation(
    record: &StringRecord,
    date_idx: usize,
    value_idx: usize,
) -> Result<Option<Observation>, String> {
    let raw_date = record
        .get(date_idx)
        .ok_or_else(|| "missing `date` field".to_string())?;
    let date = parse_date(raw_date)?;

    let raw_value = record
        .get(value_idx)
        .ok_or_else(|| "missing `value` field".to_string())?;
    let trimmed = raw_value.trim();
    if trimmed == "." || trimmed.is_empty() {
        return Ok(None);
    }
    let value = trimmed
        .parse::<f64>()
        .map_err(|e| format!("invalid value '{trimmed}': {e}"))?;
    if !value.is_finite() {
        return Err(format!("non-finite value '{trimmed}'"));
    }

    Ok(Some(Observation { date, value }))
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    let trimmed = raw.trim();
    for format in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(date);
        }
    }
    Err(format!("invalid date '{trimmed}'"))
}

fn parse_numeric(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "." {
        return None;
    }
    let v = trimmed.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header (e.g. "﻿date"). If we don't strip it, schema validation
    // will incorrectly report missing columns.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}
