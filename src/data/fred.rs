//! FRED API integration for the mandatory economic indicators.

use chrono::NaiveDate;
use rayon::prelude::*;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::data::SeriesSpec;
use crate::domain::{Observation, RawSeries};
use crate::error::AppError;

const BASE_URL: &str = "https://api.stlouisfed.org/fred/series/observations";
const OBS_LIMIT: usize = 10000;

pub struct FredClient {
    client: Client,
    api_key: String,
}

impl FredClient {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let api_key = std::env::var("FRED_API_KEY")
            .map_err(|_| AppError::usage("Missing FRED_API_KEY in environment (.env)."))?;
        Ok(Self {
            client: Client::new(),
            api_key,
        })
    }

    /// Fetch every mandatory series over the date range, one request per
    /// series in parallel. Any failure is fatal for the whole batch.
    pub fn fetch_all(
        &self,
        specs: &[SeriesSpec],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawSeries>, AppError> {
        specs
            .par_iter()
            .map(|spec| self.fetch_series(spec, start, end))
            .collect()
    }

    pub fn fetch_series(
        &self,
        spec: &SeriesSpec,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RawSeries, AppError> {
        let resp = self
            .client
            .get(BASE_URL)
            .query(&[
                ("series_id", spec.fred_id),
                ("api_key", &self.api_key),
                ("file_type", "json"),
                ("sort_order", "asc"),
                ("limit", &OBS_LIMIT.to_string()),
                ("observation_start", &start.to_string()),
                ("observation_end", &end.to_string()),
            ])
            .send()
            .map_err(|e| AppError::data(format!("FRED request for {} failed: {e}", spec.name)))?;

        if !resp.status().is_success() {
            return Err(AppError::data(format!(
                "FRED request for {} failed with status {}.",
                spec.name,
                resp.status()
            )));
        }

        let body: ObservationsResponse = resp
            .json()
            .map_err(|e| AppError::data(format!("Failed to parse FRED response for {}: {e}", spec.name)))?;

        let mut observations = Vec::new();
        for obs in body.observations {
            // FRED marks missing values with ".".
            let value = match parse_value(&obs.value) {
                Some(v) => v,
                None => continue,
            };
            let date = NaiveDate::parse_from_str(&obs.date, "%Y-%m-%d")
                .map_err(|e| AppError::data(format!("Invalid FRED date '{}': {e}", obs.date)))?;
            observations.push(Observation { date, value });
        }

        if observations.is_empty() {
            return Err(AppError::data(format!(
                "No observations returned for series {} ({}).",
                spec.name, spec.fred_id
            )));
        }

        Ok(RawSeries {
            name: spec.name.to_string(),
            frequency: spec.frequency,
            observations,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    observations: Vec<RawObservation>,
}

#[derive(Debug, Deserialize)]
struct RawObservation {
    date: String,
    value: String,
}

fn parse_value(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed == "." || trimmed.is_empty() {
        return None;
    }
    let v = trimmed.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}
