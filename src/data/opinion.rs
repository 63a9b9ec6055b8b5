//! Optional public-opinion source: remote tracker, local CSV, or a
//! deterministic synthetic sample.
//!
//! Opinion data is best-effort throughout: every failure in this module
//! degrades to `OpinionSource::Unavailable` (or the synthetic fallback) and is
//! never fatal to the run.

use std::path::Path;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use reqwest::blocking::Client;

use crate::align::aggregate;
use crate::domain::{Frequency, Observation, OpinionMode, RawSeries, OPINION_METRICS};
use crate::error::AppError;
use crate::io::ingest;

const TRACKER_URL: &str = "https://today.yougov.com/topics/economy/trackers/state-of-us-economy";
const OPINION_FILENAME: &str = "public_opinion.csv";

/// Quarterly opinion metrics ready for alignment, one series per metric.
#[derive(Debug, Clone)]
pub struct OpinionData {
    pub metrics: Vec<crate::domain::QuarterlySeries>,
}

/// Whether opinion data made it into the run.
#[derive(Debug, Clone)]
pub enum OpinionSource {
    Observed(OpinionData),
    Unavailable,
}

/// Acquire opinion data according to the configured mode.
///
/// Returns the raw monthly metric series so the caller can persist them; the
/// quarterly aggregation happens in [`to_quarterly`].
pub fn acquire(
    mode: OpinionMode,
    data_dir: &Path,
    seed: u64,
    start: NaiveDate,
    end: NaiveDate,
) -> (Option<Vec<RawSeries>>, Vec<String>) {
    let mut warnings = Vec::new();
    let raw = match mode {
        OpinionMode::Disabled => None,
        OpinionMode::Sample => match generate_sample(seed, start, end) {
            Ok(series) => Some(series),
            Err(e) => {
                warnings.push(format!("opinion sample generation failed: {e}"));
                None
            }
        },
        OpinionMode::File => {
            let path = data_dir.join(OPINION_FILENAME);
            match ingest::load_opinion_csv(&path) {
                Ok(series) => Some(series),
                Err(e) => {
                    warnings.push(format!("opinion file unavailable: {e}"));
                    None
                }
            }
        }
        OpinionMode::Auto => match fetch_tracker() {
            Some(series) => Some(series),
            None => {
                warnings.push(
                    "opinion tracker unavailable, using synthetic sample".to_string(),
                );
                match generate_sample(seed, start, end) {
                    Ok(series) => Some(series),
                    Err(e) => {
                        warnings.push(format!("opinion sample generation failed: {e}"));
                        None
                    }
                }
            }
        },
    };
    (raw, warnings)
}

/// Aggregate raw opinion metrics to quarterly. Metrics that end up empty are
/// dropped; an empty result means no opinion data at all.
pub fn to_quarterly(raw: &[RawSeries]) -> OpinionSource {
    let metrics: Vec<_> = raw
        .iter()
        .map(|series| aggregate(series).series)
        .filter(|q| !q.is_empty())
        .collect();
    if metrics.is_empty() {
        OpinionSource::Unavailable
    } else {
        OpinionSource::Observed(OpinionData { metrics })
    }
}

/// Try the remote tracker page. The page carries no stable machine-readable
/// payload, so this succeeds only when it links a downloadable CSV; anything
/// else is a miss and the caller falls back.
fn fetch_tracker() -> Option<Vec<RawSeries>> {
    let client = Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .ok()?;
    let body = client
        .get(TRACKER_URL)
        .header("Accept", "text/html,application/xhtml+xml")
        .send()
        .ok()?
        .error_for_status()
        .ok()?
        .text()
        .ok()?;

    let link = find_csv_link(&body)?;
    let csv = client
        .get(&link)
        .send()
        .ok()?
        .error_for_status()
        .ok()?
        .text()
        .ok()?;
    ingest::read_opinion_metrics(csv.as_bytes()).ok()
}

/// Scan HTML for the first absolute href ending in `.csv`.
fn find_csv_link(html: &str) -> Option<String> {
    for chunk in html.split("href=\"").skip(1) {
        let end = chunk.find('"')?;
        let href = &chunk[..end];
        if href.ends_with(".csv") && href.starts_with("http") {
            return Some(href.to_string());
        }
    }
    None
}

/// Generate the synthetic monthly opinion sample: a slow sentiment cycle plus
/// noise, with a pessimism shock over the first half of 2020.
pub fn generate_sample(
    seed: u64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<RawSeries>, AppError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 5.0)
        .map_err(|e| AppError::data(format!("Noise distribution error: {e}")))?;

    let shock_start = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap_or(NaiveDate::MIN);
    let shock_end = shock_start + chrono::Duration::days(180);

    let mut better = Vec::new();
    let mut worse = Vec::new();
    let mut same = Vec::new();
    let mut net = Vec::new();

    let mut date = NaiveDate::from_ymd_opt(start.year(), start.month(), 1).unwrap_or(start);
    let mut i = 0usize;
    while date <= end {
        let cycle = 50.0 + 15.0 * (i as f64 / 6.0).sin();
        let eps = noise.sample(&mut rng);

        let mut getting_better = (cycle + eps).clamp(10.0, 60.0);
        let mut getting_worse = (100.0 - cycle + eps * 0.8).clamp(10.0, 60.0);

        if date >= shock_start && date < shock_end {
            getting_worse *= 1.5;
            getting_better *= 0.5;
        }

        let staying_same = (100.0 - getting_better - getting_worse).max(10.0);
        let net_sentiment = getting_better - getting_worse;

        better.push(Observation { date, value: round1(getting_better) });
        worse.push(Observation { date, value: round1(getting_worse) });
        same.push(Observation { date, value: round1(staying_same) });
        net.push(Observation { date, value: round1(net_sentiment) });

        date = next_month(date);
        i += 1;
    }

    let columns = [better, worse, same, net];
    Ok(OPINION_METRICS
        .iter()
        .zip(columns)
        .map(|(name, observations)| RawSeries {
            name: (*name).to_string(),
            frequency: Frequency::Monthly,
            observations,
        })
        .collect())
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn next_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
}
