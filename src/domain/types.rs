//! Shared domain types.
//!
//! These types are intentionally lightweight and serializable so they can be:
//!
//! - used in-memory during aggregation/validation/analysis
//! - exported to JSON/CSV
//! - asserted on directly in tests

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{Datelike, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize, Serializer};

/// Native recording frequency of a raw series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Monthly,
    Quarterly,
}

impl Frequency {
    /// Observation count expected in a fully elapsed quarter, where that count
    /// is well-defined (daily counts vary with the calendar).
    pub fn expected_per_quarter(self) -> Option<usize> {
        match self {
            Frequency::Daily => None,
            Frequency::Monthly => Some(3),
            Frequency::Quarterly => Some(1),
        }
    }
}

/// A single dated observation. Immutable once produced by a source adapter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

/// A raw series as delivered by an acquisition adapter (FRED, opinion source,
/// or a local CSV). Rows are kept in delivery order; ordering problems are the
/// validation gate's business, not the adapter's.
#[derive(Debug, Clone)]
pub struct RawSeries {
    pub name: String,
    pub frequency: Frequency,
    pub observations: Vec<Observation>,
}

/// A (year, quarter-of-year) pair: the common time axis of the pipeline.
///
/// Totally ordered (year first, then quarter), with decrement/increment that
/// roll over year boundaries. Serialized as `"2021Q3"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QuarterKey {
    year: i32,
    quarter: u8,
}

impl QuarterKey {
    /// Build a key; `quarter` must be in `1..=4`.
    pub fn new(year: i32, quarter: u8) -> Option<Self> {
        if (1..=4).contains(&quarter) {
            Some(Self { year, quarter })
        } else {
            None
        }
    }

    /// Derive the key of the quarter containing `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            quarter: ((date.month0() / 3) + 1) as u8,
        }
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn quarter(self) -> u8 {
        self.quarter
    }

    /// The previous quarter, rolling Q1 back to Q4 of the prior year.
    pub fn prev(self) -> Self {
        if self.quarter == 1 {
            Self {
                year: self.year - 1,
                quarter: 4,
            }
        } else {
            Self {
                year: self.year,
                quarter: self.quarter - 1,
            }
        }
    }

    /// The next quarter, rolling Q4 forward to Q1 of the following year.
    pub fn next(self) -> Self {
        if self.quarter == 4 {
            Self {
                year: self.year + 1,
                quarter: 1,
            }
        } else {
            Self {
                year: self.year,
                quarter: self.quarter + 1,
            }
        }
    }
}

impl std::fmt::Display for QuarterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}Q{}", self.year, self.quarter)
    }
}

impl Serialize for QuarterKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A series reduced to one value per calendar quarter.
///
/// Produced only by the frequency aggregator. Absent keys are holes, never
/// zeros; the map keeps keys in ascending order by construction.
#[derive(Debug, Clone)]
pub struct QuarterlySeries {
    pub name: String,
    pub values: BTreeMap<QuarterKey, f64>,
}

impl QuarterlySeries {
    pub fn get(&self, key: QuarterKey) -> Option<f64> {
        self.values.get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn first_key(&self) -> Option<QuarterKey> {
        self.values.keys().next().copied()
    }

    pub fn last_key(&self) -> Option<QuarterKey> {
        self.values.keys().next_back().copied()
    }
}

/// A "could not compute" outcome. These are first-class results, not errors:
/// the analysis output records what was skipped and why instead of failing.
#[derive(Debug, Clone, Serialize)]
pub struct SkipNote {
    pub subject: String,
    pub reason: String,
}

/// Significance flags at the conventional 1/5/10% bands.
///
/// The bands are a presentation mapping over the continuous p-value; each
/// threshold is inclusive (`p <= threshold`).
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SignificanceBands {
    pub at_1pct: bool,
    pub at_5pct: bool,
    pub at_10pct: bool,
}

impl SignificanceBands {
    pub fn from_p(p: f64) -> Self {
        Self {
            at_1pct: p <= 0.01,
            at_5pct: p <= 0.05,
            at_10pct: p <= 0.10,
        }
    }

    /// Asterisk notation for terminal tables.
    pub fn stars(self) -> &'static str {
        if self.at_1pct {
            "***"
        } else if self.at_5pct {
            "**"
        } else if self.at_10pct {
            "*"
        } else {
            ""
        }
    }
}

/// Pearson correlation between two aligned series.
///
/// `lag` is 0 for a same-quarter join and 1 when `series_a` is taken at t-1
/// against `series_b` at t. A zero-variance input makes `r` undefined; that is
/// reported as `None` plus a note, never as an error.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationResult {
    pub series_a: String,
    pub series_b: String,
    pub lag: u8,
    pub r: Option<f64>,
    pub p_value: Option<f64>,
    pub n: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Best-lag Granger-style causality test result for one ordered pair.
#[derive(Debug, Clone, Serialize)]
pub struct CausalityResult {
    pub cause: String,
    pub effect: String,
    pub best_lag: usize,
    pub f_statistic: f64,
    pub p_value: f64,
    pub df1: usize,
    pub df2: usize,
    pub n: usize,
    pub significant_at: SignificanceBands,
}

/// Per-series descriptive statistics over the values actually present
/// (holes excluded, not zero-filled). `std` uses the sample (n-1) denominator
/// and is reported as 0 for a single observation.
#[derive(Debug, Clone, Serialize)]
pub struct DescriptiveStats {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

/// The merged output of one analysis run. Owned by the pipeline run that
/// produced it and written once to the output sink.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub correlations: Vec<CorrelationResult>,
    pub causality: Vec<CausalityResult>,
    pub descriptive_stats: BTreeMap<String, DescriptiveStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opinion_economy: Option<Vec<CorrelationResult>>,
    pub skipped: Vec<SkipNote>,
}

impl AnalysisResult {
    pub fn has_opinion(&self) -> bool {
        self.opinion_economy.is_some()
    }
}

/// How to obtain the optional public-opinion series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OpinionMode {
    /// Try the remote tracker, then fall back to a deterministic sample.
    Auto,
    /// Read `public_opinion.csv` from the data directory.
    File,
    /// Generate the deterministic synthetic sample directly.
    Sample,
    /// Run without opinion data.
    #[value(name = "none")]
    #[serde(rename = "none")]
    Disabled,
}

/// A full run's configuration as understood by the pipeline.
///
/// Derived from CLI flags plus defaults.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory for raw per-series CSVs (written after fetch, read when offline).
    pub data_dir: PathBuf,
    /// Directory for certified quarterly CSVs (written on a PASS verdict).
    pub validated_dir: PathBuf,
    /// Directory for JSON artifacts.
    pub out_dir: PathBuf,
    /// Observation range requested from the data provider.
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Skip the network and read raw CSVs from `data_dir` instead.
    pub offline: bool,
    pub opinion_mode: OpinionMode,
    /// Seed for the synthetic opinion fallback.
    pub opinion_seed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_key_from_date_covers_all_months() {
        let cases = [
            (1, 1),
            (2, 1),
            (3, 1),
            (4, 2),
            (6, 2),
            (7, 3),
            (9, 3),
            (10, 4),
            (12, 4),
        ];
        for (month, quarter) in cases {
            let date = NaiveDate::from_ymd_opt(2021, month, 15).unwrap();
            let key = QuarterKey::from_date(date);
            assert_eq!(key.year(), 2021);
            assert_eq!(key.quarter(), quarter, "month {month}");
        }
    }

    #[test]
    fn quarter_key_prev_rolls_over_year() {
        let q1 = QuarterKey::new(2022, 1).unwrap();
        assert_eq!(q1.prev(), QuarterKey::new(2021, 4).unwrap());
        let q3 = QuarterKey::new(2022, 3).unwrap();
        assert_eq!(q3.prev(), QuarterKey::new(2022, 2).unwrap());
    }

    #[test]
    fn quarter_key_next_rolls_over_year() {
        let q4 = QuarterKey::new(2021, 4).unwrap();
        assert_eq!(q4.next(), QuarterKey::new(2022, 1).unwrap());
    }

    #[test]
    fn quarter_key_ordering_is_year_then_quarter() {
        let a = QuarterKey::new(2020, 4).unwrap();
        let b = QuarterKey::new(2021, 1).unwrap();
        assert!(a < b);
    }

    #[test]
    fn quarter_key_rejects_bad_quarter() {
        assert!(QuarterKey::new(2021, 0).is_none());
        assert!(QuarterKey::new(2021, 5).is_none());
    }

    #[test]
    fn quarter_key_display() {
        let key = QuarterKey::new(2021, 3).unwrap();
        assert_eq!(key.to_string(), "2021Q3");
    }

    #[test]
    fn significance_thresholds_are_inclusive() {
        assert!(SignificanceBands::from_p(0.05).at_5pct);
        assert!(!SignificanceBands::from_p(0.0501).at_5pct);
        assert_eq!(SignificanceBands::from_p(0.009).stars(), "***");
        assert_eq!(SignificanceBands::from_p(0.03).stars(), "**");
        assert_eq!(SignificanceBands::from_p(0.10).stars(), "*");
        assert_eq!(SignificanceBands::from_p(0.2).stars(), "");
    }
}
