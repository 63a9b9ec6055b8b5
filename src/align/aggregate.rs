//! Frequency aggregation: raw observations → one value per calendar quarter.
//!
//! Design goals:
//! - **Deterministic**: the quarterly value is the arithmetic mean of the raw
//!   observations falling in that quarter; a quarterly input passes through
//!   unchanged.
//! - **Best-effort**: duplicate dates are dropped and reported, they never
//!   abort the series.
//! - **Separation of concerns**: no validation verdicts here. The aggregator
//!   only records the facts the gate needs (derivation order, sparse
//!   quarters, malformed records).

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;

use crate::domain::{Frequency, QuarterKey, QuarterlySeries, RawSeries};

/// A raw record the aggregator had to drop, named so the report can show it.
#[derive(Debug, Clone)]
pub struct MalformedInput {
    pub series: String,
    pub date: NaiveDate,
    pub message: String,
}

/// Aggregator output: the quarterly series plus the bookkeeping the
/// validation gate consumes.
#[derive(Debug, Clone)]
pub struct AggregatedSeries {
    pub series: QuarterlySeries,
    /// Quarter keys in raw encounter order, consecutive repeats collapsed.
    /// The gate's format rule checks this is strictly increasing.
    pub derived_keys: Vec<QuarterKey>,
    /// Quarters aggregated from fewer observations than the frequency implies
    /// (monthly quarters with < 3 months, and so on). Input to the gate's
    /// completeness rule.
    pub sparse_quarters: Vec<(QuarterKey, usize)>,
    /// Records dropped during aggregation (duplicate dates).
    pub malformed: Vec<MalformedInput>,
}

impl AggregatedSeries {
    pub fn name(&self) -> &str {
        &self.series.name
    }
}

/// Reduce a raw series to one value per quarter.
///
/// A quarter with zero observations produces no entry at all: holes stay
/// holes, they are never zero-filled.
pub fn aggregate(raw: &RawSeries) -> AggregatedSeries {
    let mut sums: BTreeMap<QuarterKey, (f64, usize)> = BTreeMap::new();
    let mut derived_keys: Vec<QuarterKey> = Vec::new();
    let mut malformed = Vec::new();
    let mut seen_dates: HashSet<NaiveDate> = HashSet::new();

    for obs in &raw.observations {
        if !seen_dates.insert(obs.date) {
            malformed.push(MalformedInput {
                series: raw.name.clone(),
                date: obs.date,
                message: format!(
                    "duplicate observation for {} (value {}); record dropped",
                    obs.date, obs.value
                ),
            });
            continue;
        }

        let key = QuarterKey::from_date(obs.date);
        if derived_keys.last() != Some(&key) {
            derived_keys.push(key);
        }

        let entry = sums.entry(key).or_insert((0.0, 0));
        entry.0 += obs.value;
        entry.1 += 1;
    }

    let values: BTreeMap<QuarterKey, f64> = sums
        .iter()
        .map(|(&key, &(sum, count))| (key, sum / count as f64))
        .collect();

    let sparse_quarters = match raw.frequency.expected_per_quarter() {
        Some(expected) => sums
            .iter()
            .filter(|&(_, &(_, count))| count < expected)
            .map(|(&key, &(_, count))| (key, count))
            .collect(),
        None => Vec::new(),
    };

    AggregatedSeries {
        series: QuarterlySeries {
            name: raw.name.clone(),
            values,
        },
        derived_keys,
        sparse_quarters,
        malformed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Observation;

    fn series(name: &str, frequency: Frequency, obs: &[(i32, u32, u32, f64)]) -> RawSeries {
        RawSeries {
            name: name.to_string(),
            frequency,
            observations: obs
                .iter()
                .map(|&(y, m, d, v)| Observation {
                    date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
                    value: v,
                })
                .collect(),
        }
    }

    #[test]
    fn monthly_quarter_is_mean_of_three_months() {
        let raw = series(
            "unemployment",
            Frequency::Monthly,
            &[(2021, 1, 1, 6.0), (2021, 2, 1, 6.3), (2021, 3, 1, 6.9)],
        );
        let agg = aggregate(&raw);
        let key = QuarterKey::new(2021, 1).unwrap();
        let value = agg.series.get(key).unwrap();
        assert!((value - 6.4).abs() < 1e-12);
        assert!(agg.sparse_quarters.is_empty());
    }

    #[test]
    fn quarterly_input_is_identity() {
        let raw = series(
            "gdp_growth",
            Frequency::Quarterly,
            &[(2021, 1, 1, 2.5), (2021, 4, 1, -1.0), (2021, 7, 1, 3.1)],
        );
        let agg = aggregate(&raw);
        assert_eq!(agg.series.len(), 3);
        assert_eq!(agg.series.get(QuarterKey::new(2021, 1).unwrap()), Some(2.5));
        assert_eq!(agg.series.get(QuarterKey::new(2021, 2).unwrap()), Some(-1.0));
        assert_eq!(agg.series.get(QuarterKey::new(2021, 3).unwrap()), Some(3.1));
    }

    #[test]
    fn daily_quarter_averages_all_days() {
        let raw = series(
            "fed_funds",
            Frequency::Daily,
            &[
                (2021, 4, 1, 0.05),
                (2021, 4, 2, 0.07),
                (2021, 5, 10, 0.06),
                (2021, 6, 30, 0.10),
            ],
        );
        let agg = aggregate(&raw);
        let value = agg.series.get(QuarterKey::new(2021, 2).unwrap()).unwrap();
        assert!((value - 0.07).abs() < 1e-12);
    }

    #[test]
    fn empty_quarter_is_a_hole_not_a_zero() {
        let raw = series(
            "gdp_growth",
            Frequency::Quarterly,
            &[(2021, 1, 1, 2.0), (2021, 7, 1, 1.0)],
        );
        let agg = aggregate(&raw);
        assert_eq!(agg.series.get(QuarterKey::new(2021, 2).unwrap()), None);
        assert_eq!(agg.series.len(), 2);
    }

    #[test]
    fn partial_monthly_quarter_is_flagged_sparse() {
        let raw = series(
            "unemployment",
            Frequency::Monthly,
            &[
                (2021, 1, 1, 6.0),
                (2021, 2, 1, 6.2),
                (2021, 3, 1, 6.4),
                (2021, 4, 1, 6.1),
                (2021, 5, 1, 6.0),
            ],
        );
        let agg = aggregate(&raw);
        assert_eq!(
            agg.sparse_quarters,
            vec![(QuarterKey::new(2021, 2).unwrap(), 2)]
        );
        // Still aggregated: averaged over however many are present.
        let value = agg.series.get(QuarterKey::new(2021, 2).unwrap()).unwrap();
        assert!((value - 6.05).abs() < 1e-12);
    }

    #[test]
    fn duplicate_dates_are_dropped_and_reported() {
        let raw = series(
            "gdp_growth",
            Frequency::Quarterly,
            &[(2021, 1, 1, 2.0), (2021, 1, 1, 9.0), (2021, 4, 1, 1.0)],
        );
        let agg = aggregate(&raw);
        assert_eq!(agg.malformed.len(), 1);
        assert!(agg.malformed[0].message.contains("2021-01-01"));
        // First record wins; aggregation still proceeds.
        assert_eq!(agg.series.get(QuarterKey::new(2021, 1).unwrap()), Some(2.0));
        assert_eq!(agg.series.get(QuarterKey::new(2021, 2).unwrap()), Some(1.0));
    }

    #[test]
    fn out_of_order_dates_leave_a_non_monotonic_derivation_trail() {
        let raw = series(
            "gdp_growth",
            Frequency::Quarterly,
            &[(2021, 4, 1, 1.0), (2021, 1, 1, 2.0)],
        );
        let agg = aggregate(&raw);
        assert_eq!(
            agg.derived_keys,
            vec![
                QuarterKey::new(2021, 2).unwrap(),
                QuarterKey::new(2021, 1).unwrap()
            ]
        );
    }
}
