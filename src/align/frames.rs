//! Quarter alignment: joining certified quarterly series on the quarter key.
//!
//! Two joins exist:
//! - **contemporaneous**: same-quarter intersection across all series, used
//!   for the economic correlation matrix and the causality tests;
//! - **lag-one**: economic value at quarter t-1 paired with an opinion value
//!   at quarter t (year rollover handled by `QuarterKey::prev`).

use crate::data::opinion::OpinionData;
use crate::domain::{QuarterKey, QuarterlySeries, SkipNote};

/// Minimum aligned points for a pair to enter statistical computation;
/// below this, correlation is undefined.
pub const MIN_ALIGNED_POINTS: usize = 2;

/// Series aligned on the intersection of their quarter keys, ascending.
#[derive(Debug, Clone)]
pub struct AlignedFrame {
    pub keys: Vec<QuarterKey>,
    /// One `(name, values)` column per series, values parallel to `keys`.
    pub columns: Vec<(String, Vec<f64>)>,
}

impl AlignedFrame {
    pub fn n(&self) -> usize {
        self.keys.len()
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }
}

/// One economic series lagged a quarter against one opinion metric.
#[derive(Debug, Clone)]
pub struct LaggedPair {
    pub economic: String,
    pub metric: String,
    /// Economic values at t-1, parallel to `opinion`.
    pub econ_lagged: Vec<f64>,
    /// Opinion values at t.
    pub opinion: Vec<f64>,
}

/// All lag-one pairs, plus notes for pairs excluded as too small.
#[derive(Debug, Clone)]
pub struct LaggedFrame {
    pub pairs: Vec<LaggedPair>,
    pub skipped: Vec<SkipNote>,
}

/// Restrict every series to the intersection of their quarter keys.
pub fn contemporaneous(series: &[&QuarterlySeries]) -> AlignedFrame {
    let Some(first) = series.first() else {
        return AlignedFrame {
            keys: Vec::new(),
            columns: Vec::new(),
        };
    };

    let keys: Vec<QuarterKey> = first
        .values
        .keys()
        .filter(|key| series.iter().all(|s| s.values.contains_key(key)))
        .copied()
        .collect();

    let columns = series
        .iter()
        .map(|s| {
            let values = keys.iter().map(|key| s.values[key]).collect();
            (s.name.clone(), values)
        })
        .collect();

    AlignedFrame { keys, columns }
}

/// Pair each economic series at quarter t-1 with each opinion metric at
/// quarter t. A pair is included only where the lagged economic value exists;
/// pairs with fewer than [`MIN_ALIGNED_POINTS`] points are excluded and noted.
pub fn lag_one(economic: &[&QuarterlySeries], opinion: &OpinionData) -> LaggedFrame {
    let mut pairs = Vec::new();
    let mut skipped = Vec::new();

    for econ in economic {
        for metric in &opinion.metrics {
            let mut econ_lagged = Vec::new();
            let mut opinion_values = Vec::new();

            for (&key, &value) in &metric.values {
                if let Some(lagged) = econ.get(key.prev()) {
                    econ_lagged.push(lagged);
                    opinion_values.push(value);
                }
            }

            if econ_lagged.len() < MIN_ALIGNED_POINTS {
                skipped.push(SkipNote {
                    subject: format!("{} (t-1) -> {} (t)", econ.name, metric.name),
                    reason: format!(
                        "insufficient data ({} aligned points, need {})",
                        econ_lagged.len(),
                        MIN_ALIGNED_POINTS
                    ),
                });
                continue;
            }

            pairs.push(LaggedPair {
                economic: econ.name.clone(),
                metric: metric.name.clone(),
                econ_lagged,
                opinion: opinion_values,
            });
        }
    }

    LaggedFrame { pairs, skipped }
}
