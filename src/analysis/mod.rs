//! The statistical analysis engine and its result aggregator.
//!
//! Everything here is a pure function over certified quarterly series: the
//! engines share no state, write only their own outputs, and may run in any
//! order once the validation gate has passed.

pub mod causality;
pub mod correlation;
pub mod descriptive;

use std::collections::BTreeMap;

use crate::align::{contemporaneous, lag_one};
use crate::data::opinion::OpinionSource;
use crate::domain::{AnalysisResult, QuarterlySeries};

/// Run the full battery over the certified economic series plus the optional
/// opinion source, and merge everything into one immutable result.
///
/// `opinion_economy` is present only when opinion data was available, so the
/// reporting layer can omit that section instead of rendering empty tables.
pub fn analyze(economic: &[&QuarterlySeries], opinion: &OpinionSource) -> AnalysisResult {
    let frame = contemporaneous(economic);

    let (correlations, mut skipped) = correlation::correlation_matrix(&frame);
    let (causality, causality_skips) = causality::granger_tests(&frame);
    skipped.extend(causality_skips);

    let mut descriptive_stats = BTreeMap::new();
    for series in economic {
        if let Some(stats) = descriptive::summarize(series) {
            descriptive_stats.insert(series.name.clone(), stats);
        }
    }

    let opinion_economy = match opinion {
        OpinionSource::Observed(data) => {
            for metric in &data.metrics {
                if let Some(stats) = descriptive::summarize(metric) {
                    descriptive_stats.insert(metric.name.clone(), stats);
                }
            }
            let lagged = lag_one(economic, data);
            skipped.extend(lagged.skipped.clone());
            Some(correlation::lagged_correlations(&lagged))
        }
        OpinionSource::Unavailable => None,
    };

    AnalysisResult {
        correlations,
        causality,
        descriptive_stats,
        opinion_economy,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::opinion::OpinionData;
    use crate::domain::QuarterKey;
    use std::collections::BTreeMap;

    fn quarterly(name: &str, values: &[f64]) -> QuarterlySeries {
        let mut key = QuarterKey::new(2019, 1).unwrap();
        let mut map = BTreeMap::new();
        for &v in values {
            map.insert(key, v);
            key = key.next();
        }
        QuarterlySeries {
            name: name.to_string(),
            values: map,
        }
    }

    fn three_series(n: usize) -> Vec<QuarterlySeries> {
        let gdp: Vec<f64> = (0..n).map(|t| 2.0 + (t as f64 * 0.8).sin()).collect();
        let unemp: Vec<f64> = (0..n).map(|t| 5.0 - 0.5 * (t as f64 * 0.8).sin()).collect();
        let fed: Vec<f64> = (0..n).map(|t| 1.0 + 0.1 * (t as f64 * 1.7).cos()).collect();
        vec![
            quarterly("gdp_growth", &gdp),
            quarterly("unemployment", &unemp),
            quarterly("fed_funds", &fed),
        ]
    }

    #[test]
    fn full_battery_over_three_series() {
        let series = three_series(20);
        let refs: Vec<&QuarterlySeries> = series.iter().collect();
        let result = analyze(&refs, &OpinionSource::Unavailable);

        // Exactly one correlation per unordered pair.
        assert_eq!(result.correlations.len(), 3);
        // One best-lag entry per ordered pair, data permitting.
        assert_eq!(result.causality.len() + result.skipped.len(), 6);
        assert_eq!(result.descriptive_stats.len(), 3);
        assert!(result.opinion_economy.is_none());
    }

    #[test]
    fn opinion_results_appear_only_when_observed() {
        let series = three_series(20);
        let refs: Vec<&QuarterlySeries> = series.iter().collect();

        let sentiment: Vec<f64> = (0..20).map(|t| -3.0 + (t as f64 * 0.8).cos()).collect();
        let opinion = OpinionSource::Observed(OpinionData {
            metrics: vec![quarterly("net_sentiment", &sentiment)],
        });

        let result = analyze(&refs, &opinion);
        let lagged = result.opinion_economy.as_ref().unwrap();
        // One lag-one correlation per (economic series, metric).
        assert_eq!(lagged.len(), 3);
        assert!(lagged.iter().all(|r| r.lag == 1));
        // The opinion metric is summarized too.
        assert!(result.descriptive_stats.contains_key("net_sentiment"));
    }
}
