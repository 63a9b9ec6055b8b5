//! Per-series descriptive statistics.

use crate::domain::{DescriptiveStats, QuarterlySeries};

/// Summarize the values actually present in a quarterly series.
///
/// Returns `None` for an empty series; holes contribute nothing.
pub fn summarize(series: &QuarterlySeries) -> Option<DescriptiveStats> {
    if series.is_empty() {
        return None;
    }

    let values: Vec<f64> = series.values.values().copied().collect();
    let count = values.len();
    let n = count as f64;

    let mean = values.iter().sum::<f64>() / n;
    let std = if count > 1 {
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        variance.sqrt()
    } else {
        0.0
    };

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Some(DescriptiveStats {
        count,
        mean,
        std,
        min,
        max,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::QuarterKey;
    use std::collections::BTreeMap;

    fn series(values: &[f64]) -> QuarterlySeries {
        let mut key = QuarterKey::new(2020, 1).unwrap();
        let mut map = BTreeMap::new();
        for &v in values {
            map.insert(key, v);
            key = key.next();
        }
        QuarterlySeries {
            name: "test".to_string(),
            values: map,
        }
    }

    #[test]
    fn summarize_uses_sample_std() {
        let stats = summarize(&series(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0])).unwrap();
        assert_eq!(stats.count, 8);
        assert!((stats.mean - 5.0).abs() < 1e-12);
        // Sample variance of this set is 32/7.
        assert!((stats.std - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 9.0);
    }

    #[test]
    fn empty_series_has_no_stats() {
        assert!(summarize(&series(&[])).is_none());
    }

    #[test]
    fn single_value_has_zero_std() {
        let stats = summarize(&series(&[3.5])).unwrap();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.std, 0.0);
    }
}
