//! Pearson correlation with two-sided significance.
//!
//! For every pair of aligned, equal-length value sequences we report `r` and
//! a p-value from the t-distribution with n-2 degrees of freedom. Degenerate
//! inputs (zero variance, too few points) produce "could not compute" results
//! rather than errors.

use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::align::{AlignedFrame, LaggedFrame, MIN_ALIGNED_POINTS};
use crate::domain::{CorrelationResult, SkipNote};

/// Pearson's r, or `None` if either sequence has zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    debug_assert_eq!(x.len(), y.len());
    let n = x.len() as f64;
    if x.len() < 2 {
        return None;
    }

    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x <= 0.0 || var_y <= 0.0 {
        return None;
    }

    Some(cov / (var_x * var_y).sqrt())
}

/// Two-sided p-value for a correlation of `r` over `n` points, via the
/// t-statistic `r * sqrt(n-2) / sqrt(1 - r^2)`.
///
/// A perfect correlation (|r| >= 1) short-circuits to p = 0.
pub fn two_sided_p(r: f64, n: usize) -> f64 {
    if n < 3 {
        // One degree of freedom short of a test; report total uncertainty.
        return 1.0;
    }
    if r.abs() >= 1.0 {
        return 0.0;
    }

    let df = (n - 2) as f64;
    let t_stat = r * df.sqrt() / (1.0 - r * r).sqrt();
    match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => 2.0 * (1.0 - dist.cdf(t_stat.abs())),
        Err(_) => 1.0,
    }
}

fn correlate(series_a: &str, series_b: &str, lag: u8, x: &[f64], y: &[f64]) -> CorrelationResult {
    let n = x.len();
    match pearson(x, y) {
        Some(r) => CorrelationResult {
            series_a: series_a.to_string(),
            series_b: series_b.to_string(),
            lag,
            r: Some(r),
            p_value: Some(two_sided_p(r, n)),
            n,
            note: None,
        },
        None => CorrelationResult {
            series_a: series_a.to_string(),
            series_b: series_b.to_string(),
            lag,
            r: None,
            p_value: None,
            n,
            note: Some("correlation undefined (zero variance)".to_string()),
        },
    }
}

/// Correlation for every unordered pair of columns in a contemporaneous frame.
///
/// Pairs backed by fewer than [`MIN_ALIGNED_POINTS`] points are skipped with a
/// note instead of producing an undefined correlation.
pub fn correlation_matrix(frame: &AlignedFrame) -> (Vec<CorrelationResult>, Vec<SkipNote>) {
    let mut results = Vec::new();
    let mut skipped = Vec::new();

    for i in 0..frame.columns.len() {
        for j in (i + 1)..frame.columns.len() {
            let (name_a, x) = &frame.columns[i];
            let (name_b, y) = &frame.columns[j];

            if frame.n() < MIN_ALIGNED_POINTS {
                skipped.push(SkipNote {
                    subject: format!("{name_a} ~ {name_b}"),
                    reason: format!(
                        "insufficient data ({} aligned points, need {})",
                        frame.n(),
                        MIN_ALIGNED_POINTS
                    ),
                });
                continue;
            }

            results.push(correlate(name_a, name_b, 0, x, y));
        }
    }

    (results, skipped)
}

/// Correlation for every lag-one (economic, opinion-metric) pair.
pub fn lagged_correlations(frame: &LaggedFrame) -> Vec<CorrelationResult> {
    frame
        .pairs
        .iter()
        .map(|pair| {
            correlate(
                &pair.economic,
                &pair.metric,
                1,
                &pair.econ_lagged,
                &pair.opinion,
            )
        })
        .collect()
}
