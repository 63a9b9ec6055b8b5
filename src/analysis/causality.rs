//! Granger-style predictive causality over the aligned economic series.
//!
//! For an ordered pair (X, Y) and lag order p, two models are fit:
//!
//! ```text
//! restricted:   y_t = c + Σ_{i=1..p} a_i y_{t-i}
//! unrestricted: y_t = c + Σ_{i=1..p} a_i y_{t-i} + Σ_{i=1..p} b_i x_{t-i}
//! ```
//!
//! and the SSR-based F-test compares them:
//!
//! ```text
//! F = ((SSR_r - SSR_u) / p) / (SSR_u / (n_eff - 2p - 1))
//! ```
//!
//! Each lag order 1..=4 is a fully separate model pair. We report, per pair,
//! the lag with the minimum p-value. Lag orders without enough data are
//! skipped outright, never averaged or imputed, and a pair with no feasible
//! lag yields a skip note instead of a fabricated result.

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use statrs::distribution::{ContinuousCDF, FisherSnedecor};

use crate::align::AlignedFrame;
use crate::domain::{CausalityResult, SignificanceBands, SkipNote};
use crate::math::ols::residual_sum_of_squares;

/// Lag orders tested, each independently.
pub const MAX_LAG: usize = 4;

/// Extra aligned points required beyond `4 * lag_order`.
const MIN_OBS_BUFFER: usize = 3;

/// Minimum aligned points to test a pair at a given lag order.
pub fn min_points_for_lag(lag: usize) -> usize {
    4 * lag + MIN_OBS_BUFFER
}

#[derive(Debug, Clone, Copy)]
struct LagTest {
    lag: usize,
    f_statistic: f64,
    p_value: f64,
    df1: usize,
    df2: usize,
}

/// Run the causality scan over every ordered pair of frame columns.
pub fn granger_tests(frame: &AlignedFrame) -> (Vec<CausalityResult>, Vec<SkipNote>) {
    let mut ordered_pairs = Vec::new();
    for (cause, x) in &frame.columns {
        for (effect, y) in &frame.columns {
            if cause != effect {
                ordered_pairs.push((cause.clone(), effect.clone(), x.clone(), y.clone()));
            }
        }
    }

    let outcomes: Vec<Result<CausalityResult, SkipNote>> = ordered_pairs
        .par_iter()
        .map(|(cause, effect, x, y)| test_pair(cause, effect, x, y))
        .collect();

    let mut results = Vec::new();
    let mut skipped = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(result) => results.push(result),
            Err(note) => skipped.push(note),
        }
    }

    (results, skipped)
}

/// Test one ordered pair at every lag order and keep the minimum-p lag.
fn test_pair(
    cause: &str,
    effect: &str,
    x: &[f64],
    y: &[f64],
) -> Result<CausalityResult, SkipNote> {
    let n = y.len();

    let mut best: Option<LagTest> = None;
    for lag in 1..=MAX_LAG {
        if n < min_points_for_lag(lag) {
            continue;
        }
        let Some(test) = f_test_at_lag(x, y, lag) else {
            // Degenerate regression at this lag order; exclude it from the
            // minimum search.
            continue;
        };
        let better = match best {
            None => true,
            Some(current) => test.p_value < current.p_value,
        };
        if better {
            best = Some(test);
        }
    }

    match best {
        Some(test) => Ok(CausalityResult {
            cause: cause.to_string(),
            effect: effect.to_string(),
            best_lag: test.lag,
            f_statistic: test.f_statistic,
            p_value: test.p_value,
            df1: test.df1,
            df2: test.df2,
            n,
            significant_at: SignificanceBands::from_p(test.p_value),
        }),
        None => Err(SkipNote {
            subject: format!("{cause} -> {effect}"),
            reason: format!(
                "insufficient data for causality testing ({n} aligned points, need {} for lag 1)",
                min_points_for_lag(1)
            ),
        }),
    }
}

/// One restricted-vs-unrestricted F-test at a fixed lag order.
fn f_test_at_lag(x: &[f64], y: &[f64], lag: usize) -> Option<LagTest> {
    let n = y.len();
    let n_eff = n - lag;
    let k_restricted = 1 + lag;
    let k_unrestricted = 1 + 2 * lag;
    if n_eff <= k_unrestricted {
        return None;
    }

    let response = DVector::from_iterator(n_eff, y[lag..].iter().copied());

    // Restricted design: intercept + own lags of y.
    let mut restricted = DMatrix::zeros(n_eff, k_restricted);
    // Unrestricted design: restricted columns + lags of x.
    let mut unrestricted = DMatrix::zeros(n_eff, k_unrestricted);

    for row in 0..n_eff {
        let t = row + lag;
        restricted[(row, 0)] = 1.0;
        unrestricted[(row, 0)] = 1.0;
        for i in 1..=lag {
            restricted[(row, i)] = y[t - i];
            unrestricted[(row, i)] = y[t - i];
            unrestricted[(row, lag + i)] = x[t - i];
        }
    }

    let ssr_r = residual_sum_of_squares(&restricted, &response)?;
    let ssr_u = residual_sum_of_squares(&unrestricted, &response)?;

    let df1 = lag;
    let df2 = n_eff - k_unrestricted;

    // A near-perfect unrestricted fit leaves nothing to test against.
    if ssr_u <= f64::EPSILON {
        return None;
    }

    let f_statistic = ((ssr_r - ssr_u) / df1 as f64) / (ssr_u / df2 as f64);
    if !f_statistic.is_finite() {
        return None;
    }
    // Numerical noise can push SSR_r a hair below SSR_u.
    let f_statistic = f_statistic.max(0.0);

    let dist = FisherSnedecor::new(df1 as f64, df2 as f64).ok()?;
    let p_value = 1.0 - dist.cdf(f_statistic);

    Some(LagTest {
        lag,
        f_statistic,
        p_value,
        df1,
        df2,
    })
}
