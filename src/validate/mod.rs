//! The validation gate: the pass/fail checkpoint certifying aggregated data
//! before any statistics run.
//!
//! Design goals:
//! - **Pure**: the gate only classifies. It never mutates series, never reads
//!   the clock (the caller supplies the timestamp), and never halts the
//!   process; the orchestrator inspects the verdict and stops on FAIL.
//! - **Exhaustive**: every rule always runs; a range violation does not stop
//!   the alignment check from running.
//! - **Itemized**: each finding names the offending quarters so a FAIL is
//!   actionable, not a generic message.
//!
//! The optional opinion series is never subject to this gate.

use std::collections::BTreeSet;

use chrono::{DateTime, Local};

use crate::align::AggregatedSeries;
use crate::domain::{FED_FUNDS, GDP_GROWTH, QuarterKey, UNEMPLOYMENT};

/// The fixed rule set, in evaluation (and report) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Completeness,
    Format,
    Ranges,
    Alignment,
}

impl Rule {
    pub const ALL: [Rule; 4] = [Rule::Completeness, Rule::Format, Rule::Ranges, Rule::Alignment];

    pub fn as_str(self) -> &'static str {
        match self {
            Rule::Completeness => "completeness",
            Rule::Format => "format",
            Rule::Ranges => "ranges",
            Rule::Alignment => "alignment",
        }
    }
}

/// Overall verdict of the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateStatus {
    Pass,
    Fail,
}

impl GateStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            GateStatus::Pass => "PASS",
            GateStatus::Fail => "FAIL",
        }
    }
}

/// One itemized problem found by a rule.
#[derive(Debug, Clone)]
pub struct Finding {
    pub detail: String,
    /// The quarters this finding points at (may be empty for series-level
    /// problems such as an empty series).
    pub quarters: BTreeSet<QuarterKey>,
}

impl Finding {
    fn series_level(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
            quarters: BTreeSet::new(),
        }
    }
}

/// All findings of a single rule.
#[derive(Debug, Clone)]
pub struct RuleCheck {
    pub rule: Rule,
    pub findings: Vec<Finding>,
}

impl RuleCheck {
    pub fn passed(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn issues(&self) -> Vec<String> {
        self.findings.iter().map(|f| f.detail.clone()).collect()
    }
}

/// The gate's verdict plus itemized findings. Created once per run, never
/// mutated afterwards.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub timestamp: String,
    pub status: GateStatus,
    /// One entry per rule, in [`Rule::ALL`] order.
    pub checks: Vec<RuleCheck>,
    pub summary: String,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.status == GateStatus::Pass
    }

    pub fn check(&self, rule: Rule) -> &RuleCheck {
        // `checks` always holds all four rules.
        self.checks
            .iter()
            .find(|c| c.rule == rule)
            .expect("report holds every rule")
    }
}

/// Per-series numeric bounds (inclusive on both ends).
#[derive(Debug, Clone)]
pub struct SeriesBounds {
    pub series: String,
    pub min: f64,
    pub max: f64,
}

/// Bounds configuration: series name → (min, max).
#[derive(Debug, Clone)]
pub struct BoundsConfig {
    entries: Vec<SeriesBounds>,
}

impl BoundsConfig {
    pub fn new(entries: Vec<SeriesBounds>) -> Self {
        Self { entries }
    }

    /// Economically reasonable bounds for the three mandatory series:
    /// quarterly real GDP growth in percent, and the two rate series.
    pub fn default_economic() -> Self {
        Self::new(vec![
            SeriesBounds {
                series: GDP_GROWTH.to_string(),
                min: -20.0,
                max: 20.0,
            },
            SeriesBounds {
                series: UNEMPLOYMENT.to_string(),
                min: 0.0,
                max: 30.0,
            },
            SeriesBounds {
                series: FED_FUNDS.to_string(),
                min: 0.0,
                max: 25.0,
            },
        ])
    }

    pub fn bounds_for(&self, series: &str) -> Option<(f64, f64)> {
        self.entries
            .iter()
            .find(|b| b.series == series)
            .map(|b| (b.min, b.max))
    }
}

/// Run every rule over the mandatory aggregated series and classify.
///
/// Verdict = PASS iff every rule produced zero findings. The caller supplies
/// the timestamp so the gate stays a pure function of its inputs.
pub fn run_gate(
    series: &[AggregatedSeries],
    bounds: &BoundsConfig,
    timestamp: DateTime<Local>,
) -> ValidationReport {
    let checks = vec![
        RuleCheck {
            rule: Rule::Completeness,
            findings: check_completeness(series),
        },
        RuleCheck {
            rule: Rule::Format,
            findings: check_format(series),
        },
        RuleCheck {
            rule: Rule::Ranges,
            findings: check_ranges(series, bounds),
        },
        RuleCheck {
            rule: Rule::Alignment,
            findings: check_alignment(series),
        },
    ];

    let failed: Vec<&str> = checks
        .iter()
        .filter(|c| !c.passed())
        .map(|c| c.rule.as_str())
        .collect();

    let status = if failed.is_empty() {
        GateStatus::Pass
    } else {
        GateStatus::Fail
    };

    let summary = if failed.is_empty() {
        "All validation checks passed. Data is ready for analysis.".to_string()
    } else {
        format!(
            "Validation failed. {} check(s) failed: {}. See `checks` for details.",
            failed.len(),
            failed.join(", ")
        )
    };

    ValidationReport {
        timestamp: timestamp.to_rfc3339(),
        status,
        checks,
        summary,
    }
}

/// Completeness: the union of quarter keys must form a contiguous run, every
/// series must cover it, and monthly quarters aggregated from fewer months
/// than a full quarter holds are findings (the final quarter is exempt, since
/// it may legitimately still be elapsing).
fn check_completeness(series: &[AggregatedSeries]) -> Vec<Finding> {
    let mut findings = Vec::new();

    let mut union: BTreeSet<QuarterKey> = BTreeSet::new();
    for agg in series {
        union.extend(agg.series.values.keys().copied());
    }

    for agg in series {
        if agg.series.is_empty() {
            findings.push(Finding::series_level(format!(
                "{}: no quarterly data",
                agg.name()
            )));
        } else if agg.series.len() < 2 {
            findings.push(Finding::series_level(format!(
                "{}: insufficient data (need at least 2 quarters)",
                agg.name()
            )));
        }
    }

    let (Some(&min), Some(&max)) = (union.iter().next(), union.iter().next_back()) else {
        return findings;
    };

    let expected = contiguous_range(min, max);

    for agg in series {
        if agg.series.is_empty() {
            continue;
        }
        let missing: BTreeSet<QuarterKey> = expected
            .iter()
            .filter(|key| !agg.series.values.contains_key(key))
            .copied()
            .collect();
        if !missing.is_empty() {
            findings.push(Finding {
                detail: format!(
                    "{}: missing quarters: {}",
                    agg.name(),
                    format_quarters(&missing)
                ),
                quarters: missing,
            });
        }

        let last = agg.series.last_key();
        for &(key, count) in &agg.sparse_quarters {
            if Some(key) == last {
                continue;
            }
            findings.push(Finding {
                detail: format!(
                    "{}: {key} aggregated from only {count} observation(s)",
                    agg.name()
                ),
                quarters: BTreeSet::from([key]),
            });
        }
    }

    findings
}

/// Format/ordering: quarter keys must have been derived in strictly
/// increasing order, and no raw records may have been dropped as malformed.
fn check_format(series: &[AggregatedSeries]) -> Vec<Finding> {
    let mut findings = Vec::new();

    for agg in series {
        let mut offenders = BTreeSet::new();
        for window in agg.derived_keys.windows(2) {
            if window[1] <= window[0] {
                offenders.insert(window[1]);
            }
        }
        if !offenders.is_empty() {
            findings.push(Finding {
                detail: format!(
                    "{}: quarter keys not strictly increasing (out-of-order at {})",
                    agg.name(),
                    format_quarters(&offenders)
                ),
                quarters: offenders,
            });
        }

        for record in &agg.malformed {
            findings.push(Finding::series_level(format!(
                "{}: {}",
                record.series, record.message
            )));
        }
    }

    findings
}

/// Ranges: inclusive per-series bounds; boundary values pass. Violations
/// name the quarter and value and never stop other rules.
fn check_ranges(series: &[AggregatedSeries], bounds: &BoundsConfig) -> Vec<Finding> {
    let mut findings = Vec::new();

    for agg in series {
        let Some((min, max)) = bounds.bounds_for(agg.name()) else {
            continue;
        };
        for (&key, &value) in &agg.series.values {
            if !value.is_finite() {
                findings.push(Finding {
                    detail: format!("{}: {key} has a non-finite value", agg.name()),
                    quarters: BTreeSet::from([key]),
                });
            } else if value < min || value > max {
                findings.push(Finding {
                    detail: format!(
                        "{}: {key} value {value} outside [{min}, {max}]",
                        agg.name()
                    ),
                    quarters: BTreeSet::from([key]),
                });
            }
        }
    }

    findings
}

/// Alignment: the mandatory series must share an identical set of quarter
/// keys; extra keys relative to the intersection are per-series findings.
fn check_alignment(series: &[AggregatedSeries]) -> Vec<Finding> {
    if series.len() < 2 {
        return Vec::new();
    }

    let mut intersection: Option<BTreeSet<QuarterKey>> = None;
    for agg in series {
        let keys: BTreeSet<QuarterKey> = agg.series.values.keys().copied().collect();
        intersection = Some(match intersection {
            None => keys,
            Some(common) => common.intersection(&keys).copied().collect(),
        });
    }
    let intersection = intersection.unwrap_or_default();

    let mut findings = Vec::new();

    if intersection.is_empty() && series.iter().any(|s| !s.series.is_empty()) {
        findings.push(Finding::series_level(
            "series share no common quarters".to_string(),
        ));
        return findings;
    }

    for agg in series {
        let extra: BTreeSet<QuarterKey> = agg
            .series
            .values
            .keys()
            .filter(|key| !intersection.contains(key))
            .copied()
            .collect();
        if !extra.is_empty() {
            findings.push(Finding {
                detail: format!(
                    "{}: quarters not covered by every series: {}",
                    agg.name(),
                    format_quarters(&extra)
                ),
                quarters: extra,
            });
        }
    }

    findings
}

fn contiguous_range(min: QuarterKey, max: QuarterKey) -> Vec<QuarterKey> {
    let mut keys = Vec::new();
    let mut key = min;
    while key <= max {
        keys.push(key);
        key = key.next();
    }
    keys
}

/// List the first few quarters, eliding long tails.
fn format_quarters(quarters: &BTreeSet<QuarterKey>) -> String {
    const SHOWN: usize = 5;
    let mut parts: Vec<String> = quarters.iter().take(SHOWN).map(|q| q.to_string()).collect();
    if quarters.len() > SHOWN {
        parts.push(format!("and {} more", quarters.len() - SHOWN));
    }
    parts.join(", ")
}
