//! String builders for the terminal report: validation summary, descriptive
//! table, correlation matrix with significance stars, causality table, and
//! the lagged opinion table.

use crate::domain::{
    AnalysisResult, CausalityResult, CorrelationResult, DescriptiveStats, SignificanceBands,
    SkipNote,
};
use crate::validate::ValidationReport;
use std::collections::BTreeMap;

/// Format the gate verdict with its itemized findings.
pub fn format_validation_summary(report: &ValidationReport) -> String {
    let mut out = String::new();

    out.push_str("=== Validation Gate ===\n");
    out.push_str(&format!("Status: {}\n", report.status.as_str()));
    for check in &report.checks {
        let mark = if check.passed() { "ok" } else { "FAIL" };
        out.push_str(&format!("  {:<14} {mark}\n", check.rule.as_str()));
        for issue in check.issues() {
            out.push_str(&format!("    - {issue}\n"));
        }
    }
    out.push_str(&format!("{}\n", report.summary));

    out
}

/// Format the full analysis report (all tables plus skip notes).
pub fn format_analysis(result: &AnalysisResult) -> String {
    let mut out = String::new();

    out.push_str("=== Statistical Analysis ===\n\n");
    out.push_str(&format_descriptive_table(&result.descriptive_stats));
    out.push('\n');
    out.push_str(&format_correlation_table(
        "Contemporaneous correlations",
        &result.correlations,
    ));
    out.push('\n');
    out.push_str(&format_causality_table(&result.causality));

    if let Some(lagged) = &result.opinion_economy {
        out.push('\n');
        out.push_str(&format_correlation_table(
            "Economy (t-1) vs opinion (t)",
            lagged,
        ));
    }

    if !result.skipped.is_empty() {
        out.push('\n');
        out.push_str(&format_skip_notes(&result.skipped));
    }

    out.push_str("\nSignificance: *** p<=0.01, ** p<=0.05, * p<=0.10\n");

    out
}

pub fn format_descriptive_table(stats: &BTreeMap<String, DescriptiveStats>) -> String {
    let mut out = String::new();

    out.push_str("Descriptive statistics:\n");
    out.push_str(&format!(
        "{:<22} {:>6} {:>10} {:>10} {:>10} {:>10}\n",
        "series", "n", "mean", "std", "min", "max"
    ));
    for (name, s) in stats {
        out.push_str(&format!(
            "{:<22} {:>6} {:>10.3} {:>10.3} {:>10.3} {:>10.3}\n",
            truncate(name, 22),
            s.count,
            s.mean,
            s.std,
            s.min,
            s.max
        ));
    }

    out
}

pub fn format_correlation_table(title: &str, rows: &[CorrelationResult]) -> String {
    let mut out = String::new();

    out.push_str(&format!("{title}:\n"));
    out.push_str(&format!(
        "{:<22} {:<22} {:>8} {:>10} {:>4}\n",
        "series_a", "series_b", "r", "p", "sig"
    ));
    for row in rows {
        match (row.r, row.p_value) {
            (Some(r), Some(p)) => {
                out.push_str(&format!(
                    "{:<22} {:<22} {:>8.3} {:>10.4} {:>4}\n",
                    truncate(&row.series_a, 22),
                    truncate(&row.series_b, 22),
                    r,
                    p,
                    SignificanceBands::from_p(p).stars()
                ));
            }
            _ => {
                out.push_str(&format!(
                    "{:<22} {:<22} {:>8} {:>10} {:>4}  {}\n",
                    truncate(&row.series_a, 22),
                    truncate(&row.series_b, 22),
                    "-",
                    "-",
                    "",
                    row.note.as_deref().unwrap_or("undefined")
                ));
            }
        }
    }

    out
}

pub fn format_causality_table(rows: &[CausalityResult]) -> String {
    let mut out = String::new();

    out.push_str("Predictive causality (best lag of 1..4):\n");
    out.push_str(&format!(
        "{:<22} {:<22} {:>4} {:>10} {:>10} {:>4}\n",
        "cause", "effect", "lag", "F", "p", "sig"
    ));
    for row in rows {
        out.push_str(&format!(
            "{:<22} {:<22} {:>4} {:>10.3} {:>10.4} {:>4}\n",
            truncate(&row.cause, 22),
            truncate(&row.effect, 22),
            row.best_lag,
            row.f_statistic,
            row.p_value,
            row.significant_at.stars()
        ));
    }

    out
}

pub fn format_skip_notes(notes: &[SkipNote]) -> String {
    let mut out = String::new();
    out.push_str("Skipped:\n");
    for note in notes {
        out.push_str(&format!("  - {}: {}\n", note.subject, note.reason));
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn correlation(a: &str, b: &str, r: f64, p: f64) -> CorrelationResult {
        CorrelationResult {
            series_a: a.to_string(),
            series_b: b.to_string(),
            lag: 0,
            r: Some(r),
            p_value: Some(p),
            n: 20,
            note: None,
        }
    }

    #[test]
    fn correlation_table_carries_stars() {
        let rows = vec![
            correlation("gdp_growth", "unemployment", -0.82, 0.004),
            correlation("gdp_growth", "fed_funds", 0.31, 0.18),
        ];
        let table = format_correlation_table("Contemporaneous correlations", &rows);
        assert!(table.contains("***"));
        assert!(table.contains("-0.820"));
        let weak_line = table.lines().last().unwrap();
        assert!(!weak_line.contains('*'));
    }

    #[test]
    fn undefined_correlation_prints_its_note() {
        let rows = vec![CorrelationResult {
            series_a: "gdp_growth".to_string(),
            series_b: "fed_funds".to_string(),
            lag: 0,
            r: None,
            p_value: None,
            n: 8,
            note: Some("correlation undefined (zero variance)".to_string()),
        }];
        let table = format_correlation_table("Contemporaneous correlations", &rows);
        assert!(table.contains("zero variance"));
    }

    #[test]
    fn causality_table_lists_best_lag() {
        let rows = vec![CausalityResult {
            cause: "fed_funds".to_string(),
            effect: "unemployment".to_string(),
            best_lag: 2,
            f_statistic: 5.41,
            p_value: 0.012,
            df1: 2,
            df2: 13,
            n: 20,
            significant_at: SignificanceBands::from_p(0.012),
        }];
        let table = format_causality_table(&rows);
        assert!(table.contains("fed_funds"));
        assert!(table.contains("   2"));
        assert!(table.contains("**"));
    }

    #[test]
    fn analysis_report_omits_opinion_section_without_data() {
        let result = AnalysisResult {
            correlations: vec![correlation("gdp_growth", "unemployment", -0.8, 0.01)],
            causality: vec![],
            descriptive_stats: BTreeMap::new(),
            opinion_economy: None,
            skipped: vec![],
        };
        let report = format_analysis(&result);
        assert!(!report.contains("opinion"));
        assert!(report.contains("Significance:"));
    }
}
