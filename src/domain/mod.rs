//! Shared domain types for the quarterly alignment/analysis pipeline.

mod types;

pub use types::*;

/// Canonical names of the three mandatory economic series.
pub const GDP_GROWTH: &str = "gdp_growth";
pub const UNEMPLOYMENT: &str = "unemployment";
pub const FED_FUNDS: &str = "fed_funds";

/// Opinion metric column names (also used as series names after aggregation).
pub const OPINION_METRICS: [&str; 4] = [
    "getting_better_pct",
    "getting_worse_pct",
    "staying_same_pct",
    "net_sentiment",
];
