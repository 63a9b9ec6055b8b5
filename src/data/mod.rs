//! Data acquisition: the economic series catalog, the FRED feed, and the
//! optional opinion source.

pub mod fred;
pub mod opinion;

use crate::domain::{Frequency, FED_FUNDS, GDP_GROWTH, UNEMPLOYMENT};

/// Catalog entry for one mandatory economic indicator.
#[derive(Debug, Clone, Copy)]
pub struct SeriesSpec {
    /// Canonical series name used everywhere downstream.
    pub name: &'static str,
    /// FRED series identifier.
    pub fred_id: &'static str,
    /// Native observation frequency at the source.
    pub frequency: Frequency,
}

impl SeriesSpec {
    /// Filename for the raw `date,value` CSV under the data directory.
    pub fn raw_filename(&self) -> String {
        format!("{}.csv", self.name)
    }

    /// Filename for the certified quarterly CSV under the validated directory.
    pub fn validated_filename(&self) -> String {
        format!("{}_quarterly.csv", self.name)
    }
}

/// The three mandatory indicators, in canonical order.
pub const ECONOMIC_SERIES: [SeriesSpec; 3] = [
    SeriesSpec {
        name: GDP_GROWTH,
        fred_id: "A191RL1Q225SBEA",
        frequency: Frequency::Quarterly,
    },
    SeriesSpec {
        name: UNEMPLOYMENT,
        fred_id: "UNRATE",
        frequency: Frequency::Monthly,
    },
    SeriesSpec {
        name: FED_FUNDS,
        fred_id: "DFF",
        frequency: Frequency::Daily,
    },
];

/// Look up a catalog entry by canonical name.
pub fn spec_for(name: &str) -> Option<&'static SeriesSpec> {
    ECONOMIC_SERIES.iter().find(|s| s.name == name)
}
