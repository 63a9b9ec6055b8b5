//! Quarterly alignment: frequency aggregation and frame construction.

pub mod aggregate;
pub mod frames;

pub use aggregate::{AggregatedSeries, MalformedInput, aggregate};
pub use frames::{AlignedFrame, LaggedFrame, LaggedPair, MIN_ALIGNED_POINTS, contemporaneous, lag_one};
